use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;
use whatyouseek::{
    config::AppConfig,
    favorites::{FavoritesStore, FileStorage},
    llm::CompletionClient,
    ui::{self, Session, TypingAnimation, PHRASES},
};

/// Command-line arguments.
#[derive(Debug, PartialEq)]
struct Args {
    animate: bool,
    /// Words of a one-shot query. Empty for the interactive prompt.
    words: Vec<String>,
}

impl Args {
    fn parse(args: impl IntoIterator<Item = String>) -> anyhow::Result<Self> {
        let mut parsed = Args {
            animate: true,
            words: Vec::new(),
        };
        let mut options_done = false;

        for arg in args {
            if options_done {
                parsed.words.push(arg);
                continue;
            }
            match arg.as_str() {
                "--" => options_done = true,
                "--no-animation" => parsed.animate = false,
                option if option.starts_with("--") => {
                    anyhow::bail!("unknown option: {} (supported: --no-animation)", option)
                }
                _ => parsed.words.push(arg),
            }
        }

        Ok(parsed)
    }
}

/// The main entry point of the application.
///
/// Loads the configuration and favorites, then either runs a single search for the
/// query given on the command line or starts the interactive prompt.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let args = Args::parse(std::env::args().skip(1))?;

    let config = AppConfig::load().context("failed to load configuration")?;
    let client = CompletionClient::new(&config).context("failed to create HTTP client")?;

    let storage = FileStorage::new(&config.favorites_dir);
    info!("Favorites stored in {}", storage.dir().display());
    let favorites = FavoritesStore::load(storage);

    // One-shot search
    if !args.words.is_empty() {
        let query = args.words.join(" ");
        let pb = ui::spinner(format!("Searching for '{}'...", query));
        let results = client.search_websites(&query).await;
        pb.finish_and_clear();

        print!("{}", ui::render_results(&results, &favorites));
        return Ok(());
    }

    if args.animate {
        TypingAnimation::default().play_all(PHRASES).await?;
    }

    let mut session = Session::new(favorites);
    ui::run(&client, &mut session).await?;

    Ok(())
}
