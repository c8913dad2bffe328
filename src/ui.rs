//! Terminal front-end: animated banner, search prompt, result cards and
//! favorite toggles.

use crate::favorites::{FavoritesStore, Storage};
use crate::llm::CompletionClient;
use crate::SearchResult;
use futures::future::LocalBoxFuture;
use futures::stream::FuturesUnordered;
use futures::{FutureExt, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use std::fmt::Write as _;
use std::io::{self, Write};
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::debug;

/// Website kinds cycled through by the banner and the prompt hint.
pub const PHRASES: &[&str] = &[
    "a coding tutorial website",
    "a recipe website",
    "a fitness tracker",
    "a language learning platform",
    "a meditation app",
    "a travel blog",
    "a music streaming service",
    "a book recommendation site",
];

const BANNER_PREFIX: &str = "I want ";
const PLACEHOLDER: &str = "Search the web...";
const FAVORITE: char = '★';
const NOT_FAVORITE: char = '☆';

const HELP: &str = "\
Type a query and press Enter to search.
  :fav N, :f N   toggle result N as a favorite
  :favs          list favorites
  :rec           recommend websites similar to your favorites
  :help          show this help
  :q, :quit      exit";

/// One step of the typing animation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub text: String,
    pub delay: Duration,
}

/// Types a phrase character by character, holds it, then erases it.
#[derive(Debug, Clone)]
pub struct TypingAnimation {
    char_delay: Duration,
    erase_delay: Duration,
    hold: Duration,
}

impl Default for TypingAnimation {
    fn default() -> Self {
        Self {
            char_delay: Duration::from_millis(40),
            erase_delay: Duration::from_millis(15),
            hold: Duration::from_millis(2000),
        }
    }
}

impl TypingAnimation {
    pub fn new(char_delay: Duration, erase_delay: Duration, hold: Duration) -> Self {
        Self {
            char_delay,
            erase_delay,
            hold,
        }
    }

    /// The frames for one phrase, from the first typed character back to empty.
    pub fn frames(&self, phrase: &str) -> Vec<Frame> {
        let prefixes: Vec<&str> = phrase
            .char_indices()
            .map(|(i, c)| &phrase[..i + c.len_utf8()])
            .collect();

        let mut frames = Vec::with_capacity(prefixes.len() * 2 + 1);
        for (i, prefix) in prefixes.iter().enumerate() {
            let delay = if i + 1 == prefixes.len() {
                self.hold
            } else {
                self.char_delay
            };
            frames.push(Frame {
                text: prefix.to_string(),
                delay,
            });
        }
        for prefix in prefixes.iter().rev().skip(1) {
            frames.push(Frame {
                text: prefix.to_string(),
                delay: self.erase_delay,
            });
        }
        frames.push(Frame {
            text: String::new(),
            delay: self.erase_delay,
        });

        frames
    }

    /// The frames for every phrase in order, each typed and erased in turn.
    pub fn sequence(&self, phrases: &[&str]) -> Vec<Frame> {
        phrases.iter().flat_map(|phrase| self.frames(phrase)).collect()
    }

    /// Plays the animation for all `phrases` on stdout, then prints the last one in full.
    pub async fn play_all(&self, phrases: &[&str]) -> io::Result<()> {
        let mut stdout = io::stdout();
        for frame in self.sequence(phrases) {
            write!(stdout, "\r\x1b[2K{}{}", BANNER_PREFIX, frame.text)?;
            stdout.flush()?;
            tokio::time::sleep(frame.delay).await;
        }
        if let Some(last) = phrases.last() {
            writeln!(stdout, "\r\x1b[2K{}{}", BANNER_PREFIX, last)?;
        }
        Ok(())
    }
}

/// Endless rotation over [`PHRASES`].
#[derive(Debug, Default)]
pub struct PhraseCycle {
    next: usize,
}

impl Iterator for PhraseCycle {
    type Item = &'static str;

    fn next(&mut self) -> Option<Self::Item> {
        let phrase = PHRASES[self.next % PHRASES.len()];
        self.next = (self.next + 1) % PHRASES.len();
        Some(phrase)
    }
}

/// A line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Blank input.
    Empty,
    Search(String),
    /// Toggle the favorite state of the result at this 1-based position.
    ToggleFavorite(usize),
    ListFavorites,
    Recommend,
    Help,
    Quit,
    Unknown(String),
}

impl Command {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return Self::Empty;
        }
        let Some(command) = line.strip_prefix(':') else {
            return Self::Search(line.to_string());
        };

        let mut parts = command.split_whitespace();
        match (parts.next(), parts.next(), parts.next()) {
            (Some("fav" | "f"), Some(n), None) => match n.parse::<usize>() {
                Ok(n) if n > 0 => Self::ToggleFavorite(n),
                _ => Self::Unknown(line.to_string()),
            },
            (Some("favs"), None, None) => Self::ListFavorites,
            (Some("rec"), None, None) => Self::Recommend,
            (Some("help" | "h"), None, None) => Self::Help,
            (Some("q" | "quit"), None, None) => Self::Quit,
            _ => Self::Unknown(line.to_string()),
        }
    }
}

/// The state behind the terminal view: the displayed results and the favorites.
pub struct Session<S: Storage> {
    favorites: FavoritesStore<S>,
    results: Vec<SearchResult>,
    phrases: PhraseCycle,
}

impl<S: Storage> Session<S> {
    pub fn new(favorites: FavoritesStore<S>) -> Self {
        Self {
            favorites,
            results: Vec::new(),
            phrases: PhraseCycle::default(),
        }
    }

    pub fn results(&self) -> &[SearchResult] {
        &self.results
    }

    pub fn favorites(&self) -> &FavoritesStore<S> {
        &self.favorites
    }

    /// Replaces the displayed results.
    pub fn apply_results(&mut self, results: Vec<SearchResult>) {
        self.results = results;
    }

    /// Toggles the favorite state of the result at 1-based `position`.
    ///
    /// # Returns
    ///
    /// The toggled result and whether it is now a favorite, or `None` if there
    /// is no such result.
    pub fn toggle(&mut self, position: usize) -> Option<(&SearchResult, bool)> {
        let result = self.results.get(position.checked_sub(1)?)?;
        let favorite = self.favorites.toggle(result);
        Some((result, favorite))
    }

    /// The prompt shown before each input line, with a rotating hint.
    pub fn prompt(&mut self) -> String {
        let hint = self.phrases.next().unwrap_or(PHRASES[0]);
        format!("{} (try: {}) > ", PLACEHOLDER, hint)
    }
}

/// Renders results as numbered cards with a favorite star.
pub fn render_results<S: Storage>(results: &[SearchResult], favorites: &FavoritesStore<S>) -> String {
    if results.is_empty() {
        return String::from("No results.\n");
    }

    let mut out = String::new();
    for (i, result) in results.iter().enumerate() {
        let star = if favorites.is_favorite(&result.url) {
            FAVORITE
        } else {
            NOT_FAVORITE
        };
        let _ = writeln!(out, "{:>2}. {} {}", i + 1, star, result.title);
        if !result.category.is_empty() {
            let _ = writeln!(out, "    [{}]", result.category);
        }
        if !result.description.is_empty() {
            let _ = writeln!(out, "    {}", result.description);
        }
        let _ = writeln!(out, "    {}", result.url);
    }
    out
}

/// Renders the favorites list.
pub fn render_favorites<S: Storage>(favorites: &FavoritesStore<S>) -> String {
    if favorites.is_empty() {
        return String::from("No favorites yet. Use :fav N to star a result.\n");
    }

    let mut out = String::new();
    for result in favorites.favorites() {
        let _ = writeln!(out, "{} {} - {}", FAVORITE, result.title, result.url);
    }
    out
}

/// A spinner shown while searches are pending.
pub fn spinner(message: impl Into<String>) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.into());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Prints `text`, keeping the spinner (if any) intact.
fn emit(spinner: Option<&ProgressBar>, text: &str) {
    match spinner {
        Some(pb) => pb.suspend(|| print!("{}", text)),
        None => print!("{}", text),
    }
    let _ = io::stdout().flush();
}

/// Runs the interactive loop on stdin until `:quit` or end of input.
pub async fn run<S: Storage>(client: &CompletionClient, session: &mut Session<S>) -> io::Result<()> {
    run_with(BufReader::new(tokio::io::stdin()), client, session).await
}

/// Runs the interactive loop on `input` until `:quit`, or until input ends
/// and every pending search has finished.
///
/// Searches run concurrently and are never cancelled; whichever finishes
/// last decides the displayed results.
pub async fn run_with<R, S>(
    input: R,
    client: &CompletionClient,
    session: &mut Session<S>,
) -> io::Result<()>
where
    R: AsyncBufRead + Unpin,
    S: Storage,
{
    let mut lines = input.lines();
    let mut input_open = true;
    let mut pending: FuturesUnordered<LocalBoxFuture<'_, Vec<SearchResult>>> =
        FuturesUnordered::new();
    let mut progress: Option<ProgressBar> = None;

    emit(None, &session.prompt());

    loop {
        if !input_open && pending.is_empty() {
            break;
        }

        tokio::select! {
            line = lines.next_line(), if input_open => {
                let Some(line) = line? else {
                    input_open = false;
                    continue;
                };

                match Command::parse(&line) {
                    Command::Empty => {}
                    Command::Search(query) => {
                        debug!("Queueing search: {}", query);
                        let pb = progress.get_or_insert_with(|| spinner("Searching..."));
                        pb.set_message(format!("Searching for '{}'...", query));
                        pending.push(async move { client.search_websites(&query).await }.boxed_local());
                    }
                    Command::Recommend => {
                        if session.favorites().is_empty() {
                            emit(progress.as_ref(), &render_favorites(session.favorites()));
                        } else {
                            let titles = session.favorites().titles();
                            let pb = progress.get_or_insert_with(|| spinner("Recommending..."));
                            pb.set_message("Finding similar websites...");
                            pending.push(async move { client.recommendations(&titles).await }.boxed_local());
                        }
                    }
                    Command::ToggleFavorite(position) => {
                        let text = match session.toggle(position) {
                            Some((result, true)) => format!("{} Added {} to favorites\n", FAVORITE, result.title),
                            Some((result, false)) => format!("{} Removed {} from favorites\n", NOT_FAVORITE, result.title),
                            None => format!("No result #{}\n", position),
                        };
                        emit(progress.as_ref(), &text);
                    }
                    Command::ListFavorites => emit(progress.as_ref(), &render_favorites(session.favorites())),
                    Command::Help => emit(progress.as_ref(), &format!("{}\n", HELP)),
                    Command::Quit => break,
                    Command::Unknown(input) => {
                        emit(progress.as_ref(), &format!("Unknown command: {} (try :help)\n", input));
                    }
                }

                if pending.is_empty() && input_open {
                    emit(None, &session.prompt());
                }
            }
            Some(results) = pending.next(), if !pending.is_empty() => {
                if pending.is_empty() {
                    if let Some(pb) = progress.take() {
                        pb.finish_and_clear();
                    }
                }
                session.apply_results(results);
                emit(
                    progress.as_ref(),
                    &format!("\n{}", render_results(session.results(), session.favorites())),
                );
                if pending.is_empty() && input_open {
                    emit(None, &session.prompt());
                }
            }
        }
    }

    if let Some(pb) = progress.take() {
        pb.finish_and_clear();
    }
    Ok(())
}
