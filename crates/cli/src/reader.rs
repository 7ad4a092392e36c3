// FILE: crates/cli/src/reader.rs
// Interactive, line-driven story reader

use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use console::{style, Term};
use std::collections::HashSet;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Instant;
use storybook_core::StoryPage;
use storybook_session::{
    ambient_message, SessionSnapshot, StoryController, AMBIENT_MESSAGE_INTERVAL,
};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

pub const CONTROLS: &str = "[n]ext  [p]revious  [r]ead aloud  [s]tart over  [q]uit";

/// A command typed at the page prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Next,
    Previous,
    ReadAloud,
    StartOver,
    Quit,
}

impl Action {
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_ascii_lowercase().as_str() {
            "n" | "next" => Some(Action::Next),
            "p" | "prev" | "previous" => Some(Action::Previous),
            "r" | "read" => Some(Action::ReadAloud),
            "s" | "restart" | "start over" => Some(Action::StartOver),
            "q" | "quit" | "exit" => Some(Action::Quit),
            _ => None,
        }
    }
}

enum Flow {
    StartOver,
    Quit,
}

/// Reads stories page by page from stdin commands
pub struct Reader {
    controller: StoryController,
    input: Lines<BufReader<Stdin>>,
    status: Term,
    image_dir: Option<PathBuf>,
    story_number: usize,
    saved: HashSet<usize>,
}

impl Reader {
    pub fn new(controller: StoryController, image_dir: Option<PathBuf>) -> Self {
        Self {
            controller,
            input: BufReader::new(tokio::io::stdin()).lines(),
            status: Term::stderr(),
            image_dir,
            story_number: 0,
            saved: HashSet::new(),
        }
    }

    /// Runs until the user quits or stdin closes
    pub async fn run(mut self, idea: Option<String>) -> Result<()> {
        let mut next_idea = idea;

        loop {
            let idea = match next_idea.take() {
                Some(idea) => idea,
                None => match self.prompt("What should the story be about?").await? {
                    Some(idea) => idea,
                    None => break,
                },
            };
            if idea.trim().is_empty() {
                continue;
            }

            self.story_number += 1;
            self.saved.clear();

            let created = self
                .with_progress(self.controller.create_story(&idea))
                .await;
            if let Err(e) = created {
                log::debug!("Story creation failed: {}", e);
                self.show_error();
                continue;
            }

            match self.read_story().await? {
                Flow::StartOver => self.controller.start_over(),
                Flow::Quit => break,
            }
        }

        self.controller.shutdown();
        Ok(())
    }

    async fn read_story(&mut self) -> Result<Flow> {
        loop {
            self.show_page()?;

            let Some(line) = self.prompt(CONTROLS).await? else {
                return Ok(Flow::Quit);
            };

            match Action::parse(&line) {
                Some(Action::Next) => {
                    if !self.with_progress(self.controller.next_page()).await {
                        self.note("That was the last page.");
                    }
                }
                Some(Action::Previous) => {
                    if !self.with_progress(self.controller.previous_page()).await {
                        self.note("This is the first page.");
                    }
                }
                Some(Action::ReadAloud) => {
                    if self.controller.read_aloud().is_none() {
                        self.note("This page has no narration yet.");
                    }
                }
                Some(Action::StartOver) => return Ok(Flow::StartOver),
                Some(Action::Quit) => return Ok(Flow::Quit),
                None => self.note(CONTROLS),
            }
        }
    }

    /// Drives `work` while showing what the session is waiting on
    async fn with_progress<F: Future>(&self, work: F) -> F::Output {
        tokio::pin!(work);
        let started = Instant::now();
        let mut ticker = tokio::time::interval(AMBIENT_MESSAGE_INTERVAL);
        let live = self.status.is_term();

        loop {
            tokio::select! {
                output = &mut work => {
                    if live {
                        let _ = self.status.clear_line();
                    }
                    return output;
                }
                _ = ticker.tick(), if live => {
                    if let Some(message) = self.controller.snapshot().loading_message() {
                        let line = format!(
                            "{}  {}",
                            style(message).cyan(),
                            style(ambient_message(started.elapsed())).dim()
                        );
                        let _ = self.status.clear_line();
                        let _ = self.status.write_str(&line);
                    }
                }
            }
        }
    }

    fn show_page(&mut self) -> Result<()> {
        let snapshot = self.controller.snapshot();
        let illustration = match (self.image_dir.clone(), snapshot.current_page()) {
            (Some(dir), Some(page)) => {
                self.save_illustration(&dir, snapshot.current_index, page)?
            }
            _ => None,
        };

        if let Some(view) = page_view(&snapshot, illustration.as_deref()) {
            println!("\n{}", view);
        }
        Ok(())
    }

    fn save_illustration(
        &mut self,
        dir: &Path,
        index: usize,
        page: &StoryPage,
    ) -> Result<Option<PathBuf>> {
        let Some(url) = page.image_url() else {
            return Ok(None);
        };
        let Some((extension, bytes)) = decode_data_url(url) else {
            log::warn!("Illustration for page {} is not an inline image", index + 1);
            return Ok(None);
        };

        let path = dir.join(format!(
            "story{}-page{}.{}",
            self.story_number,
            index + 1,
            extension
        ));
        if self.saved.insert(index) {
            std::fs::write(&path, bytes)
                .with_context(|| format!("Failed to save illustration to {}", path.display()))?;
            log::debug!("Saved illustration to {}", path.display());
        }
        Ok(Some(path))
    }

    fn show_error(&self) {
        if let Some(error) = self.controller.snapshot().error {
            println!("\n{}", style(error).red().bold());
        }
    }

    fn note(&self, message: &str) {
        println!("{}", style(message).dim());
    }

    async fn prompt(&mut self, label: &str) -> Result<Option<String>> {
        println!("{}", style(label).bold());
        print!("> ");
        std::io::Write::flush(&mut std::io::stdout()).context("Failed to flush stdout")?;
        self.input
            .next_line()
            .await
            .context("Failed to read from stdin")
    }
}

/// Renders the current page, or `None` when no story is loaded
pub fn page_view(snapshot: &SessionSnapshot, illustration: Option<&Path>) -> Option<String> {
    let page = snapshot.current_page()?;
    let mut view = String::new();

    view.push_str(&format!(
        "{} {}\n",
        style(format!(
            "Page {} of {}",
            snapshot.current_index + 1,
            snapshot.pages.len()
        ))
        .bold()
        .cyan(),
        style(format!("· {}", snapshot.idea)).dim()
    ));
    view.push_str(&"=".repeat(80));
    view.push('\n');
    view.push_str(page.page_text());
    view.push('\n');

    let picture = match (illustration, page.has_image()) {
        (Some(path), _) => format!("Illustration: {}", path.display()),
        (None, true) => format!("Illustration ready: {}", page.image_prompt()),
        (None, false) => "Illustration: not available".to_string(),
    };
    view.push_str(&style(picture).dim().to_string());

    if !page.is_complete() {
        if let Some(error) = &snapshot.error {
            view.push('\n');
            view.push_str(&style(error).red().bold().to_string());
        }
    }
    Some(view)
}

/// Splits a base64 `data:` URL into a file extension and decoded bytes
pub fn decode_data_url(url: &str) -> Option<(&'static str, Vec<u8>)> {
    let (header, payload) = url.strip_prefix("data:")?.split_once(',')?;
    let mime = header.strip_suffix(";base64")?;
    let extension = match mime {
        "image/png" => "png",
        "image/webp" => "webp",
        _ => "jpg",
    };
    let bytes = STANDARD.decode(payload.trim()).ok()?;
    Some((extension, bytes))
}
