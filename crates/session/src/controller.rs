//! Story session controller
//!
//! Drives story creation, page navigation and read-aloud requests. The
//! controller is a cheap `Clone` handle; every operation takes `&self`, so a
//! front-end can start over while a story or page is still being generated.
//! The session lock is never held across a remote call.

use crate::loader::{AssetLoader, AssetSink, AssetStatus};
use crate::narrator::Narrator;
use crate::phase::{LoadingPhase, PAGE_ERROR_MESSAGE, STORY_ERROR_MESSAGE};
use crate::session::{LoadTicket, Session, SessionSnapshot};
use media_engine::{Completion, PlaybackEngine};
use parking_lot::Mutex;
use std::sync::Arc;
use storybook_core::{
    validate_outlines, Collaborator, ImageGenerator, SpeechGenerator, StoryError,
    StoryGenerator, StoryPage, StoryResult,
};

struct Inner {
    session: Mutex<Session>,
    stories: Arc<dyn StoryGenerator>,
    loader: AssetLoader,
    narrator: Narrator,
}

/// Owns the story session and everything that mutates it
#[derive(Clone)]
pub struct StoryController {
    inner: Arc<Inner>,
}

impl StoryController {
    pub fn new(
        stories: Arc<dyn StoryGenerator>,
        images: Arc<dyn ImageGenerator>,
        speech: Arc<dyn SpeechGenerator>,
        engine: PlaybackEngine,
    ) -> Self {
        let narrator = Narrator::new(engine);
        Self {
            inner: Arc::new(Inner {
                session: Mutex::new(Session::default()),
                stories,
                loader: AssetLoader::new(images, speech, narrator.clone()),
                narrator,
            }),
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.inner.session.lock().snapshot()
    }

    /// Generates a story for `idea` and loads its first page
    ///
    /// Any previous story is discarded first. A story-level failure is both
    /// recorded in the session and returned; page-level failures on the first
    /// page are only recorded.
    pub async fn create_story(&self, idea: &str) -> StoryResult<()> {
        let idea = idea.trim();
        if idea.is_empty() {
            return Err(StoryError::generation(
                Collaborator::Story,
                "Story idea must not be empty",
            ));
        }

        let epoch = self.inner.session.lock().begin_story(idea);
        self.inner.narrator.stop();
        log::info!("Creating story: {}", idea);

        let generated = self
            .inner
            .stories
            .generate_story(idea)
            .await
            .and_then(validate_outlines);

        match generated {
            Ok(outlines) => {
                let pages = outlines.len();
                if !self.inner.session.lock().install_story(epoch, outlines) {
                    log::debug!("Discarding story for a session that was restarted");
                    return Ok(());
                }
                log::info!("Story ready with {} pages", pages);
                self.load_page(0).await;
                Ok(())
            }
            Err(e) => {
                log::error!("Story generation failed: {}", e);
                self.inner
                    .session
                    .lock()
                    .fail_story(epoch, STORY_ERROR_MESSAGE);
                Err(e)
            }
        }
    }

    /// Moves to the next page; returns false at the last page or with no story
    pub async fn next_page(&self) -> bool {
        self.turn_page(true).await
    }

    /// Moves to the previous page; returns false at the first page or with no story
    pub async fn previous_page(&self) -> bool {
        self.turn_page(false).await
    }

    /// Replays the current page's narration if it has been loaded
    ///
    /// Never triggers generation.
    pub fn read_aloud(&self) -> Option<Completion> {
        let audio = {
            let session = self.inner.session.lock();
            session
                .current_page()
                .and_then(StoryPage::audio_data)
                .map(str::to_owned)
        }?;
        self.inner.narrator.play(&audio)
    }

    /// Stops narration and returns to an empty session
    ///
    /// Results of generation still in flight are discarded when they arrive.
    pub fn start_over(&self) {
        self.inner.narrator.stop();
        self.inner.session.lock().reset();
        log::info!("Session cleared");
    }

    /// Stops narration and releases the output device
    pub fn shutdown(&self) {
        self.inner.narrator.shutdown();
    }

    async fn turn_page(&self, forward: bool) -> bool {
        let moved = self.inner.session.lock().step(forward);
        let Some(index) = moved else {
            return false;
        };

        self.inner.narrator.stop();
        log::debug!("Turned to page {}", index + 1);
        self.load_page(index).await;
        true
    }

    async fn load_page(&self, index: usize) {
        let Some((ticket, page)) = self.inner.session.lock().begin_load(index) else {
            return;
        };

        let sink = SessionSink {
            session: &self.inner.session,
            ticket,
        };
        let result = self.inner.loader.ensure_assets(&page, &sink).await;

        let error = match &result {
            Ok(AssetStatus::Cached) => None,
            Ok(AssetStatus::Fetched) => {
                log::info!("Loaded assets for page {}", index + 1);
                None
            }
            Err(e) => {
                log::error!("Failed to load page {}: {}", index + 1, e);
                Some(PAGE_ERROR_MESSAGE)
            }
        };
        self.inner.session.lock().finish_load(&ticket, error);
    }
}

/// Routes loader results into the session, tagged with the load they belong to
struct SessionSink<'a> {
    session: &'a Mutex<Session>,
    ticket: LoadTicket,
}

impl AssetSink for SessionSink<'_> {
    fn loading(&self, phase: LoadingPhase) {
        self.session.lock().set_loading(&self.ticket, phase);
    }

    fn install(&self, page: StoryPage) -> bool {
        self.session.lock().install_page(&self.ticket, page)
    }
}
