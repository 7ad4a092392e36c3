//! Per-page asset fetching

use crate::narrator::Narrator;
use crate::phase::LoadingPhase;
use std::sync::Arc;
use storybook_core::{ImageGenerator, SpeechGenerator, StoryPage, StoryResult};

/// Receives progress and results from the loader
///
/// The loader never touches session state itself; whoever owns the page
/// decides what to do with a result.
pub trait AssetSink: Send + Sync {
    /// A remote call for `phase` is about to start
    fn loading(&self, phase: LoadingPhase);

    /// Hands back an updated copy of the page
    ///
    /// Returns true when the page is still the one being read, so its
    /// narration should start.
    fn install(&self, page: StoryPage) -> bool;
}

/// What `ensure_assets` had to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetStatus {
    /// Both assets were already present
    Cached,
    /// At least one asset was generated
    Fetched,
}

/// Generates a page's missing illustration and narration
#[derive(Clone)]
pub struct AssetLoader {
    images: Arc<dyn ImageGenerator>,
    speech: Arc<dyn SpeechGenerator>,
    narrator: Narrator,
}

impl AssetLoader {
    pub fn new(
        images: Arc<dyn ImageGenerator>,
        speech: Arc<dyn SpeechGenerator>,
        narrator: Narrator,
    ) -> Self {
        Self {
            images,
            speech,
            narrator,
        }
    }

    /// Makes sure `page` has both assets, then narrates it
    ///
    /// A complete page is narrated straight away with no remote call.
    /// Otherwise the image and then the speech are generated, skipping
    /// whichever is already present. If a call fails the sequence stops and
    /// anything generated before the failure is still installed.
    pub async fn ensure_assets(
        &self,
        page: &StoryPage,
        sink: &dyn AssetSink,
    ) -> StoryResult<AssetStatus> {
        if page.is_complete() {
            log::debug!("Page assets already loaded, replaying narration");
            if let Some(audio) = page.audio_data() {
                self.narrator.play(audio);
            }
            return Ok(AssetStatus::Cached);
        }

        let mut updated = page.clone();

        if !updated.has_image() {
            sink.loading(LoadingPhase::Image);
            let image = self.images.generate_image(updated.image_prompt()).await?;
            updated = updated.with_image(image);
        }

        if !updated.has_audio() {
            sink.loading(LoadingPhase::Speech);
            match self.speech.generate_speech(updated.page_text()).await {
                Ok(audio) => updated = updated.with_audio(audio),
                Err(e) => {
                    if updated != *page {
                        sink.install(updated);
                    }
                    return Err(e);
                }
            }
        }

        let audio = updated.audio_data().map(str::to_owned);
        if sink.install(updated) {
            if let Some(audio) = audio {
                self.narrator.play(&audio);
            }
        }

        Ok(AssetStatus::Fetched)
    }
}
