//! Narration playback shared by the loader and the controller

use media_engine::{Completion, PlaybackEngine, PlaybackState};
use parking_lot::Mutex;
use std::sync::Arc;
use storybook_core::StoryError;

/// Cloneable handle to the playback engine
///
/// Playback failures never reach the caller: the story stays readable
/// without narration, so they are logged and dropped here.
#[derive(Clone)]
pub struct Narrator {
    engine: Arc<Mutex<PlaybackEngine>>,
}

impl Narrator {
    pub fn new(engine: PlaybackEngine) -> Self {
        Self {
            engine: Arc::new(Mutex::new(engine)),
        }
    }

    /// Starts narrating base64 PCM, replacing any current narration
    pub fn play(&self, audio: &str) -> Option<Completion> {
        match self.engine.lock().play_encoded(audio) {
            Ok(completion) => Some(completion),
            Err(e) => {
                let err = StoryError::from(e);
                log::warn!("Narration unavailable ({}): {}", err.recovery_action(), err);
                None
            }
        }
    }

    pub fn stop(&self) {
        self.engine.lock().stop();
    }

    pub fn state(&self) -> PlaybackState {
        self.engine.lock().state()
    }

    /// Stops narration and releases the output device
    pub fn shutdown(&self) {
        self.engine.lock().shutdown();
    }
}
