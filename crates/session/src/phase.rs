//! Loading phases and the messages shown while they run

use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// Shown when story generation fails
pub const STORY_ERROR_MESSAGE: &str =
    "Oh no! We couldn't create the story. Please try another idea.";

/// Shown when a page's image or narration cannot be generated
pub const PAGE_ERROR_MESSAGE: &str =
    "A little hiccup! We couldn't load this page. Let's try another.";

/// Waiting messages a front-end cycles through while anything is loading
pub const AMBIENT_MESSAGES: [&str; 5] = [
    "Mixing colors for our illustrations...",
    "Gathering magical words...",
    "Waking up the story characters...",
    "Finding the perfect storytelling voice...",
    "Turning imagination into pictures...",
];

/// How long each ambient message stays up
pub const AMBIENT_MESSAGE_INTERVAL: Duration = Duration::from_millis(2500);

/// What the session is waiting on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadingPhase {
    Story,
    Image,
    Speech,
}

impl LoadingPhase {
    pub fn message(&self) -> &'static str {
        match self {
            Self::Story => "Dreaming up a wonderful story...",
            Self::Image => "Painting a beautiful picture...",
            Self::Speech => "Warming up our storytelling voice...",
        }
    }
}

impl fmt::Display for LoadingPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// The ambient message to show after `elapsed` time spent loading
pub fn ambient_message(elapsed: Duration) -> &'static str {
    let step = elapsed.as_millis() / AMBIENT_MESSAGE_INTERVAL.as_millis();
    AMBIENT_MESSAGES[(step % AMBIENT_MESSAGES.len() as u128) as usize]
}
