//! Story session: the page and asset lifecycle
//!
//! - `controller`: the session controller a front-end talks to
//! - `loader`: fetches a page's missing illustration and narration
//! - `narrator`: shared handle to the playback engine
//! - `phase`: loading phases and user-facing messages

mod controller;
mod loader;
mod narrator;
mod phase;
mod session;

pub use controller::StoryController;
pub use loader::{AssetLoader, AssetSink, AssetStatus};
pub use narrator::Narrator;
pub use phase::{
    ambient_message, LoadingPhase, AMBIENT_MESSAGES, AMBIENT_MESSAGE_INTERVAL,
    PAGE_ERROR_MESSAGE, STORY_ERROR_MESSAGE,
};
pub use session::{SessionSnapshot, SessionState};
