// crates/network/src/lib.rs
//! HTTP plumbing and the Gemini generation collaborators

mod client;
mod error;
mod gemini;

pub use client::{Client, ClientConfig};
pub use error::{NetworkError, NetworkResult};
pub use gemini::{
    GeminiClient, GeminiConfig, DEFAULT_API_BASE_URL, DEFAULT_IMAGE_MODEL, DEFAULT_SPEECH_MODEL,
    DEFAULT_STORY_MODEL, DEFAULT_VOICE,
};
