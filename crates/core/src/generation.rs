//! Contracts for the remote generation collaborators
//!
//! The core only knows these traits. Each call is a single attempt: it
//! either returns a usable result or a `StoryError::Generation`.

use crate::{Collaborator, PageOutline, StoryError, StoryResult};
use async_trait::async_trait;

/// Turns a story idea into an ordered list of page outlines
#[async_trait]
pub trait StoryGenerator: Send + Sync {
    async fn generate_story(&self, idea: &str) -> StoryResult<Vec<PageOutline>>;
}

/// Turns an illustration prompt into an image reference (URL or data URL)
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn generate_image(&self, prompt: &str) -> StoryResult<String>;
}

/// Turns page text into base64-encoded raw 16-bit PCM narration
#[async_trait]
pub trait SpeechGenerator: Send + Sync {
    async fn generate_speech(&self, text: &str) -> StoryResult<String>;
}

/// Rejects story results that cannot be shown as a book
///
/// An empty list, or a page with blank text or a blank prompt, counts as a
/// malformed result.
pub fn validate_outlines(pages: Vec<PageOutline>) -> StoryResult<Vec<PageOutline>> {
    if pages.is_empty() {
        return Err(StoryError::generation(
            Collaborator::Story,
            "Generated story has no pages",
        ));
    }

    if let Some(index) = pages
        .iter()
        .position(|p| p.page_text.trim().is_empty() || p.image_prompt.trim().is_empty())
    {
        return Err(StoryError::generation(
            Collaborator::Story,
            format!("Generated page {} is missing text or an image prompt", index + 1),
        ));
    }

    Ok(pages)
}
