//! Story page domain models

use serde::{Deserialize, Serialize};

/// Text and illustration directive for one page, as produced by story generation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageOutline {
    pub page_text: String,
    pub image_prompt: String,
}

impl PageOutline {
    pub fn new(page_text: impl Into<String>, image_prompt: impl Into<String>) -> Self {
        Self {
            page_text: page_text.into(),
            image_prompt: image_prompt.into(),
        }
    }
}

/// A generated asset a page can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    Image,
    Speech,
}

/// One page of a generated story
///
/// Text and prompt are fixed at creation. The image reference and the
/// narration audio start out absent and can each be filled in exactly once;
/// later attempts to set them leave the existing value in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryPage {
    page_text: String,
    image_prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    image_url: Option<String>,
    /// Base64 text of raw 16-bit PCM, as returned by speech generation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    audio_data: Option<String>,
}

impl StoryPage {
    /// Creates a page with no generated assets
    pub fn new(page_text: impl Into<String>, image_prompt: impl Into<String>) -> Self {
        Self {
            page_text: page_text.into(),
            image_prompt: image_prompt.into(),
            image_url: None,
            audio_data: None,
        }
    }

    pub fn page_text(&self) -> &str {
        &self.page_text
    }

    pub fn image_prompt(&self) -> &str {
        &self.image_prompt
    }

    pub fn image_url(&self) -> Option<&str> {
        self.image_url.as_deref()
    }

    pub fn audio_data(&self) -> Option<&str> {
        self.audio_data.as_deref()
    }

    pub fn has_image(&self) -> bool {
        self.image_url.is_some()
    }

    pub fn has_audio(&self) -> bool {
        self.audio_data.is_some()
    }

    /// True once both the illustration and the narration are present
    pub fn is_complete(&self) -> bool {
        self.has_image() && self.has_audio()
    }

    /// Assets still to be generated, in fetch order
    pub fn missing_assets(&self) -> Vec<AssetKind> {
        let mut missing = Vec::with_capacity(2);
        if !self.has_image() {
            missing.push(AssetKind::Image);
        }
        if !self.has_audio() {
            missing.push(AssetKind::Speech);
        }
        missing
    }

    /// Returns this page with the image set, unless one is already present
    pub fn with_image(mut self, image_url: impl Into<String>) -> Self {
        if self.image_url.is_none() {
            self.image_url = Some(image_url.into());
        }
        self
    }

    /// Returns this page with the narration set, unless one is already present
    pub fn with_audio(mut self, audio_data: impl Into<String>) -> Self {
        if self.audio_data.is_none() {
            self.audio_data = Some(audio_data.into());
        }
        self
    }
}

impl From<PageOutline> for StoryPage {
    fn from(outline: PageOutline) -> Self {
        Self::new(outline.page_text, outline.image_prompt)
    }
}
