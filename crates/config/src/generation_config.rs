//! Generation service configuration section

use crate::validation::{ConfigSection, ValidationError, Validator};
use serde::{Deserialize, Serialize};

/// Endpoint, credentials and models used to generate stories
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GenerationConfig {
    /// Base URL of the generation REST API
    pub api_base_url: String,

    /// API key; usually supplied through the environment instead
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    pub story_model: String,
    pub image_model: String,
    pub speech_model: String,

    /// Prebuilt narration voice
    pub voice: String,

    /// Pages requested per story
    pub page_count: usize,

    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
}

impl GenerationConfig {
    /// Returns the configured key if it is present and not blank
    pub fn api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            api_key: None,
            story_model: "gemini-2.5-flash".to_string(),
            image_model: "imagen-4.0-generate-001".to_string(),
            speech_model: "gemini-2.5-flash-preview-tts".to_string(),
            voice: "Kore".to_string(),
            page_count: 5,
            request_timeout_secs: 60,
        }
    }
}

impl ConfigSection for GenerationConfig {
    fn validate(&self) -> Result<(), Vec<ValidationError>> {
        Validator::collect_errors(vec![
            Validator::http_url(&self.api_base_url, "generation.api_base_url"),
            Validator::not_blank_if_set(self.api_key.as_deref(), "generation.api_key"),
            Validator::not_empty(&self.story_model, "generation.story_model"),
            Validator::not_empty(&self.image_model, "generation.image_model"),
            Validator::not_empty(&self.speech_model, "generation.speech_model"),
            Validator::not_empty(&self.voice, "generation.voice"),
            Validator::in_range(self.page_count, 1, 20, "generation.page_count"),
            Validator::in_range(
                self.request_timeout_secs,
                5,
                600,
                "generation.request_timeout_secs",
            ),
        ])
    }

    fn merge(&mut self, other: Self) {
        self.api_base_url = other.api_base_url;
        if other.api_key.is_some() {
            self.api_key = other.api_key;
        }
        self.story_model = other.story_model;
        self.image_model = other.image_model;
        self.speech_model = other.speech_model;
        self.voice = other.voice;
        self.page_count = other.page_count;
        self.request_timeout_secs = other.request_timeout_secs;
    }

    fn section_name(&self) -> &'static str {
        "generation"
    }
}
