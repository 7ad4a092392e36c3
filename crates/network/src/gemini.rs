// crates/network/src/gemini.rs
//! Gemini implementations of the story, image and speech collaborators

use crate::client::{Client, ClientConfig};
use crate::error::{NetworkError, NetworkResult};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use storybook_core::{
    validate_outlines, Collaborator, ImageGenerator, PageOutline, SpeechGenerator,
    StoryGenerator, StoryResult, DEFAULT_PAGE_COUNT,
};

pub const DEFAULT_API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_STORY_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_IMAGE_MODEL: &str = "imagen-4.0-generate-001";
pub const DEFAULT_SPEECH_MODEL: &str = "gemini-2.5-flash-preview-tts";
pub const DEFAULT_VOICE: &str = "Kore";

const IMAGE_MIME_TYPE: &str = "image/jpeg";
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Endpoint, credentials and model selection
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_base_url: String,
    pub api_key: String,
    pub story_model: String,
    pub image_model: String,
    pub speech_model: String,
    pub voice: String,
    pub page_count: usize,
    pub timeout: Duration,
}

impl GeminiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            api_key: api_key.into(),
            story_model: DEFAULT_STORY_MODEL.to_string(),
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
            speech_model: DEFAULT_SPEECH_MODEL.to_string(),
            voice: DEFAULT_VOICE.to_string(),
            page_count: DEFAULT_PAGE_COUNT,
            timeout: Duration::from_secs(60),
        }
    }
}

/// Talks to the Gemini REST API
///
/// One client serves all three collaborator traits.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: Client,
    config: GeminiConfig,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> NetworkResult<Self> {
        if config.api_key.trim().is_empty() {
            return Err(NetworkError::MissingApiKey);
        }

        let client = Client::with_config(ClientConfig {
            timeout: config.timeout,
            ..ClientConfig::default()
        })?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }

    fn endpoint(&self, model: &str, method: &str) -> String {
        format!(
            "{}/models/{}:{}",
            self.config.api_base_url.trim_end_matches('/'),
            model,
            method
        )
    }

    async fn call<R: DeserializeOwned>(&self, url: &str, body: &Value) -> NetworkResult<R> {
        self.client
            .post_json(url, &[(API_KEY_HEADER, self.config.api_key.as_str())], body)
            .await
    }
}

#[async_trait]
impl StoryGenerator for GeminiClient {
    async fn generate_story(&self, idea: &str) -> StoryResult<Vec<PageOutline>> {
        let url = self.endpoint(&self.config.story_model, "generateContent");
        let body = story_request(idea, self.config.page_count);

        let response: GenerateContentResponse = self
            .call(&url, &body)
            .await
            .map_err(|e| e.into_generation(Collaborator::Story))?;

        let pages = parse_story(&response).map_err(|e| e.into_generation(Collaborator::Story))?;
        log::debug!("Story model returned {} pages", pages.len());
        validate_outlines(pages)
    }
}

#[async_trait]
impl ImageGenerator for GeminiClient {
    async fn generate_image(&self, prompt: &str) -> StoryResult<String> {
        let url = self.endpoint(&self.config.image_model, "predict");
        let body = image_request(prompt);

        let response: PredictResponse = self
            .call(&url, &body)
            .await
            .map_err(|e| e.into_generation(Collaborator::Image))?;

        parse_image(&response).map_err(|e| e.into_generation(Collaborator::Image))
    }
}

#[async_trait]
impl SpeechGenerator for GeminiClient {
    async fn generate_speech(&self, text: &str) -> StoryResult<String> {
        let url = self.endpoint(&self.config.speech_model, "generateContent");
        let body = speech_request(text, &self.config.voice);

        let response: GenerateContentResponse = self
            .call(&url, &body)
            .await
            .map_err(|e| e.into_generation(Collaborator::Speech))?;

        parse_speech(&response).map_err(|e| e.into_generation(Collaborator::Speech))
    }
}

fn story_request(idea: &str, page_count: usize) -> Value {
    let prompt = format!(
        "Create a short, magical story for a 5-year-old child about {}. \
         The story must have exactly {} pages. Respond with ONLY a JSON array.",
        idea, page_count
    );

    json!({
        "contents": [{ "parts": [{ "text": prompt }] }],
        "generationConfig": {
            "responseMimeType": "application/json",
            "responseSchema": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "pageText": {
                            "type": "STRING",
                            "description": "The text for this page of the story. It should be a short, engaging paragraph suitable for a young child."
                        },
                        "imagePrompt": {
                            "type": "STRING",
                            "description": "A detailed, whimsical, and kid-friendly visual prompt for an illustration based on the text. Style: vibrant colors, gentle characters, storybook illustration."
                        }
                    },
                    "required": ["pageText", "imagePrompt"]
                }
            }
        }
    })
}

fn image_request(prompt: &str) -> Value {
    json!({
        "instances": [{ "prompt": prompt }],
        "parameters": {
            "sampleCount": 1,
            "outputMimeType": IMAGE_MIME_TYPE,
            "aspectRatio": "1:1"
        }
    })
}

fn speech_request(text: &str, voice: &str) -> Value {
    json!({
        "contents": [{
            "parts": [{ "text": format!("Say with a friendly and gentle voice: {}", text) }]
        }],
        "generationConfig": {
            "responseModalities": ["AUDIO"],
            "speechConfig": {
                "voiceConfig": {
                    "prebuiltVoiceConfig": { "voiceName": voice }
                }
            }
        }
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    text: Option<String>,
    inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    data: String,
}

#[derive(Debug, Deserialize)]
struct PredictResponse {
    #[serde(default)]
    predictions: Vec<Prediction>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Prediction {
    bytes_base64_encoded: Option<String>,
    mime_type: Option<String>,
}

impl GenerateContentResponse {
    fn first_part(&self) -> Option<&Part> {
        self.candidates.first()?.content.as_ref()?.parts.first()
    }

    /// Concatenated text of the first candidate
    fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|c| c.parts.iter().filter_map(|p| p.text.as_deref()).collect())
            .unwrap_or_default()
    }
}

fn parse_story(response: &GenerateContentResponse) -> NetworkResult<Vec<PageOutline>> {
    let text = response.text();
    let text = text.trim();
    if text.is_empty() {
        return Err(NetworkError::UnexpectedResponse(
            "Story response contained no text".to_string(),
        ));
    }

    let pages: Vec<PageOutline> = serde_json::from_str(text)?;
    if pages.is_empty() {
        return Err(NetworkError::UnexpectedResponse(
            "Generated story is not in the expected format".to_string(),
        ));
    }
    Ok(pages)
}

fn parse_image(response: &PredictResponse) -> NetworkResult<String> {
    let prediction = response
        .predictions
        .first()
        .ok_or_else(|| NetworkError::UnexpectedResponse("No image was generated".to_string()))?;

    let bytes = prediction
        .bytes_base64_encoded
        .as_deref()
        .filter(|b| !b.is_empty())
        .ok_or_else(|| NetworkError::UnexpectedResponse("Image prediction had no data".to_string()))?;

    let mime = prediction.mime_type.as_deref().unwrap_or(IMAGE_MIME_TYPE);
    Ok(format!("data:{};base64,{}", mime, bytes))
}

fn parse_speech(response: &GenerateContentResponse) -> NetworkResult<String> {
    response
        .first_part()
        .and_then(|p| p.inline_data.as_ref())
        .map(|d| d.data.clone())
        .filter(|d| !d.is_empty())
        .ok_or_else(|| NetworkError::UnexpectedResponse("No audio data was generated".to_string()))
}
