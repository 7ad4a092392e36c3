//! Collaborator failures surface as generation errors
//!
//! The client is pointed at a closed local port, so every call fails at the
//! transport layer without touching the network.

use std::error::Error;
use std::time::Duration;
use storybook_core::{
    Collaborator, ErrorSeverity, ImageGenerator, SpeechGenerator, StoryGenerator,
};
use storybook_network::{GeminiClient, GeminiConfig, NetworkError};

fn unreachable_client() -> GeminiClient {
    let mut config = GeminiConfig::new("test-key");
    config.api_base_url = "http://127.0.0.1:9/v1beta".to_string();
    config.timeout = Duration::from_secs(5);
    GeminiClient::new(config).expect("client built")
}

#[tokio::test]
async fn test_story_transport_failure_is_generation_error() {
    let err = unreachable_client()
        .generate_story("a dragon who bakes")
        .await
        .unwrap_err();

    assert_eq!(err.collaborator(), Some(Collaborator::Story));
    assert_eq!(err.severity(), ErrorSeverity::Recoverable);
    let source = err.source().expect("network cause kept");
    assert!(source.downcast_ref::<NetworkError>().is_some());
}

#[tokio::test]
async fn test_image_transport_failure_is_generation_error() {
    let err = unreachable_client()
        .generate_image("a castle made of cake")
        .await
        .unwrap_err();

    assert_eq!(err.collaborator(), Some(Collaborator::Image));
}

#[tokio::test]
async fn test_speech_transport_failure_is_generation_error() {
    let err = unreachable_client()
        .generate_speech("Once upon a time.")
        .await
        .unwrap_err();

    assert_eq!(err.collaborator(), Some(Collaborator::Speech));
}

#[test]
fn test_blank_key_is_rejected() {
    let result = GeminiClient::new(GeminiConfig::new(""));
    assert!(matches!(result, Err(NetworkError::MissingApiKey)));
}
