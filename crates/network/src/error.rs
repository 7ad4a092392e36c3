// crates/network/src/error.rs
//! Error types for network operations

use storybook_core::{Collaborator, StoryError};
use thiserror::Error;

/// Result type for network operations
pub type NetworkResult<T> = Result<T, NetworkError>;

/// Errors that can occur during network operations
#[derive(Debug, Error)]
pub enum NetworkError {
    /// Transport failure, including timeouts
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// Response body was not the JSON we expected
    #[error("Invalid response body: {0}")]
    Json(#[from] serde_json::Error),

    /// Response parsed but did not contain the requested content
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    /// No API key was configured
    #[error("No API key configured")]
    MissingApiKey,
}

impl NetworkError {
    /// Returns true if the error is a client error (4xx)
    pub fn is_client_error(&self) -> bool {
        match self {
            NetworkError::Status { status, .. } => (400..500).contains(status),
            NetworkError::Http(e) => e.status().map(|s| s.is_client_error()).unwrap_or(false),
            _ => false,
        }
    }

    /// Returns true if the error is a server error (5xx)
    pub fn is_server_error(&self) -> bool {
        match self {
            NetworkError::Status { status, .. } => (500..600).contains(status),
            NetworkError::Http(e) => e.status().map(|s| s.is_server_error()).unwrap_or(false),
            _ => false,
        }
    }

    /// Wraps this error as a generation failure of `collaborator`
    pub fn into_generation(self, collaborator: Collaborator) -> StoryError {
        let message = format!("Failed to generate {} from API", collaborator);
        StoryError::generation_with_source(collaborator, message, self)
    }
}
