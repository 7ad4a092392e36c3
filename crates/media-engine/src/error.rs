// FILE: crates/media-engine/src/error.rs

use storybook_core::StoryError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Decode error: {0}")]
    DecodeError(String),

    #[error("Output error: {0}")]
    OutputError(String),

    #[error("Resample error: {0}")]
    ResampleError(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),
}

impl EngineError {
    /// True when the failure came from the audio payload rather than the device
    pub fn is_decode_error(&self) -> bool {
        matches!(self, EngineError::DecodeError(_))
    }
}

impl From<EngineError> for StoryError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::DecodeError(message) => StoryError::decode(message),
            other => StoryError::playback(other.to_string()),
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;
    use storybook_core::ErrorSeverity;

    #[test]
    fn test_error_display() {
        let err = EngineError::OutputError("no device".to_string());
        assert!(err.to_string().contains("no device"));
    }

    #[test]
    fn test_decode_error_maps_to_decode() {
        let err: StoryError = EngineError::DecodeError("bad base64".to_string()).into();
        assert!(matches!(err, StoryError::Decode { .. }));
        assert_eq!(err.severity(), ErrorSeverity::Degraded);
    }

    #[test]
    fn test_device_errors_map_to_playback() {
        let err: StoryError = EngineError::OutputError("stream died".to_string()).into();
        assert!(matches!(err, StoryError::Playback { .. }));

        let err: StoryError = EngineError::ResampleError("ratio".to_string()).into();
        assert!(matches!(err, StoryError::Playback { .. }));
    }
}
