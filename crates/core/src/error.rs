//! Error types for the storybook core
//!
//! Three failure families exist:
//! - **Generation**: a remote collaborator failed or returned an invalid shape
//! - **Decode**: an audio payload could not be turned into samples
//! - **Playback**: the output device is unavailable
//!
//! None of them is retried automatically. Generation failures are surfaced to
//! the user, who re-triggers the action; decode and playback failures only
//! cost the narration and are logged.

use std::fmt;
use thiserror::Error;

/// The remote collaborator a generation error came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collaborator {
    Story,
    Image,
    Speech,
}

impl fmt::Display for Collaborator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Story => write!(f, "story"),
            Self::Image => write!(f, "image"),
            Self::Speech => write!(f, "speech"),
        }
    }
}

/// What has to happen after an error for the user to make progress
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryAction {
    /// The user re-submits the idea or re-navigates to the page
    UserRetrigger,
    /// Keep showing the story without narration
    ContinueSilently,
}

impl fmt::Display for RecoveryAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UserRetrigger => write!(f, "Waiting for the user to try again"),
            Self::ContinueSilently => write!(f, "Continuing without narration"),
        }
    }
}

/// Error severity classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    /// The action can be re-triggered and may succeed
    Recoverable,
    /// A feature (narration) is lost but the story stays usable
    Degraded,
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Recoverable => write!(f, "Recoverable"),
            Self::Degraded => write!(f, "Degraded"),
        }
    }
}

/// Main error type for the storybook core
#[derive(Error, Debug)]
pub enum StoryError {
    /// A generation collaborator failed or returned an unusable result
    #[error("Failed to generate {collaborator}: {message}")]
    Generation {
        collaborator: Collaborator,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The audio payload is malformed
    #[error("Audio decode error: {message}")]
    Decode { message: String },

    /// The output device could not be opened or driven
    #[error("Playback device error: {message}")]
    Playback { message: String },
}

impl StoryError {
    /// Creates a generation error without an underlying cause
    pub fn generation(collaborator: Collaborator, message: impl Into<String>) -> Self {
        Self::Generation {
            collaborator,
            message: message.into(),
            source: None,
        }
    }

    /// Creates a generation error wrapping the underlying cause
    pub fn generation_with_source<E: std::error::Error + Send + Sync + 'static>(
        collaborator: Collaborator,
        message: impl Into<String>,
        source: E,
    ) -> Self {
        Self::Generation {
            collaborator,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    pub fn playback(message: impl Into<String>) -> Self {
        Self::Playback {
            message: message.into(),
        }
    }

    /// Returns the severity level of this error
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Generation { .. } => ErrorSeverity::Recoverable,
            Self::Decode { .. } | Self::Playback { .. } => ErrorSeverity::Degraded,
        }
    }

    /// Returns the recommended recovery action for this error
    pub fn recovery_action(&self) -> RecoveryAction {
        match self.severity() {
            ErrorSeverity::Recoverable => RecoveryAction::UserRetrigger,
            ErrorSeverity::Degraded => RecoveryAction::ContinueSilently,
        }
    }

    /// Returns the collaborator that failed, for generation errors
    pub fn collaborator(&self) -> Option<Collaborator> {
        match self {
            Self::Generation { collaborator, .. } => Some(*collaborator),
            _ => None,
        }
    }

    /// Returns a user-friendly error message suitable for display
    pub fn user_message(&self) -> String {
        match self {
            Self::Generation {
                collaborator: Collaborator::Story,
                ..
            } => "We couldn't dream up that story. Please try another idea.".to_string(),
            Self::Generation {
                collaborator: Collaborator::Image,
                ..
            } => "We couldn't paint this page's picture.".to_string(),
            Self::Generation {
                collaborator: Collaborator::Speech,
                ..
            } => "We couldn't find a voice for this page.".to_string(),
            Self::Decode { .. } => "This page's narration could not be read.".to_string(),
            Self::Playback { .. } => {
                "Cannot access audio playback. Please check your sound settings.".to_string()
            }
        }
    }
}

/// Convenience type alias for Results using StoryError
pub type StoryResult<T> = std::result::Result<T, StoryError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;
    use std::io;

    #[test]
    fn test_generation_error_display() {
        let err = StoryError::generation(Collaborator::Image, "no image was generated");
        let display = err.to_string();
        assert!(display.contains("image"));
        assert!(display.contains("no image was generated"));
    }

    #[test]
    fn test_generation_error_is_recoverable() {
        let err = StoryError::generation(Collaborator::Story, "empty result");
        assert_eq!(err.severity(), ErrorSeverity::Recoverable);
        assert_eq!(err.recovery_action(), RecoveryAction::UserRetrigger);
        assert_eq!(err.collaborator(), Some(Collaborator::Story));
    }

    #[test]
    fn test_audio_errors_are_degraded() {
        let decode = StoryError::decode("invalid base64");
        let playback = StoryError::playback("no output device");

        assert_eq!(decode.severity(), ErrorSeverity::Degraded);
        assert_eq!(playback.recovery_action(), RecoveryAction::ContinueSilently);
        assert_eq!(decode.collaborator(), None);
    }

    #[test]
    fn test_error_source_chain() {
        let inner = io::Error::new(io::ErrorKind::Other, "connection reset");
        let outer =
            StoryError::generation_with_source(Collaborator::Speech, "request failed", inner);
        assert!(outer.source().is_some());
    }

    #[test]
    fn test_user_messages_are_not_empty() {
        let errors = [
            StoryError::generation(Collaborator::Story, "x"),
            StoryError::generation(Collaborator::Image, "x"),
            StoryError::generation(Collaborator::Speech, "x"),
            StoryError::decode("x"),
            StoryError::playback("x"),
        ];
        for err in &errors {
            assert!(!err.user_message().is_empty());
        }
    }

    #[test]
    fn test_severity_ordering() {
        assert!(ErrorSeverity::Recoverable < ErrorSeverity::Degraded);
    }
}
