pub mod error;
pub mod generation;
pub mod types;

// Re-export commonly used types
pub use error::{Collaborator, ErrorSeverity, RecoveryAction, StoryError, StoryResult};
pub use generation::{validate_outlines, ImageGenerator, SpeechGenerator, StoryGenerator};
pub use types::{AssetKind, PageOutline, StoryPage};

/// Number of pages a story is generated with
pub const DEFAULT_PAGE_COUNT: usize = 5;

/// Sample rate of the raw PCM produced by the speech collaborator
pub const SPEECH_SAMPLE_RATE: u32 = 24_000;

/// Channel count of the raw PCM produced by the speech collaborator
pub const SPEECH_CHANNELS: u16 = 1;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_exports_accessible() {
        let page = StoryPage::new("Once upon a time", "a castle made of cake");
        assert!(page.missing_assets().contains(&AssetKind::Image));
        assert_eq!(DEFAULT_PAGE_COUNT, 5);
    }
}
