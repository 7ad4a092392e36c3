//! Media Engine - narration decoding and playback for the storybook
//!
//! - `codec`: base64 16-bit PCM to planar float buffers
//! - `engine`: the single-source playback engine
//! - `device`: the output device seam, with a cpal implementation in `output`

mod audio_device;
mod codec;
mod device;
mod engine;
mod error;
mod output;
mod playback;
mod resampler;
mod state;

pub use audio_device::{AudioDeviceInfo, AudioDeviceManager};
pub use codec::{decode_base64_pcm, AudioBuffer};
pub use device::{DeviceProvider, DeviceState, EndedCallback, OutputDevice, SourceHandle};
pub use engine::PlaybackEngine;
pub use error::{EngineError, EngineResult};
pub use output::{AudioOutputConfig, CpalDevice, CpalProvider, DeviceFormat};
pub use playback::Completion;
pub use resampler::resample;
pub use state::{CompletionStatus, PlaybackState};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_error_converts_to_story_error() {
        let err = decode_base64_pcm("%%%", 24_000, 1).unwrap_err();
        let story: storybook_core::StoryError = err.into();
        assert_eq!(
            story.severity(),
            storybook_core::ErrorSeverity::Degraded
        );
    }
}
