//! Audio output configuration section

use crate::validation::{ConfigSection, ValidationError, Validator};
use serde::{Deserialize, Serialize};

/// Narration PCM format and the device it is played on
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AudioConfig {
    /// Sample rate narration audio is decoded at, in Hz
    pub sample_rate: u32,

    /// Channel count narration audio is decoded with
    pub channels: u16,

    /// Output device name; the system default when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_device: Option<String>,

    /// Frames per output callback; the device default when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buffer_size: Option<u32>,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: 24_000,
            channels: 1,
            output_device: None,
            buffer_size: None,
        }
    }
}

impl ConfigSection for AudioConfig {
    fn validate(&self) -> Result<(), Vec<ValidationError>> {
        Validator::collect_errors(vec![
            Validator::in_range(self.sample_rate, 8_000, 192_000, "audio.sample_rate"),
            Validator::in_range(self.channels, 1, 8, "audio.channels"),
            Validator::not_blank_if_set(self.output_device.as_deref(), "audio.output_device"),
            match self.buffer_size {
                Some(frames) => Validator::in_range(frames, 64, 8_192, "audio.buffer_size"),
                None => Ok(()),
            },
        ])
    }

    fn merge(&mut self, other: Self) {
        self.sample_rate = other.sample_rate;
        self.channels = other.channels;
        if other.output_device.is_some() {
            self.output_device = other.output_device;
        }
        if other.buffer_size.is_some() {
            self.buffer_size = other.buffer_size;
        }
    }

    fn section_name(&self) -> &'static str {
        "audio"
    }
}
