//! Raw PCM decoding
//!
//! Speech arrives as base64 text wrapping interleaved signed 16-bit
//! little-endian samples with no header. Decoding is pure: the same input
//! always yields the same buffer.

use crate::error::{EngineError, EngineResult};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use std::time::Duration;

/// Divisor that maps the i16 range onto [-1.0, 1.0)
const I16_SCALE: f32 = 32768.0;

/// Planar float audio at a fixed sample rate
///
/// Every channel holds the same number of frames.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    sample_rate: u32,
    channels: Vec<Vec<f32>>,
}

impl AudioBuffer {
    /// Creates a buffer from planar channel data
    pub fn new(sample_rate: u32, channels: Vec<Vec<f32>>) -> EngineResult<Self> {
        if sample_rate == 0 {
            return Err(EngineError::DecodeError(
                "Sample rate must be greater than zero".to_string(),
            ));
        }
        if channels.is_empty() {
            return Err(EngineError::DecodeError(
                "Audio must have at least one channel".to_string(),
            ));
        }
        let frames = channels[0].len();
        if channels.iter().any(|c| c.len() != frames) {
            return Err(EngineError::DecodeError(
                "All channels must have the same length".to_string(),
            ));
        }

        Ok(Self {
            sample_rate,
            channels,
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channel_count(&self) -> u16 {
        self.channels.len() as u16
    }

    pub fn frame_count(&self) -> usize {
        self.channels.first().map(Vec::len).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.frame_count() == 0
    }

    /// Playing time at the buffer's own sample rate
    pub fn duration(&self) -> Duration {
        Duration::from_secs_f64(self.frame_count() as f64 / self.sample_rate as f64)
    }

    pub fn channel(&self, index: usize) -> Option<&[f32]> {
        self.channels.get(index).map(Vec::as_slice)
    }

    pub fn channels(&self) -> &[Vec<f32>] {
        &self.channels
    }

    /// Interleaves the channels into a single frame-ordered sequence
    pub fn interleaved(&self) -> Vec<f32> {
        let frames = self.frame_count();
        let mut out = Vec::with_capacity(frames * self.channels.len());
        for frame in 0..frames {
            for channel in &self.channels {
                out.push(channel[frame]);
            }
        }
        out
    }

    /// Maps the buffer onto a different channel count
    ///
    /// Mono is copied to every output channel, anything mixed down to mono
    /// is averaged, and other layouts reuse the last source channel for
    /// output channels the source does not have.
    pub fn remix(&self, channels: u16) -> AudioBuffer {
        let target = channels.max(1) as usize;
        let source = self.channels.len();

        let mixed = if target == source {
            self.channels.clone()
        } else if source == 1 {
            vec![self.channels[0].clone(); target]
        } else if target == 1 {
            let frames = self.frame_count();
            let mono = (0..frames)
                .map(|i| self.channels.iter().map(|c| c[i]).sum::<f32>() / source as f32)
                .collect();
            vec![mono]
        } else {
            (0..target)
                .map(|i| self.channels[i.min(source - 1)].clone())
                .collect()
        };

        AudioBuffer {
            sample_rate: self.sample_rate,
            channels: mixed,
        }
    }
}

/// Decodes base64 text of interleaved 16-bit little-endian PCM
///
/// The result has `floor(bytes / 2 / channels)` frames: a trailing odd byte
/// and a trailing partial frame are dropped. Fails on malformed base64 or a
/// zero channel count or sample rate.
pub fn decode_base64_pcm(encoded: &str, sample_rate: u32, channels: u16) -> EngineResult<AudioBuffer> {
    if channels == 0 {
        return Err(EngineError::DecodeError(
            "Channel count must be greater than zero".to_string(),
        ));
    }

    let bytes = BASE64
        .decode(encoded.trim())
        .map_err(|e| EngineError::DecodeError(format!("Invalid base64 audio payload: {}", e)))?;

    let samples: Vec<i16> = bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
        .collect();

    AudioBuffer::new(sample_rate, deinterleave(&samples, channels as usize))
}

fn deinterleave(samples: &[i16], channels: usize) -> Vec<Vec<f32>> {
    let frames = samples.len() / channels;
    let mut planar = vec![Vec::with_capacity(frames); channels];

    for frame in samples.chunks_exact(channels) {
        for (channel, &sample) in planar.iter_mut().zip(frame) {
            channel.push(sample as f32 / I16_SCALE);
        }
    }

    planar
}
