// crates/media-engine/src/resampler.rs
// Sample rate conversion for whole narration buffers

use crate::codec::AudioBuffer;
use crate::error::{EngineError, EngineResult};
use rubato::{FastFixedIn, PolynomialDegree, Resampler};

/// Converts `buffer` to `target_rate`, keeping its channel layout
///
/// Narration clips are short, so the whole clip is processed as one chunk and
/// the resampler is flushed afterwards. The filter delay is trimmed so the
/// output starts at the same instant as the input.
pub fn resample(buffer: &AudioBuffer, target_rate: u32) -> EngineResult<AudioBuffer> {
    if target_rate == 0 {
        return Err(EngineError::ResampleError(
            "Target sample rate must be greater than zero".to_string(),
        ));
    }
    if buffer.sample_rate() == target_rate || buffer.is_empty() {
        return AudioBuffer::new(target_rate, buffer.channels().to_vec());
    }

    let ratio = target_rate as f64 / buffer.sample_rate() as f64;
    let input_frames = buffer.frame_count();
    let channels = buffer.channel_count() as usize;

    let mut resampler = FastFixedIn::<f32>::new(
        ratio,
        1.0,
        PolynomialDegree::Septic,
        input_frames,
        channels,
    )
    .map_err(|e| EngineError::ResampleError(format!("Failed to create resampler: {}", e)))?;

    let mut output = resampler
        .process(buffer.channels(), None)
        .map_err(|e| EngineError::ResampleError(format!("Resampling failed: {}", e)))?;
    let tail = resampler
        .process_partial(None::<&[Vec<f32>]>, None)
        .map_err(|e| EngineError::ResampleError(format!("Resampler flush failed: {}", e)))?;

    let delay = resampler.output_delay();
    let expected = (input_frames as f64 * ratio).ceil() as usize;

    for (channel, rest) in output.iter_mut().zip(tail) {
        channel.extend(rest);
        let start = delay.min(channel.len());
        let end = (start + expected).min(channel.len());
        *channel = channel[start..end].to_vec();
    }

    log::debug!(
        "Resampled {} frames at {} Hz to {} frames at {} Hz",
        input_frames,
        buffer.sample_rate(),
        output.first().map(Vec::len).unwrap_or(0),
        target_rate
    );

    AudioBuffer::new(target_rate, output)
}
