// crates/media-engine/src/output.rs
// cpal output backend driven from a dedicated thread

use crate::audio_device::AudioDeviceManager;
use crate::codec::AudioBuffer;
use crate::device::{DeviceProvider, DeviceState, EndedCallback, OutputDevice, SourceHandle};
use crate::error::{EngineError, EngineResult};
use crate::resampler;
use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::{Device, FromSample, Sample, SampleFormat, SizedSample, Stream, StreamConfig};
use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use parking_lot::Mutex;
use std::sync::Arc;
use std::thread;

/// Audio output configuration
#[derive(Debug, Clone, Default)]
pub struct AudioOutputConfig {
    /// Device to open by name; the host default when None
    pub device_name: Option<String>,
    pub buffer_size: Option<u32>,
}

/// Native format of an opened device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceFormat {
    pub sample_rate: u32,
    pub channels: u16,
}

/// Opens cpal output devices
#[derive(Debug, Clone, Default)]
pub struct CpalProvider {
    config: AudioOutputConfig,
}

impl CpalProvider {
    pub fn new(config: AudioOutputConfig) -> Self {
        Self { config }
    }
}

impl DeviceProvider for CpalProvider {
    fn open(&self) -> EngineResult<Box<dyn OutputDevice>> {
        Ok(Box::new(CpalDevice::open(&self.config)?))
    }
}

/// Samples being rendered, already at the device's rate and channel count
struct Voice {
    id: u64,
    samples: Vec<f32>,
    position: usize,
    on_ended: Option<EndedCallback>,
}

type VoiceSlot = Arc<Mutex<Option<Voice>>>;

enum OutputCommand {
    Suspend(Sender<EngineResult<()>>),
    Resume(Sender<EngineResult<()>>),
    Close,
}

/// An open cpal stream
///
/// `cpal::Stream` is not `Send`, so the stream lives on its own thread and is
/// controlled through a command channel. The audio callback reads the single
/// voice slot shared with this handle.
pub struct CpalDevice {
    format: DeviceFormat,
    state: Arc<Mutex<DeviceState>>,
    voice: VoiceSlot,
    commands: Sender<OutputCommand>,
    thread: Option<thread::JoinHandle<()>>,
    next_voice: u64,
}

impl CpalDevice {
    pub fn open(config: &AudioOutputConfig) -> EngineResult<Self> {
        let voice: VoiceSlot = Arc::new(Mutex::new(None));
        let state = Arc::new(Mutex::new(DeviceState::Suspended));
        let (ready_tx, ready_rx) = bounded(1);
        let (command_tx, command_rx) = unbounded();

        let thread_config = config.clone();
        let thread_voice = Arc::clone(&voice);
        let thread_state = Arc::clone(&state);

        let handle = thread::Builder::new()
            .name("storybook-audio-output".to_string())
            .spawn(move || {
                output_thread(thread_config, thread_voice, thread_state, ready_tx, command_rx)
            })
            .map_err(|e| EngineError::OutputError(format!("Failed to spawn output thread: {}", e)))?;

        let format = match ready_rx.recv() {
            Ok(Ok(format)) => format,
            Ok(Err(e)) => {
                let _ = handle.join();
                return Err(e);
            }
            Err(_) => {
                let _ = handle.join();
                return Err(EngineError::OutputError(
                    "Output thread exited during setup".to_string(),
                ));
            }
        };

        log::info!(
            "Opened audio output at {} Hz, {} channel(s)",
            format.sample_rate,
            format.channels
        );

        Ok(Self {
            format,
            state,
            voice,
            commands: command_tx,
            thread: Some(handle),
            next_voice: 0,
        })
    }

    pub fn format(&self) -> DeviceFormat {
        self.format
    }

    fn request(&self, command: impl FnOnce(Sender<EngineResult<()>>) -> OutputCommand) -> EngineResult<()> {
        let (reply_tx, reply_rx) = bounded(1);
        self.commands
            .send(command(reply_tx))
            .map_err(|_| EngineError::InvalidState("Output thread is not running".to_string()))?;
        reply_rx
            .recv()
            .map_err(|_| EngineError::InvalidState("Output thread did not reply".to_string()))?
    }

    /// Converts a buffer to the device's rate and channel layout
    fn prepare(&self, buffer: &AudioBuffer) -> EngineResult<Vec<f32>> {
        let resampled = resampler::resample(buffer, self.format.sample_rate)?;
        Ok(resampled.remix(self.format.channels).interleaved())
    }
}

impl OutputDevice for CpalDevice {
    fn state(&self) -> DeviceState {
        *self.state.lock()
    }

    fn suspend(&mut self) -> EngineResult<()> {
        if self.state() == DeviceState::Closed {
            return Err(EngineError::InvalidState("Device is closed".to_string()));
        }
        self.request(OutputCommand::Suspend)
    }

    fn resume(&mut self) -> EngineResult<()> {
        if self.state() == DeviceState::Closed {
            return Err(EngineError::InvalidState("Device is closed".to_string()));
        }
        self.request(OutputCommand::Resume)
    }

    fn start_source(
        &mut self,
        buffer: AudioBuffer,
        on_ended: EndedCallback,
    ) -> EngineResult<Box<dyn SourceHandle>> {
        if self.state() == DeviceState::Closed {
            return Err(EngineError::InvalidState("Device is closed".to_string()));
        }

        let samples = self.prepare(&buffer)?;
        self.next_voice += 1;
        let id = self.next_voice;

        let previous = self.voice.lock().replace(Voice {
            id,
            samples,
            position: 0,
            on_ended: Some(on_ended),
        });
        drop(previous);

        Ok(Box::new(CpalSource {
            id,
            voice: Arc::clone(&self.voice),
        }))
    }

    fn close(&mut self) {
        let _ = self.commands.send(OutputCommand::Close);
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }
        let orphan = self.voice.lock().take();
        drop(orphan);
        *self.state.lock() = DeviceState::Closed;
    }
}

impl Drop for CpalDevice {
    fn drop(&mut self) {
        self.close();
    }
}

struct CpalSource {
    id: u64,
    voice: VoiceSlot,
}

impl SourceHandle for CpalSource {
    fn stop(&mut self) {
        let removed = {
            let mut slot = self.voice.lock();
            if slot.as_ref().map(|v| v.id) == Some(self.id) {
                slot.take()
            } else {
                None
            }
        };
        drop(removed);
    }
}

fn output_thread(
    config: AudioOutputConfig,
    voice: VoiceSlot,
    state: Arc<Mutex<DeviceState>>,
    ready: Sender<EngineResult<DeviceFormat>>,
    commands: Receiver<OutputCommand>,
) {
    let (stream, format) = match build_stream(&config, voice, Arc::clone(&state)) {
        Ok(built) => built,
        Err(e) => {
            let _ = ready.send(Err(e));
            return;
        }
    };

    match stream.play() {
        Ok(()) => *state.lock() = DeviceState::Running,
        Err(e) => log::warn!("Output stream opened suspended: {}", e),
    }

    if ready.send(Ok(format)).is_err() {
        return;
    }

    for command in commands.iter() {
        match command {
            OutputCommand::Suspend(reply) => {
                let result = stream
                    .pause()
                    .map_err(|e| EngineError::OutputError(format!("Failed to pause stream: {}", e)));
                if result.is_ok() {
                    *state.lock() = DeviceState::Suspended;
                }
                let _ = reply.send(result);
            }
            OutputCommand::Resume(reply) => {
                let result = stream
                    .play()
                    .map_err(|e| EngineError::OutputError(format!("Failed to resume stream: {}", e)));
                if result.is_ok() {
                    *state.lock() = DeviceState::Running;
                }
                let _ = reply.send(result);
            }
            OutputCommand::Close => break,
        }
    }

    drop(stream);
    *state.lock() = DeviceState::Closed;
    log::debug!("Audio output thread finished");
}

fn build_stream(
    config: &AudioOutputConfig,
    voice: VoiceSlot,
    state: Arc<Mutex<DeviceState>>,
) -> EngineResult<(Stream, DeviceFormat)> {
    let device = AudioDeviceManager::new().find_device(config.device_name.as_deref())?;
    let supported = device
        .default_output_config()
        .map_err(|e| EngineError::OutputError(format!("Failed to get device config: {}", e)))?;

    let sample_format = supported.sample_format();
    let mut stream_config: StreamConfig = supported.config();
    if let Some(size) = config.buffer_size {
        stream_config.buffer_size = cpal::BufferSize::Fixed(size);
    }

    let format = DeviceFormat {
        sample_rate: stream_config.sample_rate.0,
        channels: stream_config.channels,
    };

    let stream = match sample_format {
        SampleFormat::F32 => build::<f32>(&device, &stream_config, voice, state)?,
        SampleFormat::I16 => build::<i16>(&device, &stream_config, voice, state)?,
        SampleFormat::U16 => build::<u16>(&device, &stream_config, voice, state)?,
        other => {
            return Err(EngineError::OutputError(format!(
                "Unsupported sample format: {:?}",
                other
            )))
        }
    };

    Ok((stream, format))
}

fn build<T>(
    device: &Device,
    config: &StreamConfig,
    voice: VoiceSlot,
    state: Arc<Mutex<DeviceState>>,
) -> EngineResult<Stream>
where
    T: SizedSample + FromSample<f32>,
{
    device
        .build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                // Runs after the slot lock is released.
                if let Some(on_ended) = fill_output(data, &voice) {
                    on_ended();
                }
            },
            move |err| {
                log::error!("Audio output stream error: {}", err);
                *state.lock() = DeviceState::Closed;
            },
            None,
        )
        .map_err(|e| EngineError::OutputError(format!("Failed to build stream: {}", e)))
}

/// Copies the next samples of the active voice into `data`
///
/// Returns the voice's ended callback once its last sample has been written.
fn fill_output<T>(data: &mut [T], voice: &VoiceSlot) -> Option<EndedCallback>
where
    T: Sample + FromSample<f32>,
{
    let mut slot = voice.lock();
    let mut written = 0;

    let finished = match slot.as_mut() {
        Some(active) => {
            let remaining = &active.samples[active.position..];
            written = remaining.len().min(data.len());
            for (out, &sample) in data[..written].iter_mut().zip(remaining) {
                *out = T::from_sample(sample);
            }
            active.position += written;
            active.position >= active.samples.len()
        }
        None => false,
    };

    for out in &mut data[written..] {
        *out = T::EQUILIBRIUM;
    }

    if finished {
        slot.take().and_then(|v| v.on_ended)
    } else {
        None
    }
}
