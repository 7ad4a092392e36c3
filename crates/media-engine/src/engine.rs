//! Playback engine: one narration at a time

use crate::codec::{decode_base64_pcm, AudioBuffer};
use crate::device::{DeviceProvider, DeviceState, OutputDevice, SourceHandle};
use crate::error::{EngineError, EngineResult};
use crate::playback::Completion;
use crate::state::PlaybackState;
use parking_lot::Mutex;
use std::sync::Arc;
use storybook_core::{SPEECH_CHANNELS, SPEECH_SAMPLE_RATE};
use tokio::sync::oneshot;

/// The live source and the sender that fulfils its completion
struct ActiveHandle {
    id: u64,
    /// None until `start_source` has returned
    source: Option<Box<dyn SourceHandle>>,
    done: oneshot::Sender<()>,
}

type HandleSlot = Arc<Mutex<Option<ActiveHandle>>>;

/// Plays decoded narration through a lazily acquired output device
///
/// At most one source is live. Starting a new playback is the only way prior
/// playback gets cancelled; the cancelled completion is abandoned.
pub struct PlaybackEngine {
    provider: Box<dyn DeviceProvider>,
    device: Option<Box<dyn OutputDevice>>,
    current: HandleSlot,
    next_handle: u64,
    sample_rate: u32,
    channels: u16,
}

impl PlaybackEngine {
    /// Creates an engine that decodes speech as 24 kHz mono
    pub fn new(provider: Box<dyn DeviceProvider>) -> Self {
        Self::with_format(provider, SPEECH_SAMPLE_RATE, SPEECH_CHANNELS)
    }

    /// Creates an engine with a custom format for `play_encoded`
    pub fn with_format(provider: Box<dyn DeviceProvider>, sample_rate: u32, channels: u16) -> Self {
        Self {
            provider,
            device: None,
            current: Arc::new(Mutex::new(None)),
            next_handle: 0,
            sample_rate,
            channels,
        }
    }

    pub fn state(&self) -> PlaybackState {
        if self.current.lock().is_some() {
            PlaybackState::Playing
        } else {
            PlaybackState::Idle
        }
    }

    /// Decodes base64 PCM in the engine's format and plays it
    pub fn play_encoded(&mut self, encoded: &str) -> EngineResult<Completion> {
        let buffer = decode_base64_pcm(encoded, self.sample_rate, self.channels)?;
        self.play(buffer)
    }

    /// Plays `buffer` from the start, interrupting anything already playing
    pub fn play(&mut self, buffer: AudioBuffer) -> EngineResult<Completion> {
        self.interrupt();

        let device = Self::acquire(self.provider.as_ref(), &mut self.device)?;

        self.next_handle += 1;
        let id = self.next_handle;
        let (done, rx) = oneshot::channel();

        // Registered before the source starts so an immediate end still finds it.
        *self.current.lock() = Some(ActiveHandle {
            id,
            source: None,
            done,
        });

        let slot = Arc::clone(&self.current);
        let frames = buffer.frame_count();
        match device.start_source(buffer, Box::new(move || finish(&slot, id))) {
            Ok(source) => {
                let leftover = {
                    let mut current = self.current.lock();
                    match current.as_mut() {
                        Some(handle) if handle.id == id => {
                            handle.source = Some(source);
                            None
                        }
                        _ => Some(source),
                    }
                };
                drop(leftover);
            }
            Err(e) => {
                let failed = take_if_current(&self.current, id);
                drop(failed);
                return Err(e);
            }
        }

        log::debug!("Started playback {} ({} frames)", id, frames);
        Ok(Completion::new(rx))
    }

    /// Stops playback and suspends the device; a no-op when idle
    pub fn stop(&mut self) {
        if !self.interrupt() {
            return;
        }

        if let Some(device) = self.device.as_mut() {
            if device.state() == DeviceState::Running {
                if let Err(e) = device.suspend() {
                    log::warn!("Failed to suspend output device: {}", e);
                }
            }
        }
    }

    /// Stops playback and releases the output device
    ///
    /// The next `play` opens a fresh device.
    pub fn shutdown(&mut self) {
        self.interrupt();
        if let Some(mut device) = self.device.take() {
            device.close();
            log::info!("Closed audio output");
        }
    }

    /// Drops the current handle, abandoning its completion
    fn interrupt(&mut self) -> bool {
        let previous = self.current.lock().take();
        match previous {
            Some(mut handle) => {
                if let Some(mut source) = handle.source.take() {
                    source.stop();
                }
                log::debug!("Interrupted playback {}", handle.id);
                true
            }
            None => false,
        }
    }

    /// Returns a running device, reusing, resuming or reopening as needed
    fn acquire<'a>(
        provider: &dyn DeviceProvider,
        slot: &'a mut Option<Box<dyn OutputDevice>>,
    ) -> EngineResult<&'a mut Box<dyn OutputDevice>> {
        let reusable = match slot.as_mut() {
            None => false,
            Some(device) => match device.state() {
                DeviceState::Running => true,
                DeviceState::Suspended => match device.resume() {
                    Ok(()) => true,
                    Err(e) => {
                        log::warn!("Failed to resume output device, reopening: {}", e);
                        false
                    }
                },
                DeviceState::Closed => {
                    log::info!("Output device was closed, reopening");
                    false
                }
            },
        };

        if !reusable {
            if let Some(mut stale) = slot.take() {
                stale.close();
            }

            let mut device = provider.open()?;
            if device.state() == DeviceState::Suspended {
                if let Err(e) = device.resume() {
                    device.close();
                    return Err(e);
                }
            }
            *slot = Some(device);
        }

        slot.as_mut()
            .ok_or_else(|| EngineError::InvalidState("No output device".to_string()))
    }
}

impl Drop for PlaybackEngine {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Natural-end handler; ignores ends of handles that are no longer current
fn finish(slot: &HandleSlot, id: u64) {
    if let Some(handle) = take_if_current(slot, id) {
        let _ = handle.done.send(());
        log::debug!("Playback {} finished", id);
    }
}

fn take_if_current(slot: &HandleSlot, id: u64) -> Option<ActiveHandle> {
    let mut current = slot.lock();
    if current.as_ref().map(|h| h.id) == Some(id) {
        current.take()
    } else {
        None
    }
}
