//! Output device abstraction
//!
//! The playback engine talks to audio hardware only through these traits so
//! that it can be driven by a real backend (`output::CpalProvider`) or by a
//! scripted device in tests.

use crate::codec::AudioBuffer;
use crate::error::EngineResult;

/// Invoked once when a source plays through to its natural end
pub type EndedCallback = Box<dyn FnOnce() + Send + 'static>;

/// Lifecycle of an opened output device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceState {
    Running,
    /// Opened but paused by the host or by us; can be resumed
    Suspended,
    /// Unusable; a fresh device must be opened
    Closed,
}

/// A buffer currently routed to the device
pub trait SourceHandle: Send {
    /// Stops the source without invoking its ended callback
    fn stop(&mut self);
}

/// An opened audio output
pub trait OutputDevice: Send {
    fn state(&self) -> DeviceState;

    /// Pauses a running device; the state becomes `Suspended`
    fn suspend(&mut self) -> EngineResult<()>;

    /// Moves a suspended device back to `Running`
    fn resume(&mut self) -> EngineResult<()>;

    /// Starts playing `buffer` from its first frame
    ///
    /// `on_ended` runs on the device's own thread after the last frame has
    /// been rendered, and never runs for a source that was stopped.
    fn start_source(
        &mut self,
        buffer: AudioBuffer,
        on_ended: EndedCallback,
    ) -> EngineResult<Box<dyn SourceHandle>>;

    /// Releases the device; its state becomes `Closed`
    fn close(&mut self);
}

/// Opens output devices on demand
pub trait DeviceProvider: Send {
    fn open(&self) -> EngineResult<Box<dyn OutputDevice>>;
}
