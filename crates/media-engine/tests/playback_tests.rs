//! Playback engine behaviour against a scripted output device
//!
//! The fake device records every call and holds the ended callbacks of the
//! sources it was given, so tests decide when a source "reaches its end".

use media_engine::{
    AudioBuffer, CompletionStatus, DeviceProvider, DeviceState, EndedCallback, EngineError,
    EngineResult, OutputDevice, PlaybackEngine, PlaybackState, SourceHandle,
};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

#[derive(Default)]
struct Recorder {
    opened: usize,
    closed: usize,
    resumed: usize,
    suspended: usize,
    stopped: usize,
    state: Option<DeviceState>,
    /// Ended callbacks by source index; None once stopped or ended
    callbacks: Vec<Option<EndedCallback>>,
    open_suspended: bool,
    fail_open: bool,
    fail_resume: bool,
    end_immediately: bool,
    /// Leave callbacks in place on stop, to deliver stale ends
    keep_callbacks_on_stop: bool,
}

#[derive(Clone, Default)]
struct FakeOutput(Arc<Mutex<Recorder>>);

impl FakeOutput {
    fn engine(&self) -> PlaybackEngine {
        PlaybackEngine::new(Box::new(self.clone()))
    }

    fn with<R>(&self, f: impl FnOnce(&mut Recorder) -> R) -> R {
        f(&mut self.0.lock())
    }

    /// Delivers the natural end of the `index`-th started source
    fn end(&self, index: usize) -> bool {
        let callback = self.with(|r| r.callbacks.get_mut(index).and_then(Option::take));
        match callback {
            Some(callback) => {
                callback();
                true
            }
            None => false,
        }
    }

    fn set_state(&self, state: DeviceState) {
        self.with(|r| r.state = Some(state));
    }
}

impl DeviceProvider for FakeOutput {
    fn open(&self) -> EngineResult<Box<dyn OutputDevice>> {
        let mut r = self.0.lock();
        if r.fail_open {
            return Err(EngineError::OutputError("no output device".to_string()));
        }
        r.opened += 1;
        r.state = Some(if r.open_suspended {
            DeviceState::Suspended
        } else {
            DeviceState::Running
        });
        Ok(Box::new(FakeDevice(self.clone())))
    }
}

struct FakeDevice(FakeOutput);

impl OutputDevice for FakeDevice {
    fn state(&self) -> DeviceState {
        self.0.with(|r| r.state.unwrap_or(DeviceState::Closed))
    }

    fn suspend(&mut self) -> EngineResult<()> {
        self.0.with(|r| {
            r.suspended += 1;
            r.state = Some(DeviceState::Suspended);
        });
        Ok(())
    }

    fn resume(&mut self) -> EngineResult<()> {
        self.0.with(|r| {
            if r.fail_resume {
                return Err(EngineError::OutputError("resume refused".to_string()));
            }
            r.resumed += 1;
            r.state = Some(DeviceState::Running);
            Ok(())
        })
    }

    fn start_source(
        &mut self,
        _buffer: AudioBuffer,
        on_ended: EndedCallback,
    ) -> EngineResult<Box<dyn SourceHandle>> {
        let (index, immediate) = self.0.with(|r| {
            r.callbacks.push(None);
            (r.callbacks.len() - 1, r.end_immediately)
        });

        if immediate {
            on_ended();
        } else {
            self.0.with(|r| r.callbacks[index] = Some(on_ended));
        }

        Ok(Box::new(FakeSource {
            output: self.0.clone(),
            index,
        }))
    }

    fn close(&mut self) {
        self.0.with(|r| {
            r.closed += 1;
            r.state = Some(DeviceState::Closed);
        });
    }
}

struct FakeSource {
    output: FakeOutput,
    index: usize,
}

impl SourceHandle for FakeSource {
    fn stop(&mut self) {
        let dropped = self.output.with(|r| {
            r.stopped += 1;
            if r.keep_callbacks_on_stop {
                None
            } else {
                r.callbacks[self.index].take()
            }
        });
        drop(dropped);
    }
}

fn clip(frames: usize) -> AudioBuffer {
    AudioBuffer::new(24_000, vec![vec![0.1; frames]]).expect("valid buffer")
}

#[test]
fn test_stop_when_idle_is_noop() {
    let output = FakeOutput::default();
    let mut engine = output.engine();

    engine.stop();

    assert_eq!(engine.state(), PlaybackState::Idle);
    output.with(|r| {
        assert_eq!(r.opened, 0);
        assert_eq!(r.suspended, 0);
    });
}

#[tokio::test]
async fn test_natural_end_resolves_completion() {
    let output = FakeOutput::default();
    let mut engine = output.engine();

    let completion = engine.play(clip(240)).expect("playback started");
    assert_eq!(engine.state(), PlaybackState::Playing);

    assert!(output.end(0));
    tokio::time::timeout(Duration::from_secs(1), completion)
        .await
        .expect("completion resolved");
    assert_eq!(engine.state(), PlaybackState::Idle);
}

#[tokio::test]
async fn test_new_playback_abandons_previous() {
    let output = FakeOutput::default();
    let mut engine = output.engine();

    let mut first = engine.play(clip(240)).expect("first started");
    let second = engine.play(clip(240)).expect("second started");

    assert_eq!(first.status(), CompletionStatus::Abandoned);
    output.with(|r| assert_eq!(r.stopped, 1));

    // The first source was stopped, so its end never arrives.
    assert!(!output.end(0));
    assert!(output.end(1));
    tokio::time::timeout(Duration::from_secs(1), second)
        .await
        .expect("second completion resolved");

    let waited = tokio::time::timeout(Duration::from_millis(20), first).await;
    assert!(waited.is_err(), "abandoned completion must never resolve");
}

#[test]
fn test_stale_end_does_not_clear_current_playback() {
    let output = FakeOutput::default();
    output.with(|r| r.keep_callbacks_on_stop = true);
    let mut engine = output.engine();

    let _first = engine.play(clip(240)).expect("first started");
    let mut second = engine.play(clip(240)).expect("second started");

    assert!(output.end(0));

    assert_eq!(engine.state(), PlaybackState::Playing);
    assert_eq!(second.status(), CompletionStatus::Pending);

    assert!(output.end(1));
    assert_eq!(second.status(), CompletionStatus::Finished);
    assert_eq!(engine.state(), PlaybackState::Idle);
}

#[test]
fn test_stop_abandons_and_suspends() {
    let output = FakeOutput::default();
    let mut engine = output.engine();

    let mut completion = engine.play(clip(240)).expect("playback started");
    engine.stop();

    assert_eq!(engine.state(), PlaybackState::Idle);
    assert_eq!(completion.status(), CompletionStatus::Abandoned);
    output.with(|r| {
        assert_eq!(r.stopped, 1);
        assert_eq!(r.suspended, 1);
        assert_eq!(r.state, Some(DeviceState::Suspended));
    });
}

#[test]
fn test_device_reused_and_resumed() {
    let output = FakeOutput::default();
    let mut engine = output.engine();

    let _ = engine.play(clip(10)).expect("first started");
    engine.stop();
    let _ = engine.play(clip(10)).expect("second started");

    output.with(|r| {
        assert_eq!(r.opened, 1);
        assert_eq!(r.resumed, 1);
        assert_eq!(r.state, Some(DeviceState::Running));
    });
}

#[test]
fn test_closed_device_is_reopened() {
    let output = FakeOutput::default();
    let mut engine = output.engine();

    let _ = engine.play(clip(10)).expect("first started");
    output.set_state(DeviceState::Closed);
    let _ = engine.play(clip(10)).expect("second started");

    output.with(|r| assert_eq!(r.opened, 2));
    assert_eq!(engine.state(), PlaybackState::Playing);
}

#[test]
fn test_failed_resume_reopens_device() {
    let output = FakeOutput::default();
    let mut engine = output.engine();

    let _ = engine.play(clip(10)).expect("first started");
    engine.stop();
    output.with(|r| r.fail_resume = true);
    output.with(|r| r.open_suspended = false);
    let _ = engine.play(clip(10)).expect("second started");

    output.with(|r| {
        assert_eq!(r.opened, 2);
        assert_eq!(r.closed, 1);
    });
}

#[test]
fn test_suspended_device_resumed_on_open() {
    let output = FakeOutput::default();
    output.with(|r| r.open_suspended = true);
    let mut engine = output.engine();

    let _ = engine.play(clip(10)).expect("playback started");

    output.with(|r| {
        assert_eq!(r.resumed, 1);
        assert_eq!(r.state, Some(DeviceState::Running));
    });
}

#[test]
fn test_open_failure_leaves_engine_idle() {
    let output = FakeOutput::default();
    output.with(|r| r.fail_open = true);
    let mut engine = output.engine();

    let result = engine.play(clip(10));
    assert!(matches!(result, Err(EngineError::OutputError(_))));
    assert_eq!(engine.state(), PlaybackState::Idle);

    output.with(|r| r.fail_open = false);
    assert!(engine.play(clip(10)).is_ok());
    assert_eq!(engine.state(), PlaybackState::Playing);
}

#[test]
fn test_immediate_end_is_not_lost() {
    let output = FakeOutput::default();
    output.with(|r| r.end_immediately = true);
    let mut engine = output.engine();

    let mut completion = engine.play(clip(0)).expect("playback started");

    assert_eq!(completion.status(), CompletionStatus::Finished);
    assert_eq!(engine.state(), PlaybackState::Idle);
}

#[test]
fn test_malformed_payload_never_touches_device() {
    let output = FakeOutput::default();
    let mut engine = output.engine();

    let result = engine.play_encoded("definitely not base64!");

    assert!(matches!(result, Err(EngineError::DecodeError(_))));
    assert_eq!(engine.state(), PlaybackState::Idle);
    output.with(|r| assert_eq!(r.opened, 0));
}

#[test]
fn test_play_encoded_decodes_speech_format() {
    let output = FakeOutput::default();
    let mut engine = output.engine();

    // Four bytes of silence: two mono frames.
    let result = engine.play_encoded("AAAAAA==");

    assert!(result.is_ok());
    assert_eq!(engine.state(), PlaybackState::Playing);
}

#[test]
fn test_shutdown_closes_device() {
    let output = FakeOutput::default();
    let mut engine = output.engine();

    let mut completion = engine.play(clip(10)).expect("playback started");
    engine.shutdown();

    assert_eq!(completion.status(), CompletionStatus::Abandoned);
    output.with(|r| assert_eq!(r.closed, 1));

    let _ = engine.play(clip(10)).expect("playback after shutdown");
    output.with(|r| assert_eq!(r.opened, 2));
}

#[test]
fn test_drop_releases_device() {
    let output = FakeOutput::default();
    {
        let mut engine = output.engine();
        let _ = engine.play(clip(10)).expect("playback started");
    }
    output.with(|r| assert_eq!(r.closed, 1));
}
