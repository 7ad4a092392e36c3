//! Hand-written fakes shared by the session integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use media_engine::{
    AudioBuffer, DeviceProvider, DeviceState, EndedCallback, EngineResult, OutputDevice,
    PlaybackEngine, SourceHandle,
};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use storybook_core::{
    Collaborator, ImageGenerator, PageOutline, SpeechGenerator, StoryError, StoryGenerator,
    StoryResult,
};
use storybook_session::StoryController;
use tokio::sync::Notify;

/// Two frames of silence, as base64 16-bit PCM
pub const SILENCE: &str = "AAAAAA==";

/// Inputs seen, inputs to fail on, and an optional gate for the next call
#[derive(Default)]
pub struct Script {
    calls: Mutex<Vec<String>>,
    fail_on: Mutex<HashSet<String>>,
    fail_all: Mutex<bool>,
    gate: Mutex<Option<Arc<Notify>>>,
}

impl Script {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    pub fn fail_on(&self, input: &str) {
        self.fail_on.lock().insert(input.to_string());
    }

    pub fn fail_all(&self) {
        *self.fail_all.lock() = true;
    }

    /// Makes the next call wait until the returned gate is notified
    pub fn hold(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.gate.lock() = Some(Arc::clone(&gate));
        gate
    }

    async fn run(&self, input: &str, collaborator: Collaborator) -> StoryResult<()> {
        self.calls.lock().push(input.to_string());
        let gate = self.gate.lock().take();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        if *self.fail_all.lock() || self.fail_on.lock().contains(input) {
            return Err(StoryError::generation(collaborator, "scripted failure"));
        }
        Ok(())
    }
}

pub struct FakeStory {
    pub script: Script,
    pages: usize,
}

impl FakeStory {
    pub fn new(pages: usize) -> Self {
        Self {
            script: Script::default(),
            pages,
        }
    }
}

#[async_trait]
impl StoryGenerator for FakeStory {
    async fn generate_story(&self, idea: &str) -> StoryResult<Vec<PageOutline>> {
        self.script.run(idea, Collaborator::Story).await?;
        Ok((0..self.pages)
            .map(|i| PageOutline::new(page_text(i), image_prompt(i)))
            .collect())
    }
}

#[derive(Default)]
pub struct FakeImages {
    pub script: Script,
}

#[async_trait]
impl ImageGenerator for FakeImages {
    async fn generate_image(&self, prompt: &str) -> StoryResult<String> {
        self.script.run(prompt, Collaborator::Image).await?;
        Ok(image_url(prompt))
    }
}

pub struct FakeSpeech {
    pub script: Script,
    audio: String,
}

impl FakeSpeech {
    pub fn new() -> Self {
        Self::returning(SILENCE)
    }

    pub fn returning(audio: &str) -> Self {
        Self {
            script: Script::default(),
            audio: audio.to_string(),
        }
    }
}

#[async_trait]
impl SpeechGenerator for FakeSpeech {
    async fn generate_speech(&self, text: &str) -> StoryResult<String> {
        self.script.run(text, Collaborator::Speech).await?;
        Ok(self.audio.clone())
    }
}

pub fn page_text(index: usize) -> String {
    format!("Page {} of the story.", index + 1)
}

pub fn image_prompt(index: usize) -> String {
    format!("Illustration for page {}", index + 1)
}

pub fn image_url(prompt: &str) -> String {
    format!("data:image/jpeg;base64,{}", prompt.len())
}

#[derive(Default)]
pub struct OutputLog {
    pub opened: usize,
    pub started: usize,
    pub stopped: usize,
    callbacks: Vec<Option<EndedCallback>>,
}

/// Output device that never makes a sound
#[derive(Clone, Default)]
pub struct FakeOutput(Arc<Mutex<OutputLog>>);

impl FakeOutput {
    pub fn engine(&self) -> PlaybackEngine {
        PlaybackEngine::new(Box::new(self.clone()))
    }

    pub fn started(&self) -> usize {
        self.0.lock().started
    }

    pub fn stopped(&self) -> usize {
        self.0.lock().stopped
    }

    /// Lets the most recently started source reach its end
    pub fn finish_latest(&self) -> bool {
        let callback = self
            .0
            .lock()
            .callbacks
            .last_mut()
            .and_then(Option::take);
        match callback {
            Some(callback) => {
                callback();
                true
            }
            None => false,
        }
    }
}

impl DeviceProvider for FakeOutput {
    fn open(&self) -> EngineResult<Box<dyn OutputDevice>> {
        self.0.lock().opened += 1;
        Ok(Box::new(FakeDevice(self.clone())))
    }
}

struct FakeDevice(FakeOutput);

impl OutputDevice for FakeDevice {
    fn state(&self) -> DeviceState {
        DeviceState::Running
    }

    fn suspend(&mut self) -> EngineResult<()> {
        Ok(())
    }

    fn resume(&mut self) -> EngineResult<()> {
        Ok(())
    }

    fn start_source(
        &mut self,
        _buffer: AudioBuffer,
        on_ended: EndedCallback,
    ) -> EngineResult<Box<dyn SourceHandle>> {
        let mut log = (self.0).0.lock();
        log.started += 1;
        log.callbacks.push(Some(on_ended));
        Ok(Box::new(FakeSource {
            output: self.0.clone(),
            index: log.callbacks.len() - 1,
        }))
    }

    fn close(&mut self) {}
}

struct FakeSource {
    output: FakeOutput,
    index: usize,
}

impl SourceHandle for FakeSource {
    fn stop(&mut self) {
        let dropped = {
            let mut log = self.output.0.lock();
            log.stopped += 1;
            log.callbacks[self.index].take()
        };
        drop(dropped);
    }
}

pub struct Harness {
    pub controller: StoryController,
    pub stories: Arc<FakeStory>,
    pub images: Arc<FakeImages>,
    pub speech: Arc<FakeSpeech>,
    pub output: FakeOutput,
}

pub fn harness(pages: usize) -> Harness {
    let stories = Arc::new(FakeStory::new(pages));
    let images = Arc::new(FakeImages::default());
    let speech = Arc::new(FakeSpeech::new());
    let output = FakeOutput::default();

    let controller = StoryController::new(
        stories.clone(),
        images.clone(),
        speech.clone(),
        output.engine(),
    );

    Harness {
        controller,
        stories,
        images,
        speech,
        output,
    }
}

/// Yields to other futures on the same task until `done` holds
pub async fn until(mut done: impl FnMut() -> bool) {
    while !done() {
        tokio::task::yield_now().await;
    }
}
