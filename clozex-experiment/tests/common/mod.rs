#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use clozex_core::{ParticipantId, ResponseKey, TrialSpec};
use clozex_experiment::{
    Collaborators, FormStatus, Host, HostError, Recorder, Screen, UploadMode, Uploader,
};
use tokio::time::Instant;

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Reveal(String),
    Question(String),
    StopKey,
    Continue,
    Screen(Screen),
    Audio(String),
    Checkpoint(String),
    Form(String),
    RecordingTest(String),
}

/// Participant whose answers and stop-key timings are queued up front.
#[derive(Default)]
pub struct ScriptedHost {
    answers: Mutex<VecDeque<(ResponseKey, u64)>>,
    stops: Mutex<VecDeque<Option<u64>>>,
    forms: Mutex<VecDeque<FormStatus>>,
    pub events: Mutex<Vec<(Event, Instant)>>,
}

impl ScriptedHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a comprehension answer given after `after_ms`.
    pub fn answer(self, key: ResponseKey, after_ms: u64) -> Self {
        self.answers.lock().unwrap().push_back((key, after_ms));
        self
    }

    /// Queues a stop key after `after_ms`, or silence when `None`.
    pub fn stop(self, after_ms: Option<u64>) -> Self {
        self.stops.lock().unwrap().push_back(after_ms);
        self
    }

    pub fn form(self, status: FormStatus) -> Self {
        self.forms.lock().unwrap().push_back(status);
        self
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().iter().map(|(e, _)| e.clone()).collect()
    }

    pub fn first_at(&self, event: &Event) -> Option<Instant> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .find(|(e, _)| e == event)
            .map(|(_, t)| *t)
    }

    pub fn count(&self, pred: impl Fn(&Event) -> bool) -> usize {
        self.events.lock().unwrap().iter().filter(|(e, _)| pred(e)).count()
    }

    fn log(&self, event: Event) {
        self.events.lock().unwrap().push((event, Instant::now()));
    }
}

#[async_trait]
impl Host for ScriptedHost {
    async fn reveal_sentence(&self, sentence: &str) -> Result<(), HostError> {
        self.log(Event::Reveal(sentence.to_string()));
        Ok(())
    }

    async fn ask_question(&self, question: &str) -> Result<ResponseKey, HostError> {
        self.log(Event::Question(question.to_string()));
        let next = self.answers.lock().unwrap().pop_front();
        let (key, after_ms) = next.unwrap_or((ResponseKey::Left, 500));
        tokio::time::sleep(Duration::from_millis(after_ms)).await;
        Ok(key)
    }

    async fn wait_stop_key(&self) -> Result<(), HostError> {
        let next = self.stops.lock().unwrap().pop_front();
        match next.unwrap_or(Some(1000)) {
            Some(ms) => tokio::time::sleep(Duration::from_millis(ms)).await,
            None => std::future::pending::<()>().await,
        }
        self.log(Event::StopKey);
        Ok(())
    }

    async fn wait_continue(&self) -> Result<(), HostError> {
        self.log(Event::Continue);
        Ok(())
    }

    async fn display(&self, screen: Screen) -> Result<(), HostError> {
        self.log(Event::Screen(screen));
        Ok(())
    }

    async fn play_audio(&self, audio: &str) -> Result<(), HostError> {
        self.log(Event::Audio(audio.to_string()));
        Ok(())
    }

    async fn checkpoint(&self, label: &str) -> Result<(), HostError> {
        self.log(Event::Checkpoint(label.to_string()));
        Ok(())
    }

    async fn present_form(&self, label: &str) -> Result<FormStatus, HostError> {
        self.log(Event::Form(label.to_string()));
        let next = self.forms.lock().unwrap().pop_front();
        Ok(next.unwrap_or(FormStatus::Complete))
    }

    async fn recording_test(&self, filename: &str) -> Result<(), HostError> {
        self.log(Event::RecordingTest(filename.to_string()));
        Ok(())
    }
}

/// Recorder that logs start and stop times. The first `missing_tests`
/// capture checks report nothing recorded.
#[derive(Default)]
pub struct TapeRecorder {
    missing_tests: Mutex<u32>,
    pub events: Mutex<Vec<(String, Instant)>>,
}

impl TapeRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn missing_tests(self, n: u32) -> Self {
        *self.missing_tests.lock().unwrap() = n;
        self
    }

    pub fn labels(&self) -> Vec<String> {
        self.events.lock().unwrap().iter().map(|(e, _)| e.clone()).collect()
    }

    pub fn at(&self, label: &str) -> Option<Instant> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .find(|(e, _)| e == label)
            .map(|(_, t)| *t)
    }
}

#[async_trait]
impl Recorder for TapeRecorder {
    async fn start(&self, filename: &str) -> Result<(), HostError> {
        self.events
            .lock()
            .unwrap()
            .push((format!("start {filename}"), Instant::now()));
        Ok(())
    }

    async fn stop(&self, filename: &str) -> Result<(), HostError> {
        self.events
            .lock()
            .unwrap()
            .push((format!("stop {filename}"), Instant::now()));
        Ok(())
    }

    async fn has_capture(&self, _filename: &str) -> Result<bool, HostError> {
        let mut missing = self.missing_tests.lock().unwrap();
        if *missing > 0 {
            *missing -= 1;
            return Ok(false);
        }
        Ok(true)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Upload {
    pub mode: UploadMode,
    pub started: Instant,
    pub finished: Option<Instant>,
}

/// Uploader with a fixed transfer time. The first `sync_failures` sync
/// uploads fail.
pub struct SlowUploader {
    delay: Duration,
    sync_failures: Mutex<u32>,
    pub uploads: Mutex<Vec<Upload>>,
}

impl SlowUploader {
    pub fn new(delay_ms: u64) -> Self {
        Self {
            delay: Duration::from_millis(delay_ms),
            sync_failures: Mutex::new(0),
            uploads: Mutex::new(Vec::new()),
        }
    }

    pub fn sync_failures(self, n: u32) -> Self {
        *self.sync_failures.lock().unwrap() = n;
        self
    }

    pub fn modes(&self) -> Vec<UploadMode> {
        self.uploads.lock().unwrap().iter().map(|u| u.mode).collect()
    }

    pub fn snapshot(&self) -> Vec<Upload> {
        self.uploads.lock().unwrap().clone()
    }
}

#[async_trait]
impl Uploader for SlowUploader {
    async fn upload(&self, mode: UploadMode) -> Result<(), HostError> {
        let index = {
            let mut uploads = self.uploads.lock().unwrap();
            uploads.push(Upload {
                mode,
                started: Instant::now(),
                finished: None,
            });
            uploads.len() - 1
        };
        tokio::time::sleep(self.delay).await;

        if mode == UploadMode::Sync {
            let mut failures = self.sync_failures.lock().unwrap();
            if *failures > 0 {
                *failures -= 1;
                return Err(HostError::Upload("server unavailable".into()));
            }
        }
        self.uploads.lock().unwrap()[index].finished = Some(Instant::now());
        Ok(())
    }
}

pub fn participant() -> ParticipantId {
    ParticipantId::parse("x1y2z3").unwrap()
}

pub fn collaborators(
    host: &Arc<ScriptedHost>,
    recorder: &Arc<TapeRecorder>,
    uploader: &Arc<SlowUploader>,
) -> Collaborators {
    Collaborators::new(host.clone(), recorder.clone(), uploader.clone())
}

pub fn comprehension_trial(item: &str, answer: ResponseKey) -> TrialSpec {
    TrialSpec::new(item, "high", format!("Sentence {item} ends"))
        .with_question(format!("Question {item}?"), answer)
}

pub fn production_example(item: &str, set: &str, audio: &str) -> TrialSpec {
    let mut spec = TrialSpec::new(item, "example", format!("Example {item} ends")).with_audio(audio);
    spec.example_set = set.to_string();
    spec
}

pub fn production_trial(item: &str) -> TrialSpec {
    TrialSpec::new(item, "low", format!("Sentence {item} needs a"))
}
