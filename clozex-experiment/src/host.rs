//! Collaborator traits for everything a session delegates: presentation and
//! input, audio capture, and recording upload.

use std::sync::Arc;

use async_trait::async_trait;
use clozex_core::{Correctness, ResponseKey};
use serde::{Deserialize, Serialize};

use crate::error::HostError;

/// Non-blocking screens the runner asks the host to show.
#[derive(Debug, Clone, PartialEq)]
pub enum Screen {
    Feedback {
        correctness: Correctness,
        running_accuracy: Option<f64>,
    },
    /// Recording is live, the participant should finish the sentence.
    ProductionCue,
    ProductionTime {
        latency_ms: u64,
    },
    TimeoutWarning,
    /// Comprehension example question while the decision is being simulated.
    ExampleQuestion {
        question: String,
    },
    /// The example question with the expected key highlighted.
    ExampleAnswer {
        question: String,
        answer: ResponseKey,
    },
    ContinuePrompt,
    Warning(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormStatus {
    Complete,
    Incomplete { warning: String },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadMode {
    /// Fire and forget, the session continues immediately.
    #[default]
    Async,
    /// Must finish before the session moves on.
    Sync,
}

/// Presentation and participant input.
#[async_trait]
pub trait Host: Send + Sync {
    /// Shows the masked sentence and resolves once it has been fully revealed.
    async fn reveal_sentence(&self, sentence: &str) -> Result<(), HostError>;

    /// Shows the question and waits for one of the two response keys.
    async fn ask_question(&self, question: &str) -> Result<ResponseKey, HostError>;

    /// Resolves when the participant signals the end of a production.
    async fn wait_stop_key(&self) -> Result<(), HostError>;

    /// "Press Enter to continue."
    async fn wait_continue(&self) -> Result<(), HostError>;

    async fn display(&self, screen: Screen) -> Result<(), HostError>;

    /// Starts playback of an audio asset. Resolves once playback has started.
    async fn play_audio(&self, audio: &str) -> Result<(), HostError>;

    /// Blocking pass-through page such as a transition or a mini-break.
    async fn checkpoint(&self, label: &str) -> Result<(), HostError>;

    async fn present_form(&self, label: &str) -> Result<FormStatus, HostError>;

    /// Microphone test page. Resolves when the participant tries to continue.
    async fn recording_test(&self, filename: &str) -> Result<(), HostError>;
}

/// Audio capture, addressed by recording file name.
#[async_trait]
pub trait Recorder: Send + Sync {
    async fn start(&self, filename: &str) -> Result<(), HostError>;
    async fn stop(&self, filename: &str) -> Result<(), HostError>;
    async fn has_capture(&self, filename: &str) -> Result<bool, HostError>;
}

/// Sends recordings captured so far to the experiment server.
#[async_trait]
pub trait Uploader: Send + Sync {
    async fn upload(&self, mode: UploadMode) -> Result<(), HostError>;
}

#[derive(Clone)]
pub struct Collaborators {
    pub host: Arc<dyn Host>,
    pub recorder: Arc<dyn Recorder>,
    pub uploader: Arc<dyn Uploader>,
}

impl Collaborators {
    pub fn new(host: Arc<dyn Host>, recorder: Arc<dyn Recorder>, uploader: Arc<dyn Uploader>) -> Self {
        Self {
            host,
            recorder,
            uploader,
        }
    }
}
