use serde::{Deserialize, Serialize};

use crate::phase::BlockKind;

/// Per-trial state machine.
///
/// `Idle -> SentenceRevealed -> (QuestionPhase) -> ResponsePhase -> FeedbackPhase
/// -> ContinuePrompt -> Idle`. The question phase only exists for comprehension
/// trials that ask a question.
#[derive(Copy, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrialState {
    Idle,
    SentenceRevealed,
    QuestionPhase,
    ResponsePhase,
    FeedbackPhase,
    ContinuePrompt,
}

impl TrialState {
    pub fn can_advance_to(&self, next: TrialState) -> bool {
        use TrialState::*;
        matches!(
            (self, next),
            (Idle, SentenceRevealed)
                | (SentenceRevealed, QuestionPhase)
                | (SentenceRevealed, ResponsePhase)
                | (QuestionPhase, ResponsePhase)
                | (ResponsePhase, FeedbackPhase)
                | (FeedbackPhase, ContinuePrompt)
                | (ContinuePrompt, Idle)
        )
    }
}

/// Tri-state answer correctness. `NotAsked` means no question was shown,
/// which is different from a wrong answer.
#[derive(Copy, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Correctness {
    #[serde(rename = "true")]
    Correct,
    #[serde(rename = "false")]
    Incorrect,
    #[serde(rename = "NA")]
    NotAsked,
}

impl Correctness {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Correctness::Correct => Some(true),
            Correctness::Incorrect => Some(false),
            Correctness::NotAsked => None,
        }
    }
}

impl std::fmt::Display for Correctness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Correctness::Correct => "true",
            Correctness::Incorrect => "false",
            Correctness::NotAsked => "NA",
        })
    }
}

/// Outcome of waiting for the comprehension key.
#[derive(Copy, Debug, Clone, PartialEq, Eq)]
pub enum KeyResult {
    Correct,
    Incorrect,
    Timeout,
}

impl From<KeyResult> for Correctness {
    fn from(result: KeyResult) -> Self {
        match result {
            KeyResult::Correct => Correctness::Correct,
            KeyResult::Incorrect | KeyResult::Timeout => Correctness::Incorrect,
        }
    }
}

#[derive(Copy, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeoutFlag {
    NoTimeOut,
    TimedOut,
}

impl std::fmt::Display for TimeoutFlag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            TimeoutFlag::NoTimeOut => "NoTimeOut",
            TimeoutFlag::TimedOut => "TimedOut",
        })
    }
}

/// Comprehension answers of one block kind, in presentation order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunningAccuracy {
    answers: Vec<bool>,
}

impl RunningAccuracy {
    pub fn push(&mut self, correct: bool) {
        self.answers.push(correct);
    }

    pub fn len(&self) -> usize {
        self.answers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }

    pub fn correct(&self) -> usize {
        self.answers.iter().filter(|&&a| a).count()
    }

    /// Recomputed from the full list every call. `None` before the first question.
    pub fn mean(&self) -> Option<f64> {
        if self.answers.is_empty() {
            None
        } else {
            Some(self.correct() as f64 / self.answers.len() as f64)
        }
    }
}

/// Recorded result per trial
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrialResult {
    pub block: BlockKind,
    pub item_num: String,
    pub global_counter: u64,
    pub block_counter: u64,
    pub correctness: Correctness,
    pub latency_ms: Option<u64>,
    pub timeout: Option<TimeoutFlag>,
    pub recording: Option<String>,
    pub running_accuracy: Option<f64>,
    /// States visited, starting with `Idle`.
    #[serde(skip)]
    pub path: Vec<TrialState>,
}

impl TrialResult {
    pub fn new(block: BlockKind, item_num: &str, global_counter: u64, block_counter: u64) -> Self {
        Self {
            block,
            item_num: item_num.to_string(),
            global_counter,
            block_counter,
            correctness: Correctness::NotAsked,
            latency_ms: None,
            timeout: None,
            recording: None,
            running_accuracy: None,
            path: vec![TrialState::Idle],
        }
    }

    pub fn state(&self) -> TrialState {
        self.path.last().copied().unwrap_or(TrialState::Idle)
    }

    pub fn advance(&mut self, next: TrialState) {
        debug_assert!(
            self.state().can_advance_to(next),
            "illegal trial transition {:?} -> {:?}",
            self.state(),
            next
        );
        self.path.push(next);
    }

    pub fn visited(&self, state: TrialState) -> bool {
        self.path.contains(&state)
    }
}
