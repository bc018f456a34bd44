use std::collections::HashMap;

use clozex_core::{BlockKind, ParticipantId, RunningAccuracy};

/// Counter values assigned to one trial before it runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrialCounters {
    pub global: u64,
    pub block: u64,
}

/// Mutable state shared by every trial of a session.
///
/// Built once per participant and mutated only by the trial currently
/// running.
#[derive(Debug, Clone)]
pub struct SessionContext {
    participant: ParticipantId,
    trial_number: u64,
    block_trial_numbers: HashMap<BlockKind, u64>,
    accuracy: HashMap<BlockKind, RunningAccuracy>,
    current_recording: Option<String>,
    finished: bool,
}

impl SessionContext {
    pub fn new(participant: ParticipantId) -> Self {
        Self {
            participant,
            trial_number: 0,
            block_trial_numbers: HashMap::new(),
            accuracy: HashMap::new(),
            current_recording: None,
            finished: false,
        }
    }

    pub fn participant(&self) -> &ParticipantId {
        &self.participant
    }

    /// Increments the global and the block-kind counter.
    pub fn next_trial(&mut self, kind: BlockKind) -> TrialCounters {
        self.trial_number += 1;
        let block = self.block_trial_numbers.entry(kind).or_insert(0);
        *block += 1;
        TrialCounters {
            global: self.trial_number,
            block: *block,
        }
    }

    pub fn trial_number(&self) -> u64 {
        self.trial_number
    }

    pub fn block_trial_number(&self, kind: BlockKind) -> u64 {
        self.block_trial_numbers.get(&kind).copied().unwrap_or(0)
    }

    /// Appends a comprehension answer and returns the recomputed mean.
    pub fn record_answer(&mut self, kind: BlockKind, correct: bool) -> Option<f64> {
        let acc = self.accuracy.entry(kind).or_default();
        acc.push(correct);
        acc.mean()
    }

    pub fn accuracy(&self, kind: BlockKind) -> Option<&RunningAccuracy> {
        self.accuracy.get(&kind)
    }

    pub fn running_accuracy(&self, kind: BlockKind) -> Option<f64> {
        self.accuracy.get(&kind).and_then(RunningAccuracy::mean)
    }

    pub fn set_current_recording(&mut self, filename: Option<String>) {
        self.current_recording = filename;
    }

    pub fn current_recording(&self) -> Option<&str> {
        self.current_recording.as_deref()
    }

    pub fn mark_finished(&mut self) {
        self.finished = true;
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }
}
