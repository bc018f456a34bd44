use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ExperimentError;
use crate::script::SessionScript;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    /// How long the participant has to finish a production before it times out.
    pub production_timeout_ms: u64,
    /// Extra capture after a production resolves so trailing speech is kept.
    pub spillover_ms: u64,
    /// How long the "too slow" warning stays up after a timeout.
    pub timeout_warning_ms: u64,
    /// How long practice feedback stays up.
    pub feedback_ms: u64,
    /// How long an instruction example stays up before the continue prompt.
    pub example_ms: u64,
    /// Pause before a comprehension example reveals its answer.
    pub example_decision_ms: u64,
    /// How long the revealed example answer stays up.
    pub example_answer_ms: u64,
    /// Limit on the comprehension answer. `None` waits indefinitely.
    pub comprehension_window_ms: Option<u64>,
    /// Extra attempts for the synchronous upload at the end of a block.
    pub upload_retries: u32,
    pub upload_retry_delay_ms: u64,
    /// Shows feedback, running accuracy and production times in main blocks.
    pub debug_mode: bool,
    /// Off runs production trials without audio capture.
    pub record_mode: bool,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            production_timeout_ms: 4000,
            spillover_ms: 1000,
            timeout_warning_ms: 1000,
            feedback_ms: 1000,
            example_ms: 3000,
            example_decision_ms: 1000,
            example_answer_ms: 1500,
            comprehension_window_ms: None,
            upload_retries: 3,
            upload_retry_delay_ms: 500,
            debug_mode: false,
            record_mode: true,
        }
    }
}

impl ExperimentConfig {
    pub fn production_timeout(&self) -> Duration {
        Duration::from_millis(self.production_timeout_ms)
    }

    pub fn spillover(&self) -> Duration {
        Duration::from_millis(self.spillover_ms)
    }

    pub fn timeout_warning(&self) -> Duration {
        Duration::from_millis(self.timeout_warning_ms)
    }

    pub fn feedback(&self) -> Duration {
        Duration::from_millis(self.feedback_ms)
    }

    pub fn example(&self) -> Duration {
        Duration::from_millis(self.example_ms)
    }

    pub fn example_decision(&self) -> Duration {
        Duration::from_millis(self.example_decision_ms)
    }

    pub fn example_answer(&self) -> Duration {
        Duration::from_millis(self.example_answer_ms)
    }

    pub fn comprehension_window(&self) -> Option<Duration> {
        self.comprehension_window_ms.map(Duration::from_millis)
    }

    pub fn upload_retry_delay(&self) -> Duration {
        Duration::from_millis(self.upload_retry_delay_ms)
    }
}

/// On-disk configuration: timings plus the session script.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    pub experiment: ExperimentConfig,
    pub script: SessionScript,
}

impl ConfigFile {
    pub fn from_toml_str(s: &str) -> Result<Self, ExperimentError> {
        Ok(toml::from_str(s)?)
    }

    pub fn load(path: &Path) -> Result<Self, ExperimentError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }
}
