pub mod error;
pub mod log;
pub mod phase;
pub mod stimulus;
pub mod trial;

pub use error::SpecError;
pub use log::{LogRecord, NA};
pub use phase::{BlockKind, TrialMode};
pub use stimulus::{HasQuestion, ParticipantId, ResponseKey, TrialSpec};
pub use trial::{Correctness, KeyResult, RunningAccuracy, TimeoutFlag, TrialResult, TrialState};
