pub mod block;
pub mod checks;
pub mod config;
pub mod error;
pub mod host;
pub mod script;
pub mod session;
pub mod sink;
pub mod trial;

pub use block::BlockSequencer;
pub use config::{ConfigFile, ExperimentConfig};
pub use error::{ExperimentError, HostError};
pub use host::{Collaborators, FormStatus, Host, Recorder, Screen, UploadMode, Uploader};
pub use script::{BlockSummary, Session, SessionScript, SessionSummary, Step};
pub use session::{SessionContext, TrialCounters};
pub use sink::{CsvLogSink, LogSink, MemoryLogSink};
pub use trial::TrialRunner;
