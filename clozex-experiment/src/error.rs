use clozex_core::SpecError;
use clozex_stimuli::StimuliError;
use thiserror::Error;

/// Failures of the collaborators a session delegates to.
#[derive(Debug, Error)]
pub enum HostError {
    #[error("participant input closed")]
    InputClosed,

    #[error("recorder error: {0}")]
    Recorder(String),

    #[error("upload failed: {0}")]
    Upload(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum ExperimentError {
    #[error(transparent)]
    Host(#[from] HostError),

    #[error("log sink error: {0}")]
    Log(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config: {0}")]
    Config(#[from] toml::de::Error),

    #[error(transparent)]
    Stimuli(#[from] StimuliError),

    #[error(transparent)]
    Spec(#[from] SpecError),

    #[error("unknown stimulus table {0:?}")]
    UnknownTable(String),
}
