use thiserror::Error;

/// A stimulus row that cannot drive a trial.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SpecError {
    #[error("invalid answer key {0:?}, expected D or K")]
    InvalidAnswerKey(String),

    #[error("item {0} asks a question but has no answer key")]
    MissingAnswer(String),

    #[error("invalid participant id {0:?}")]
    InvalidParticipantId(String),
}
