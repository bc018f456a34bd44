use clozex_core::SpecError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StimuliError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("row {row}: {source}")]
    Spec {
        row: usize,
        #[source]
        source: SpecError,
    },

    #[error("requested {requested} rows but only {available} are available")]
    NotEnoughRows { requested: usize, available: usize },

    #[error("no filler with a comprehension question to open the block")]
    NoQuestionFiller,

    #[error("no order satisfies the constraints after {attempts} attempts")]
    Unsatisfiable { attempts: usize },
}
