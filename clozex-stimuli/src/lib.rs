//! Stimulus tables and the offline pseudorandomization that fixes trial order
//! before a session runs.

pub mod error;
pub mod pseudorandomize;
pub mod table;

pub use error::StimuliError;
pub use pseudorandomize::{OrderConstraints, extend_order, standard_order, standard_orders};
pub use table::StimulusTable;
