pub mod race;
pub mod timer;

pub use race::{race_deadline, Race};
pub use timer::{Timer, TokioTimer};
