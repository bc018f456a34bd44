use std::future::Future;
use std::time::Duration;

use crate::timer::Timer;

/// Result of racing an input against a deadline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Race<T> {
    /// The input resolved first. `elapsed` never exceeds the limit.
    Input { value: T, elapsed: Duration },
    /// The deadline fired first. The input future has been dropped.
    Deadline { limit: Duration },
}

impl<T> Race<T> {
    pub fn timed_out(&self) -> bool {
        matches!(self, Race::Deadline { .. })
    }

    /// Elapsed time until resolution: the full limit on a deadline.
    pub fn elapsed(&self) -> Duration {
        match self {
            Race::Input { elapsed, .. } => *elapsed,
            Race::Deadline { limit } => *limit,
        }
    }
}

/// Waits for `input` or `limit`, whichever comes first. The loser is cancelled
/// by being dropped. A tie goes to the input.
pub async fn race_deadline<T, Tm, F>(timer: &Tm, input: F, limit: Duration) -> Race<T>
where
    Tm: Timer,
    F: Future<Output = T>,
{
    let start = timer.now();
    tokio::select! {
        biased;
        value = input => Race::Input {
            value,
            elapsed: timer.elapsed(start).min(limit),
        },
        _ = timer.sleep(limit) => Race::Deadline { limit },
    }
}
