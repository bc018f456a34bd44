use std::future::Future;
use std::time::Duration;

/// Clock used by trials for latencies and fixed waits.
pub trait Timer: Clone + Send + Sync {
    type Timestamp: Copy + Clone + Send + Sync;
    fn now(&self) -> Self::Timestamp;
    fn elapsed(&self, ts: Self::Timestamp) -> Duration;
    fn sleep(&self, d: Duration) -> impl Future<Output = ()> + Send;

    fn elapsed_ms(&self, ts: Self::Timestamp) -> u64 {
        self.elapsed(ts).as_millis() as u64
    }
}

/// Wall-clock timer on the tokio time driver.
///
/// Built on `tokio::time::Instant`, so a runtime started with paused time
/// advances it deterministically.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioTimer;

impl TokioTimer {
    pub fn new() -> Self {
        Self
    }
}

impl Timer for TokioTimer {
    type Timestamp = tokio::time::Instant;

    fn now(&self) -> tokio::time::Instant {
        tokio::time::Instant::now()
    }

    fn elapsed(&self, ts: tokio::time::Instant) -> Duration {
        tokio::time::Instant::now().saturating_duration_since(ts)
    }

    fn sleep(&self, d: Duration) -> impl Future<Output = ()> + Send {
        tokio::time::sleep(d)
    }
}
