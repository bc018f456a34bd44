use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use clozex_core::ResponseKey;
use clozex_experiment::{ExperimentConfig, FormStatus, Host, HostError, Recorder, Screen};
use rand::Rng;
use rand::rngs::StdRng;
use tracing::debug;

/// Random participant for dry runs of a script.
///
/// Answer and production delays scale with the configured production
/// timeout, so short timings in a config give a fast run.
pub struct SimulatedHost {
    rng: Mutex<StdRng>,
    recorder: Arc<dyn Recorder>,
    production_limit: Duration,
}

impl SimulatedHost {
    pub fn new(rng: StdRng, recorder: Arc<dyn Recorder>, config: &ExperimentConfig) -> Self {
        Self {
            rng: Mutex::new(rng),
            recorder,
            production_limit: config.production_timeout(),
        }
    }

    fn with_rng<T>(&self, f: impl FnOnce(&mut StdRng) -> T) -> T {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut rng)
    }

    /// A delay between `lo` and `hi` times the production limit.
    fn delay(&self, lo: f64, hi: f64) -> Duration {
        let factor = self.with_rng(|rng| rng.random_range(lo..hi));
        self.production_limit.mul_f64(factor)
    }
}

#[async_trait]
impl Host for SimulatedHost {
    async fn reveal_sentence(&self, sentence: &str) -> Result<(), HostError> {
        debug!(%sentence, "reveal");
        Ok(())
    }

    async fn ask_question(&self, question: &str) -> Result<ResponseKey, HostError> {
        let key = self.with_rng(|rng| {
            if rng.random_bool(0.5) {
                ResponseKey::Left
            } else {
                ResponseKey::Right
            }
        });
        tokio::time::sleep(self.delay(0.05, 0.4)).await;
        debug!(%question, ?key, "answer");
        Ok(key)
    }

    async fn wait_stop_key(&self) -> Result<(), HostError> {
        // about one production in five runs past the limit
        tokio::time::sleep(self.delay(0.2, 1.25)).await;
        Ok(())
    }

    async fn wait_continue(&self) -> Result<(), HostError> {
        Ok(())
    }

    async fn display(&self, screen: Screen) -> Result<(), HostError> {
        debug!(?screen, "display");
        Ok(())
    }

    async fn play_audio(&self, audio: &str) -> Result<(), HostError> {
        debug!(%audio, "play");
        Ok(())
    }

    async fn checkpoint(&self, label: &str) -> Result<(), HostError> {
        debug!(%label, "checkpoint");
        Ok(())
    }

    async fn present_form(&self, label: &str) -> Result<FormStatus, HostError> {
        debug!(%label, "form");
        Ok(FormStatus::Complete)
    }

    async fn recording_test(&self, filename: &str) -> Result<(), HostError> {
        self.recorder.start(filename).await?;
        tokio::time::sleep(self.delay(0.1, 0.3)).await;
        self.recorder.stop(filename).await
    }
}
