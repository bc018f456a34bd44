use std::sync::Arc;

use clozex_core::{BlockKind, LogRecord, TrialMode, TrialResult, TrialSpec};
use clozex_timing::{Timer, TokioTimer};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::config::ExperimentConfig;
use crate::error::{ExperimentError, HostError};
use crate::host::{Collaborators, UploadMode, Uploader};
use crate::session::SessionContext;
use crate::sink::LogSink;
use crate::trial::TrialRunner;

/// Runs the trials of one block in order and handles recording uploads.
///
/// Production blocks send recordings asynchronously between trials and
/// flush synchronously once the last trial is done.
pub struct BlockSequencer<T: Timer = TokioTimer> {
    runner: TrialRunner<T>,
    uploader: Arc<dyn Uploader>,
    pending: JoinSet<Result<(), HostError>>,
}

impl BlockSequencer<TokioTimer> {
    pub fn new(collaborators: Collaborators, config: ExperimentConfig) -> Self {
        Self::from_runner(TrialRunner::new(collaborators, config))
    }
}

impl<T: Timer> BlockSequencer<T> {
    pub fn from_runner(runner: TrialRunner<T>) -> Self {
        let uploader = runner.collaborators().uploader.clone();
        Self {
            runner,
            uploader,
            pending: JoinSet::new(),
        }
    }

    pub fn runner(&self) -> &TrialRunner<T> {
        &self.runner
    }

    /// Number of async uploads not yet awaited.
    pub fn pending_uploads(&self) -> usize {
        self.pending.len()
    }

    pub async fn run_block(
        &mut self,
        session: &mut SessionContext,
        specs: &[TrialSpec],
        kind: BlockKind,
        sink: &mut dyn LogSink,
    ) -> Result<Vec<TrialResult>, ExperimentError> {
        info!(block = %kind, trials = specs.len(), "block started");
        let mut results = Vec::with_capacity(specs.len());

        for (i, spec) in specs.iter().enumerate() {
            let counters = session.next_trial(kind);
            let result = self.runner.run(session, spec, kind, counters).await?;
            sink.write(&LogRecord::new(session.participant(), spec, &result))?;
            results.push(result);

            if kind.uploads_recordings() && i + 1 < specs.len() {
                self.send_async();
            }
        }
        sink.flush()?;

        if kind.uploads_recordings() {
            self.flush_uploads().await?;
        }
        info!(
            block = %kind,
            trials = results.len(),
            accuracy = ?session.running_accuracy(kind),
            "block complete"
        );
        Ok(results)
    }

    /// Instruction examples in order. Nothing is counted or logged.
    pub async fn run_examples(&self, specs: &[TrialSpec], mode: TrialMode) -> Result<(), ExperimentError> {
        for spec in specs {
            self.runner.run_example(spec, mode).await?;
        }
        info!(?mode, examples = specs.len(), "examples shown");
        Ok(())
    }

    /// Fires an upload without waiting for it.
    pub fn send_async(&mut self) {
        let uploader = self.uploader.clone();
        debug!("sending recordings asynchronously");
        self.pending
            .spawn(async move { uploader.upload(UploadMode::Async).await });
    }

    /// Synchronous upload with retries, then waits for any async sends.
    ///
    /// Async failures are logged only; a final sync failure is returned.
    pub async fn flush_uploads(&mut self) -> Result<(), ExperimentError> {
        let config = self.runner.config();
        let mut attempt = 0;
        loop {
            match self.uploader.upload(UploadMode::Sync).await {
                Ok(()) => break,
                Err(e) if attempt < config.upload_retries => {
                    attempt += 1;
                    warn!(error = %e, attempt, "sync upload failed, retrying");
                    self.runner.timer().sleep(config.upload_retry_delay()).await;
                }
                Err(e) => {
                    warn!(error = %e, "sync upload failed, giving up");
                    return Err(e.into());
                }
            }
        }
        self.drain_pending().await;
        Ok(())
    }

    pub async fn drain_pending(&mut self) {
        while let Some(joined) = self.pending.join_next().await {
            match joined {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!(error = %e, "async upload failed"),
                Err(e) => warn!(error = %e, "async upload task aborted"),
            }
        }
    }

    /// Blocking pass-through screen between blocks.
    pub async fn checkpoint(&self, label: &str) -> Result<(), ExperimentError> {
        debug!(%label, "checkpoint");
        self.runner.collaborators().host.checkpoint(label).await?;
        Ok(())
    }
}
