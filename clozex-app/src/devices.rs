//! Stand-ins for audio capture and upload. Both only keep track of what
//! the session asked them to do.

use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use clozex_experiment::{HostError, Recorder, UploadMode, Uploader};
use tracing::{debug, info};

/// Remembers which recordings were started and stopped.
#[derive(Debug, Default)]
pub struct LogRecorder {
    open: Mutex<HashSet<String>>,
    captured: Mutex<HashSet<String>>,
}

impl LogRecorder {
    pub fn captured(&self) -> usize {
        self.captured
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[async_trait]
impl Recorder for LogRecorder {
    async fn start(&self, filename: &str) -> Result<(), HostError> {
        debug!(%filename, "capture started");
        self.open
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(filename.to_string());
        Ok(())
    }

    async fn stop(&self, filename: &str) -> Result<(), HostError> {
        let was_open = self
            .open
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(filename);
        if !was_open {
            return Err(HostError::Recorder(format!("{filename} was never started")));
        }
        debug!(%filename, "capture stopped");
        self.captured
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(filename.to_string());
        Ok(())
    }

    async fn has_capture(&self, filename: &str) -> Result<bool, HostError> {
        Ok(self
            .captured
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(filename))
    }
}

/// Counts upload requests.
#[derive(Debug, Default)]
pub struct LogUploader {
    sends: AtomicUsize,
}

impl LogUploader {
    pub fn sends(&self) -> usize {
        self.sends.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl Uploader for LogUploader {
    async fn upload(&self, mode: UploadMode) -> Result<(), HostError> {
        let n = self.sends.fetch_add(1, Ordering::Relaxed) + 1;
        info!(?mode, n, "sending recordings");
        Ok(())
    }
}
