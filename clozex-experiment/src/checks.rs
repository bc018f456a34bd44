//! Gates that keep the participant on a page until a condition holds.

use clozex_core::ParticipantId;
use tracing::{debug, warn};

use crate::error::ExperimentError;
use crate::host::{Collaborators, FormStatus, Screen};

pub const RECORDING_WARNING: &str = "Please test your audio recording before continuing.";

/// Blocks until a test recording exists for the participant.
pub async fn recording_check(
    collaborators: &Collaborators,
    participant: &ParticipantId,
) -> Result<u32, ExperimentError> {
    let filename = participant.test_recording_filename();
    let mut attempts = 0;
    loop {
        attempts += 1;
        collaborators.host.recording_test(&filename).await?;
        if collaborators.recorder.has_capture(&filename).await? {
            debug!(%filename, attempts, "recording check passed");
            return Ok(attempts);
        }
        warn!(%filename, attempts, "no test recording yet");
        collaborators
            .host
            .display(Screen::Warning(RECORDING_WARNING.to_string()))
            .await?;
    }
}

/// Presents a form until every required field is filled.
pub async fn fill_form(collaborators: &Collaborators, label: &str) -> Result<u32, ExperimentError> {
    let mut attempts = 0;
    loop {
        attempts += 1;
        match collaborators.host.present_form(label).await? {
            FormStatus::Complete => {
                debug!(%label, attempts, "form complete");
                return Ok(attempts);
            }
            FormStatus::Incomplete { warning } => {
                collaborators.host.display(Screen::Warning(warning)).await?;
            }
        }
    }
}
