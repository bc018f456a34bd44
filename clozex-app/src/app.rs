use std::collections::HashMap;
use std::fs::{self, File};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clozex_core::ParticipantId;
use clozex_experiment::{
    Collaborators, ConfigFile, CsvLogSink, Host, LogSink, Session, SessionSummary,
};
use clozex_stimuli::StimulusTable;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::info;

use crate::console::ConsoleHost;
use crate::devices::{LogRecorder, LogUploader};
use crate::simulated::SimulatedHost;

/// Options of `clozex run`.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub config: Option<PathBuf>,
    pub stimuli_dir: PathBuf,
    pub output: PathBuf,
    pub participant: Option<String>,
    pub simulate: bool,
    pub seed: Option<u64>,
}

/// One participant session, ready to run.
pub struct App {
    config: ConfigFile,
    participant: ParticipantId,
    tables: HashMap<String, StimulusTable>,
    output: PathBuf,
    simulate: bool,
    rng: StdRng,
}

impl App {
    pub fn new(options: RunOptions) -> Result<Self> {
        let config = match &options.config {
            Some(path) => ConfigFile::load(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => ConfigFile::default(),
        };

        let mut rng = match options.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let participant = match &options.participant {
            Some(id) => ParticipantId::parse(id)?,
            None => ParticipantId::generate(&mut rng),
        };

        let tables = config
            .script
            .load_tables(&options.stimuli_dir)
            .with_context(|| format!("loading stimuli from {}", options.stimuli_dir.display()))?;

        Ok(Self {
            config,
            participant,
            tables,
            output: options.output,
            simulate: options.simulate,
            rng,
        })
    }

    pub fn participant(&self) -> &ParticipantId {
        &self.participant
    }

    pub async fn run(self) -> Result<SessionSummary> {
        fs::create_dir_all(&self.output)
            .with_context(|| format!("creating {}", self.output.display()))?;

        let recorder = Arc::new(LogRecorder::default());
        let uploader = Arc::new(LogUploader::default());
        let host: Arc<dyn Host> = if self.simulate {
            Arc::new(SimulatedHost::new(
                self.rng,
                recorder.clone(),
                &self.config.experiment,
            ))
        } else {
            Arc::new(ConsoleHost::new(recorder.clone()))
        };

        info!(
            participant = %self.participant,
            simulate = self.simulate,
            debug_mode = self.config.experiment.debug_mode,
            record_mode = self.config.experiment.record_mode,
            "starting session"
        );

        let results_path = self.output.join(format!("results_{}.csv", self.participant));
        let mut sink = CsvLogSink::create(&results_path)?;
        let mut session = Session::new(
            self.participant.clone(),
            Collaborators::new(host, recorder.clone(), uploader.clone()),
            self.config.experiment.clone(),
            self.tables,
        );
        let summary = session.run(&self.config.script, &mut sink).await?;
        sink.flush()?;

        let summary_path = self.output.join(format!("summary_{}.json", self.participant));
        let file = File::create(&summary_path)
            .with_context(|| format!("creating {}", summary_path.display()))?;
        serde_json::to_writer_pretty(file, &summary)?;

        info!(
            trials = summary.trials,
            captures = recorder.captured(),
            uploads = uploader.sends(),
            "session complete"
        );
        println!(
            "Participant {}: {} trials. Results written to {}",
            summary.participant,
            summary.trials,
            results_path.display()
        );
        Ok(summary)
    }
}
