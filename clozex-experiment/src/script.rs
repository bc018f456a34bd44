use std::collections::HashMap;
use std::path::Path;

use clozex_core::{BlockKind, ParticipantId, TrialMode, TrialResult, TrialSpec};
use clozex_stimuli::StimulusTable;
use clozex_timing::{Timer, TokioTimer};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::block::BlockSequencer;
use crate::checks::{fill_form, recording_check};
use crate::config::ExperimentConfig;
use crate::error::ExperimentError;
use crate::host::{Collaborators, UploadMode};
use crate::session::SessionContext;
use crate::sink::LogSink;
use crate::trial::TrialRunner;

/// Label of the checkpoint inserted between two blocks that follow each other directly.
pub const TRANSITION: &str = "transition";

/// Table holding every instruction example, grouped by its `set` column.
pub const EXAMPLES_TABLE: &str = "stimuli_examples.csv";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Step {
    /// Microphone test, repeated until a capture exists.
    RecordingCheck,
    Form {
        label: String,
    },
    Checkpoint {
        label: String,
    },
    Block {
        kind: BlockKind,
        table: String,
        /// Only rows with this `ExpCondition`.
        #[serde(default)]
        condition: Option<String>,
    },
    /// Instruction examples, outside any block.
    Examples {
        mode: TrialMode,
        table: String,
        /// Only rows of this example group (`set` column).
        #[serde(default)]
        set: Option<String>,
    },
    SendRecordings {
        #[serde(default)]
        mode: UploadMode,
    },
    /// Flushes the result log.
    SendResults,
}

impl Step {
    fn form(label: &str) -> Self {
        Step::Form {
            label: label.to_string(),
        }
    }

    fn checkpoint(label: &str) -> Self {
        Step::Checkpoint {
            label: label.to_string(),
        }
    }

    fn block(kind: BlockKind, table: &str, condition: Option<&str>) -> Self {
        Step::Block {
            kind,
            table: table.to_string(),
            condition: condition.map(str::to_string),
        }
    }

    fn examples(mode: TrialMode, set: &str) -> Self {
        Step::Examples {
            mode,
            table: EXAMPLES_TABLE.to_string(),
            set: Some(set.to_string()),
        }
    }

    fn table(&self) -> Option<&str> {
        match self {
            Step::Block { table, .. } | Step::Examples { table, .. } => Some(table.as_str()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionScript {
    pub steps: Vec<Step>,
}

impl Default for SessionScript {
    fn default() -> Self {
        Self::standard()
    }
}

impl SessionScript {
    pub fn new(steps: Vec<Step>) -> Self {
        Self { steps }
    }

    /// Two comprehension blocks followed by two production blocks, each
    /// preceded by instruction examples and practice.
    pub fn standard() -> Self {
        use BlockKind::*;
        Self::new(vec![
            Step::form("consent"),
            Step::RecordingCheck,
            Step::SendRecordings {
                mode: UploadMode::Async,
            },
            Step::form("demographics"),
            Step::checkpoint("instructions_comp"),
            Step::examples(TrialMode::Comprehension, "4"),
            Step::checkpoint("instructions_comp2"),
            Step::block(ComprehensionPractice, "practice.csv", Some("prac_comprehension")),
            Step::checkpoint("transition_comp"),
            Step::block(Comprehension, "block1_comp.csv", None),
            Step::checkpoint("minibreak_comp"),
            Step::block(Comprehension, "block2_comp.csv", None),
            Step::checkpoint("transition_blocks"),
            Step::checkpoint("instructions_prod"),
            Step::examples(TrialMode::Production, "1"),
            Step::checkpoint("instructions_prod2"),
            Step::examples(TrialMode::Production, "2"),
            Step::checkpoint("instructions_prod3"),
            Step::examples(TrialMode::Production, "3"),
            Step::checkpoint("instructions_prod4"),
            Step::block(ProductionPractice, "practice.csv", Some("prac_production")),
            Step::checkpoint("transition_prod"),
            Step::block(Production, "block3_prod.csv", None),
            Step::checkpoint("minibreak_prod"),
            Step::block(Production, "block4_prod.csv", None),
            Step::checkpoint("transition_survey"),
            Step::form("postexp_survey"),
            Step::SendResults,
            Step::checkpoint("prolific_code"),
        ])
    }

    /// Distinct stimulus table names, in first-use order.
    pub fn tables(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for table in self.steps.iter().filter_map(Step::table) {
            if !names.contains(&table) {
                names.push(table);
            }
        }
        names
    }

    /// Loads every table the script names from `dir`.
    pub fn load_tables(&self, dir: &Path) -> Result<HashMap<String, StimulusTable>, ExperimentError> {
        let mut tables = HashMap::new();
        for name in self.tables() {
            let table = StimulusTable::from_path(&dir.join(name))?;
            debug!(table = %name, rows = table.len(), "loaded stimuli");
            tables.insert(name.to_string(), table);
        }
        Ok(tables)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BlockSummary {
    pub kind: BlockKind,
    pub table: String,
    pub trials: usize,
    pub accuracy: Option<f64>,
}

/// What a finished (or aborted) session produced.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub participant: ParticipantId,
    pub trials: u64,
    pub blocks: Vec<BlockSummary>,
    pub results: Vec<TrialResult>,
    pub finished: bool,
}

/// One participant's run through a script.
pub struct Session<T: Timer = TokioTimer> {
    context: SessionContext,
    sequencer: BlockSequencer<T>,
    collaborators: Collaborators,
    tables: HashMap<String, StimulusTable>,
}

impl Session<TokioTimer> {
    pub fn new(
        participant: ParticipantId,
        collaborators: Collaborators,
        config: ExperimentConfig,
        tables: HashMap<String, StimulusTable>,
    ) -> Self {
        Self::with_timer(participant, collaborators, config, tables, TokioTimer::new())
    }
}

impl<T: Timer> Session<T> {
    pub fn with_timer(
        participant: ParticipantId,
        collaborators: Collaborators,
        config: ExperimentConfig,
        tables: HashMap<String, StimulusTable>,
        timer: T,
    ) -> Self {
        let runner = TrialRunner::with_timer(collaborators.clone(), config, timer);
        Self {
            context: SessionContext::new(participant),
            sequencer: BlockSequencer::from_runner(runner),
            collaborators,
            tables,
        }
    }

    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    fn table(&self, name: &str) -> Result<&StimulusTable, ExperimentError> {
        self.tables
            .get(name)
            .ok_or_else(|| ExperimentError::UnknownTable(name.to_string()))
    }

    /// Runs every step in order. The session is finished only once the last
    /// step has completed.
    pub async fn run(
        &mut self,
        script: &SessionScript,
        sink: &mut dyn LogSink,
    ) -> Result<SessionSummary, ExperimentError> {
        info!(participant = %self.context.participant(), steps = script.steps.len(), "session started");
        let mut blocks = Vec::new();
        let mut results = Vec::new();
        let mut previous_block = false;

        for step in &script.steps {
            if previous_block && matches!(step, Step::Block { .. }) {
                self.sequencer.checkpoint(TRANSITION).await?;
            }
            previous_block = matches!(step, Step::Block { .. });

            match step {
                Step::RecordingCheck => {
                    recording_check(&self.collaborators, self.context.participant()).await?;
                }
                Step::Form { label } => {
                    fill_form(&self.collaborators, label).await?;
                }
                Step::Checkpoint { label } => self.sequencer.checkpoint(label).await?,
                Step::Block {
                    kind,
                    table,
                    condition,
                } => {
                    let source = self.table(table)?;
                    let specs = match condition {
                        Some(c) => source.filter_condition(c).trials,
                        None => source.trials.clone(),
                    };
                    validate(&specs)?;

                    let block = self
                        .sequencer
                        .run_block(&mut self.context, &specs, *kind, sink)
                        .await?;
                    blocks.push(BlockSummary {
                        kind: *kind,
                        table: table.clone(),
                        trials: block.len(),
                        accuracy: self.context.running_accuracy(*kind),
                    });
                    results.extend(block);
                }
                Step::Examples { mode, table, set } => {
                    let source = self.table(table)?;
                    let specs = match set {
                        Some(s) => source.filter_example_set(s).trials,
                        None => source.trials.clone(),
                    };
                    validate(&specs)?;
                    self.sequencer.run_examples(&specs, *mode).await?;
                }
                Step::SendRecordings {
                    mode: UploadMode::Async,
                } => self.sequencer.send_async(),
                Step::SendRecordings {
                    mode: UploadMode::Sync,
                } => self.sequencer.flush_uploads().await?,
                Step::SendResults => {
                    sink.flush()?;
                    info!(rows = results.len(), "results sent");
                }
            }
        }

        self.sequencer.drain_pending().await;
        self.context.mark_finished();
        info!(
            participant = %self.context.participant(),
            trials = self.context.trial_number(),
            "session finished"
        );

        Ok(SessionSummary {
            participant: self.context.participant().clone(),
            trials: self.context.trial_number(),
            blocks,
            results,
            finished: self.context.is_finished(),
        })
    }
}

fn validate(specs: &[TrialSpec]) -> Result<(), ExperimentError> {
    for spec in specs {
        spec.validate()?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_script_names_six_tables() {
        let script = SessionScript::standard();
        assert_eq!(
            script.tables(),
            vec![
                EXAMPLES_TABLE,
                "practice.csv",
                "block1_comp.csv",
                "block2_comp.csv",
                "block3_prod.csv",
                "block4_prod.csv"
            ]
        );
        assert_eq!(script.steps.last(), Some(&Step::checkpoint("prolific_code")));
    }

    #[test]
    fn standard_script_never_puts_blocks_back_to_back() {
        let script = SessionScript::standard();
        for pair in script.steps.windows(2) {
            assert!(
                !(matches!(pair[0], Step::Block { .. }) && matches!(pair[1], Step::Block { .. })),
                "{pair:?}"
            );
        }
    }

    #[test]
    fn examples_precede_each_practice_block() {
        let script = SessionScript::standard();
        let sets: Vec<_> = script
            .steps
            .iter()
            .filter_map(|step| match step {
                Step::Examples { mode, set, .. } => Some((*mode, set.as_deref())),
                _ => None,
            })
            .collect();
        assert_eq!(
            sets,
            vec![
                (TrialMode::Comprehension, Some("4")),
                (TrialMode::Production, Some("1")),
                (TrialMode::Production, Some("2")),
                (TrialMode::Production, Some("3")),
            ]
        );

        let position = |wanted: &Step| script.steps.iter().position(|s| s == wanted).unwrap();
        assert!(
            position(&Step::examples(TrialMode::Comprehension, "4"))
                < position(&Step::block(BlockKind::ComprehensionPractice, "practice.csv", Some("prac_comprehension")))
        );
        assert!(
            position(&Step::examples(TrialMode::Production, "3"))
                < position(&Step::block(BlockKind::ProductionPractice, "practice.csv", Some("prac_production")))
        );
    }

    #[test]
    fn script_round_trips_through_toml() {
        let script = SessionScript::standard();
        let text = toml::to_string(&script).unwrap();
        assert!(text.contains("type = \"recording_check\""));
        let back: SessionScript = toml::from_str(&text).unwrap();
        assert_eq!(back, script);
    }

    #[test]
    fn summary_serializes_block_kinds_in_snake_case() {
        let summary = SessionSummary {
            participant: ParticipantId::parse("abc123").unwrap(),
            trials: 1,
            blocks: vec![BlockSummary {
                kind: BlockKind::ProductionPractice,
                table: "practice.csv".into(),
                trials: 1,
                accuracy: None,
            }],
            results: Vec::new(),
            finished: true,
        };
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["participant"], "abc123");
        assert_eq!(json["blocks"][0]["kind"], "production_practice");
        assert_eq!(json["blocks"][0]["accuracy"], serde_json::Value::Null);
        assert_eq!(json["finished"], true);
    }
}
