use std::time::Duration;

use clozex_core::{BlockKind, KeyResult, TimeoutFlag, TrialMode, TrialResult, TrialSpec, TrialState};
use clozex_timing::{Race, Timer, TokioTimer, race_deadline};
use tracing::{debug, info};

use crate::config::ExperimentConfig;
use crate::error::ExperimentError;
use crate::host::{Collaborators, Screen};
use crate::session::{SessionContext, TrialCounters};

/// Runs the steps of a single trial and produces its result.
pub struct TrialRunner<T: Timer = TokioTimer> {
    collaborators: Collaborators,
    config: ExperimentConfig,
    timer: T,
}

impl TrialRunner<TokioTimer> {
    pub fn new(collaborators: Collaborators, config: ExperimentConfig) -> Self {
        Self::with_timer(collaborators, config, TokioTimer::new())
    }
}

impl<T: Timer> TrialRunner<T> {
    pub fn with_timer(collaborators: Collaborators, config: ExperimentConfig, timer: T) -> Self {
        Self {
            collaborators,
            config,
            timer,
        }
    }

    pub fn config(&self) -> &ExperimentConfig {
        &self.config
    }

    pub fn timer(&self) -> &T {
        &self.timer
    }

    pub fn collaborators(&self) -> &Collaborators {
        &self.collaborators
    }

    /// Runs `spec` as a trial of `kind`. Counters must already be assigned.
    pub async fn run(
        &self,
        session: &mut SessionContext,
        spec: &TrialSpec,
        kind: BlockKind,
        counters: TrialCounters,
    ) -> Result<TrialResult, ExperimentError> {
        let mut result = TrialResult::new(kind, &spec.item_num, counters.global, counters.block);
        debug!(
            trial = counters.global,
            block = %kind,
            item = %spec.item_num,
            "trial started"
        );

        match kind.mode() {
            TrialMode::Comprehension => self.run_comprehension(session, spec, kind, &mut result).await?,
            TrialMode::Production => self.run_production(session, spec, kind, &mut result).await?,
        }

        result.advance(TrialState::Idle);
        debug!(
            trial = counters.global,
            correct = %result.correctness,
            latency_ms = ?result.latency_ms,
            "trial complete"
        );
        Ok(result)
    }

    /// Runs an instruction example. Examples take no input besides the
    /// continue key and leave counters and accuracy alone.
    pub async fn run_example(&self, spec: &TrialSpec, mode: TrialMode) -> Result<(), ExperimentError> {
        let host = &self.collaborators.host;
        debug!(item = %spec.item_num, ?mode, "example started");

        host.reveal_sentence(&spec.sentence).await?;
        match (mode, spec.question.as_deref(), spec.answer) {
            (TrialMode::Comprehension, Some(question), Some(answer)) => {
                host.display(Screen::ExampleQuestion {
                    question: question.to_string(),
                })
                .await?;
                self.timer.sleep(self.config.example_decision()).await;
                host.display(Screen::ExampleAnswer {
                    question: question.to_string(),
                    answer,
                })
                .await?;
                self.timer.sleep(self.config.example_answer()).await;
            }
            (TrialMode::Comprehension, ..) => {}
            (TrialMode::Production, ..) => {
                if let Some(audio) = &spec.audio {
                    host.play_audio(audio).await?;
                }
                self.timer.sleep(self.config.example()).await;
            }
        }

        host.display(Screen::ContinuePrompt).await?;
        host.wait_continue().await?;
        Ok(())
    }

    async fn run_comprehension(
        &self,
        session: &mut SessionContext,
        spec: &TrialSpec,
        kind: BlockKind,
        result: &mut TrialResult,
    ) -> Result<(), ExperimentError> {
        let host = &self.collaborators.host;

        host.reveal_sentence(&spec.sentence).await?;
        result.advance(TrialState::SentenceRevealed);

        let answered = match (spec.has_question.is_yes(), spec.answer) {
            (true, Some(expected)) => {
                result.advance(TrialState::QuestionPhase);
                let question = spec.question.as_deref().unwrap_or_default();
                result.advance(TrialState::ResponsePhase);

                let start = self.timer.now();
                let race = match self.config.comprehension_window() {
                    Some(limit) => race_deadline(&self.timer, host.ask_question(question), limit).await,
                    None => {
                        let value = host.ask_question(question).await;
                        Race::Input {
                            value,
                            elapsed: self.timer.elapsed(start),
                        }
                    }
                };
                result.latency_ms = Some(race.elapsed().as_millis() as u64);
                let key_result = match race {
                    Race::Input { value, .. } => {
                        if value? == expected {
                            KeyResult::Correct
                        } else {
                            KeyResult::Incorrect
                        }
                    }
                    Race::Deadline { .. } => KeyResult::Timeout,
                };
                result.correctness = key_result.into();
                if kind.tracks_accuracy() {
                    session.record_answer(kind, key_result == KeyResult::Correct);
                }
                true
            }
            _ => {
                // no question: correctness stays NA and nothing is appended
                result.advance(TrialState::ResponsePhase);
                false
            }
        };
        result.running_accuracy = session.running_accuracy(kind);

        result.advance(TrialState::FeedbackPhase);
        if answered && kind.always_shows_feedback() {
            host.display(Screen::Feedback {
                correctness: result.correctness,
                running_accuracy: result.running_accuracy.filter(|_| self.config.debug_mode),
            })
            .await?;
            self.timer.sleep(self.config.feedback()).await;
        } else if answered && self.config.debug_mode {
            host.display(Screen::Feedback {
                correctness: result.correctness,
                running_accuracy: result.running_accuracy,
            })
            .await?;
        }

        self.continue_prompt(result).await?;
        Ok(())
    }

    async fn run_production(
        &self,
        session: &mut SessionContext,
        spec: &TrialSpec,
        kind: BlockKind,
        result: &mut TrialResult,
    ) -> Result<(), ExperimentError> {
        let host = &self.collaborators.host;
        let recorder = &self.collaborators.recorder;

        let recording = (kind.records_audio() && self.config.record_mode)
            .then(|| spec.recording_filename(session.participant()));
        session.set_current_recording(recording.clone());
        result.recording = recording.clone();

        host.reveal_sentence(&spec.sentence).await?;
        result.advance(TrialState::SentenceRevealed);
        if let Some(filename) = &recording {
            recorder.start(filename).await?;
        }

        result.advance(TrialState::ResponsePhase);
        let limit = self.config.production_timeout();
        host.display(Screen::ProductionCue).await?;
        let race = race_deadline(&self.timer, host.wait_stop_key(), limit).await;

        // capture keeps running for the spillover while the trial finishes
        let stop_capture = async {
            match &recording {
                Some(filename) => {
                    self.timer.sleep(self.config.spillover()).await;
                    debug!(%filename, "stopping capture");
                    recorder.stop(filename).await
                }
                None => Ok(()),
            }
        };
        let finish = async {
            let (flag, latency) = match race {
                Race::Input { value, elapsed } => {
                    value?;
                    (TimeoutFlag::NoTimeOut, elapsed)
                }
                Race::Deadline { limit } => (TimeoutFlag::TimedOut, limit),
            };
            self.finish_production(result, flag, latency).await
        };

        let (stopped, finished) = tokio::join!(stop_capture, finish);
        finished?;
        stopped?;
        Ok(())
    }

    async fn finish_production(
        &self,
        result: &mut TrialResult,
        flag: TimeoutFlag,
        latency: Duration,
    ) -> Result<(), ExperimentError> {
        let host = &self.collaborators.host;
        let latency_ms = latency.as_millis() as u64;
        result.timeout = Some(flag);
        result.latency_ms = Some(latency_ms);

        result.advance(TrialState::FeedbackPhase);
        if self.config.debug_mode {
            host.display(Screen::ProductionTime { latency_ms }).await?;
        }
        if flag == TimeoutFlag::TimedOut {
            info!(item = %result.item_num, "production timed out");
            host.display(Screen::TimeoutWarning).await?;
            self.timer.sleep(self.config.timeout_warning()).await;
        }

        self.continue_prompt(result).await
    }

    async fn continue_prompt(&self, result: &mut TrialResult) -> Result<(), ExperimentError> {
        let host = &self.collaborators.host;
        result.advance(TrialState::ContinuePrompt);
        host.display(Screen::ContinuePrompt).await?;
        host.wait_continue().await?;
        Ok(())
    }
}
