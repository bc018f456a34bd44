use std::sync::Arc;

use async_trait::async_trait;
use clozex_core::ResponseKey;
use clozex_experiment::{FormStatus, Host, HostError, Recorder, Screen};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::Mutex;

const FORM_WARNING: &str = "Please fill in the form before continuing.";

/// Terminal host: prints to stdout and reads one line per participant action.
pub struct ConsoleHost {
    lines: Mutex<Lines<BufReader<Stdin>>>,
    recorder: Arc<dyn Recorder>,
}

impl ConsoleHost {
    pub fn new(recorder: Arc<dyn Recorder>) -> Self {
        Self {
            lines: Mutex::new(BufReader::new(tokio::io::stdin()).lines()),
            recorder,
        }
    }

    async fn read_line(&self) -> Result<String, HostError> {
        let mut lines = self.lines.lock().await;
        match lines.next_line().await? {
            Some(line) => Ok(line),
            None => Err(HostError::InputClosed),
        }
    }
}

#[async_trait]
impl Host for ConsoleHost {
    async fn reveal_sentence(&self, sentence: &str) -> Result<(), HostError> {
        println!();
        println!("  {sentence}");
        Ok(())
    }

    async fn ask_question(&self, question: &str) -> Result<ResponseKey, HostError> {
        println!("  {question}   [D] no / [K] yes");
        loop {
            let line = self.read_line().await?;
            let key = line
                .trim()
                .chars()
                .next()
                .and_then(|c| ResponseKey::from_key(c.to_ascii_uppercase()));
            if let Some(key) = key {
                return Ok(key);
            }
        }
    }

    async fn wait_stop_key(&self) -> Result<(), HostError> {
        self.read_line().await?;
        Ok(())
    }

    async fn wait_continue(&self) -> Result<(), HostError> {
        self.read_line().await?;
        Ok(())
    }

    async fn display(&self, screen: Screen) -> Result<(), HostError> {
        match screen {
            Screen::Feedback {
                correctness,
                running_accuracy,
            } => {
                let verdict = match correctness.as_bool() {
                    Some(true) => "Correct!",
                    Some(false) => "Incorrect.",
                    None => "",
                };
                match running_accuracy {
                    Some(acc) => println!("  {verdict} (accuracy {:.0}%)", acc * 100.0),
                    None => println!("  {verdict}"),
                }
            }
            Screen::ProductionCue => println!("  Say the sentence out loud, then press Enter."),
            Screen::ProductionTime { latency_ms } => println!("  ({latency_ms} ms)"),
            Screen::TimeoutWarning => println!("  Too slow!"),
            Screen::ExampleQuestion { question } => println!("  {question}   [D] no / [K] yes"),
            Screen::ExampleAnswer { question, answer } => {
                let choice = match answer {
                    ResponseKey::Left => "[D] no",
                    ResponseKey::Right => "[K] yes",
                };
                println!("  {question}   -> {choice}");
            }
            Screen::ContinuePrompt => println!("  Press Enter to continue."),
            Screen::Warning(text) => println!("  ! {text}"),
        }
        Ok(())
    }

    async fn play_audio(&self, audio: &str) -> Result<(), HostError> {
        println!("  (playing {audio})");
        Ok(())
    }

    async fn checkpoint(&self, label: &str) -> Result<(), HostError> {
        println!();
        println!("--- {label} ---  Press Enter to continue.");
        self.read_line().await?;
        Ok(())
    }

    async fn present_form(&self, label: &str) -> Result<FormStatus, HostError> {
        println!();
        println!("[{label}] Type your answers on one line and press Enter.");
        let line = self.read_line().await?;
        if line.trim().is_empty() {
            Ok(FormStatus::Incomplete {
                warning: FORM_WARNING.to_string(),
            })
        } else {
            Ok(FormStatus::Complete)
        }
    }

    async fn recording_test(&self, filename: &str) -> Result<(), HostError> {
        println!();
        println!("Microphone test. Type \"r\" and press Enter to record, or just Enter to continue.");
        let line = self.read_line().await?;
        if line.trim().eq_ignore_ascii_case("r") {
            self.recorder.start(filename).await?;
            println!("  Recording... press Enter to stop.");
            self.read_line().await?;
            self.recorder.stop(filename).await?;
        }
        Ok(())
    }
}
