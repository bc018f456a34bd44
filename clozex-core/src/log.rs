//! The flat per-trial log row. This is the persisted output of a session.

use serde::{Deserialize, Serialize};

use crate::phase::TrialMode;
use crate::stimulus::{ParticipantId, TrialSpec};
use crate::trial::TrialResult;

/// Placeholder for values that do not apply to a row.
pub const NA: &str = "NA";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    #[serde(rename = "UniqueID")]
    pub unique_id: String,
    #[serde(rename = "LatinList")]
    pub latin_list: String,
    #[serde(rename = "Block")]
    pub block: String,
    #[serde(rename = "ExpItemNum")]
    pub item_num: String,
    #[serde(rename = "ExpItemType")]
    pub item_type: String,
    #[serde(rename = "ExpCondition")]
    pub condition: String,
    #[serde(rename = "TargetPosition")]
    pub target_position: String,
    #[serde(rename = "TargetWord")]
    pub target_word: String,
    #[serde(rename = "TargetFreq")]
    pub target_freq: String,
    #[serde(rename = "SentenceEnd")]
    pub sentence_end: String,
    #[serde(rename = "TrialCounterGlobal")]
    pub counter_global: String,
    #[serde(rename = "TrialCounterBlock")]
    pub counter_block: String,
    #[serde(rename = "TargetAnswer")]
    pub target_answer: String,
    #[serde(rename = "QuestionText")]
    pub question: String,
    #[serde(rename = "CorrectAnswer")]
    pub correct: String,
    #[serde(rename = "AnswerTime")]
    pub answer_time: String,
    #[serde(rename = "ProductionTimeout")]
    pub production_timeout: String,
    #[serde(rename = "RecordingFilename")]
    pub recording: String,
    #[serde(rename = "RunningAccuracy")]
    pub running_accuracy: String,
}

fn or_na<T: ToString>(value: Option<T>) -> String {
    value.map_or_else(|| NA.to_string(), |v| v.to_string())
}

fn text_or_na(value: &str) -> String {
    if value.is_empty() {
        NA.to_string()
    } else {
        value.to_string()
    }
}

impl LogRecord {
    pub fn new(participant: &ParticipantId, spec: &TrialSpec, result: &TrialResult) -> Self {
        let comprehension = result.block.mode() == TrialMode::Comprehension;
        let counter_block = if result.block.is_practice() {
            NA.to_string()
        } else {
            result.block_counter.to_string()
        };

        Self {
            unique_id: participant.to_string(),
            latin_list: text_or_na(&spec.latin_list),
            block: result.block.label().to_string(),
            item_num: text_or_na(&spec.item_num),
            item_type: text_or_na(&spec.item_type),
            condition: text_or_na(&spec.condition),
            target_position: text_or_na(&spec.target_position),
            target_word: text_or_na(&spec.target_word),
            target_freq: text_or_na(&spec.target_freq),
            sentence_end: text_or_na(&spec.sentence_end),
            counter_global: result.global_counter.to_string(),
            counter_block,
            target_answer: or_na(spec.answer.filter(|_| comprehension).map(|k| k.key())),
            question: or_na(spec.question.as_deref().filter(|_| comprehension)),
            correct: result.correctness.to_string(),
            answer_time: or_na(result.latency_ms),
            production_timeout: or_na(result.timeout),
            recording: or_na(result.recording.as_deref()),
            running_accuracy: or_na(result.running_accuracy),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::phase::BlockKind;
    use crate::stimulus::ResponseKey;
    use crate::trial::{Correctness, TimeoutFlag};

    fn participant() -> ParticipantId {
        ParticipantId::parse("x9y8z7").unwrap()
    }

    #[test]
    fn comprehension_without_question_is_na() {
        let spec = TrialSpec::new("4", "filler", "He drank a glass of");
        let mut result = TrialResult::new(BlockKind::Comprehension, "4", 9, 2);
        result.running_accuracy = Some(0.5);

        let row = LogRecord::new(&participant(), &spec, &result);
        assert_eq!(row.correct, "NA");
        assert_eq!(row.target_answer, "NA");
        assert_eq!(row.question, "NA");
        assert_eq!(row.production_timeout, "NA");
        assert_eq!(row.counter_global, "9");
        assert_eq!(row.counter_block, "2");
        assert_eq!(row.running_accuracy, "0.5");
    }

    #[test]
    fn production_row_carries_timeout_and_recording() {
        let spec = TrialSpec::new("11", "high", "The pilot landed the")
            .with_question("unused", ResponseKey::Left);
        let mut result = TrialResult::new(BlockKind::Production, "11", 40, 3);
        result.latency_ms = Some(4000);
        result.timeout = Some(TimeoutFlag::TimedOut);
        result.recording = Some(spec.recording_filename(&participant()));

        let row = LogRecord::new(&participant(), &spec, &result);
        assert_eq!(row.block, "Production");
        assert_eq!(row.answer_time, "4000");
        assert_eq!(row.production_timeout, "TimedOut");
        assert_eq!(row.recording, "recorder_x9y8z7_11_high");
        assert_eq!(row.target_answer, "NA");
        assert_eq!(row.running_accuracy, "NA");
    }

    #[test]
    fn practice_rows_have_no_block_counter() {
        let spec = TrialSpec::new("p1", "prac_comprehension", "Practice")
            .with_question("Was it practice?", ResponseKey::Right);
        let mut result = TrialResult::new(BlockKind::ComprehensionPractice, "p1", 1, 1);
        result.correctness = Correctness::Correct;
        let row = LogRecord::new(&participant(), &spec, &result);
        assert_eq!(row.counter_block, "NA");
        assert_eq!(row.target_answer, "K");
        assert_eq!(row.correct, "true");
    }
}
