use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::SpecError;

/// Whether a comprehension question follows the sentence.
#[derive(Copy, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum HasQuestion {
    Yes,
    No,
}

impl HasQuestion {
    /// Only the literal `Yes` asks a question; blank and any other value do not.
    pub fn from_column(value: &str) -> Self {
        if value.trim() == "Yes" {
            HasQuestion::Yes
        } else {
            HasQuestion::No
        }
    }

    pub fn is_yes(&self) -> bool {
        matches!(self, HasQuestion::Yes)
    }
}

/// The two-way comprehension choice. Left is key `D` ("No"), right is key `K` ("Yes").
#[derive(Copy, Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResponseKey {
    Left,
    Right,
}

impl ResponseKey {
    pub fn from_key(key: char) -> Option<Self> {
        match key.to_ascii_uppercase() {
            'D' => Some(ResponseKey::Left),
            'K' => Some(ResponseKey::Right),
            _ => None,
        }
    }

    /// Parses the row-supplied answer key. `NoQ` and blank mean "no answer".
    pub fn from_column(value: &str) -> Result<Option<Self>, SpecError> {
        let value = value.trim();
        if value.is_empty() || value.eq_ignore_ascii_case("NoQ") || value == "NA" {
            return Ok(None);
        }
        let mut chars = value.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Self::from_key(c)
                .map(Some)
                .ok_or_else(|| SpecError::InvalidAnswerKey(value.to_string())),
            _ => Err(SpecError::InvalidAnswerKey(value.to_string())),
        }
    }

    pub fn key(&self) -> char {
        match self {
            ResponseKey::Left => 'D',
            ResponseKey::Right => 'K',
        }
    }
}

/// Immutable description of one trial, built from a stimulus row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialSpec {
    pub item_num: String,
    pub item_type: String,
    pub condition: String,
    pub latin_list: String,
    pub sentence: String,
    pub question: Option<String>,
    pub has_question: HasQuestion,
    pub answer: Option<ResponseKey>,
    pub target_position: String,
    pub target_word: String,
    pub target_freq: String,
    pub sentence_end: String,
    /// Audio asset played with production examples.
    pub audio: Option<String>,
    /// Which instruction example group the row belongs to. Empty for trial rows.
    pub example_set: String,
}

impl TrialSpec {
    /// Minimal spec without question metadata. Used by builders and tests.
    pub fn new(item_num: impl Into<String>, condition: impl Into<String>, sentence: impl Into<String>) -> Self {
        Self {
            item_num: item_num.into(),
            item_type: String::new(),
            condition: condition.into(),
            latin_list: String::new(),
            sentence: sentence.into(),
            question: None,
            has_question: HasQuestion::No,
            answer: None,
            target_position: String::new(),
            target_word: String::new(),
            target_freq: String::new(),
            sentence_end: String::new(),
            audio: None,
            example_set: String::new(),
        }
    }

    pub fn with_question(mut self, question: impl Into<String>, answer: ResponseKey) -> Self {
        self.question = Some(question.into());
        self.has_question = HasQuestion::Yes;
        self.answer = Some(answer);
        self
    }

    pub fn with_audio(mut self, audio: impl Into<String>) -> Self {
        self.audio = Some(audio.into());
        self
    }

    pub fn with_item_type(mut self, item_type: impl Into<String>) -> Self {
        self.item_type = item_type.into();
        self
    }

    /// A question trial without an answer key cannot be scored.
    pub fn validate(&self) -> Result<(), SpecError> {
        if self.has_question.is_yes() && self.answer.is_none() {
            return Err(SpecError::MissingAnswer(self.item_num.clone()));
        }
        Ok(())
    }

    pub fn recording_filename(&self, participant: &ParticipantId) -> String {
        format!("recorder_{}_{}_{}", participant, self.item_num, self.condition)
    }
}

/// Six lowercase base-36 characters attached to every log row and recording.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(String);

const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

impl ParticipantId {
    pub const LEN: usize = 6;

    pub fn generate<R: Rng>(rng: &mut R) -> Self {
        let id = (0..Self::LEN)
            .map(|_| BASE36[rng.random_range(0..BASE36.len())] as char)
            .collect();
        Self(id)
    }

    /// Accepts exactly `LEN` lowercase base-36 characters, the shape `generate` produces.
    pub fn parse(value: &str) -> Result<Self, SpecError> {
        let valid = value.len() == Self::LEN && value.bytes().all(|b| BASE36.contains(&b));
        if valid {
            Ok(Self(value.to_string()))
        } else {
            Err(SpecError::InvalidParticipantId(value.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// File name of the pre-session microphone test.
    pub fn test_recording_filename(&self) -> String {
        format!("test_recorder_{}", self.0)
    }
}

impl std::fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn has_question_only_for_literal_yes() {
        assert_eq!(HasQuestion::from_column("Yes"), HasQuestion::Yes);
        assert_eq!(HasQuestion::from_column(" Yes "), HasQuestion::Yes);
        assert_eq!(HasQuestion::from_column("No"), HasQuestion::No);
        assert_eq!(HasQuestion::from_column(""), HasQuestion::No);
        assert_eq!(HasQuestion::from_column("yes please"), HasQuestion::No);
    }

    #[test]
    fn answer_keys_parse_case_insensitively() {
        assert_eq!(ResponseKey::from_column("D").unwrap(), Some(ResponseKey::Left));
        assert_eq!(ResponseKey::from_column("k").unwrap(), Some(ResponseKey::Right));
        assert_eq!(ResponseKey::from_column("NoQ").unwrap(), None);
        assert_eq!(ResponseKey::from_column("").unwrap(), None);
        assert!(matches!(
            ResponseKey::from_column("Yes"),
            Err(SpecError::InvalidAnswerKey(_))
        ));
    }

    #[test]
    fn question_without_answer_is_rejected() {
        let mut spec = TrialSpec::new("12", "high", "The cat sat on the");
        spec.has_question = HasQuestion::Yes;
        assert!(matches!(spec.validate(), Err(SpecError::MissingAnswer(ref n)) if n == "12"));

        let spec = spec.with_question("Did the cat sit?", ResponseKey::Right);
        assert!(spec.validate().is_ok());
    }

    #[test]
    fn recording_filename_follows_convention() {
        let id = ParticipantId::parse("a1b2c3").unwrap();
        let spec = TrialSpec::new("17", "low", "She poured the");
        assert_eq!(spec.recording_filename(&id), "recorder_a1b2c3_17_low");
        assert_eq!(id.test_recording_filename(), "test_recorder_a1b2c3");
    }

    #[test]
    fn participant_ids_outside_base36_are_rejected() {
        for bad in ["ab_c", "ab_c12", "ABC123", "abc-12", "abc1234", "abc12", "", "UPPER-case_and_very_long_id"] {
            assert!(
                matches!(ParticipantId::parse(bad), Err(SpecError::InvalidParticipantId(ref v)) if v == bad),
                "{bad:?}"
            );
        }
        assert_eq!(ParticipantId::parse("0z9y8x").unwrap().as_str(), "0z9y8x");
    }

    #[test]
    fn generated_ids_are_six_base36_chars() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let id = ParticipantId::generate(&mut rng);
            assert_eq!(id.as_str().len(), ParticipantId::LEN);
            assert_eq!(ParticipantId::parse(id.as_str()).unwrap(), id);
            assert!(id
                .as_str()
                .chars()
                .all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
        }
    }
}
