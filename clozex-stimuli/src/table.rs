use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use clozex_core::{HasQuestion, ResponseKey, TrialSpec};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::StimuliError;

/// One CSV row as written by the stimulus preparation scripts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct StimulusRow {
    #[serde(rename = "ItemNum")]
    item_num: String,
    #[serde(rename = "Type", default)]
    item_type: String,
    #[serde(rename = "ExpCondition", alias = "Condition", default)]
    condition: String,
    #[serde(rename = "Group", alias = "group", default)]
    group: String,
    #[serde(rename = "Sentence")]
    sentence: String,
    #[serde(rename = "Question", default)]
    question: String,
    #[serde(rename = "HasQuestion", default)]
    has_question: String,
    #[serde(rename = "Answer", alias = "AnswerKey", default)]
    answer: String,
    #[serde(rename = "TargetPosition", default)]
    target_position: String,
    #[serde(rename = "TargetWord", default)]
    target_word: String,
    #[serde(rename = "Lg10WF", default)]
    target_freq: String,
    #[serde(rename = "End", default)]
    sentence_end: String,
    #[serde(rename = "Audio", alias = "audio", default)]
    audio: String,
    #[serde(rename = "set", alias = "Set", default)]
    example_set: String,
}

impl StimulusRow {
    fn into_spec(self, row: usize) -> Result<TrialSpec, StimuliError> {
        let answer = ResponseKey::from_column(&self.answer)
            .map_err(|source| StimuliError::Spec { row, source })?;
        let question = Some(self.question).filter(|q| !q.trim().is_empty());
        let spec = TrialSpec {
            item_num: self.item_num,
            item_type: self.item_type,
            condition: self.condition,
            latin_list: self.group,
            sentence: self.sentence,
            question,
            has_question: HasQuestion::from_column(&self.has_question),
            answer,
            target_position: self.target_position,
            target_word: self.target_word,
            target_freq: self.target_freq,
            sentence_end: self.sentence_end,
            audio: Some(self.audio).filter(|a| !a.trim().is_empty()),
            example_set: self.example_set,
        };
        spec.validate()
            .map_err(|source| StimuliError::Spec { row, source })?;
        Ok(spec)
    }

    fn from_spec(spec: &TrialSpec) -> Self {
        Self {
            item_num: spec.item_num.clone(),
            item_type: spec.item_type.clone(),
            condition: spec.condition.clone(),
            group: spec.latin_list.clone(),
            sentence: spec.sentence.clone(),
            question: spec.question.clone().unwrap_or_default(),
            has_question: match spec.has_question {
                HasQuestion::Yes => "Yes".to_string(),
                HasQuestion::No => "No".to_string(),
            },
            answer: spec
                .answer
                .map_or_else(|| "NoQ".to_string(), |k| k.key().to_string()),
            target_position: spec.target_position.clone(),
            target_word: spec.target_word.clone(),
            target_freq: spec.target_freq.clone(),
            sentence_end: spec.sentence_end.clone(),
            audio: spec.audio.clone().unwrap_or_default(),
            example_set: spec.example_set.clone(),
        }
    }
}

/// An ordered stimulus table. Row order is presentation order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StimulusTable {
    pub name: String,
    pub trials: Vec<TrialSpec>,
}

impl StimulusTable {
    pub fn new(name: impl Into<String>, trials: Vec<TrialSpec>) -> Self {
        Self {
            name: name.into(),
            trials,
        }
    }

    pub fn from_reader<R: Read>(name: impl Into<String>, reader: R) -> Result<Self, StimuliError> {
        let name = name.into();
        let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let mut trials = Vec::new();
        for (i, row) in rdr.deserialize::<StimulusRow>().enumerate() {
            // header is line 1
            trials.push(row?.into_spec(i + 2)?);
        }
        debug!(table = %name, rows = trials.len(), "loaded stimulus table");
        Ok(Self { name, trials })
    }

    pub fn from_path(path: &Path) -> Result<Self, StimuliError> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self::from_reader(name, File::open(path)?)
    }

    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), StimuliError> {
        let mut wtr = csv::Writer::from_writer(writer);
        for spec in &self.trials {
            wtr.serialize(StimulusRow::from_spec(spec))?;
        }
        wtr.flush()?;
        Ok(())
    }

    /// Rows of one condition, e.g. the `prac_comprehension` rows of a practice table.
    pub fn filter_condition(&self, condition: &str) -> Self {
        Self {
            name: format!("{}[{}]", self.name, condition),
            trials: self
                .trials
                .iter()
                .filter(|t| t.condition == condition)
                .cloned()
                .collect(),
        }
    }

    /// Rows of one instruction example group (`set` column).
    pub fn filter_example_set(&self, set: &str) -> Self {
        Self {
            name: format!("{}[set={}]", self.name, set),
            trials: self
                .trials
                .iter()
                .filter(|t| t.example_set == set)
                .cloned()
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.trials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trials.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PRACTICE: &str = "\
ItemNum,Type,ExpCondition,Group,Sentence,Question,HasQuestion,Answer,TargetWord
p1,Practice,prac_comprehension,1,The dog chased the ball.,Did the dog chase a cat?,Yes,D,ball
p2,Practice,prac_comprehension,1,She opened the window.,,No,NoQ,window
p3,Practice,prac_production,1,He locked the,,No,,door
";

    #[test]
    fn parses_rows_and_tri_state_columns() {
        let table = StimulusTable::from_reader("practice.csv", PRACTICE.as_bytes()).unwrap();
        assert_eq!(table.len(), 3);

        let first = &table.trials[0];
        assert_eq!(first.has_question, HasQuestion::Yes);
        assert_eq!(first.answer, Some(ResponseKey::Left));
        assert_eq!(first.question.as_deref(), Some("Did the dog chase a cat?"));
        assert_eq!(first.latin_list, "1");

        let second = &table.trials[1];
        assert_eq!(second.has_question, HasQuestion::No);
        assert_eq!(second.answer, None);
        assert_eq!(second.question, None);
    }

    #[test]
    fn filters_practice_rows_by_condition() {
        let table = StimulusTable::from_reader("practice.csv", PRACTICE.as_bytes()).unwrap();
        let comp = table.filter_condition("prac_comprehension");
        assert_eq!(comp.len(), 2);
        let prod = table.filter_condition("prac_production");
        assert_eq!(prod.trials[0].item_num, "p3");
    }

    #[test]
    fn example_rows_keep_audio_and_set() {
        let csv = "\
ItemNum,Condition,set,Sentence,Question,Answer,audio
e1,good,1,The baker kneaded the,,,good_dough.mp3
e2,bad,2,The baker kneaded the,,,bad_dough.mp3
e3,comp,4,The girl fed the cat.,Did the girl feed a dog?,D,
";
        let table = StimulusTable::from_reader("stimuli_examples.csv", csv.as_bytes()).unwrap();
        let good = table.filter_example_set("1");
        assert_eq!(good.name, "stimuli_examples.csv[set=1]");
        assert_eq!(good.trials.len(), 1);
        assert_eq!(good.trials[0].audio.as_deref(), Some("good_dough.mp3"));
        assert_eq!(good.trials[0].condition, "good");

        let comp = table.filter_example_set("4");
        assert_eq!(comp.trials[0].audio, None);
        assert_eq!(comp.trials[0].answer, Some(ResponseKey::Left));
        assert!(table.filter_example_set("3").is_empty());
    }

    #[test]
    fn answer_key_column_is_accepted() {
        let csv = "ItemNum,ExpCondition,Sentence,HasQuestion,AnswerKey\n1,high,A sentence.,Yes,K\n";
        let table = StimulusTable::from_reader("t.csv", csv.as_bytes()).unwrap();
        assert_eq!(table.trials[0].answer, Some(ResponseKey::Right));
    }

    #[test]
    fn question_without_answer_reports_row() {
        let csv = "ItemNum,Sentence,HasQuestion,Answer\n1,Fine.,No,\n2,Broken.,Yes,NoQ\n";
        let err = StimulusTable::from_reader("t.csv", csv.as_bytes()).unwrap_err();
        assert!(matches!(err, StimuliError::Spec { row: 3, .. }), "{err}");
    }

    #[test]
    fn written_table_reads_back() {
        let table = StimulusTable::from_reader("practice.csv", PRACTICE.as_bytes()).unwrap();
        let mut out = Vec::new();
        table.write_csv(&mut out).unwrap();
        let again = StimulusTable::from_reader("practice.csv", out.as_slice()).unwrap();
        assert_eq!(again.trials, table.trials);
    }
}
