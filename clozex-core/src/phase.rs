use serde::{Deserialize, Serialize};

/// Which response a trial collects after the sentence is revealed.
#[derive(Copy, Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrialMode {
    Comprehension,
    Production,
}

/// Kind of block a trial belongs to. Drives every branch of the trial runner.
#[derive(Copy, Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    ComprehensionPractice,
    #[default]
    Comprehension,
    ProductionPractice,
    Production,
}

impl BlockKind {
    pub fn mode(&self) -> TrialMode {
        match self {
            Self::ComprehensionPractice | Self::Comprehension => TrialMode::Comprehension,
            Self::ProductionPractice | Self::Production => TrialMode::Production,
        }
    }

    pub fn is_practice(&self) -> bool {
        matches!(self, Self::ComprehensionPractice | Self::ProductionPractice)
    }

    /// Practice production never captures audio.
    pub fn records_audio(&self) -> bool {
        matches!(self, Self::Production)
    }

    /// Whether answers feed the running accuracy of the kind.
    pub fn tracks_accuracy(&self) -> bool {
        self.mode() == TrialMode::Comprehension
    }

    pub fn uploads_recordings(&self) -> bool {
        self.records_audio()
    }

    /// Practice blocks always show answer feedback, main blocks only in debug mode.
    pub fn always_shows_feedback(&self) -> bool {
        matches!(self, Self::ComprehensionPractice)
    }

    /// Value of the `Block` log column.
    pub fn label(&self) -> &'static str {
        match self {
            Self::ComprehensionPractice => "ComprehensionPractice",
            Self::Comprehension => "Comprehension",
            Self::ProductionPractice => "ProductionPractice",
            Self::Production => "Production",
        }
    }
}

impl std::fmt::Display for BlockKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
