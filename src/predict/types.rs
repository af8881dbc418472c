use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// Number of classes the network scores.
pub const NUM_CLASSES: usize = 2;

/// Diagnosis returned for an image. Serialized as the bare label string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ClassLabel {
    Benign,
    Malignant,
}

impl ClassLabel {
    /// Labels in output-index order.
    pub const ALL: [ClassLabel; NUM_CLASSES] = [ClassLabel::Benign, ClassLabel::Malignant];

    /// Label for an output index, `None` past the last class.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Output index the label is read from.
    pub fn index(&self) -> usize {
        match self {
            ClassLabel::Benign => 0,
            ClassLabel::Malignant => 1,
        }
    }

    /// The literal label string.
    pub fn as_str(&self) -> &'static str {
        match self {
            ClassLabel::Benign => "Benign",
            ClassLabel::Malignant => "Malignant",
        }
    }
}

impl fmt::Display for ClassLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Label plus the raw scores it was derived from.
#[derive(Debug, Clone, Serialize)]
pub struct Prediction {
    pub path: PathBuf,
    pub label: ClassLabel,
    /// Raw model outputs, index order of [`ClassLabel::ALL`]
    pub scores: [f32; NUM_CLASSES],
    pub elapsed_ms: u64,
}
