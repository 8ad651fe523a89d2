use serde::{Deserialize, Serialize};
use std::fmt;

/// The text field of an input record, captured at ingestion so downstream
/// stages never have to inspect raw JSON types.
#[derive(Debug, Clone, PartialEq)]
pub enum TextValue {
    /// Key absent or explicitly null
    Missing,
    /// Present but not a string (number, bool, array, object)
    WrongType(serde_json::Value),
    /// A string, possibly blank
    Text(String),
}

impl From<Option<&serde_json::Value>> for TextValue {
    fn from(value: Option<&serde_json::Value>) -> Self {
        match value {
            None | Some(serde_json::Value::Null) => TextValue::Missing,
            Some(serde_json::Value::String(s)) => TextValue::Text(s.clone()),
            Some(other) => TextValue::WrongType(other.clone()),
        }
    }
}

/// One review record as read from the input batch
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub id: String,
    pub text: TextValue,
    pub stars: Option<u8>,
}

impl Record {
    pub fn new(id: impl Into<String>, text: TextValue, stars: Option<u8>) -> Self {
        Self {
            id: id.into(),
            text,
            stars,
        }
    }
}

/// Why a record's text cannot be sent to inference as-is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Defect {
    None,
    Missing,
    Empty,
    WrongType,
    NoAlphanumeric,
    TooLong,
}

impl Defect {
    pub const ALL: [Defect; 6] = [
        Defect::None,
        Defect::Missing,
        Defect::Empty,
        Defect::WrongType,
        Defect::NoAlphanumeric,
        Defect::TooLong,
    ];

    pub fn is_defect(self) -> bool {
        self != Defect::None
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Defect::None => "NONE",
            Defect::Missing => "MISSING",
            Defect::Empty => "EMPTY",
            Defect::WrongType => "WRONG_TYPE",
            Defect::NoAlphanumeric => "NO_ALPHANUMERIC",
            Defect::TooLong => "TOO_LONG",
        }
    }
}

impl fmt::Display for Defect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Repair applied by the healer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HealingAction {
    None,
    FillPlaceholder,
    ConvertType,
    ReplaceMarker,
    Truncate,
}

impl HealingAction {
    pub fn as_str(self) -> &'static str {
        match self {
            HealingAction::None => "NONE",
            HealingAction::FillPlaceholder => "FILL_PLACEHOLDER",
            HealingAction::ConvertType => "CONVERT_TYPE",
            HealingAction::ReplaceMarker => "REPLACE_MARKER",
            HealingAction::Truncate => "TRUNCATE",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

impl Sentiment {
    pub const ALL: [Sentiment; 3] = [Sentiment::Positive, Sentiment::Negative, Sentiment::Neutral];

    /// Parse a label as returned by the inference service. Case-insensitive.
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_ascii_uppercase().as_str() {
            "POSITIVE" => Some(Sentiment::Positive),
            "NEGATIVE" => Some(Sentiment::Negative),
            "NEUTRAL" => Some(Sentiment::Neutral),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Sentiment::Positive => "POSITIVE",
            Sentiment::Negative => "NEGATIVE",
            Sentiment::Neutral => "NEUTRAL",
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-record processing status. A function of (defect present, inference succeeded).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProcessingStatus {
    Success,
    Healed,
    Degraded,
}

impl ProcessingStatus {
    pub fn from_outcome(defect: Defect, inference_succeeded: bool) -> Self {
        match (inference_succeeded, defect.is_defect()) {
            (false, _) => ProcessingStatus::Degraded,
            (true, false) => ProcessingStatus::Success,
            (true, true) => ProcessingStatus::Healed,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ProcessingStatus::Success => "SUCCESS",
            ProcessingStatus::Healed => "HEALED",
            ProcessingStatus::Degraded => "DEGRADED",
        }
    }
}

impl fmt::Display for ProcessingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
