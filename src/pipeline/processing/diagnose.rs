use crate::types::{Defect, TextValue};

/// Classifies a record's text field as clean or names the single defect that applies.
///
/// Rules are evaluated in a fixed precedence so exactly one defect is reported:
/// missing, wrong type, empty after trimming, no alphanumeric characters, too long.
#[derive(Debug, Clone)]
pub struct Diagnoser {
    max_text_length: usize,
}

impl Diagnoser {
    pub fn new(max_text_length: usize) -> Self {
        Self { max_text_length }
    }

    pub fn max_text_length(&self) -> usize {
        self.max_text_length
    }

    pub fn diagnose(&self, text: &TextValue) -> Defect {
        match text {
            TextValue::Missing => Defect::Missing,
            TextValue::WrongType(_) => Defect::WrongType,
            TextValue::Text(s) => self.diagnose_str(s),
        }
    }

    /// Diagnose a value already known to be a string
    pub fn diagnose_str(&self, text: &str) -> Defect {
        if text.trim().is_empty() {
            Defect::Empty
        } else if !text.chars().any(char::is_alphanumeric) {
            Defect::NoAlphanumeric
        } else if text.chars().count() > self.max_text_length {
            Defect::TooLong
        } else {
            Defect::None
        }
    }
}
