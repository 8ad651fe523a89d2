use serde::Serialize;

use crate::config::HealingConfig;
use crate::constants::ELLIPSIS;
use crate::types::{Defect, HealingAction, TextValue};

/// Result of applying a single repair to a record's text
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealingOutcome {
    /// Text handed to the classifier
    pub text: String,
    pub action: HealingAction,
    pub healed: bool,
}

/// Pure, deterministic repair of diagnosed text. Never fails.
///
/// Healing is single-pass: a `WRONG_TYPE` value is stringified and the result is
/// not re-diagnosed, even when the stringified form is itself empty or symbol-only.
#[derive(Debug, Clone)]
pub struct Healer {
    config: HealingConfig,
}

impl Healer {
    pub fn new(config: HealingConfig) -> Self {
        Self { config }
    }

    pub fn heal(&self, value: &TextValue, defect: Defect) -> HealingOutcome {
        match defect {
            Defect::None => HealingOutcome {
                text: raw_text(value),
                action: HealingAction::None,
                healed: false,
            },
            Defect::Missing | Defect::Empty => {
                self.repaired(self.config.placeholder_text.clone(), HealingAction::FillPlaceholder)
            }
            Defect::WrongType => self.repaired(raw_text(value), HealingAction::ConvertType),
            Defect::NoAlphanumeric => {
                self.repaired(self.config.marker_text.clone(), HealingAction::ReplaceMarker)
            }
            Defect::TooLong => self.repaired(
                truncate(&raw_text(value), self.config.max_text_length),
                HealingAction::Truncate,
            ),
        }
    }

    fn repaired(&self, text: String, action: HealingAction) -> HealingOutcome {
        HealingOutcome {
            text,
            action,
            healed: true,
        }
    }
}

/// Textual representation of any text value; non-strings render as compact JSON.
fn raw_text(value: &TextValue) -> String {
    match value {
        TextValue::Missing => String::new(),
        TextValue::Text(s) => s.clone(),
        TextValue::WrongType(v) => v.to_string(),
    }
}

/// Cut to `max_chars - len(ELLIPSIS)` characters and append the ellipsis.
/// The result never exceeds `max_chars` characters.
pub fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let keep = max_chars.saturating_sub(ELLIPSIS.chars().count());
    let mut out: String = text.chars().take(keep).collect();
    out.push_str(ELLIPSIS);
    out
}
