//! Per-field value rules for imported cells
//!
//! Rules are keyed by view-field label (the column header the operator
//! sees). Fields without a rule accept any value.

use crate::error::{Result, SyncError};
use std::collections::HashMap;
use uuid::Uuid;

const BOOLEAN_VALUES: &[&str] = &["true", "false"];
const FRAME_RATES: &[&str] = &[
    "23.976", "23.98", "24", "25", "29.97", "30", "50", "59.94", "60",
];
const FRAME_RATE_MODES: &[&str] = &["Constant", "Variable"];
const AI_PROCESSES: &[&str] = &["Transcription", "Object Recognition", "Sports Classification"];
const CONTENT_CATEGORIES: &[&str] = &[
    "Demo Content",
    "Case Studies",
    "Promotional",
    "Projects",
    "Internal",
    "Miscellaneous",
];

/// Constraint on a single metadata value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldRule {
    /// Value must be one of a fixed set (case-sensitive)
    OneOf(Vec<String>),
    /// Value must parse as a whole number
    Integer,
}

impl FieldRule {
    pub fn one_of(values: &[&str]) -> Self {
        Self::OneOf(values.iter().map(|v| v.to_string()).collect())
    }

    pub fn check(&self, field: &str, value: &str) -> Result<()> {
        let reason = match self {
            Self::OneOf(allowed) if allowed.iter().any(|a| a == value) => return Ok(()),
            Self::OneOf(allowed) => format!(
                "invalid value for {}. Valid values are: {}. The value is currently set to: {}",
                field,
                allowed.join(", "),
                value
            ),
            Self::Integer if value.parse::<i64>().is_ok() => return Ok(()),
            Self::Integer => format!(
                "for {} the value must be set to an integer. The value is currently set to: {}",
                field, value
            ),
        };

        Err(SyncError::Validation {
            field: field.to_string(),
            value: value.to_string(),
            reason,
        })
    }
}

/// Label -> rule table
#[derive(Debug, Clone, Default)]
pub struct FieldRules {
    rules: HashMap<String, FieldRule>,
}

impl FieldRules {
    /// No rules; every value is accepted.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The rule table for the delivery metadata view.
    pub fn builtin() -> Self {
        let mut rules = Self::empty();
        for label in ["Signed off", "Archived", "Can not be share", "SAP Product Asset"] {
            rules = rules.with_rule(label, FieldRule::one_of(BOOLEAN_VALUES));
        }
        for label in ["Frame Rate", "Audio Frame Rate"] {
            rules = rules.with_rule(label, FieldRule::one_of(FRAME_RATES));
        }
        rules
            .with_rule("Frame Rate Mode", FieldRule::one_of(FRAME_RATE_MODES))
            .with_rule("AI Process", FieldRule::one_of(AI_PROCESSES))
            .with_rule("Content Categories", FieldRule::one_of(CONTENT_CATEGORIES))
            .with_rule("Archive Delay, days", FieldRule::Integer)
    }

    pub fn with_rule(mut self, label: impl Into<String>, rule: FieldRule) -> Self {
        self.rules.insert(label.into(), rule);
        self
    }

    pub fn rule_for(&self, label: &str) -> Option<&FieldRule> {
        self.rules.get(label)
    }

    /// Check one (already split and trimmed) value of the column `label`.
    pub fn validate(&self, label: &str, value: &str) -> Result<()> {
        match self.rule_for(label) {
            Some(rule) => rule.check(label, value),
            None => Ok(()),
        }
    }
}

/// Whether `id` is syntactically a catalog asset identifier (a UUID).
pub fn is_valid_asset_id(id: &str) -> bool {
    Uuid::parse_str(id.trim()).is_ok()
}
