//! Rule declaration schema
//!
//! Defines the shape of a rule as written in a JSON or YAML rule file.
//! Required fields are `Option`s here so the loader can name the one that is
//! missing; unknown fields are rejected outright.

use ora2red_core::StatementKind;
use serde::{Deserialize, Serialize};

/// Priority of a rule that does not declare one
pub const DEFAULT_PRIORITY: i64 = 1000;

/// Criticality of a rule that does not declare one
pub const DEFAULT_CRITICALITY: &str = "low";

/// Kinds a rule may fire on when `applicable_to` is absent
pub fn default_applicable_to() -> Vec<StatementKind> {
    vec![StatementKind::Ddl, StatementKind::Dml]
}

/// A single rule as declared in a rule file
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RuleDecl {
    /// Case-insensitive regular expression matched against one line
    #[serde(default)]
    pub pattern: Option<String>,

    /// Substitution template; `\1` and `\g<name>` refer to captures
    #[serde(default)]
    pub replacement: Option<String>,

    /// Human-readable label, also part of the change-log dedup key
    #[serde(default)]
    pub description: Option<String>,

    /// Lower runs earlier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<i64>,

    /// Statement kinds this rule may fire on
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub applicable_to: Option<Vec<StatementKind>>,

    /// Any application of this rule needs a human to look at the result
    #[serde(default)]
    pub manual_review_required: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manual_reason: Option<String>,

    /// Advisory only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub criticality: Option<String>,

    /// Advisory only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl RuleDecl {
    /// Shorthand for a rule with only the required fields
    pub fn new(
        pattern: impl Into<String>,
        replacement: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            pattern: Some(pattern.into()),
            replacement: Some(replacement.into()),
            description: Some(description.into()),
            ..Default::default()
        }
    }

    pub fn with_priority(mut self, priority: i64) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_applicable_to(mut self, kinds: &[StatementKind]) -> Self {
        self.applicable_to = Some(kinds.to_vec());
        self
    }

    pub fn with_manual_review(mut self, reason: impl Into<String>) -> Self {
        self.manual_review_required = true;
        self.manual_reason = Some(reason.into());
        self
    }
}
