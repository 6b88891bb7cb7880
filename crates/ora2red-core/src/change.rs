//! Change-log records and per-file deduplication state

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// One rule's effect on one line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEntry {
    /// 1-based line number
    pub line: usize,
    /// Description of the rule that fired
    pub description: String,
    /// Source text of the rule's pattern
    pub pattern: String,
    /// The original line, indentation included
    pub before: String,
    /// The line right after this rule fired, indentation reattached
    pub after: String,
    pub manual_review: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manual_reason: Option<String>,
}

impl ChangeEntry {
    pub fn key(&self) -> ChangeKey {
        ChangeKey::new(self.line, &self.description, &self.pattern)
    }

    /// Render as a before/after block for plain-text change logs
    pub fn render(&self) -> String {
        format!("{}\n- {}\n+ {}", self, self.before, self.after)
    }
}

impl fmt::Display for ChangeEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[Line {}] {}", self.line, self.description)?;
        if self.manual_review {
            match &self.manual_reason {
                Some(reason) => write!(f, " (manual review: {})", reason)?,
                None => write!(f, " (manual review)")?,
            }
        }
        Ok(())
    }
}

/// Deduplication key of a change-log entry: at most one entry per rule per line
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChangeKey {
    pub line: usize,
    pub description: String,
    pub pattern: String,
}

impl ChangeKey {
    pub fn new(line: usize, description: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self {
            line,
            description: description.into(),
            pattern: pattern.into(),
        }
    }
}

/// Keys already logged while converting one file.
///
/// Create one per file; never share it between files.
#[derive(Debug, Default, Clone)]
pub struct SeenChanges {
    keys: HashSet<ChangeKey>,
}

impl SeenChanges {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &ChangeKey) -> bool {
        self.keys.contains(key)
    }

    /// Mark a key as logged. Returns `false` if it already was.
    pub fn insert(&mut self, key: ChangeKey) -> bool {
        self.keys.insert(key)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}
