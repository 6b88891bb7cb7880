//! Transformation engine
//!
//! Applies a compiled [`RuleSet`] line by line. Within a line, rules run in
//! execution order and each one sees the output of the rules before it.
//! Every change is logged once per (line, description, pattern) within a
//! file; the running text is updated whether or not the entry was new.

use std::borrow::Cow;

use ora2red_core::{route_kind, ChangeEntry, ChangeKey, SeenChanges, StatementKind, StatementMap};
use regex::Captures;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::compiler::{CompiledRule, RuleSet};
use crate::review::ReviewScanner;

/// A rule whose replacement refers to a capture group its pattern lacks
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("rule '{description}' (pattern `{pattern}`) references capture group {group} which its pattern does not define (line {line})")]
pub struct RuleApplicationError {
    pub description: String,
    pub pattern: String,
    pub group: String,
    /// 1-based line where the rule was first attempted
    pub line: usize,
}

/// One input line being transformed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unit {
    /// 1-based
    pub line_number: usize,
    /// Leading whitespace of the original line
    pub indent: String,
    /// The line with surrounding whitespace stripped
    pub text: String,
    pub original: String,
}

impl Unit {
    pub fn new(line_number: usize, line: &str) -> Self {
        let body = line.trim_start();
        let indent = &line[..line.len() - body.len()];

        Self {
            line_number,
            indent: indent.to_string(),
            text: body.trim_end().to_string(),
            original: line.to_string(),
        }
    }
}

/// What the engine produced for one unit
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnitOutcome {
    /// Transformed line, indentation reattached
    pub text: String,
    /// Entries not already present in the file's seen set
    pub entries: Vec<ChangeEntry>,
    pub manual_required: bool,
    pub manual_reasons: Vec<String>,
    /// Descriptions of rules that changed this unit, in firing order
    pub fired: Vec<String>,
}

/// Apply `rules` to one unit.
///
/// With `Some(kind)`, rules whose `applicable_to` lacks `kind` are skipped;
/// with `None` every rule is attempted. `seen` is the per-file dedup state.
pub fn apply_unit(
    unit: &Unit,
    kind: Option<StatementKind>,
    rules: &RuleSet,
    seen: &mut SeenChanges,
) -> Result<UnitOutcome, RuleApplicationError> {
    let mut current = unit.text.clone();
    let mut outcome = UnitOutcome::default();

    for rule in rules {
        if let Some(kind) = kind {
            if !rule.applies_to(kind) {
                continue;
            }
        }

        check_groups(rule, unit.line_number)?;

        let new_text = match substitute(rule, &current) {
            Cow::Borrowed(_) => continue,
            Cow::Owned(text) if text == current => continue,
            Cow::Owned(text) => text,
        };

        let key = ChangeKey::new(unit.line_number, rule.description(), rule.pattern());
        if !seen.contains(&key) {
            outcome.entries.push(ChangeEntry {
                line: unit.line_number,
                description: rule.description().to_string(),
                pattern: rule.pattern().to_string(),
                before: unit.original.clone(),
                after: format!("{}{}", unit.indent, new_text),
                manual_review: rule.manual_review_required(),
                manual_reason: rule.manual_reason().map(str::to_string),
            });
            seen.insert(key);
        }
        current = new_text;

        if !outcome.fired.iter().any(|d| d == rule.description()) {
            outcome.fired.push(rule.description().to_string());
        }

        if rule.manual_review_required() {
            outcome.manual_required = true;
            if let Some(reason) = rule.manual_reason() {
                push_unique(&mut outcome.manual_reasons, reason);
            }
        }
    }

    outcome.text = format!("{}{}", unit.indent, current);
    Ok(outcome)
}

fn check_groups(rule: &CompiledRule, line: usize) -> Result<(), RuleApplicationError> {
    match rule.template().missing_group(rule.regex()) {
        Some(group) => Err(RuleApplicationError {
            description: rule.description().to_string(),
            pattern: rule.pattern().to_string(),
            group: group.to_string(),
            line,
        }),
        None => Ok(()),
    }
}

fn substitute<'t>(rule: &CompiledRule, text: &'t str) -> Cow<'t, str> {
    let template = rule.template();
    rule.regex()
        .replace_all(text, |caps: &Captures<'_>| template.render(caps))
}

fn push_unique(list: &mut Vec<String>, value: &str) {
    if !list.iter().any(|v| v == value) {
        list.push(value.to_string());
    }
}

/// Engine behaviour switches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineOptions {
    /// Gate rules by the kind of the statement each line belongs to
    pub gate_by_kind: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self { gate_by_kind: true }
    }
}

/// How a converted script is routed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// No rule changed anything
    NoChange,
    /// Changed, and nothing that fired asked for review
    AutoConverted,
    /// At least one fired rule asked for review
    ManualReview,
}

impl Outcome {
    /// The change-log / manual-flag decision table
    pub fn decide(has_changes: bool, manual_required: bool) -> Self {
        match (has_changes, manual_required) {
            (false, _) => Outcome::NoChange,
            (true, false) => Outcome::AutoConverted,
            (true, true) => Outcome::ManualReview,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::NoChange => "no change",
            Outcome::AutoConverted => "auto-converted",
            Outcome::ManualReview => "manual review",
        }
    }
}

/// Everything the engine knows about one converted script
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScriptResult {
    pub text: String,
    pub changes: Vec<ChangeEntry>,
    /// Descriptions of rules that fired at least once, first firing first
    pub applied_rules: Vec<String>,
    pub manual_required: bool,
    pub manual_reasons: Vec<String>,
    /// Whole-file routing kind
    pub kind: StatementKind,
    /// Review keywords found in the source; informational only
    pub review_keywords: Vec<String>,
}

impl ScriptResult {
    pub fn outcome(&self) -> Outcome {
        Outcome::decide(!self.changes.is_empty(), self.manual_required)
    }

    pub fn is_changed(&self) -> bool {
        !self.changes.is_empty()
    }
}

/// Converts whole scripts with a shared rule set.
///
/// Holds no per-file state, so one converter can serve many files, also
/// from several threads at once.
#[derive(Debug, Clone)]
pub struct Converter<'r> {
    rules: &'r RuleSet,
    options: EngineOptions,
    review: ReviewScanner,
}

impl<'r> Converter<'r> {
    pub fn new(rules: &'r RuleSet) -> Self {
        Self {
            rules,
            options: EngineOptions::default(),
            review: ReviewScanner::default(),
        }
    }

    pub fn with_options(mut self, options: EngineOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_review(mut self, review: ReviewScanner) -> Self {
        self.review = review;
        self
    }

    pub fn rules(&self) -> &RuleSet {
        self.rules
    }

    /// Convert one script.
    ///
    /// Lines are joined with `\n`; a trailing newline in `source` is kept.
    pub fn convert(&self, source: &str) -> Result<ScriptResult, RuleApplicationError> {
        let map = self.options.gate_by_kind.then(|| StatementMap::build(source));
        let mut seen = SeenChanges::new();

        let mut lines = Vec::new();
        let mut changes = Vec::new();
        let mut applied_rules: Vec<String> = Vec::new();
        let mut manual_required = false;
        let mut manual_reasons: Vec<String> = Vec::new();

        for (idx, line) in source.lines().enumerate() {
            let unit = Unit::new(idx + 1, line);
            let kind = map.as_ref().map(|m| m.kind_at(unit.line_number));
            let outcome = apply_unit(&unit, kind, self.rules, &mut seen)?;

            for description in &outcome.fired {
                push_unique(&mut applied_rules, description);
            }
            for reason in &outcome.manual_reasons {
                push_unique(&mut manual_reasons, reason);
            }
            manual_required |= outcome.manual_required;
            changes.extend(outcome.entries);
            lines.push(outcome.text);
        }

        let mut text = lines.join("\n");
        if source.ends_with('\n') {
            text.push('\n');
        }

        Ok(ScriptResult {
            text,
            changes,
            applied_rules,
            manual_required,
            manual_reasons,
            kind: route_kind(source),
            review_keywords: self.review.scan(source),
        })
    }
}
