//! Rule compilation
//!
//! Turns validated [`RuleDecl`]s into an immutable, priority-ordered
//! [`RuleSet`]. Compilation is all-or-nothing: the first bad declaration
//! fails the whole set.

use ora2red_core::StatementKind;
use regex::{Regex, RegexBuilder};
use std::path::Path;

use crate::loader::{load_rules, RuleLoadError};
use crate::replacer::ReplacementTemplate;
use crate::schema::{default_applicable_to, RuleDecl, DEFAULT_CRITICALITY, DEFAULT_PRIORITY};

/// A rule ready to apply
#[derive(Debug, Clone)]
pub struct CompiledRule {
    description: String,
    pattern: String,
    regex: Regex,
    replacement: String,
    template: ReplacementTemplate,
    priority: i64,
    applicable_to: Vec<StatementKind>,
    manual_review_required: bool,
    manual_reason: Option<String>,
    criticality: String,
    notes: String,
    /// Position in the declaration list, 0-based
    declared_at: usize,
}

impl CompiledRule {
    /// Validate and compile one declaration. `index` is its 0-based position.
    pub fn compile(decl: RuleDecl, index: usize) -> Result<Self, RuleLoadError> {
        let label = decl
            .description
            .clone()
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| "<unnamed>".to_string());
        let missing = |field| RuleLoadError::MissingField {
            index: index + 1,
            field,
            description: label.clone(),
        };

        let description = decl
            .description
            .filter(|d| !d.is_empty())
            .ok_or_else(|| missing("description"))?;
        let pattern = decl
            .pattern
            .filter(|p| !p.is_empty())
            .ok_or_else(|| missing("pattern"))?;
        // An empty replacement is legal: it deletes the match
        let replacement = decl.replacement.ok_or_else(|| missing("replacement"))?;

        let regex = RegexBuilder::new(&pattern)
            .case_insensitive(true)
            .build()
            .map_err(|source| RuleLoadError::InvalidPattern {
                description: description.clone(),
                source,
            })?;

        let template = ReplacementTemplate::parse(&replacement).map_err(|e| {
            RuleLoadError::InvalidReplacement {
                description: description.clone(),
                reason: e.to_string(),
            }
        })?;

        Ok(Self {
            description,
            pattern,
            regex,
            replacement,
            template,
            priority: decl.priority.unwrap_or(DEFAULT_PRIORITY),
            applicable_to: decl.applicable_to.unwrap_or_else(default_applicable_to),
            manual_review_required: decl.manual_review_required,
            manual_reason: decl.manual_reason.filter(|r| !r.is_empty()),
            criticality: decl
                .criticality
                .unwrap_or_else(|| DEFAULT_CRITICALITY.to_string()),
            notes: decl.notes.unwrap_or_default(),
            declared_at: index,
        })
    }

    /// Whether the rule may fire on a statement of `kind`
    pub fn applies_to(&self, kind: StatementKind) -> bool {
        self.applicable_to.contains(&kind)
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Pattern source text, as declared
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn regex(&self) -> &Regex {
        &self.regex
    }

    pub fn replacement(&self) -> &str {
        &self.replacement
    }

    pub fn template(&self) -> &ReplacementTemplate {
        &self.template
    }

    pub fn priority(&self) -> i64 {
        self.priority
    }

    pub fn applicable_to(&self) -> &[StatementKind] {
        &self.applicable_to
    }

    pub fn manual_review_required(&self) -> bool {
        self.manual_review_required
    }

    pub fn manual_reason(&self) -> Option<&str> {
        self.manual_reason.as_deref()
    }

    pub fn criticality(&self) -> &str {
        &self.criticality
    }

    pub fn notes(&self) -> &str {
        &self.notes
    }

    pub fn declared_at(&self) -> usize {
        self.declared_at
    }
}

/// An ordered, immutable sequence of compiled rules.
///
/// Rules are sorted by ascending priority; equal priorities keep declaration
/// order. A `RuleSet` is never mutated after construction and can be shared
/// across threads.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<CompiledRule>,
}

impl RuleSet {
    /// Compile declarations into execution order
    pub fn compile(decls: Vec<RuleDecl>) -> Result<Self, RuleLoadError> {
        let mut rules = decls
            .into_iter()
            .enumerate()
            .map(|(index, decl)| CompiledRule::compile(decl, index))
            .collect::<Result<Vec<_>, _>>()?;

        // sort_by_key is stable
        rules.sort_by_key(|rule| rule.priority);

        Ok(Self { rules })
    }

    /// Load and compile rules from a file or a directory of rule files
    pub fn from_path(path: &Path) -> Result<Self, RuleLoadError> {
        Self::compile(load_rules(path)?)
    }

    /// The Oracle to Redshift rule set shipped with this crate
    pub fn builtin() -> Result<Self, RuleLoadError> {
        Self::compile(crate::builtin::builtin_decls()?)
    }

    /// A copy without the rules named in `descriptions`.
    ///
    /// Every name must match at least one rule.
    pub fn without(&self, descriptions: &[String]) -> Result<Self, RuleLoadError> {
        if let Some(unknown) = descriptions
            .iter()
            .find(|d| !self.rules.iter().any(|r| &r.description == *d))
        {
            return Err(RuleLoadError::UnknownRule(unknown.clone()));
        }

        Ok(Self {
            rules: self
                .rules
                .iter()
                .filter(|r| !descriptions.contains(&r.description))
                .cloned()
                .collect(),
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &CompiledRule> {
        self.rules.iter()
    }

    pub fn rules(&self) -> &[CompiledRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Rule descriptions in execution order
    pub fn descriptions(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.description.as_str()).collect()
    }
}

impl<'a> IntoIterator for &'a RuleSet {
    type Item = &'a CompiledRule;
    type IntoIter = std::slice::Iter<'a, CompiledRule>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.iter()
    }
}
