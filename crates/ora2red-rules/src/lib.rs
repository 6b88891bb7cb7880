//! ora2red-rules: Declarative rewrite rules and the transformation engine
//!
//! - `schema`: rule declarations as written in JSON/YAML rule files
//! - `loader`: reading rule files and directories
//! - `replacer`: `\1` / `\g<name>` replacement templates
//! - `compiler`: validation and priority ordering into a `RuleSet`
//! - `engine`: per-line application with change tracking and manual review
//! - `review`: whole-script review keyword scan
//! - `builtin`: the shipped Oracle to Redshift rule set

pub mod builtin;
pub mod compiler;
pub mod engine;
pub mod loader;
pub mod replacer;
pub mod review;
pub mod schema;

pub use builtin::{BUILTIN_NAME, BUILTIN_RULES};
pub use compiler::{CompiledRule, RuleSet};
pub use engine::{
    apply_unit, Converter, EngineOptions, Outcome, RuleApplicationError, ScriptResult, Unit,
    UnitOutcome,
};
pub use loader::{
    load_rules, load_rules_from_dir, load_rules_from_file, load_rules_from_str, RuleFormat,
    RuleLoadError,
};
pub use replacer::{GroupRef, ReplacementTemplate, TemplateError};
pub use review::{ReviewScanner, DEFAULT_REVIEW_KEYWORDS};
pub use schema::{RuleDecl, DEFAULT_CRITICALITY, DEFAULT_PRIORITY};
