//! Rule loader
//!
//! Load rule declarations from JSON or YAML files, directories, or strings.
//! A document holds either a list of rules or a single rule object.

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::schema::RuleDecl;

/// Errors that can occur while loading or compiling a rule set
#[derive(Debug, Error)]
pub enum RuleLoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse JSON rules: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to parse YAML rules: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("unsupported rule file format: {0} (expected .json, .yaml or .yml)")]
    UnsupportedFormat(PathBuf),

    #[error("rule #{index} ({description}) is missing required field `{field}`")]
    MissingField {
        index: usize,
        field: &'static str,
        description: String,
    },

    #[error("rule '{description}' has an invalid pattern: {source}")]
    InvalidPattern {
        description: String,
        #[source]
        source: regex::Error,
    },

    #[error("rule '{description}' has an invalid replacement: {reason}")]
    InvalidReplacement { description: String, reason: String },

    #[error("no rule named '{0}' in the rule set")]
    UnknownRule(String),
}

/// Serialization format of a rule document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleFormat {
    Json,
    Yaml,
}

impl RuleFormat {
    /// Pick a format from a file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "json" => Some(RuleFormat::Json),
            "yaml" | "yml" => Some(RuleFormat::Yaml),
            _ => None,
        }
    }
}

/// Load rule declarations from a string
pub fn load_rules_from_str(content: &str, format: RuleFormat) -> Result<Vec<RuleDecl>, RuleLoadError> {
    match format {
        RuleFormat::Json => {
            let value: serde_json::Value = serde_json::from_str(content)?;
            if value.is_array() {
                Ok(serde_json::from_value(value)?)
            } else {
                Ok(vec![serde_json::from_value(value)?])
            }
        }
        RuleFormat::Yaml => {
            let value: serde_yaml::Value = serde_yaml::from_str(content)?;
            match value {
                serde_yaml::Value::Null => Ok(Vec::new()),
                serde_yaml::Value::Sequence(_) => Ok(serde_yaml::from_value(value)?),
                other => Ok(vec![serde_yaml::from_value(other)?]),
            }
        }
    }
}

/// Load rule declarations from a file; the extension selects the format
pub fn load_rules_from_file(path: &Path) -> Result<Vec<RuleDecl>, RuleLoadError> {
    let format =
        RuleFormat::from_path(path).ok_or_else(|| RuleLoadError::UnsupportedFormat(path.to_path_buf()))?;
    let content = fs::read_to_string(path).map_err(|source| RuleLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    load_rules_from_str(&content, format)
}

/// Load every rule file directly inside `dir`, in sorted path order.
///
/// Files with other extensions are ignored. The first broken file aborts the
/// whole load.
pub fn load_rules_from_dir(dir: &Path) -> Result<Vec<RuleDecl>, RuleLoadError> {
    let io_err = |source: std::io::Error| RuleLoadError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        if path.is_file() && RuleFormat::from_path(&path).is_some() {
            files.push(path);
        }
    }
    files.sort();

    let mut rules = Vec::new();
    for path in files {
        rules.extend(load_rules_from_file(&path)?);
    }
    Ok(rules)
}

/// Load from a file or a directory
pub fn load_rules(path: &Path) -> Result<Vec<RuleDecl>, RuleLoadError> {
    if path.is_dir() {
        load_rules_from_dir(path)
    } else {
        load_rules_from_file(path)
    }
}
