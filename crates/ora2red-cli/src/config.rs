//! Configuration file support for ora2red
//!
//! Loads `.ora2red.toml` from current directory or parent directories.

use anyhow::{Context, Result};
use ora2red_rules::DEFAULT_REVIEW_KEYWORDS;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Name of the config file searched for
pub const CONFIG_FILE: &str = ".ora2red.toml";

/// Configuration file structure
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub rules: RulesConfig,
    pub paths: PathsConfig,
    pub output: OutputConfig,
    pub engine: EngineConfig,
    pub review: ReviewConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    /// Rule file or directory of rule files; the built-in set when absent
    pub file: Option<PathBuf>,
    /// Descriptions of rules to drop after loading
    pub disabled: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Glob patterns to exclude from processing
    pub exclude: Vec<String>,
    /// File extensions to pick up when walking directories
    pub extensions: Vec<String>,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            exclude: Vec::new(),
            extensions: vec!["sql".to_string()],
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Root of the converted tree
    pub dir: PathBuf,
    pub report_dir: PathBuf,
    pub log_dir: PathBuf,
    /// Output format: "text", "json" or "diff"
    pub format: Option<String>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("converted_sqls"),
            report_dir: PathBuf::from("reports"),
            log_dir: PathBuf::from("logs"),
            format: None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Gate rules by the kind of statement each line belongs to
    pub gate_by_kind: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { gate_by_kind: true }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ReviewConfig {
    /// Keywords reported when found anywhere in a script
    pub keywords: Vec<String>,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            keywords: DEFAULT_REVIEW_KEYWORDS.iter().map(|k| k.to_string()).collect(),
        }
    }
}

impl Config {
    /// Load config from `.ora2red.toml` searching from current directory upward
    pub fn load() -> Result<Option<(Config, PathBuf)>> {
        Self::load_from(std::env::current_dir()?)
    }

    /// Load config searching from the given directory upward
    pub fn load_from(start_dir: PathBuf) -> Result<Option<(Config, PathBuf)>> {
        let mut current = Some(start_dir.as_path());

        while let Some(dir) = current {
            let config_path = dir.join(CONFIG_FILE);
            if config_path.exists() {
                let config = Self::load_path(&config_path)?;
                return Ok(Some((config, config_path)));
            }
            current = dir.parent();
        }

        Ok(None)
    }

    /// Load config from a specific path
    pub fn load_path(path: &Path) -> Result<Config> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(config)
    }

    /// Whether `path` has one of the configured extensions
    pub fn wants_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| {
                self.paths
                    .extensions
                    .iter()
                    .any(|wanted| wanted.trim_start_matches('.').eq_ignore_ascii_case(ext))
            })
    }

    /// Check if a path should be excluded based on config patterns
    pub fn should_exclude(&self, path: &Path) -> bool {
        let path_str = path.to_string_lossy();

        for pattern in &self.paths.exclude {
            // Try glob matching
            if let Ok(glob_pattern) = glob::Pattern::new(pattern) {
                if glob_pattern.matches(&path_str) {
                    return true;
                }
                // Also try matching against just the file/dir name
                if let Some(file_name) = path.file_name() {
                    if glob_pattern.matches(&file_name.to_string_lossy()) {
                        return true;
                    }
                }
            }

            // Also do simple prefix/contains matching for directory patterns
            if pattern.ends_with('/') {
                let dir_pattern = pattern.trim_end_matches('/');
                if path_str.contains(&format!("/{}/", dir_pattern))
                    || path_str.starts_with(&format!("{}/", dir_pattern))
                {
                    return true;
                }
            }
        }

        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn create_config(dir: &Path, content: &str) {
        fs::write(dir.join(CONFIG_FILE), content).unwrap();
    }

    #[test]
    fn test_load_basic_config() {
        let temp = TempDir::new().unwrap();
        create_config(
            temp.path(),
            r#"
[rules]
file = "rules/transformations.json"
disabled = ["MINUS -> EXCEPT"]

[paths]
exclude = ["archive/", "*.bak.sql"]
extensions = ["sql", "pks"]

[output]
dir = "out"
format = "json"

[engine]
gate_by_kind = false

[review]
keywords = ["MERGE INTO"]
"#,
        );

        let (config, path) = Config::load_from(temp.path().to_path_buf())
            .unwrap()
            .unwrap();

        assert_eq!(path, temp.path().join(CONFIG_FILE));
        assert_eq!(
            config.rules.file,
            Some(PathBuf::from("rules/transformations.json"))
        );
        assert_eq!(config.rules.disabled, vec!["MINUS -> EXCEPT".to_string()]);
        assert_eq!(
            config.paths.exclude,
            vec!["archive/".to_string(), "*.bak.sql".to_string()]
        );
        assert_eq!(config.paths.extensions, vec!["sql".to_string(), "pks".to_string()]);
        assert_eq!(config.output.dir, PathBuf::from("out"));
        // Unset keys in a present section keep their defaults
        assert_eq!(config.output.log_dir, PathBuf::from("logs"));
        assert_eq!(config.output.format, Some("json".to_string()));
        assert!(!config.engine.gate_by_kind);
        assert_eq!(config.review.keywords, vec!["MERGE INTO".to_string()]);
    }

    #[test]
    fn test_load_empty_config() {
        let temp = TempDir::new().unwrap();
        create_config(temp.path(), "");

        let (config, _) = Config::load_from(temp.path().to_path_buf())
            .unwrap()
            .unwrap();

        assert!(config.rules.file.is_none());
        assert!(config.rules.disabled.is_empty());
        assert!(config.paths.exclude.is_empty());
        assert_eq!(config.paths.extensions, vec!["sql".to_string()]);
        assert_eq!(config.output.dir, PathBuf::from("converted_sqls"));
        assert_eq!(config.output.report_dir, PathBuf::from("reports"));
        assert!(config.output.format.is_none());
        assert!(config.engine.gate_by_kind);
        assert_eq!(config.review.keywords.len(), 3);
    }

    #[test]
    fn test_found_in_parent_directory() {
        let temp = TempDir::new().unwrap();
        create_config(temp.path(), "[engine]\ngate_by_kind = false\n");
        let nested = temp.path().join("a").join("b");
        fs::create_dir_all(&nested).unwrap();

        let (config, path) = Config::load_from(nested).unwrap().unwrap();
        assert_eq!(path, temp.path().join(CONFIG_FILE));
        assert!(!config.engine.gate_by_kind);
    }

    #[test]
    fn test_no_config_found() {
        let temp = TempDir::new().unwrap();
        let result = Config::load_from(temp.path().to_path_buf()).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_unparseable_config() {
        let temp = TempDir::new().unwrap();
        create_config(temp.path(), "[engine]\ngate_by_kind = \"yes\"\n");
        assert!(Config::load_from(temp.path().to_path_buf()).is_err());
    }

    #[test]
    fn test_wants_extension() {
        let config = Config {
            paths: PathsConfig {
                exclude: vec![],
                extensions: vec!["sql".to_string(), ".PKB".to_string()],
            },
            ..Default::default()
        };

        assert!(config.wants_extension(Path::new("a/b.sql")));
        assert!(config.wants_extension(Path::new("a/b.SQL")));
        assert!(config.wants_extension(Path::new("pkg.pkb")));
        assert!(!config.wants_extension(Path::new("notes.txt")));
        assert!(!config.wants_extension(Path::new("Makefile")));
    }

    #[test]
    fn test_should_exclude_glob() {
        let config = Config {
            paths: PathsConfig {
                exclude: vec!["*.bak.sql".to_string()],
                ..Default::default()
            },
            ..Default::default()
        };

        assert!(config.should_exclude(Path::new("emp.bak.sql")));
        assert!(!config.should_exclude(Path::new("emp.sql")));
    }

    #[test]
    fn test_should_exclude_directory() {
        let config = Config {
            paths: PathsConfig {
                exclude: vec!["archive/".to_string()],
                ..Default::default()
            },
            ..Default::default()
        };

        assert!(config.should_exclude(Path::new("project/archive/old.sql")));
        assert!(config.should_exclude(Path::new("archive/2019/emp.sql")));
        assert!(!config.should_exclude(Path::new("src/archive.sql")));
    }
}
