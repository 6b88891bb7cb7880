//! Output formatting for ora2red
//!
//! Supports text (colored terminal), JSON and unified diff output formats.

use colored::*;
use ora2red_core::{ChangeEntry, StatementKind};
use ora2red_rules::Outcome;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::process::ConvertedFile;

/// Output format selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Diff,
}

impl OutputFormat {
    pub fn from_str(s: &str) -> Option<OutputFormat> {
        match s.to_lowercase().as_str() {
            "text" => Some(OutputFormat::Text),
            "json" => Some(OutputFormat::Json),
            "diff" => Some(OutputFormat::Diff),
            _ => None,
        }
    }
}

/// Per-file entry of the JSON output and the results export
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileReport {
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<StatementKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<Outcome>,
    /// Where the converted file was written; absent in check mode
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub applied_rules: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub manual_reasons: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub review_keywords: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub changes: Vec<ChangeEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FileReport {
    pub fn converted(file: &ConvertedFile, output: Option<&Path>) -> Self {
        let result = &file.result;
        Self {
            path: file.path.display().to_string(),
            kind: Some(result.kind),
            outcome: Some(result.outcome()),
            output: output.map(|p| p.display().to_string()),
            applied_rules: result.applied_rules.clone(),
            manual_reasons: result.manual_reasons.clone(),
            review_keywords: result.review_keywords.clone(),
            changes: result.changes.clone(),
            error: None,
        }
    }

    pub fn error(path: &Path, error: String) -> Self {
        Self {
            path: path.display().to_string(),
            kind: None,
            outcome: None,
            output: None,
            applied_rules: Vec::new(),
            manual_reasons: Vec::new(),
            review_keywords: Vec::new(),
            changes: Vec::new(),
            error: Some(error),
        }
    }

    #[allow(dead_code)]
    pub fn has_changes(&self) -> bool {
        !self.changes.is_empty()
    }

    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Summary statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub files_processed: usize,
    pub unchanged: usize,
    pub auto_converted: usize,
    pub manual_review: usize,
    pub total_changes: usize,
    pub errors: usize,
}

impl Summary {
    /// Count one converted file
    pub fn add(&mut self, report: &FileReport) {
        self.files_processed += 1;
        self.total_changes += report.changes.len();
        match report.outcome {
            Some(Outcome::NoChange) => self.unchanged += 1,
            Some(Outcome::AutoConverted) => self.auto_converted += 1,
            Some(Outcome::ManualReview) => self.manual_review += 1,
            None => {}
        }
        if report.has_error() {
            self.errors += 1;
        }
    }

    /// Files the conversion changed
    pub fn files_with_changes(&self) -> usize {
        self.auto_converted + self.manual_review
    }
}

/// Full JSON output structure
#[derive(Debug, Serialize)]
pub struct JsonOutput {
    pub version: String,
    pub summary: Summary,
    pub files: Vec<FileReport>,
}

/// Reporter for accumulating and outputting results
pub struct Reporter {
    format: OutputFormat,
    verbose: bool,
    results: Vec<FileReport>,
    summary: Summary,
}

impl Reporter {
    pub fn new(format: OutputFormat, verbose: bool) -> Self {
        Self {
            format,
            verbose,
            results: Vec::new(),
            summary: Summary::default(),
        }
    }

    /// Report a converted file; `output` is where it was written, if anywhere
    pub fn report_file(&mut self, file: &ConvertedFile, output: Option<&Path>) {
        let result = &file.result;
        let path = &file.path;
        let report = FileReport::converted(file, output);
        self.summary.add(&report);

        let outcome = result.outcome();

        match self.format {
            OutputFormat::Text => {
                if outcome == Outcome::NoChange {
                    if self.verbose {
                        println!("{}: No changes needed ({})", path.display(), result.kind);
                    }
                } else {
                    let tag = match outcome {
                        Outcome::ManualReview => "manual review".yellow(),
                        _ => "converted".green(),
                    };
                    println!("{} [{}, {}]", path.display().to_string().bold(), result.kind, tag);
                    print_diff(&file.source, &result.text);
                    println!();
                    for change in &result.changes {
                        println!("  {} {}", "->".green(), change);
                    }
                    for reason in &result.manual_reasons {
                        println!("  {} {}", "!".yellow(), reason);
                    }
                    if let Some(output) = output {
                        println!("  {} {}", "=>".dimmed(), output.display());
                    }
                    println!();
                }
                if self.verbose && !result.review_keywords.is_empty() {
                    println!(
                        "  {} review keywords: {}",
                        "?".yellow(),
                        result.review_keywords.join(", ")
                    );
                }
            }
            OutputFormat::Diff => {
                if outcome != Outcome::NoChange {
                    print_unified_diff(path, &file.source, &result.text);
                }
            }
            OutputFormat::Json => {
                // JSON output is handled in finish()
            }
        }

        self.results.push(report);
    }

    /// Report an error processing a file
    pub fn report_error(&mut self, path: &Path, error: &str) {
        let report = FileReport::error(path, error.to_string());
        self.summary.add(&report);

        if self.format == OutputFormat::Text {
            eprintln!(
                "{}: {} - {}",
                "Warning".yellow(),
                path.display(),
                error
            );
        }

        self.results.push(report);
    }

    /// Report an input path that does not exist
    pub fn report_missing(&mut self, path: &Path) {
        self.summary.errors += 1;

        if self.format == OutputFormat::Text {
            eprintln!("{}: Path does not exist: {}", "Warning".yellow(), path.display());
        }

        self.results
            .push(FileReport::error(path, "Path does not exist".to_string()));
    }

    /// Print final summary/output
    pub fn finish(&self, check_mode: bool) {
        match self.format {
            OutputFormat::Text => {
                println!();
                println!("{}", "Summary".bold().underline());
                println!("  Files processed: {}", self.summary.files_processed);
                println!("  Unchanged: {}", self.summary.unchanged);
                println!("  Auto-converted: {}", self.summary.auto_converted);
                println!("  Manual review: {}", self.summary.manual_review);
                println!("  Total changes: {}", self.summary.total_changes);
                if self.summary.errors > 0 {
                    println!("  Errors: {}", self.summary.errors);
                }

                if check_mode && self.summary.total_changes > 0 {
                    println!();
                    println!("{}", "Run without --check to write converted files".yellow());
                }
            }
            OutputFormat::Json => {
                let output = JsonOutput {
                    version: env!("CARGO_PKG_VERSION").to_string(),
                    summary: self.summary.clone(),
                    files: self.results.clone(),
                };
                match serde_json::to_string_pretty(&output) {
                    Ok(json) => println!("{}", json),
                    Err(e) => eprintln!("{}: {}", "Error".red(), e),
                }
            }
            OutputFormat::Diff => {
                // Diff format outputs each file's diff as it's processed
                // No summary needed for patch-compatible output
            }
        }
    }

    /// Get summary for exit code determination
    pub fn summary(&self) -> &Summary {
        &self.summary
    }

    pub fn results(&self) -> &[FileReport] {
        &self.results
    }
}

/// Print a colored diff between old and new content
fn print_diff(old: &str, new: &str) {
    for diff_result in diff::lines(old, new) {
        match diff_result {
            diff::Result::Left(l) => {
                println!("  {}", format!("- {}", l).red());
            }
            diff::Result::Right(r) => {
                println!("  {}", format!("+ {}", r).green());
            }
            diff::Result::Both(_, _) => {
                // Skip unchanged lines for cleaner output
            }
        }
    }
}

/// Render a unified diff (standard diff -u compatible)
pub fn unified_diff(path: &Path, old: &str, new: &str) -> String {
    use similar::{ChangeTag, TextDiff};

    let diff = TextDiff::from_lines(old, new);
    let path_str = path.display().to_string();
    let mut out = format!("--- a/{}\n+++ b/{}\n", path_str, path_str);

    for hunk in diff.unified_diff().context_radius(3).iter_hunks() {
        out.push_str(&format!("{}\n", hunk.header()));
        for change in hunk.iter_changes() {
            let sign = match change.tag() {
                ChangeTag::Delete => "-",
                ChangeTag::Insert => "+",
                ChangeTag::Equal => " ",
            };
            out.push_str(&format!("{}{}", sign, change));
            if change.missing_newline() {
                out.push('\n');
            }
        }
    }

    out
}

fn print_unified_diff(path: &Path, old: &str, new: &str) {
    print!("{}", unified_diff(path, old, new));
}
