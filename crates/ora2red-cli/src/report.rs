//! Run reports written to the report directory
//!
//! An HTML overview rendered with Handlebars, and a JSON export of the
//! per-file results. An earlier export can be merged into the next one.

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use handlebars::Handlebars;
use serde::Deserialize;
use serde_json::json;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::output::{FileReport, Summary};
use crate::process::write_atomic;

/// File name of the JSON results export
pub const RESULTS_FILE: &str = "conversion_results.json";

const REPORT_TEMPLATE: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>ora2red conversion report</title>
<style>
body { font-family: sans-serif; margin: 2em; }
table { border-collapse: collapse; }
td, th { border: 1px solid #ccc; padding: 4px 8px; text-align: left; }
.manual_review { color: #b36b00; }
.auto_converted { color: #227722; }
.no_change { color: #666; }
.error { color: #b00020; }
pre { background: #f6f6f6; padding: 4px; margin: 2px 0; }
</style>
</head>
<body>
<h1>Conversion report</h1>
<p>Generated {{generated}}. Rules: {{rule_source}}.</p>

<h2>Summary</h2>
<table>
<tr><th>Files processed</th><td>{{summary.files_processed}}</td></tr>
<tr><th>Unchanged</th><td>{{summary.unchanged}}</td></tr>
<tr><th>Auto-converted</th><td>{{summary.auto_converted}}</td></tr>
<tr><th>Manual review</th><td>{{summary.manual_review}}</td></tr>
<tr><th>Total changes</th><td>{{summary.total_changes}}</td></tr>
<tr><th>Errors</th><td>{{summary.errors}}</td></tr>
</table>

<h2>Files</h2>
{{#each files}}
<h3>{{path}}</h3>
{{#if error}}
<p class="error">Error: {{error}}</p>
{{else}}
<p>Kind: {{kind}}. Outcome: <span class="{{outcome}}">{{outcome}}</span>.{{#if output}} Written to {{output}}.{{/if}}</p>
{{#if applied_rules}}
<p>Applied rules:</p>
<ul>{{#each applied_rules}}<li>{{this}}</li>{{/each}}</ul>
{{/if}}
{{#if manual_reasons}}
<p>Manual review:</p>
<ul>{{#each manual_reasons}}<li>{{this}}</li>{{/each}}</ul>
{{/if}}
{{#if review_keywords}}
<p>Review keywords: {{#each review_keywords}}{{#unless @first}}, {{/unless}}{{this}}{{/each}}</p>
{{/if}}
{{#if changes}}
<table>
<tr><th>Line</th><th>Rule</th><th>Before / after</th></tr>
{{#each changes}}
<tr><td>{{line}}</td><td>{{description}}{{#if manual_review}} (manual review){{/if}}</td><td><pre>- {{before}}</pre><pre>+ {{after}}</pre></td></tr>
{{/each}}
</table>
{{/if}}
{{/if}}
{{/each}}
</body>
</html>
"##;

#[derive(Deserialize)]
struct ResultsExport {
    #[serde(default)]
    files: Vec<FileReport>,
}

/// Read the per-file results of an earlier export; a missing file has none
pub fn load_results(path: &Path) -> Result<Vec<FileReport>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read results: {}", path.display()))?;
    let export: ResultsExport = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse results: {}", path.display()))?;
    Ok(export.files)
}

/// Merge earlier results under the current run.
///
/// Earlier files the current run converted again are replaced, earlier
/// errors are dropped, and the rest are kept ahead of the current results.
pub fn merge_results(
    previous: Vec<FileReport>,
    current: &[FileReport],
    summary: &Summary,
) -> (Summary, Vec<FileReport>) {
    let seen: HashSet<&str> = current.iter().map(|r| r.path.as_str()).collect();
    let mut merged_summary = summary.clone();
    let mut files = Vec::with_capacity(previous.len() + current.len());

    for report in previous {
        if report.has_error() || seen.contains(report.path.as_str()) {
            continue;
        }
        merged_summary.add(&report);
        files.push(report);
    }
    files.extend(current.iter().cloned());

    (merged_summary, files)
}

/// File name of the HTML report for a run started at `at`
pub fn html_report_name(at: &DateTime<Local>) -> String {
    format!("conversion_report_{}.html", at.format("%Y%m%d_%H%M"))
}

/// Render the HTML report; every interpolated value is HTML-escaped
pub fn render_html(
    summary: &Summary,
    files: &[FileReport],
    rule_source: &str,
    generated: &DateTime<Local>,
) -> Result<String> {
    let mut handlebars = Handlebars::new();
    handlebars.set_strict_mode(false);
    handlebars
        .register_template_string("report", REPORT_TEMPLATE)
        .context("Failed to register report template")?;

    let data = json!({
        "generated": generated.format("%Y-%m-%d %H:%M:%S").to_string(),
        "rule_source": rule_source,
        "summary": summary,
        "files": files,
    });

    handlebars
        .render("report", &data)
        .context("Failed to render report")
}

/// Write the HTML report and the JSON export into `report_dir`.
///
/// Returns the paths written, HTML first.
pub fn write_reports(
    report_dir: &Path,
    summary: &Summary,
    files: &[FileReport],
    rule_source: &str,
    generated: &DateTime<Local>,
) -> Result<(PathBuf, PathBuf)> {
    let html_path = report_dir.join(html_report_name(generated));
    let html = render_html(summary, files, rule_source, generated)?;
    write_atomic(&html_path, &html)?;

    let json_path = report_dir.join(RESULTS_FILE);
    let export = json!({
        "generated": generated.to_rfc3339(),
        "summary": summary,
        "files": files,
    });
    let json = serde_json::to_string_pretty(&export).context("Failed to serialize results")?;
    write_atomic(&json_path, &json)?;

    Ok((html_path, json_path))
}
