//! ora2red CLI - Oracle to Redshift SQL converter
//!
//! Converts SQL scripts with an ordered set of declarative rewrite rules,
//! routes each converted file by statement kind and outcome, and writes
//! per-file change logs plus HTML and JSON run reports.

mod config;
mod logging;
mod output;
mod process;
mod report;

use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use rayon::prelude::*;
use std::path::PathBuf;
use std::process::ExitCode;

use config::Config;
use logging::RunLog;
use ora2red_rules::{Converter, EngineOptions, ReviewScanner, RuleSet, BUILTIN_NAME};
use output::{OutputFormat, Reporter};
use process::{convert_file, write_converted, FileResult};

#[derive(Parser)]
#[command(name = "ora2red")]
#[command(version)]
#[command(about = "Rule-driven Oracle to Redshift SQL converter")]
struct Cli {
    /// Files or directories to convert
    #[arg(required_unless_present = "list_rules")]
    paths: Vec<PathBuf>,

    /// Rule file (.json, .yaml, .yml) or directory of rule files. Overrides config file.
    #[arg(long, short = 'r', value_name = "PATH")]
    rules: Option<PathBuf>,

    /// Root directory of the converted tree
    #[arg(long, short = 'o', value_name = "DIR")]
    output: Option<PathBuf>,

    /// Directory for HTML and JSON reports
    #[arg(long, value_name = "DIR")]
    report_dir: Option<PathBuf>,

    /// Directory for the run log and per-file change logs
    #[arg(long, value_name = "DIR")]
    log_dir: Option<PathBuf>,

    /// Report what would change without writing anything
    #[arg(long, short = 'n')]
    check: bool,

    /// Keep results of earlier runs from the existing results export
    #[arg(long, conflicts_with = "check")]
    merge: bool,

    /// Apply every rule to every line regardless of statement kind
    #[arg(long)]
    no_gate: bool,

    /// Show verbose output
    #[arg(long, short = 'v')]
    verbose: bool,

    /// Output format: text, json, diff
    #[arg(long, value_name = "FORMAT")]
    format: Option<String>,

    /// Shorthand for --format json
    #[arg(long, conflicts_with = "format")]
    json: bool,

    /// Path to config file (default: auto-detect .ora2red.toml)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Ignore config files
    #[arg(long)]
    no_config: bool,

    /// List the compiled rules in execution order and exit
    #[arg(long)]
    list_rules: bool,
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {:#}", "Error".red(), e);
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Load config file
    let (config, config_source) = if cli.no_config {
        (Config::default(), None)
    } else if let Some(config_path) = &cli.config {
        (Config::load_path(config_path)?, Some(config_path.clone()))
    } else {
        match Config::load()? {
            Some((cfg, path)) => (cfg, Some(path)),
            None => (Config::default(), None),
        }
    };

    // Determine output format
    let output_format = if cli.json {
        OutputFormat::Json
    } else {
        let name = cli
            .format
            .as_deref()
            .or(config.output.format.as_deref())
            .unwrap_or("text");
        OutputFormat::from_str(name).ok_or_else(|| {
            anyhow::anyhow!(
                "Invalid output format '{}'. Valid options: text, json, diff",
                name
            )
        })?
    };
    let verbose_text = cli.verbose && output_format == OutputFormat::Text;

    let out_dir = cli.output.clone().unwrap_or_else(|| config.output.dir.clone());
    let report_dir = cli
        .report_dir
        .clone()
        .unwrap_or_else(|| config.output.report_dir.clone());
    let log_dir = cli.log_dir.clone().unwrap_or_else(|| config.output.log_dir.clone());

    // Nothing is written in check mode or when only listing rules, logs included
    let log = if cli.check || cli.list_rules {
        RunLog::disabled(verbose_text)
    } else {
        RunLog::open(&log_dir, verbose_text)?
    };

    log.section("ORA2RED RUN");
    match &config_source {
        Some(path) => log.info(&format!("Using config: {}", path.display())),
        None => log.info("No config file; using defaults"),
    }

    // Compile the rule set once for the whole run
    let (rules, rule_source) = match load_rule_set(&cli, &config) {
        Ok(loaded) => loaded,
        Err(e) => {
            log.error(&format!("Rule set failed to load: {:#}", e));
            return Err(e);
        }
    };
    log.info(&format!("Loaded {} rules from {}", rules.len(), rule_source));

    // Handle --list-rules
    if cli.list_rules {
        print_rules(&rules, &rule_source);
        return Ok(ExitCode::SUCCESS);
    }

    let gate_by_kind = config.engine.gate_by_kind && !cli.no_gate;
    let converter = Converter::new(&rules)
        .with_options(EngineOptions { gate_by_kind })
        .with_review(ReviewScanner::new(&config.review.keywords));

    if verbose_text {
        println!("{}: {}", "Mode".bold(), if cli.check { "check" } else { "convert" });
        println!("{}: {} ({} rules)", "Rules".bold(), rule_source, rules.len());
        println!("{}: {}", "Gate by kind".bold(), gate_by_kind);
        println!();
    }

    let (file_paths, missing_paths) = collect_files(&cli.paths, &config);
    log.info(&format!("Found {} input files", file_paths.len()));

    // Convert everything before writing anything; a broken rule aborts here
    let results: Vec<FileResult> = match file_paths
        .par_iter()
        .map(|path| convert_file(path, &converter))
        .collect::<Result<Vec<_>, _>>()
    {
        Ok(results) => results,
        Err(e) => {
            log.error(&format!("{:#}", e));
            return Err(e);
        }
    };

    let mut reporter = Reporter::new(output_format, cli.verbose);

    // Missing inputs count as errors
    for path in &missing_paths {
        log.warn(&format!("Path does not exist: {}", path.display()));
        reporter.report_missing(path);
    }

    for (path, result) in file_paths.iter().zip(results) {
        match result {
            FileResult::Converted(file) => {
                let written = if cli.check {
                    None
                } else {
                    let written = write_converted(&out_dir, &file)?;
                    log.info(&format!(
                        "{}: {} / {}, {} change(s) -> {}",
                        file.path.display(),
                        file.result.kind,
                        file.result.outcome().as_str(),
                        file.result.changes.len(),
                        written.display()
                    ));
                    if file.result.is_changed() {
                        let change_log = logging::write_change_log(
                            &log_dir,
                            &file.stem,
                            &file.path,
                            &file.result.changes,
                        )?;
                        log.info(&format!("Change log: {}", change_log.display()));
                    }
                    Some(written)
                };
                reporter.report_file(&file, written.as_deref());
            }
            FileResult::Error(msg) => {
                log.warn(&format!("{}: {}", path.display(), msg));
                reporter.report_error(path, &msg);
            }
        }
    }

    reporter.finish(cli.check);

    if !cli.check {
        let generated = chrono::Local::now();
        let (summary, files) = if cli.merge {
            let previous = report::load_results(&report_dir.join(report::RESULTS_FILE))?;
            let merged = report::merge_results(previous, reporter.results(), reporter.summary());
            log.info(&format!(
                "Merged {} earlier result(s)",
                merged.1.len() - reporter.results().len()
            ));
            merged
        } else {
            (reporter.summary().clone(), reporter.results().to_vec())
        };
        let (html, json) =
            report::write_reports(&report_dir, &summary, &files, &rule_source, &generated)?;
        log.info(&format!("Reports: {}, {}", html.display(), json.display()));
        if output_format == OutputFormat::Text {
            println!("{}: {}", "Report".bold(), html.display());
        }
    }

    // Determine exit code
    let summary = reporter.summary();
    let exit_code = if summary.errors > 0 {
        ExitCode::from(1)
    } else if cli.check && summary.files_with_changes() > 0 {
        ExitCode::from(2)
    } else {
        ExitCode::SUCCESS
    };

    Ok(exit_code)
}

/// Compile the rule set named on the command line, in the config, or the
/// built-in one, minus any disabled rules
fn load_rule_set(cli: &Cli, config: &Config) -> Result<(RuleSet, String)> {
    let (rules, source) = match cli.rules.as_ref().or(config.rules.file.as_ref()) {
        Some(path) => (
            RuleSet::from_path(path)
                .with_context(|| format!("Failed to load rules from {}", path.display()))?,
            path.display().to_string(),
        ),
        None => (RuleSet::builtin()?, BUILTIN_NAME.to_string()),
    };

    if config.rules.disabled.is_empty() {
        Ok((rules, source))
    } else {
        Ok((rules.without(&config.rules.disabled)?, source))
    }
}

fn print_rules(rules: &RuleSet, source: &str) {
    println!("{} {}", "Rules from".bold(), source);
    for rule in rules {
        let kinds = rule
            .applicable_to()
            .iter()
            .map(|k| k.as_str())
            .collect::<Vec<_>>()
            .join(",");
        let manual = if rule.manual_review_required() {
            " [manual review]".yellow().to_string()
        } else {
            String::new()
        };
        println!(
            "  {:>5}  {} ({}){}",
            rule.priority(),
            rule.description().green(),
            kinds,
            manual
        );
    }
}

/// Expand the given paths into a sorted list of input files, plus the paths
/// that do not exist
fn collect_files(paths: &[PathBuf], config: &Config) -> (Vec<PathBuf>, Vec<PathBuf>) {
    let mut file_paths: Vec<PathBuf> = Vec::new();
    let mut missing_paths: Vec<PathBuf> = Vec::new();

    for path in paths {
        if path.is_file() {
            file_paths.push(path.clone());
        } else if path.is_dir() {
            for entry in walkdir::WalkDir::new(path)
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file() && config.wants_extension(e.path()))
            {
                let file_path = entry.path();
                if !config.should_exclude(file_path) {
                    file_paths.push(file_path.to_path_buf());
                }
            }
        } else {
            missing_paths.push(path.clone());
        }
    }

    file_paths.sort();
    file_paths.dedup();
    (file_paths, missing_paths)
}
