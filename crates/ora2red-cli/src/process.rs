//! File processing logic for ora2red
//!
//! Reading and converting happen here without touching the output tree;
//! writing is a separate step so a fatal rule error can stop the run before
//! anything lands on disk.

use anyhow::{Context, Result};
use std::io::Write;
use std::path::{Path, PathBuf};

use ora2red_core::StatementKind;
use ora2red_rules::{Converter, Outcome, ScriptResult};

/// A file that was read and converted in memory
#[derive(Debug, Clone)]
pub struct ConvertedFile {
    pub path: PathBuf,
    /// File stem with spaces replaced by underscores
    pub stem: String,
    pub source: String,
    pub result: ScriptResult,
}

/// Result of processing a single file (for parallel processing)
#[derive(Debug)]
pub enum FileResult {
    Converted(Box<ConvertedFile>),
    /// The file could not be read; other files carry on
    Error(String),
}

/// Read and convert one file.
///
/// A read failure is reported in the returned [`FileResult`]; a broken rule
/// is returned as `Err`, naming the file, and should stop the run.
pub fn convert_file(path: &Path, converter: &Converter<'_>) -> Result<FileResult> {
    let source = match read_source(path) {
        Ok(source) => source,
        Err(e) => return Ok(FileResult::Error(format!("{:#}", e))),
    };

    let result = converter
        .convert(&source)
        .with_context(|| format!("Failed to convert {}", path.display()))?;

    Ok(FileResult::Converted(Box::new(ConvertedFile {
        path: path.to_path_buf(),
        stem: file_stem(path),
        source,
        result,
    })))
}

/// Read a file as text: invalid UTF-8 is replaced, a leading BOM dropped
pub fn read_source(path: &Path) -> Result<String> {
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read file: {}", path.display()))?;
    let text = String::from_utf8_lossy(&bytes);
    Ok(text.strip_prefix('\u{feff}').unwrap_or(&text[..]).to_string())
}

/// Output stem of a file: its stem with spaces replaced by underscores
pub fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().replace(' ', "_"))
        .unwrap_or_else(|| "unnamed".to_string())
}

/// Directory name a routed file lands in
pub fn bucket_dir(outcome: Outcome) -> &'static str {
    match outcome {
        Outcome::NoChange => "nochange_sqls",
        Outcome::AutoConverted => "success_sqls",
        Outcome::ManualReview => "manual_sqls",
    }
}

/// `<out_dir>/<DDL|DML>/<bucket>/<stem>_converted.sql`
pub fn output_path(out_dir: &Path, kind: StatementKind, outcome: Outcome, stem: &str) -> PathBuf {
    out_dir
        .join(kind.as_str())
        .join(bucket_dir(outcome))
        .join(format!("{}_converted.sql", stem))
}

/// Write the converted text of `file` into its routed location
pub fn write_converted(out_dir: &Path, file: &ConvertedFile) -> Result<PathBuf> {
    let path = output_path(out_dir, file.result.kind, file.result.outcome(), &file.stem);
    write_atomic(&path, &file.result.text)?;
    Ok(path)
}

/// Write `content` to `path` through a temp file in the same directory, so
/// the destination is either untouched or complete
pub fn write_atomic(path: &Path, content: &str) -> Result<()> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create directory: {}", dir.display()))?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create temp file in {}", dir.display()))?;
    tmp.write_all(content.as_bytes())
        .with_context(|| format!("Failed to write file: {}", path.display()))?;
    tmp.persist(path)
        .with_context(|| format!("Failed to write file: {}", path.display()))?;
    Ok(())
}
