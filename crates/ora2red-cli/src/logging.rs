//! Run log for ora2red
//!
//! Records configuration, rule loading and per-file conversion results in
//! `<log_dir>/ora2red.log`, and writes a change log per converted file.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use colored::*;
use ora2red_core::ChangeEntry;

/// File name of the run log inside the log directory
pub const RUN_LOG_FILE: &str = "ora2red.log";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Warn,
    Error,
}

impl Level {
    fn as_str(&self) -> &'static str {
        match self {
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
        }
    }
}

/// Log for one run; pass it by reference to whatever needs to log
pub struct RunLog {
    file: Option<Mutex<File>>,
    path: Option<PathBuf>,
    echo: bool,
}

impl RunLog {
    /// Open `<log_dir>/ora2red.log` for appending
    pub fn open(log_dir: &Path, echo: bool) -> Result<Self> {
        fs::create_dir_all(log_dir)
            .with_context(|| format!("Failed to create log directory {}", log_dir.display()))?;
        let path = log_dir.join(RUN_LOG_FILE);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Failed to open log file {}", path.display()))?;

        Ok(Self {
            file: Some(Mutex::new(file)),
            path: Some(path),
            echo,
        })
    }

    /// A log that drops everything, except the stderr echo if asked for
    pub fn disabled(echo: bool) -> Self {
        Self {
            file: None,
            path: None,
            echo,
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn log(&self, level: Level, message: &str) {
        if let Some(file) = &self.file {
            let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
            if let Ok(mut file) = file.lock() {
                let _ = writeln!(file, "[{}] {} {}", timestamp, level.as_str(), message);
                let _ = file.flush();
            }
        }

        if self.echo {
            let tag = match level {
                Level::Info => level.as_str().dimmed(),
                Level::Warn => level.as_str().yellow(),
                Level::Error => level.as_str().red(),
            };
            eprintln!("{} {}", tag, message);
        }
    }

    pub fn info(&self, message: &str) {
        self.log(Level::Info, message);
    }

    pub fn warn(&self, message: &str) {
        self.log(Level::Warn, message);
    }

    pub fn error(&self, message: &str) {
        self.log(Level::Error, message);
    }

    /// Log a section header
    pub fn section(&self, title: &str) {
        let separator = "=".repeat(60);
        self.info(&separator);
        self.info(title);
        self.info(&separator);
    }
}

/// Path of the change log for a converted file
pub fn change_log_path(log_dir: &Path, stem: &str) -> PathBuf {
    log_dir.join(format!("{}_converted_log.txt", stem))
}

/// Render change entries as a plain-text change log
pub fn render_change_log(source: &Path, changes: &[ChangeEntry]) -> String {
    let mut out = format!("Changes for {}\n\n", source.display());
    for entry in changes {
        out.push_str(&entry.render());
        out.push_str("\n\n");
    }
    out
}

/// Write the change log for `source` into `log_dir`
pub fn write_change_log(
    log_dir: &Path,
    stem: &str,
    source: &Path,
    changes: &[ChangeEntry],
) -> Result<PathBuf> {
    fs::create_dir_all(log_dir)
        .with_context(|| format!("Failed to create log directory {}", log_dir.display()))?;
    let path = change_log_path(log_dir, stem);
    crate::process::write_atomic(&path, &render_change_log(source, changes))?;
    Ok(path)
}
