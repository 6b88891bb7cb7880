//! Coarse SQL statement classification
//!
//! Two policies live here on purpose:
//! - [`classify`] looks at one statement and decides its kind from PL/SQL
//!   markers and the first keyword. The engine uses it to gate rules.
//! - [`route_kind`] looks at a whole script and only answers DDL or DML.
//!   The run driver uses it to pick the output folder.
//!
//! Neither parses SQL. Keywords are found on text passed through
//! [`mask_sql`](crate::scan::mask_sql) so comments and literals never count.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;
use thiserror::Error;

use crate::scan::mask_sql;

const PLSQL_MARKERS: &[&str] = &["DECLARE", "BEGIN", "EXCEPTION", "END", "CURSOR", "LOOP"];
const CONTROL_KEYWORDS: &[&str] = &["COMMIT", "ROLLBACK", "SAVEPOINT"];
const DDL_KEYWORDS: &[&str] = &["CREATE", "ALTER", "DROP", "TRUNCATE", "COMMENT", "RENAME"];
const DML_KEYWORDS: &[&str] = &["SELECT", "INSERT", "UPDATE", "DELETE", "MERGE"];

/// Coarse kind of a unit of SQL text
///
/// Tags serialize uppercase and parse case-insensitively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE", try_from = "String")]
pub enum StatementKind {
    Ddl,
    Dml,
    Plsql,
    Control,
    Unknown,
}

impl StatementKind {
    pub const ALL: [StatementKind; 5] = [
        StatementKind::Ddl,
        StatementKind::Dml,
        StatementKind::Plsql,
        StatementKind::Control,
        StatementKind::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StatementKind::Ddl => "DDL",
            StatementKind::Dml => "DML",
            StatementKind::Plsql => "PLSQL",
            StatementKind::Control => "CONTROL",
            StatementKind::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for a kind tag outside DDL/DML/PLSQL/CONTROL/UNKNOWN
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown statement kind '{0}' (expected DDL, DML, PLSQL, CONTROL or UNKNOWN)")]
pub struct UnknownKind(pub String);

impl FromStr for StatementKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StatementKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownKind(s.to_string()))
    }
}

impl TryFrom<String> for StatementKind {
    type Error = UnknownKind;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

fn plsql_marker_regex() -> &'static Regex {
    static PLSQL: OnceLock<Regex> = OnceLock::new();
    PLSQL.get_or_init(|| {
        let pattern = format!(r"(?i)\b(?:{})\b", PLSQL_MARKERS.join("|"));
        Regex::new(&pattern).unwrap()
    })
}

fn first_token_regex() -> &'static Regex {
    static FIRST: OnceLock<Regex> = OnceLock::new();
    FIRST.get_or_init(|| Regex::new(r"^[\s(]*([A-Za-z_][A-Za-z0-9_$#]*)").unwrap())
}

fn block_opener_regex() -> &'static Regex {
    static OPENER: OnceLock<Regex> = OnceLock::new();
    OPENER.get_or_init(|| {
        Regex::new(
            r"(?i)^\s*(?:DECLARE|BEGIN|CREATE\s+(?:OR\s+REPLACE\s+)?(?:(?:NON)?EDITIONABLE\s+)?(?:PROCEDURE|FUNCTION|PACKAGE|TRIGGER|TYPE))\b",
        )
        .unwrap()
    })
}

/// First keyword of already-masked text, uppercased
fn first_keyword(masked: &str) -> Option<String> {
    first_token_regex()
        .captures(masked)
        .map(|caps| caps[1].to_ascii_uppercase())
}

/// Classify a block of SQL text.
///
/// In priority order: any PL/SQL marker anywhere gives `PLSQL`; a leading
/// COMMIT/ROLLBACK/SAVEPOINT gives `CONTROL`; otherwise the first keyword
/// decides between `DDL`, `DML` and `UNKNOWN`. Empty text is `UNKNOWN`.
pub fn classify(text: &str) -> StatementKind {
    let masked = mask_sql(text);

    if plsql_marker_regex().is_match(&masked) {
        return StatementKind::Plsql;
    }

    let Some(keyword) = first_keyword(&masked) else {
        return StatementKind::Unknown;
    };
    let keyword = keyword.as_str();

    if CONTROL_KEYWORDS.contains(&keyword) {
        StatementKind::Control
    } else if DDL_KEYWORDS.contains(&keyword) {
        StatementKind::Ddl
    } else if DML_KEYWORDS.contains(&keyword) {
        StatementKind::Dml
    } else {
        StatementKind::Unknown
    }
}

/// Kind used to route a whole converted file.
///
/// Deliberately lenient: any DDL keyword anywhere in the uppercased text
/// makes it `DDL`, else any DML keyword makes it `DML`, else `DDL`.
/// Matching is by substring, so `CREATED_AT` counts as `CREATE`.
pub fn route_kind(text: &str) -> StatementKind {
    let upper = text.to_uppercase();

    if DDL_KEYWORDS.iter().any(|kw| upper.contains(kw)) {
        StatementKind::Ddl
    } else if DML_KEYWORDS.iter().any(|kw| upper.contains(kw)) {
        StatementKind::Dml
    } else {
        StatementKind::Ddl
    }
}

/// One statement found by [`split_statements`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    /// Statement text, trimmed, comments included
    pub text: String,
    pub kind: StatementKind,
    /// 1-based line of the first character
    pub start_line: usize,
    /// 1-based line of the last character
    pub end_line: usize,
}

/// Split a script into statements by a coarse scan.
///
/// Statements end at `;`. A statement opened by DECLARE, BEGIN or
/// `CREATE [OR REPLACE] PROCEDURE|FUNCTION|PACKAGE|TRIGGER|TYPE` runs until a
/// line holding only `/`, or the end of input. Stray `/` lines between
/// statements are skipped.
pub fn split_statements(text: &str) -> Vec<Statement> {
    let masked = mask_sql(text);
    let mut statements = Vec::new();

    let mut start: Option<(usize, usize)> = None;
    let mut block = false;
    let mut line = 1;
    let mut line_start = 0;

    let mut push = |from: usize, to: usize, start_line: usize| {
        let stmt_text = text[from..to].trim();
        if !stmt_text.is_empty() {
            statements.push(Statement {
                text: stmt_text.to_string(),
                kind: classify(stmt_text),
                start_line,
                end_line: start_line + stmt_text.matches('\n').count(),
            });
        }
    };

    for (i, ch) in masked.char_indices() {
        match ch {
            '\n' => {
                if let Some((from, start_line)) = start {
                    if block && masked[line_start..i].trim() == "/" {
                        push(from, i, start_line);
                        start = None;
                        block = false;
                    } else if !block && block_opener_regex().is_match(&masked[from..i]) {
                        block = true;
                    }
                }
                line += 1;
                line_start = i + 1;
            }
            ';' => {
                if let Some((from, start_line)) = start {
                    if block {
                        continue;
                    }
                    if block_opener_regex().is_match(&masked[from..i]) {
                        block = true;
                    } else {
                        push(from, i + 1, start_line);
                        start = None;
                    }
                }
            }
            c if c.is_whitespace() => {}
            _ => {
                if start.is_none() {
                    let rest_of_line = masked[line_start..].lines().next().unwrap_or("");
                    if rest_of_line.trim() == "/" {
                        continue;
                    }
                    start = Some((i, line));
                }
            }
        }
    }

    if let Some((from, start_line)) = start {
        push(from, masked.len(), start_line);
    }

    statements
}

/// Per-line statement kinds of a script.
///
/// Each line takes the kind of the first statement covering it. Lines that
/// belong to no statement (blank, comment-only, `/`) are `UNKNOWN`.
#[derive(Debug, Clone, Default)]
pub struct StatementMap {
    kinds: Vec<StatementKind>,
}

impl StatementMap {
    pub fn build(text: &str) -> Self {
        let line_count = text.lines().count();
        let mut kinds: Vec<Option<StatementKind>> = vec![None; line_count];

        for stmt in split_statements(text) {
            for line in stmt.start_line..=stmt.end_line {
                if let Some(slot) = kinds.get_mut(line - 1) {
                    slot.get_or_insert(stmt.kind);
                }
            }
        }

        Self {
            kinds: kinds
                .into_iter()
                .map(|k| k.unwrap_or(StatementKind::Unknown))
                .collect(),
        }
    }

    /// Kind of the 1-based `line`; out-of-range lines are `UNKNOWN`
    pub fn kind_at(&self, line: usize) -> StatementKind {
        line.checked_sub(1)
            .and_then(|idx| self.kinds.get(idx))
            .copied()
            .unwrap_or(StatementKind::Unknown)
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}
