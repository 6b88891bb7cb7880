//! ora2red-core: Core abstractions for Oracle SQL conversion
//!
//! This crate provides:
//! - `StatementKind`: Coarse statement classification (DDL, DML, PLSQL, CONTROL, UNKNOWN)
//! - `classify()`: Strict first-token classifier used to gate rules
//! - `route_kind()`: Lenient whole-text classifier used to route converted files
//! - `split_statements()` / `StatementMap`: Coarse statement boundaries and per-line kinds
//! - `ChangeEntry` / `SeenChanges`: Change-log records and their per-file dedup state

mod change;
pub mod classify;
pub mod scan;

pub use change::{ChangeEntry, ChangeKey, SeenChanges};
pub use classify::{
    classify, route_kind, split_statements, Statement, StatementKind, StatementMap, UnknownKind,
};
pub use scan::mask_sql;
