//! End-to-end conversion behaviour through the public API

use ora2red_core::{classify, SeenChanges, StatementKind};
use ora2red_rules::{apply_unit, Converter, EngineOptions, Outcome, RuleDecl, RuleSet, Unit};

fn compile(decls: Vec<RuleDecl>) -> RuleSet {
    RuleSet::compile(decls).expect("rule set should compile")
}

#[test]
fn test_second_pass_is_a_fixed_point() {
    let rules = compile(vec![
        RuleDecl::new(r"NUMBER\((\d+),\s*(\d+)\)", r"DECIMAL(\1, \2)", "NUMBER(p,s)"),
        RuleDecl::new(r"\bNVL\(", "COALESCE(", "NVL"),
        RuleDecl::new(r"\bVARCHAR2\b", "VARCHAR", "VARCHAR2"),
    ]);
    let converter = Converter::new(&rules);
    let source = "CREATE TABLE t (\n  a NUMBER(10, 2),\n  b VARCHAR2(20)\n);\nSELECT NVL(a, 0) FROM t;\n";

    let first = converter.convert(source).unwrap();
    let second = converter.convert(&first.text).unwrap();

    assert_eq!(second.text, first.text);
    assert!(second.changes.is_empty());
    assert_eq!(second.outcome(), Outcome::NoChange);
}

#[test]
fn test_builtin_second_pass_is_a_fixed_point() {
    let rules = RuleSet::builtin().unwrap();
    let converter = Converter::new(&rules);
    let source = "CREATE TABLE orders (\n  id NUMBER(10,0),\n  total NUMBER(12,2),\n  note CLOB,\n  placed DATE\n);\nSELECT NVL(total, 0), SYSDATE FROM orders WHERE ROWNUM <= 10;\n";

    let first = converter.convert(source).unwrap();
    let second = converter.convert(&first.text).unwrap();

    assert_ne!(first.text, source);
    assert_eq!(second.text, first.text);
}

#[test]
fn test_builtin_case_rewrite_in_ddl_is_a_fixed_point() {
    let rules = RuleSet::builtin().unwrap();
    let converter = Converter::new(&rules);
    let source = "CREATE VIEW v AS SELECT NVL2(a, 1, 0) AS x FROM DUAL;\nCREATE TABLE t2 AS SELECT DECODE(a, 1, 2) AS d, s.NEXTVAL AS id FROM src;\n";

    let first = converter.convert(source).unwrap();
    assert_eq!(classify(&first.text), StatementKind::Plsql);

    let second = converter.convert(&first.text).unwrap();

    assert_eq!(second.text, first.text);
    assert!(second.changes.is_empty());
}

#[test]
fn test_lower_priority_value_runs_first() {
    // Both rules match "FOO"; the earlier one rewrites it out from under the later one
    let rules = compile(vec![
        RuleDecl::new("FOO", "QUX", "late").with_priority(20),
        RuleDecl::new("FOO", "BAR", "early").with_priority(10),
    ]);
    let mut seen = SeenChanges::new();

    let out = apply_unit(&Unit::new(1, "FOO"), None, &rules, &mut seen).unwrap();

    assert_eq!(out.text, "BAR");
    assert_eq!(out.fired, vec!["early"]);
}

#[test]
fn test_later_rule_sees_earlier_output() {
    let rules = compile(vec![
        RuleDecl::new(r"BAR", "BAZ", "second").with_priority(2),
        RuleDecl::new(r"FOO", "BAR", "first").with_priority(1),
    ]);
    let result = Converter::new(&rules)
        .with_options(EngineOptions { gate_by_kind: false })
        .convert("FOO")
        .unwrap();

    assert_eq!(result.text, "BAZ");
    assert_eq!(result.applied_rules, vec!["first", "second"]);
}

#[test]
fn test_duplicate_rules_log_once_per_line() {
    let rules = compile(vec![
        RuleDecl::new(r"\bSYSDATE\b", "GETDATE()", "SYSDATE"),
        RuleDecl::new(r"\bSYSDATE\b", "GETDATE()", "SYSDATE"),
    ]);
    let mut seen = SeenChanges::new();
    let unit = Unit::new(4, "SELECT SYSDATE, SYSDATE");

    let first = apply_unit(&unit, None, &rules, &mut seen).unwrap();
    let again = apply_unit(&unit, None, &rules, &mut seen).unwrap();

    assert_eq!(first.entries.len(), 1);
    assert!(again.entries.is_empty());
    assert_eq!(again.text, "SELECT GETDATE(), GETDATE()");
}

#[test]
fn test_same_rule_on_different_lines_logs_each() {
    let rules = compile(vec![RuleDecl::new(r"\bSYSDATE\b", "GETDATE()", "SYSDATE")]);
    let result = Converter::new(&rules)
        .convert("SELECT SYSDATE;\nSELECT SYSDATE;\n")
        .unwrap();

    let lines: Vec<_> = result.changes.iter().map(|c| c.line).collect();
    assert_eq!(lines, vec![1, 2]);
}

#[test]
fn test_classification_examples() {
    assert_eq!(classify("CREATE TABLE x (id INT)"), StatementKind::Ddl);
    assert_eq!(classify("SELECT * FROM x"), StatementKind::Dml);
    assert_eq!(
        classify("DECLARE x NUMBER; BEGIN SELECT 1 INTO x FROM dual; END;"),
        StatementKind::Plsql
    );
    assert_eq!(classify("COMMIT;"), StatementKind::Control);
    assert_eq!(classify(""), StatementKind::Unknown);
}

#[test]
fn test_number_rule_single_entry() {
    let rules = compile(vec![RuleDecl::new(
        r"NUMBER\((\d+),\s*(\d+)\)",
        r"DECIMAL(\1, \2)",
        "NUMBER(p,s) -> DECIMAL(p, s)",
    )]);
    let mut seen = SeenChanges::new();

    let out = apply_unit(
        &Unit::new(1, "col NUMBER(10, 2)"),
        Some(StatementKind::Ddl),
        &rules,
        &mut seen,
    )
    .unwrap();

    assert_eq!(out.text, "col DECIMAL(10, 2)");
    assert_eq!(out.entries.len(), 1);
    assert_eq!(out.entries[0].line, 1);
    assert_eq!(out.entries[0].before, "col NUMBER(10, 2)");
    assert_eq!(out.entries[0].after, "col DECIMAL(10, 2)");
}

#[test]
fn test_manual_reason_reported_once_per_file() {
    let rules = compile(vec![RuleDecl::new(r"\bOPEN\s+(\w+)\s+FOR\b", r"OPEN \1 FOR", "cursor open")
        .with_applicable_to(&[StatementKind::Plsql])
        .with_manual_review("review cursor usage")
        .with_priority(1)]);
    // Lines 5 and 9 open a cursor
    let source = "\
CREATE OR REPLACE PROCEDURE p AS
  c1 SYS_REFCURSOR;
  c2 SYS_REFCURSOR;
BEGIN
  open c1 for SELECT 1 FROM dual;
  NULL;
  NULL;
  NULL;
  open c2 for SELECT 2 FROM dual;
END;
/
";

    let result = Converter::new(&rules).convert(source).unwrap();

    let lines: Vec<_> = result.changes.iter().map(|c| c.line).collect();
    assert_eq!(lines, vec![5, 9]);
    assert!(result.manual_required);
    assert_eq!(result.manual_reasons, vec!["review cursor usage"]);
    assert_eq!(result.outcome(), Outcome::ManualReview);
}

#[test]
fn test_excluded_kind_never_fires() {
    let rules = compile(vec![RuleDecl::new(r"\bSYSDATE\b", "GETDATE()", "SYSDATE")
        .with_applicable_to(&[StatementKind::Ddl])]);
    let source = "SELECT SYSDATE FROM t;\n";

    let result = Converter::new(&rules).convert(source).unwrap();

    assert_eq!(result.text, source);
    assert!(result.changes.is_empty());
    assert!(result.applied_rules.is_empty());
}

#[test]
fn test_invalid_rule_set_fails_whole() {
    let err = RuleSet::compile(vec![
        RuleDecl::new("ok", "fine", "good rule"),
        RuleDecl::new("NUMBER(", "x", "bad rule"),
    ])
    .unwrap_err();

    assert!(err.to_string().contains("bad rule"));
}

#[test]
fn test_routing_kind_is_lenient() {
    let rules = compile(vec![]);
    let converter = Converter::new(&rules);

    // Strict classification would say UNKNOWN; routing finds a DML keyword
    let result = converter.convert("WITH x AS (SELECT 1) SELECT * FROM x;").unwrap();
    assert_eq!(classify("WITH x AS (SELECT 1) SELECT * FROM x;"), StatementKind::Unknown);
    assert_eq!(result.kind, StatementKind::Dml);

    assert_eq!(converter.convert("").unwrap().kind, StatementKind::Ddl);
}
