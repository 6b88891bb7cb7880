//! Built-in Oracle to Redshift rule set
//!
//! The rules live in `rules/oracle_to_redshift.yaml` and are embedded at
//! compile time.

use crate::loader::{load_rules_from_str, RuleFormat, RuleLoadError};
use crate::schema::RuleDecl;

/// Source of the built-in rule file
pub const BUILTIN_RULES: &str = include_str!("../rules/oracle_to_redshift.yaml");

/// Name the built-in set is reported under
pub const BUILTIN_NAME: &str = "built-in (oracle_to_redshift.yaml)";

pub fn builtin_decls() -> Result<Vec<RuleDecl>, RuleLoadError> {
    load_rules_from_str(BUILTIN_RULES, RuleFormat::Yaml)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::RuleSet;
    use crate::engine::Converter;
    use ora2red_core::StatementKind;

    fn convert(sql: &str) -> String {
        let rules = RuleSet::builtin().unwrap();
        Converter::new(&rules).convert(sql).unwrap().text
    }

    #[test]
    fn test_builtin_compiles() {
        let rules = RuleSet::builtin().unwrap();
        assert!(rules.len() > 20);

        let priorities: Vec<_> = rules.iter().map(|r| r.priority()).collect();
        assert!(priorities.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_builtin_descriptions_unique() {
        let rules = RuleSet::builtin().unwrap();
        let mut names = rules.descriptions();
        names.sort();
        let before = names.len();
        names.dedup();
        assert_eq!(names.len(), before);
    }

    #[test]
    fn test_create_table() {
        let sql = "CREATE TABLE emp (\n  id NUMBER(10,0),\n  flag NUMBER(1,0),\n  salary NUMBER(12, 2),\n  name VARCHAR2(100 CHAR),\n  hired DATE\n) TABLESPACE users;\n";
        assert_eq!(
            convert(sql),
            "CREATE TABLE emp (\n  id BIGINT,\n  flag SMALLINT,\n  salary DECIMAL(12, 2),\n  name VARCHAR(100),\n  hired TIMESTAMP\n);\n"
        );
    }

    #[test]
    fn test_query_functions() {
        assert_eq!(
            convert("SELECT NVL(a, 0), SUBSTR(b, 1, 2) FROM t WHERE c > SYSDATE;"),
            "SELECT COALESCE(a, 0), SUBSTRING(b, 1, 2) FROM t WHERE c > GETDATE();"
        );
        assert_eq!(convert("SELECT SYSDATE FROM DUAL;"), "SELECT GETDATE();");
        assert_eq!(
            convert("SELECT a FROM x MINUS SELECT a FROM y;"),
            "SELECT a FROM x EXCEPT SELECT a FROM y;"
        );
    }

    #[test]
    fn test_manual_rules_flagged() {
        let rules = RuleSet::builtin().unwrap();
        let result = Converter::new(&rules)
            .convert("SELECT a FROM x, y WHERE x.id = y.id(+);\n")
            .unwrap();

        assert!(result.manual_required);
        assert_eq!(result.text, "SELECT a FROM x, y WHERE x.id = y.id;\n");
        assert_eq!(result.manual_reasons.len(), 1);
    }

    #[test]
    fn test_refcursor_flagged() {
        let rules = RuleSet::builtin().unwrap();
        let rule = rules
            .iter()
            .find(|r| r.description() == "SYS_REFCURSOR -> REFCURSOR")
            .unwrap();
        assert!(rule.manual_review_required());
        assert_eq!(rule.manual_reason(), Some("Review cursor usage"));
    }

    #[test]
    fn test_plsql_rules_also_cover_ddl_and_dml() {
        // A CASE rewrite adds END, so a DDL or DML statement classifies as
        // PLSQL once converted
        let rules = RuleSet::builtin().unwrap();
        for rule in &rules {
            if rule.applies_to(StatementKind::Plsql) {
                assert!(
                    rule.applies_to(StatementKind::Ddl) && rule.applies_to(StatementKind::Dml),
                    "{} applies to PLSQL only partially",
                    rule.description()
                );
            }
        }
    }

    #[test]
    fn test_case_rewrite_in_ddl_is_complete() {
        assert_eq!(
            convert("CREATE VIEW v AS SELECT NVL2(a, 1, 0) AS x FROM DUAL;"),
            "CREATE VIEW v AS SELECT CASE WHEN a IS NOT NULL THEN 1 ELSE 0 END AS x;"
        );
        assert_eq!(
            convert("CREATE TABLE t2 AS SELECT DECODE(a, 1, 2) AS d, s.NEXTVAL AS id FROM src;"),
            "CREATE TABLE t2 AS SELECT CASE WHEN a = 1 THEN 2 END AS d, NULL /* sequence s */ AS id FROM src;"
        );
    }

    #[test]
    fn test_builtin_idempotent() {
        let sql = "CREATE TABLE t (\n  a NUMBER,\n  b NUMBER(5),\n  c CLOB,\n  d BLOB,\n  e RAW(16)\n) NOLOGGING;\nSELECT NVL2(a, 1, 0), DECODE(s, 'A', 1), INSTR(x, 'y'), TO_CHAR(n), seq.NEXTVAL FROM t WHERE ROWNUM <= 5;\nDECLARE\n  c SYS_REFCURSOR;\nBEGIN\n  NULL;\nEND;\n/\nCREATE VIEW v AS SELECT NVL2(a, 1, 0) AS x FROM DUAL;\nCREATE TABLE t2 AS SELECT DECODE(a, 1, 2) AS d, s.NEXTVAL AS id FROM src;\n";
        let once = convert(sql);
        let twice = convert(&once);
        assert_ne!(once, sql);
        assert_eq!(once, twice);
    }
}
