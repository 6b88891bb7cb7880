//! Whole-script review keyword scan
//!
//! Some constructs are worth a human look no matter which rules fired. The
//! scan only reports what it finds; it never changes a script's outcome.

/// Keywords scanned for when none are configured
pub const DEFAULT_REVIEW_KEYWORDS: &[&str] = &["DECLARE", "EXCEPTION WHEN OTHERS", "CONNECT BY PRIOR"];

#[derive(Debug, Clone)]
pub struct ReviewScanner {
    /// Uppercased, single-spaced
    keywords: Vec<String>,
}

impl ReviewScanner {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut normalized: Vec<String> = Vec::new();
        for keyword in keywords {
            let keyword = normalize(keyword.as_ref());
            if !keyword.is_empty() && !normalized.contains(&keyword) {
                normalized.push(keyword);
            }
        }
        Self { keywords: normalized }
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    /// Keywords present in `text`, in configured order.
    ///
    /// Matching is a case-insensitive substring test; runs of whitespace in the
    /// text count as a single space.
    pub fn scan(&self, text: &str) -> Vec<String> {
        let haystack = normalize(text);
        self.keywords
            .iter()
            .filter(|k| haystack.contains(k.as_str()))
            .cloned()
            .collect()
    }
}

impl Default for ReviewScanner {
    fn default() -> Self {
        Self::new(DEFAULT_REVIEW_KEYWORDS)
    }
}

fn normalize(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_keywords() {
        let scanner = ReviewScanner::default();
        let text = "declare\n  x number;\nbegin\n  null;\nexception when\n   others then null;\nend;";
        assert_eq!(scanner.scan(text), vec!["DECLARE", "EXCEPTION WHEN OTHERS"]);
    }

    #[test]
    fn test_connect_by_prior() {
        let scanner = ReviewScanner::default();
        let found = scanner.scan("SELECT id FROM t START WITH id = 1 CONNECT BY PRIOR id = parent_id");
        assert_eq!(found, vec!["CONNECT BY PRIOR"]);
    }

    #[test]
    fn test_nothing_found() {
        assert!(ReviewScanner::default().scan("SELECT 1").is_empty());
    }

    #[test]
    fn test_custom_keywords_normalized() {
        let scanner = ReviewScanner::new(["  merge   into ", "MERGE INTO", ""]);
        assert_eq!(scanner.keywords(), &["MERGE INTO".to_string()]);
        assert_eq!(scanner.scan("Merge Into t USING s"), vec!["MERGE INTO"]);
    }
}
