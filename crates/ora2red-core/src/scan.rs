//! Lexical masking of SQL text
//!
//! Keyword scans must not see words inside comments or quoted literals.
//! `mask_sql` blanks those regions out while keeping every byte offset and
//! line break of the input, so positions found in the masked text can be
//! used directly against the original.

#[derive(Clone, Copy, PartialEq, Eq)]
enum State {
    Code,
    LineComment,
    BlockComment,
    SingleQuote,
    DoubleQuote,
}

/// Replace comments and the contents of quoted literals with spaces.
///
/// Quote delimiters are kept; `''` inside a string literal is treated as an
/// escaped quote. The result has the same byte length as `text`.
pub fn mask_sql(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut state = State::Code;
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        match state {
            State::Code => match ch {
                '-' if chars.peek() == Some(&'-') => {
                    chars.next();
                    out.push_str("  ");
                    state = State::LineComment;
                }
                '/' if chars.peek() == Some(&'*') => {
                    chars.next();
                    out.push_str("  ");
                    state = State::BlockComment;
                }
                '\'' => {
                    out.push(ch);
                    state = State::SingleQuote;
                }
                '"' => {
                    out.push(ch);
                    state = State::DoubleQuote;
                }
                _ => out.push(ch),
            },
            State::LineComment => {
                if ch == '\n' {
                    out.push('\n');
                    state = State::Code;
                } else {
                    blank(&mut out, ch);
                }
            }
            State::BlockComment => {
                if ch == '*' && chars.peek() == Some(&'/') {
                    chars.next();
                    out.push_str("  ");
                    state = State::Code;
                } else {
                    blank(&mut out, ch);
                }
            }
            State::SingleQuote | State::DoubleQuote => {
                let quote = if state == State::SingleQuote { '\'' } else { '"' };
                if ch == quote {
                    if chars.peek() == Some(&quote) {
                        chars.next();
                        out.push_str("  ");
                    } else {
                        out.push(ch);
                        state = State::Code;
                    }
                } else {
                    blank(&mut out, ch);
                }
            }
        }
    }

    out
}

/// Push spaces covering the UTF-8 width of `ch`, keeping newlines
fn blank(out: &mut String, ch: char) {
    if ch == '\n' {
        out.push('\n');
        return;
    }
    for _ in 0..ch.len_utf8() {
        out.push(' ');
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_code_unchanged() {
        let sql = "SELECT a, b FROM t WHERE x = 1;";
        assert_eq!(mask_sql(sql), sql);
    }

    #[test]
    fn test_line_comment_masked() {
        let masked = mask_sql("SELECT 1 -- BEGIN here\nFROM dual");
        assert_eq!(masked, "SELECT 1              \nFROM dual");
    }

    #[test]
    fn test_block_comment_masked_across_lines() {
        let masked = mask_sql("/* DECLARE\nx */SELECT 1");
        assert_eq!(masked, "          \n    SELECT 1");
    }

    #[test]
    fn test_string_literal_contents_masked() {
        let masked = mask_sql("SELECT 'END LOOP' FROM t");
        assert_eq!(masked, "SELECT '        ' FROM t");
    }

    #[test]
    fn test_escaped_quote_inside_literal() {
        let masked = mask_sql("SELECT 'it''s' FROM t");
        assert_eq!(masked, "SELECT '     ' FROM t");
    }

    #[test]
    fn test_multibyte_keeps_byte_length() {
        let sql = "SELECT '한글' FROM t -- 주석";
        let masked = mask_sql(sql);
        assert_eq!(masked.len(), sql.len());
        assert!(masked.starts_with("SELECT '"));
        assert!(!masked.contains('한'));
    }

    #[test]
    fn test_double_quoted_identifier_masked() {
        let masked = mask_sql("SELECT \"BEGIN\" FROM t");
        assert_eq!(masked, "SELECT \"     \" FROM t");
    }
}
