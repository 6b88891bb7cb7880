//! Replacement templates
//!
//! Rule files write replacements with backslash references (`\1`, `\g<2>`,
//! `\g<name>`), the form most regex-based SQL converters already use. The
//! template is parsed once at compile time into literal and group pieces and
//! expanded against each match. `$` has no special meaning.

use regex::{Captures, Regex};
use std::fmt;
use thiserror::Error;

/// Errors in the template text itself
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error("bad escape \\{0} at position {1}")]
    BadEscape(char, usize),

    #[error("missing '>' in group reference at position {0}")]
    UnterminatedGroup(usize),

    #[error("invalid group reference '{0}' at position {1}")]
    InvalidGroup(String, usize),

    #[error("trailing backslash at end of template")]
    TrailingBackslash,
}

/// A capture group referenced from a template
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupRef {
    Index(usize),
    Name(String),
}

impl fmt::Display for GroupRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupRef::Index(i) => write!(f, "\\{}", i),
            GroupRef::Name(name) => write!(f, "\\g<{}>", name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Piece {
    Literal(String),
    Group(GroupRef),
}

/// A parsed replacement template
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplacementTemplate {
    pieces: Vec<Piece>,
}

impl ReplacementTemplate {
    /// Parse a backslash-style template
    pub fn parse(template: &str) -> Result<Self, TemplateError> {
        let mut pieces = Vec::new();
        let mut literal = String::new();
        let mut chars = template.char_indices().peekable();

        while let Some((pos, ch)) = chars.next() {
            if ch != '\\' {
                literal.push(ch);
                continue;
            }

            let Some((_, next)) = chars.next() else {
                return Err(TemplateError::TrailingBackslash);
            };

            let group = match next {
                'g' => {
                    if chars.next_if(|&(_, c)| c == '<').is_none() {
                        return Err(TemplateError::UnterminatedGroup(pos));
                    }
                    let mut name = String::new();
                    loop {
                        match chars.next() {
                            Some((_, '>')) => break,
                            Some((_, c)) => name.push(c),
                            None => return Err(TemplateError::UnterminatedGroup(pos)),
                        }
                    }
                    Some(parse_group_name(&name, pos)?)
                }
                '1'..='9' => {
                    let mut digits = next.to_string();
                    if let Some((_, d)) = chars.next_if(|&(_, c)| c.is_ascii_digit()) {
                        digits.push(d);
                    }
                    // At most two digits, so this always fits
                    Some(GroupRef::Index(digits.parse().unwrap_or(0)))
                }
                '0' => return Err(TemplateError::InvalidGroup("0".to_string(), pos)),
                '\\' => {
                    literal.push('\\');
                    None
                }
                'n' | 't' | 'r' | 'a' | 'f' | 'v' | 'b' => {
                    literal.push(match next {
                        'n' => '\n',
                        't' => '\t',
                        'r' => '\r',
                        'a' => '\x07',
                        'f' => '\x0c',
                        'v' => '\x0b',
                        _ => '\x08',
                    });
                    None
                }
                c if c.is_ascii_alphabetic() => return Err(TemplateError::BadEscape(c, pos)),
                c => {
                    literal.push('\\');
                    literal.push(c);
                    None
                }
            };

            if let Some(group) = group {
                if !literal.is_empty() {
                    pieces.push(Piece::Literal(std::mem::take(&mut literal)));
                }
                pieces.push(Piece::Group(group));
            }
        }

        if !literal.is_empty() {
            pieces.push(Piece::Literal(literal));
        }

        Ok(Self { pieces })
    }

    /// True when the template references no capture group
    pub fn is_literal(&self) -> bool {
        self.pieces.iter().all(|p| matches!(p, Piece::Literal(_)))
    }

    /// All group references, in template order
    pub fn groups(&self) -> impl Iterator<Item = &GroupRef> {
        self.pieces.iter().filter_map(|p| match p {
            Piece::Group(g) => Some(g),
            Piece::Literal(_) => None,
        })
    }

    /// First referenced group that `regex` does not define
    pub fn missing_group(&self, regex: &Regex) -> Option<&GroupRef> {
        self.groups().find(|group| match group {
            GroupRef::Index(i) => *i >= regex.captures_len(),
            GroupRef::Name(name) => !regex.capture_names().flatten().any(|n| n == name),
        })
    }

    /// Expand the template for one match, appending to `dst`.
    ///
    /// A group that did not participate in the match expands to nothing.
    pub fn expand(&self, caps: &Captures<'_>, dst: &mut String) {
        for piece in &self.pieces {
            match piece {
                Piece::Literal(text) => dst.push_str(text),
                Piece::Group(GroupRef::Index(i)) => {
                    if let Some(m) = caps.get(*i) {
                        dst.push_str(m.as_str());
                    }
                }
                Piece::Group(GroupRef::Name(name)) => {
                    if let Some(m) = caps.name(name) {
                        dst.push_str(m.as_str());
                    }
                }
            }
        }
    }

    pub fn render(&self, caps: &Captures<'_>) -> String {
        let mut out = String::new();
        self.expand(caps, &mut out);
        out
    }
}

fn parse_group_name(name: &str, pos: usize) -> Result<GroupRef, TemplateError> {
    if !name.is_empty() && name.chars().all(|c| c.is_ascii_digit()) {
        return name
            .parse()
            .map(GroupRef::Index)
            .map_err(|_| TemplateError::InvalidGroup(name.to_string(), pos));
    }

    let mut chars = name.chars();
    let valid = matches!(chars.next(), Some(c) if c.is_alphabetic() || c == '_')
        && chars.all(|c| c.is_alphanumeric() || c == '_');
    if valid {
        Ok(GroupRef::Name(name.to_string()))
    } else {
        Err(TemplateError::InvalidGroup(name.to_string(), pos))
    }
}
