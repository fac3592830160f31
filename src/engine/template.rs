//! Replacement templates for regex operations.
//!
//! Supported references:
//!
//! | syntax     | expands to                              |
//! |------------|-----------------------------------------|
//! | `$$`       | a literal `$`                           |
//! | `$&`       | the whole match                         |
//! | `$1`-`$99` | numbered group (empty if it didn't take part) |
//! | `$<name>`, `${name}` | named group                   |
//! | `` $` ``   | region text before the match            |
//! | `$'`       | region text after the match             |
//!
//! A reference to a group the pattern does not define is kept as literal
//! text, so `$9` in a pattern with two groups stays `$9`. Group numbers start
//! at 1: `$0` and `$00` are literal.

use regex::{Captures, Regex};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Piece {
    Literal(String),
    Group(usize),
    Named(String),
    Before,
    After,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    pieces: Vec<Piece>,
}

impl Template {
    /// Compile `template` against the groups `regex` defines.
    pub fn parse(template: &str, regex: &Regex) -> Self {
        let group_count = regex.captures_len();
        let has_name = |name: &str| regex.capture_names().flatten().any(|n| n == name);

        let mut pieces = Vec::new();
        let mut literal = String::new();
        let mut rest = template;

        while let Some(pos) = rest.find('$') {
            literal.push_str(&rest[..pos]);
            let after = &rest[pos + 1..];

            let (piece, consumed) = match after.chars().next() {
                Some('$') => {
                    literal.push('$');
                    (None, 1)
                }
                Some('&') => (Some(Piece::Group(0)), 1),
                Some('`') => (Some(Piece::Before), 1),
                Some('\'') => (Some(Piece::After), 1),
                Some(c) if c.is_ascii_digit() => match numbered(after, group_count) {
                    Some((group, len)) => (Some(Piece::Group(group)), len),
                    None => {
                        literal.push('$');
                        (None, 0)
                    }
                },
                Some(open @ ('<' | '{')) => {
                    let close = if open == '<' { '>' } else { '}' };
                    match after[1..].find(close) {
                        Some(end) if has_name(&after[1..=end]) => {
                            (Some(Piece::Named(after[1..=end].to_string())), end + 2)
                        }
                        _ => {
                            literal.push('$');
                            (None, 0)
                        }
                    }
                }
                _ => {
                    literal.push('$');
                    (None, 0)
                }
            };

            if let Some(piece) = piece {
                if !literal.is_empty() {
                    pieces.push(Piece::Literal(std::mem::take(&mut literal)));
                }
                pieces.push(piece);
            }
            rest = &after[consumed..];
        }

        literal.push_str(rest);
        if !literal.is_empty() {
            pieces.push(Piece::Literal(literal));
        }

        Self { pieces }
    }

    /// Expand this template for one match. `haystack` is the full region the
    /// captures were taken from.
    pub fn expand(&self, caps: &Captures<'_>, haystack: &str) -> String {
        let whole = caps.get(0).map_or(0..0, |m| m.range());
        let mut out = String::new();
        for piece in &self.pieces {
            match piece {
                Piece::Literal(text) => out.push_str(text),
                Piece::Group(idx) => {
                    if let Some(m) = caps.get(*idx) {
                        out.push_str(m.as_str());
                    }
                }
                Piece::Named(name) => {
                    if let Some(m) = caps.name(name) {
                        out.push_str(m.as_str());
                    }
                }
                Piece::Before => out.push_str(&haystack[..whole.start]),
                Piece::After => out.push_str(&haystack[whole.end..]),
            }
        }
        out
    }
}

/// Read a one- or two-digit group number from the start of `text`.
///
/// Two digits win when they name an existing group; otherwise one digit is
/// used if that group exists. Group 0 is never addressable this way.
fn numbered(text: &str, group_count: usize) -> Option<(usize, usize)> {
    let digits: Vec<usize> = text
        .chars()
        .take(2)
        .map_while(|c| c.to_digit(10))
        .map(|d| d as usize)
        .collect();

    if digits.len() == 2 {
        let two = digits[0] * 10 + digits[1];
        if (1..group_count).contains(&two) {
            return Some((two, 2));
        }
    }
    match digits.first() {
        Some(&one) if (1..group_count).contains(&one) => Some((one, 1)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expand_all(pattern: &str, template: &str, haystack: &str) -> String {
        let regex = Regex::new(pattern).unwrap();
        let template = Template::parse(template, &regex);
        regex
            .replace_all(haystack, |caps: &Captures<'_>| template.expand(caps, haystack))
            .into_owned()
    }

    #[test]
    fn test_whole_match() {
        assert_eq!(expand_all(r"old\w+", "new$&", "oldValue"), "newoldValue");
        assert_eq!(expand_all(r"old\w+", "[$&]", "oldValue"), "[oldValue]");
    }

    #[test]
    fn test_numbered_groups() {
        assert_eq!(expand_all(r"(\w+)=(\w+)", "$2=$1", "a=b"), "b=a");
    }

    #[test]
    fn test_group_followed_by_text() {
        // Unlike the regex crate's own syntax, "$1a" is group 1 then "a".
        assert_eq!(expand_all(r"(x)", "$1a", "x"), "xa");
    }

    #[test]
    fn test_group_zero_is_literal() {
        assert_eq!(expand_all(r"old", "$0", "old"), "$0");
        assert_eq!(expand_all(r"(o)ld", "$00|$01", "old"), "$00|o");
    }

    #[test]
    fn test_missing_group_is_literal() {
        assert_eq!(expand_all(r"(x)", "$5", "x"), "$5");
    }

    #[test]
    fn test_two_digit_fallback() {
        // Only one group: "$12" is group 1 followed by "2".
        assert_eq!(expand_all(r"(x)", "$12", "x"), "x2");
    }

    #[test]
    fn test_named_groups() {
        assert_eq!(
            expand_all(r"(?P<key>\w+):(?P<val>\w+)", "$<val>:${key}", "a:b"),
            "b:a"
        );
        assert_eq!(expand_all(r"(?P<key>\w+)", "$<nope>", "a"), "$<nope>");
    }

    #[test]
    fn test_dollar_escape() {
        assert_eq!(expand_all(r"cost", "$$5", "cost"), "$5");
        assert_eq!(expand_all(r"cost", "5$", "cost"), "5$");
    }

    #[test]
    fn test_before_and_after() {
        assert_eq!(expand_all(r"b", "[$`|$']", "abc"), "a[a|c]c");
    }

    #[test]
    fn test_unmatched_optional_group_is_empty() {
        assert_eq!(expand_all(r"a(z)?", "<$1>", "a"), "<>");
    }
}
