//! Regex flag configuration.
//!
//! Callers may pass extra flags as a short string (`"gim"`). They are parsed
//! into a [`RegexFlags`] record up front so conflicts surface at validation
//! time instead of when the pattern is compiled.

use crate::engine::errors::EngineError;
use regex::RegexBuilder;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RegexFlags {
    /// `i`
    pub ignore_case: bool,
    /// `m`: `^`/`$` match at line boundaries inside the region
    pub multi_line: bool,
    /// `s`: `.` also matches `\n`
    pub dot_matches_new_line: bool,
    /// `x`: whitespace and `#` comments in the pattern are ignored
    pub ignore_whitespace: bool,
    /// `g`: replace-all. Always on; accepted so callers can pass it explicitly.
    pub global: bool,
    /// `u`: Unicode classes. Always on.
    pub unicode: bool,
}

impl RegexFlags {
    /// Parse a flag string. Unknown or repeated letters are rejected.
    pub fn parse(flags: &str) -> Result<Self, EngineError> {
        let mut parsed = RegexFlags::default();
        for letter in flags.trim().chars() {
            let slot = match letter {
                'i' => &mut parsed.ignore_case,
                'm' => &mut parsed.multi_line,
                's' => &mut parsed.dot_matches_new_line,
                'x' => &mut parsed.ignore_whitespace,
                'g' => &mut parsed.global,
                'u' => &mut parsed.unicode,
                other => {
                    return Err(EngineError::invalid(format!(
                        "unsupported regex flag '{other}' (expected any of g, i, m, s, u, x)"
                    )))
                }
            };
            if *slot {
                return Err(EngineError::invalid(format!(
                    "duplicate regex flag '{letter}'"
                )));
            }
            *slot = true;
        }
        Ok(parsed)
    }

    pub fn is_empty(&self) -> bool {
        *self == RegexFlags::default()
    }

    /// Merge the operation-level `ignore_case` switch into these flags.
    ///
    /// Asking for case-insensitivity twice is reported as a conflict.
    pub fn merge_ignore_case(mut self, ignore_case: bool) -> Result<Self, EngineError> {
        if ignore_case {
            if self.ignore_case {
                return Err(EngineError::invalid(
                    "ignore_case is set and regex flags also contain 'i'",
                ));
            }
            self.ignore_case = true;
        }
        Ok(self)
    }

    pub(crate) fn configure<'a>(&self, builder: &'a mut RegexBuilder) -> &'a mut RegexBuilder {
        builder
            .case_insensitive(self.ignore_case)
            .multi_line(self.multi_line)
            .dot_matches_new_line(self.dot_matches_new_line)
            .ignore_whitespace(self.ignore_whitespace)
    }
}
