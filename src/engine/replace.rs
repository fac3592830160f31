//! Sequential search/replace.
//!
//! Operations compose: each one runs against the document produced by the
//! previous one. The working region of an operation is matched as a single
//! `\n`-joined block, so a pattern can span lines inside its scope but never
//! reach outside it.

use crate::document::{Document, LineEnding};
use crate::engine::errors::{BatchError, EngineError};
use crate::engine::flags::RegexFlags;
use crate::engine::template::Template;
use regex::{Captures, NoExpand, Regex, RegexBuilder};
use std::ops::Range;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReplaceOperation {
    pub search: String,
    pub replace: String,
    pub scope_start: Option<usize>,
    pub scope_end: Option<usize>,
    pub use_regex: bool,
    pub ignore_case: bool,
    /// Extra flags; only meaningful with `use_regex`.
    pub flags: RegexFlags,
}

impl ReplaceOperation {
    /// Literal, case-sensitive, whole-document replacement.
    pub fn literal(search: impl Into<String>, replace: impl Into<String>) -> Self {
        Self {
            search: search.into(),
            replace: replace.into(),
            ..Self::default()
        }
    }

    pub fn regex(search: impl Into<String>, replace: impl Into<String>) -> Self {
        Self {
            use_regex: true,
            ..Self::literal(search, replace)
        }
    }

    pub fn ignore_case(mut self) -> Self {
        self.ignore_case = true;
        self
    }

    pub fn with_flags(mut self, flags: RegexFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn scoped(mut self, start: usize, end: usize) -> Self {
        self.scope_start = Some(start);
        self.scope_end = Some(end);
        self
    }

    /// Resolve the inclusive 1-based scope against `doc`.
    ///
    /// `None` means the document is empty and no scope was given.
    fn region(&self, doc: &Document) -> Result<Option<(usize, usize)>, EngineError> {
        let line_count = doc.line_count();
        match (self.scope_start, self.scope_end) {
            (None, None) if line_count == 0 => Ok(None),
            (start, end) => {
                let start = start.unwrap_or(1);
                let end = end.unwrap_or(line_count);
                doc.check_range(start, end)?;
                Ok(Some((start, end)))
            }
        }
    }

    /// Regions are `\n`-joined, so `\r\n` in the search or replacement text
    /// is folded to `\n` before compiling.
    fn compile(&self) -> Result<Matcher, EngineError> {
        if self.search.is_empty() {
            return Err(EngineError::invalid("search text is empty"));
        }
        let search = self.search.replace("\r\n", "\n");
        let replace = self.replace.replace("\r\n", "\n");

        if !self.use_regex {
            if !self.flags.is_empty() {
                return Err(EngineError::invalid("regex flags given without use_regex"));
            }
            let regex = RegexBuilder::new(&regex::escape(&search))
                .case_insensitive(self.ignore_case)
                .build()
                .map_err(|e| self.pattern_error(e))?;
            return Ok(Matcher::Literal {
                regex,
                replacement: replace,
            });
        }

        let flags = self.flags.merge_ignore_case(self.ignore_case)?;
        let regex = flags
            .configure(&mut RegexBuilder::new(&search))
            .build()
            .map_err(|e| self.pattern_error(e))?;
        let template = Template::parse(&replace, &regex);
        Ok(Matcher::Regex { regex, template })
    }

    fn pattern_error(&self, error: regex::Error) -> EngineError {
        EngineError::Pattern {
            pattern: self.search.clone(),
            message: error.to_string(),
        }
    }
}

/// A compiled operation.
#[derive(Debug)]
enum Matcher {
    Literal { regex: Regex, replacement: String },
    Regex { regex: Regex, template: Template },
}

/// One match inside a working region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchResult {
    /// Byte span within the `\n`-joined region text.
    pub span: Range<usize>,
    pub replacement: String,
}

impl Matcher {
    fn regex(&self) -> &Regex {
        match self {
            Matcher::Literal { regex, .. } | Matcher::Regex { regex, .. } => regex,
        }
    }

    fn find_all(&self, haystack: &str) -> Vec<MatchResult> {
        self.regex()
            .captures_iter(haystack)
            .filter_map(|caps| {
                let span = caps.get(0)?.range();
                Some(MatchResult {
                    span,
                    replacement: self.expand(&caps, haystack),
                })
            })
            .collect()
    }

    fn expand(&self, caps: &Captures<'_>, haystack: &str) -> String {
        match self {
            Matcher::Literal { replacement, .. } => replacement.clone(),
            Matcher::Regex { template, .. } => template.expand(caps, haystack),
        }
    }

    /// Replace every non-overlapping match, returning the new text and count.
    fn replace_all(&self, haystack: &str) -> (String, usize) {
        let count = self.regex().find_iter(haystack).count();
        if count == 0 {
            return (haystack.to_string(), 0);
        }
        let replaced = match self {
            Matcher::Literal { regex, replacement } => {
                regex.replace_all(haystack, NoExpand(replacement)).into_owned()
            }
            Matcher::Regex { regex, template } => regex
                .replace_all(haystack, |caps: &Captures<'_>| template.expand(caps, haystack))
                .into_owned(),
        };
        (replaced, count)
    }
}

/// Apply `ops` in order, returning the final document and per-operation
/// match counts.
///
/// Every operation is compiled before any is applied. A scope is checked
/// against the document its operation runs on, so it may address lines an
/// earlier operation created.
pub fn apply_replacements(
    doc: &Document,
    ops: &[ReplaceOperation],
) -> Result<(Document, Vec<usize>), BatchError> {
    let matchers = ops
        .iter()
        .enumerate()
        .map(|(index, op)| op.compile().map_err(|e| BatchError::new(index, e)))
        .collect::<Result<Vec<_>, _>>()?;

    let mut current = doc.clone();
    let mut counts = Vec::with_capacity(ops.len());

    for (index, (op, matcher)) in ops.iter().zip(&matchers).enumerate() {
        let region = op.region(&current).map_err(|e| BatchError::new(index, e))?;
        let (next, count) = replace_in_region(&current, region, matcher);
        debug!(index, matches = count, regex = op.use_regex, "applied replace operation");
        counts.push(count);
        current = next;
    }

    debug!(
        operations = ops.len(),
        matched = counts.iter().filter(|&&c| c > 0).count(),
        "applied replace batch"
    );

    Ok((current, counts))
}

/// List the matches `op` would make against `doc` without applying it.
pub fn find_matches(doc: &Document, op: &ReplaceOperation) -> Result<Vec<MatchResult>, EngineError> {
    let matcher = op.compile()?;
    let text = match op.region(doc)? {
        Some((start, end)) => doc.slice(start, end)?.join("\n"),
        None => String::new(),
    };
    Ok(matcher.find_all(&text))
}

fn replace_in_region(
    doc: &Document,
    region: Option<(usize, usize)>,
    matcher: &Matcher,
) -> (Document, usize) {
    let lines = doc.lines();
    let (start, end) = match region {
        Some(bounds) => bounds,
        None => {
            // Empty document: a pattern can still match the empty string.
            let (text, count) = matcher.replace_all("");
            if text.is_empty() {
                return (doc.clone(), count);
            }
            let new_lines = split_region(doc, &text, false);
            return (doc.with_lines(new_lines), count);
        }
    };

    let text = lines[start - 1..end].join("\n");
    let (replaced, count) = matcher.replace_all(&text);
    if count == 0 {
        return (doc.clone(), 0);
    }

    let mut out = Vec::with_capacity(lines.len());
    out.extend_from_slice(&lines[..start - 1]);
    let last_terminated = end < lines.len() || doc.has_trailing_newline();
    out.extend(split_region(doc, &replaced, last_terminated));
    out.extend_from_slice(&lines[end..]);
    (doc.with_lines(out), count)
}

/// Split replaced region text back into lines. In a CRLF document a
/// terminated line drops its trailing `\r`, as [`Document::from_text`] does.
fn split_region(doc: &Document, text: &str, last_terminated: bool) -> Vec<String> {
    let mut lines: Vec<String> = text.split('\n').map(str::to_string).collect();
    if doc.line_ending() == LineEnding::CrLf {
        let terminated = if last_terminated {
            lines.len()
        } else {
            lines.len() - 1
        };
        for line in &mut lines[..terminated] {
            if line.ends_with('\r') {
                line.pop();
            }
        }
    }
    lines
}

/// A line that looks like a failed literal search target.
#[derive(Debug, Clone, PartialEq)]
pub struct NearMatch {
    pub line: usize,
    pub text: String,
    pub similarity: f64,
}

/// Closest line to a single-line literal `search` inside the operation's
/// scope, by normalized Levenshtein similarity. Used to explain zero-match
/// operations. Returns `None` for regex or multi-line searches, or when no
/// line reaches `threshold`.
pub fn closest_line(doc: &Document, op: &ReplaceOperation, threshold: f64) -> Option<NearMatch> {
    if op.use_regex || op.search.contains('\n') || op.search.trim().is_empty() {
        return None;
    }
    let (start, end) = op.region(doc).ok()??;
    let needle = if op.ignore_case {
        op.search.trim().to_lowercase()
    } else {
        op.search.trim().to_string()
    };

    doc.slice(start, end)
        .ok()?
        .iter()
        .enumerate()
        .map(|(offset, text)| {
            let candidate = if op.ignore_case {
                text.trim().to_lowercase()
            } else {
                text.trim().to_string()
            };
            NearMatch {
                line: start + offset,
                text: text.clone(),
                similarity: strsim::normalized_levenshtein(&needle, &candidate),
            }
        })
        .filter(|near| near.similarity >= threshold)
        .fold(None, |best: Option<NearMatch>, near| match best {
            Some(b) if b.similarity >= near.similarity => Some(b),
            _ => Some(near),
        })
}

/// [`closest_line`] for operation `index` of a batch, measured against the
/// document that operation ran on rather than the batch input.
pub fn closest_line_in_batch(
    doc: &Document,
    ops: &[ReplaceOperation],
    index: usize,
    threshold: f64,
) -> Option<NearMatch> {
    let op = ops.get(index)?;
    let (input, _) = apply_replacements(doc, &ops[..index]).ok()?;
    closest_line(&input, op, threshold)
}
