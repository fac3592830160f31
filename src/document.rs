//! Line-addressed document snapshots.
//!
//! A [`Document`] is an immutable value: engines never mutate one in place,
//! they build a new snapshot from the old one. Line terminators are stripped
//! on load and restored by [`Document::to_text`].

use crate::engine::EngineError;
use xxhash_rust::xxh3::xxh3_64;

/// Line terminator style recorded when a document is loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineEnding {
    #[default]
    Lf,
    CrLf,
}

impl LineEnding {
    pub fn as_str(self) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::CrLf => "\r\n",
        }
    }

    /// `CrLf` only when every line break in `text` is `\r\n`.
    fn detect(text: &str) -> Self {
        let breaks = text.matches('\n').count();
        if breaks > 0 && text.matches("\r\n").count() == breaks {
            LineEnding::CrLf
        } else {
            LineEnding::Lf
        }
    }
}

/// An ordered sequence of lines addressed 1..=N.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Document {
    lines: Vec<String>,
    trailing_newline: bool,
    line_ending: LineEnding,
}

impl Document {
    /// Parse text into a document.
    ///
    /// Mixed line endings are kept verbatim: a stray `\r` stays part of the
    /// line content so the round-trip through [`Document::to_text`] is exact.
    pub fn from_text(text: &str) -> Self {
        let line_ending = LineEnding::detect(text);
        let trailing_newline = text.ends_with('\n');

        let body = if trailing_newline {
            &text[..text.len() - 1]
        } else {
            text
        };

        let mut lines: Vec<String> = if text.is_empty() {
            Vec::new()
        } else {
            body.split('\n').map(str::to_string).collect()
        };

        if line_ending == LineEnding::CrLf {
            // An unterminated last line keeps any `\r` it ends with.
            let terminated = if trailing_newline {
                lines.len()
            } else {
                lines.len().saturating_sub(1)
            };
            for line in &mut lines[..terminated] {
                line.pop();
            }
        }

        Self {
            lines,
            trailing_newline,
            line_ending,
        }
    }

    /// Build a `\n`-terminated document from already-split lines.
    pub fn from_lines<I, S>(lines: I, trailing_newline: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
            trailing_newline,
            line_ending: LineEnding::Lf,
        }
    }

    /// Render the document back to text.
    pub fn to_text(&self) -> String {
        let sep = self.line_ending.as_str();
        let mut text = self.lines.join(sep);
        if self.trailing_newline {
            text.push_str(sep);
        }
        text
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// 1-based line lookup.
    pub fn line(&self, number: usize) -> Option<&str> {
        number
            .checked_sub(1)
            .and_then(|idx| self.lines.get(idx))
            .map(String::as_str)
    }

    pub fn has_trailing_newline(&self) -> bool {
        self.trailing_newline
    }

    pub fn line_ending(&self) -> LineEnding {
        self.line_ending
    }

    /// Inclusive 1-based slice `[start, end]`.
    ///
    /// An empty document accepts `(0, 0)` and yields no lines.
    pub fn slice(&self, start: usize, end: usize) -> Result<&[String], EngineError> {
        if self.is_empty() && start == 0 && end == 0 {
            return Ok(&[]);
        }
        self.check_range(start, end)?;
        Ok(&self.lines[start - 1..end])
    }

    pub(crate) fn check_range(&self, start: usize, end: usize) -> Result<(), EngineError> {
        let line_count = self.line_count();
        if start > end || start < 1 || end > line_count {
            return Err(EngineError::Range {
                start,
                end,
                line_count,
            });
        }
        Ok(())
    }

    /// xxh3 hash of the rendered text.
    pub fn fingerprint(&self) -> u64 {
        fingerprint(&self.to_text())
    }

    /// New snapshot with `lines`, keeping this document's terminator settings.
    pub(crate) fn with_lines(&self, lines: Vec<String>) -> Self {
        Self {
            lines,
            trailing_newline: self.trailing_newline,
            line_ending: self.line_ending,
        }
    }

    pub(crate) fn with_trailing_newline(mut self, trailing_newline: bool) -> Self {
        self.trailing_newline = trailing_newline;
        self
    }
}

/// Fingerprint raw storage text the same way [`Document::fingerprint`] does.
pub fn fingerprint(text: &str) -> u64 {
    xxh3_64(text.as_bytes())
}

/// Split a content block into lines.
///
/// A single trailing line break ends the last line rather than opening an
/// empty one, so `"a\nb\n"` is two lines.
pub(crate) fn split_block(content: &str) -> Vec<String> {
    let body = content
        .strip_suffix("\r\n")
        .or_else(|| content.strip_suffix('\n'))
        .unwrap_or(content);
    body.split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line).to_string())
        .collect()
}
