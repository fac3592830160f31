//! The approval collaborator: someone (or something) accepts or rejects a
//! diff before it is written.

use crate::diff::DiffPreview;
use std::io::{BufRead, Write};
use tracing::warn;

pub trait Approver {
    /// Return `true` to write the change.
    fn present(&mut self, preview: &DiffPreview) -> bool;
}

impl<T: Approver + ?Sized> Approver for Box<T> {
    fn present(&mut self, preview: &DiffPreview) -> bool {
        (**self).present(preview)
    }
}

/// Accepts everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoApprove;

impl Approver for AutoApprove {
    fn present(&mut self, _preview: &DiffPreview) -> bool {
        true
    }
}

/// Rejects everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct RejectAll;

impl Approver for RejectAll {
    fn present(&mut self, _preview: &DiffPreview) -> bool {
        false
    }
}

/// Shows the unified diff and asks `[y/N]` on a line-oriented channel.
///
/// Anything other than `y`/`yes` (case-insensitive), including EOF or an
/// I/O error, is a rejection.
#[derive(Debug)]
pub struct PromptApprover<R, W> {
    input: R,
    output: W,
    label: String,
    context: usize,
}

impl<R: BufRead, W: Write> PromptApprover<R, W> {
    pub fn new(input: R, output: W, label: impl Into<String>) -> Self {
        Self {
            input,
            output,
            label: label.into(),
            context: 3,
        }
    }

    pub fn context(mut self, lines: usize) -> Self {
        self.context = lines;
        self
    }

    fn ask(&mut self, preview: &DiffPreview) -> std::io::Result<bool> {
        let diff = preview.unified(
            self.context,
            &format!("{} (original)", self.label),
            &format!("{} (modified)", self.label),
        );
        write!(self.output, "{diff}")?;
        writeln!(self.output, "{}", preview.summary())?;
        write!(self.output, "Apply these changes? [y/N] ")?;
        self.output.flush()?;

        let mut answer = String::new();
        self.input.read_line(&mut answer)?;
        Ok(matches!(
            answer.trim().to_ascii_lowercase().as_str(),
            "y" | "yes"
        ))
    }
}

impl<R: BufRead, W: Write> Approver for PromptApprover<R, W> {
    fn present(&mut self, preview: &DiffPreview) -> bool {
        self.ask(preview).unwrap_or_else(|err| {
            warn!(error = %err, "approval prompt failed; treating as rejection");
            false
        })
    }
}
