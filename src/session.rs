//! The read → mutate → preview → approve → write loop around the engines.

use crate::approval::Approver;
use crate::config::Operations;
use crate::diff::{compute_diff, DiffPreview};
use crate::document::{fingerprint, Document};
use crate::engine::{
    apply_insertions, apply_replacements, BatchError, InsertOperation, ReplaceOperation,
};
use crate::storage::{Storage, StorageError};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum SessionError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Batch(#[from] BatchError),
}

/// What happened to the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Approved and written
    Applied,
    /// Approver declined; nothing written
    Rejected,
    /// The batch produced identical text; approval was not requested
    Unchanged,
    /// Dry run; nothing written and approval not requested
    Previewed,
}

#[derive(Debug, Clone)]
#[must_use = "EditReport should be checked for the outcome"]
pub struct EditReport {
    pub path: PathBuf,
    pub outcome: Outcome,
    pub preview: DiffPreview,
    pub original: Document,
    pub result: Document,
    /// Per-operation match counts for replace batches; empty for inserts.
    pub match_counts: Vec<usize>,
}

impl EditReport {
    /// Indices of replace operations that matched nothing.
    pub fn unmatched(&self) -> Vec<usize> {
        self.match_counts
            .iter()
            .enumerate()
            .filter(|(_, count)| **count == 0)
            .map(|(index, _)| index)
            .collect()
    }

    pub fn total_matches(&self) -> usize {
        self.match_counts.iter().sum()
    }
}

/// Runs edit batches against files from `S`, asking `A` before each write.
#[derive(Debug)]
pub struct EditSession<S, A> {
    storage: S,
    approver: A,
    dry_run: bool,
}

impl<S: Storage, A: Approver> EditSession<S, A> {
    pub fn new(storage: S, approver: A) -> Self {
        Self {
            storage,
            approver,
            dry_run: false,
        }
    }

    /// Compute and preview, but never ask or write.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn insert(
        &mut self,
        path: &Path,
        ops: &[InsertOperation],
    ) -> Result<EditReport, SessionError> {
        let text = self.storage.read(path)?;
        let original = Document::from_text(&text);
        let result = apply_insertions(&original, ops)?;
        self.finish(path, &text, &original, result, Vec::new())
    }

    pub fn replace(
        &mut self,
        path: &Path,
        ops: &[ReplaceOperation],
    ) -> Result<EditReport, SessionError> {
        let text = self.storage.read(path)?;
        let original = Document::from_text(&text);
        let (result, counts) = apply_replacements(&original, ops)?;
        self.finish(path, &text, &original, result, counts)
    }

    pub fn run(
        &mut self,
        path: &Path,
        operations: &Operations,
    ) -> Result<EditReport, SessionError> {
        match operations {
            Operations::Insert(ops) => self.insert(path, ops),
            Operations::Replace(ops) => self.replace(path, ops),
        }
    }

    fn finish(
        &mut self,
        path: &Path,
        original_text: &str,
        original: &Document,
        result: Document,
        match_counts: Vec<usize>,
    ) -> Result<EditReport, SessionError> {
        let preview = compute_diff(original, &result);
        let new_text = result.to_text();
        debug!(path = %path.display(), summary = %preview.summary(), "computed preview");

        let outcome = if new_text == original_text {
            Outcome::Unchanged
        } else if self.dry_run {
            Outcome::Previewed
        } else if self.approver.present(&preview) {
            match self
                .storage
                .write_if_unchanged(path, &new_text, fingerprint(original_text))
            {
                Ok(()) => {}
                Err(err @ StorageError::Stale { .. }) => {
                    warn!(path = %path.display(), "file changed while awaiting approval");
                    return Err(err.into());
                }
                Err(err) => return Err(err.into()),
            }
            info!(path = %path.display(), summary = %preview.summary(), "wrote changes");
            Outcome::Applied
        } else {
            info!(path = %path.display(), "changes rejected");
            Outcome::Rejected
        };

        Ok(EditReport {
            path: path.to_path_buf(),
            outcome,
            preview,
            original: original.clone(),
            result,
            match_counts,
        })
    }
}
