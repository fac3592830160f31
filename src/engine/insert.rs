//! Positional insertion against a fixed baseline.
//!
//! Every `target_line` in a batch refers to the original document, never to
//! the document as modified by earlier entries of the same batch. The content
//! of each block is emitted verbatim; indentation is the caller's concern.

use crate::document::{split_block, Document};
use crate::engine::errors::{BatchError, EngineError};
use tracing::debug;

/// Insert `content` so its first line becomes line `target_line`.
///
/// `0` and `1` both mean "before the first line"; `line_count + 1` appends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertOperation {
    pub target_line: usize,
    pub content: String,
}

impl InsertOperation {
    pub fn new(target_line: usize, content: impl Into<String>) -> Self {
        Self {
            target_line,
            content: content.into(),
        }
    }

    fn validate(&self, doc: &Document) -> Result<(), EngineError> {
        let append_line = doc.line_count() + 1;
        if self.target_line > append_line {
            return Err(EngineError::OutOfRange {
                target: self.target_line,
                append_line,
            });
        }
        if self.content.is_empty() {
            return Err(EngineError::invalid("insert content is empty"));
        }
        Ok(())
    }
}

/// Apply a batch of insertions to `doc`, returning a new document.
///
/// The batch is validated in full before anything is built; the first
/// invalid operation is reported with its index.
pub fn apply_insertions(doc: &Document, ops: &[InsertOperation]) -> Result<Document, BatchError> {
    for (index, op) in ops.iter().enumerate() {
        op.validate(doc).map_err(|e| BatchError::new(index, e))?;
    }

    if ops.is_empty() {
        return Ok(doc.clone());
    }

    // Stable sort keeps batch order for equal targets. Target 0 sorts before
    // target 1 but both land in front of the first original line.
    let mut pending: Vec<&InsertOperation> = ops.iter().collect();
    pending.sort_by_key(|op| op.target_line);

    let blocks: Vec<(usize, Vec<String>)> = pending
        .into_iter()
        .map(|op| (op.target_line.max(1), split_block(&op.content)))
        .collect();
    let inserted: usize = blocks.iter().map(|(_, lines)| lines.len()).sum();

    let mut out = Vec::with_capacity(doc.line_count() + inserted);
    let mut blocks = blocks.into_iter().peekable();

    for (idx, line) in doc.lines().iter().enumerate() {
        let line_number = idx + 1;
        while let Some((_, block)) = blocks.next_if(|(target, _)| *target == line_number) {
            out.extend(block);
        }
        out.push(line.clone());
    }
    // Whatever is left targets line_count + 1.
    for (_, block) in blocks {
        out.extend(block);
    }

    debug!(
        operations = ops.len(),
        inserted_lines = inserted,
        original_lines = doc.line_count(),
        "applied insertion batch"
    );

    let result = doc.with_lines(out);
    if doc.is_empty() {
        // Nothing to inherit from; follow the last block's own terminator.
        let trailing = ops
            .iter()
            .max_by_key(|op| op.target_line)
            .is_some_and(|op| op.content.ends_with('\n'));
        return Ok(result.with_trailing_newline(trailing));
    }
    Ok(result)
}
