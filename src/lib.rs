//! Text Mutator: line-addressed insertion and search/replace with previews
//!
//! Applies batches of structured edits to an in-memory text document and
//! produces both the mutated text and a reviewable diff before anything is
//! written back.
//!
//! # Architecture
//!
//! - [`Document`] is an immutable, 1-based line snapshot.
//! - [`apply_insertions`] places blocks against the *original* line numbers
//!   of a snapshot; same-line insertions keep batch order.
//! - [`apply_replacements`] runs literal or regex replacements in sequence,
//!   each seeing the previous result, and reports per-operation match counts.
//! - [`compute_diff`] aligns two snapshots (Myers) into add/remove/context
//!   hunks and renders unified diffs.
//! - [`EditSession`] is the caller loop: read from [`Storage`], run an
//!   engine, ask an [`Approver`], write on approval.
//!
//! # Guarantees
//!
//! - Engines are pure; every call returns a new document
//! - Batches are all-or-nothing, with the failing operation's index
//! - Writes are atomic (tempfile + fsync + rename) and refuse stale snapshots
//! - Storage access is confined to a workspace root
//!
//! # Example
//!
//! ```
//! use text_mutator::{apply_replacements, compute_diff, Document, ReplaceOperation};
//!
//! let doc = Document::from_text("let oldValue = 1;\n");
//! let ops = [ReplaceOperation::regex(r"old\w+", "new$&")];
//! let (result, counts) = apply_replacements(&doc, &ops).unwrap();
//!
//! assert_eq!(result.to_text(), "let newoldValue = 1;\n");
//! assert_eq!(counts, vec![1]);
//! assert!(compute_diff(&doc, &result).has_changes());
//! ```

pub mod approval;
pub mod config;
pub mod diff;
pub mod document;
pub mod engine;
pub mod safety;
pub mod session;
pub mod storage;

// Re-exports
pub use approval::{Approver, AutoApprove, PromptApprover, RejectAll};
pub use config::{
    load_from_path, load_from_str, BatchFormat, ConfigError, EditBatch, Operations,
    ValidationError,
};
pub use diff::{compute_diff, DiffPreview, DiffSummary, Hunk, HunkKind};
pub use document::{Document, LineEnding};
pub use engine::{
    apply_insertions, apply_replacements, BatchError, EngineError, InsertOperation, RegexFlags,
    ReplaceOperation,
};
pub use safety::{SafetyError, WorkspaceGuard};
pub use session::{EditReport, EditSession, Outcome, SessionError};
pub use storage::{FsStorage, MemoryStorage, Storage, StorageError};
