//! The two mutation engines.
//!
//! Both are pure functions over a [`Document`](crate::Document) snapshot and
//! both are atomic at the batch level: a failing operation yields a
//! [`BatchError`] and no document at all.

pub mod errors;
pub mod flags;
pub mod insert;
pub mod replace;
pub mod template;

pub use errors::{BatchError, EngineError};
pub use flags::RegexFlags;
pub use insert::{apply_insertions, InsertOperation};
pub use replace::{
    apply_replacements, closest_line, closest_line_in_batch, find_matches, MatchResult, NearMatch,
    ReplaceOperation,
};
pub use template::Template;
