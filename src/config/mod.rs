//! Edit batch files: parsing and strict validation into engine operations.

pub mod loader;
pub mod schema;

pub use loader::{load_from_path, load_from_str, BatchFormat, ConfigError};
pub use schema::{
    BatchConfig, EditBatch, FlagField, LineField, Metadata, Operations, RawInsert, RawReplace,
    ValidationError, ValidationIssue,
};
