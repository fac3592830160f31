use crate::config::schema::{BatchConfig, EditBatch, ValidationError};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Serialization format of a batch file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchFormat {
    Toml,
    Json,
}

impl BatchFormat {
    /// `.json` files are JSON; everything else is read as TOML.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => BatchFormat::Json,
            _ => BatchFormat::Toml,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Toml {
        path: Option<PathBuf>,
        source: toml_edit::de::Error,
    },
    Json {
        path: Option<PathBuf>,
        source: serde_json::Error,
    },
    Validation {
        path: Option<PathBuf>,
        source: ValidationError,
    },
}

impl ConfigError {
    fn with_path(self, path: &Path) -> Self {
        let path = path.to_path_buf();
        match self {
            ConfigError::Io { .. } => self,
            ConfigError::Toml { path: None, source } => ConfigError::Toml {
                path: Some(path),
                source,
            },
            ConfigError::Json { path: None, source } => ConfigError::Json {
                path: Some(path),
                source,
            },
            ConfigError::Validation { path: None, source } => ConfigError::Validation {
                path: Some(path),
                source,
            },
            other => other,
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io { path, source } => {
                write!(
                    f,
                    "failed to read edit batch from {}: {}",
                    path.display(),
                    source
                )
            }
            ConfigError::Toml { path, source } => match path {
                Some(path) => write!(
                    f,
                    "failed to parse edit batch TOML ({}): {}",
                    path.display(),
                    source
                ),
                None => write!(f, "failed to parse edit batch TOML: {}", source),
            },
            ConfigError::Json { path, source } => match path {
                Some(path) => write!(
                    f,
                    "failed to parse edit batch JSON ({}): {}",
                    path.display(),
                    source
                ),
                None => write!(f, "failed to parse edit batch JSON: {}", source),
            },
            ConfigError::Validation { path, source } => match path {
                Some(path) => write!(f, "invalid edit batch ({}): {}", path.display(), source),
                None => write!(f, "invalid edit batch: {}", source),
            },
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            ConfigError::Toml { source, .. } => Some(source),
            ConfigError::Json { source, .. } => Some(source),
            ConfigError::Validation { source, .. } => Some(source),
        }
    }
}

pub fn load_from_str(input: &str, format: BatchFormat) -> Result<EditBatch, ConfigError> {
    let config: BatchConfig = match format {
        BatchFormat::Toml => toml_edit::de::from_str(input)
            .map_err(|source| ConfigError::Toml { path: None, source })?,
        BatchFormat::Json => serde_json::from_str(input)
            .map_err(|source| ConfigError::Json { path: None, source })?,
    };
    config
        .validate()
        .map_err(|source| ConfigError::Validation { path: None, source })
}

pub fn load_from_path(path: impl AsRef<Path>) -> Result<EditBatch, ConfigError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    load_from_str(&contents, BatchFormat::from_path(path)).map_err(|error| error.with_path(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::Operations;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(BatchFormat::from_path(Path::new("ops.json")), BatchFormat::Json);
        assert_eq!(BatchFormat::from_path(Path::new("ops.JSON")), BatchFormat::Json);
        assert_eq!(BatchFormat::from_path(Path::new("ops.toml")), BatchFormat::Toml);
        assert_eq!(BatchFormat::from_path(Path::new("ops")), BatchFormat::Toml);
    }

    #[test]
    fn test_load_toml_insert() {
        let toml = r#"
[meta]
name = "imports"
file = "src/lib.rs"

[[insert]]
start_line = 1
content = "use std::fmt;\n"

[[insert]]
start_line = "10"
content = "fn extra() {}\n"
"#;
        let batch = load_from_str(toml, BatchFormat::Toml).unwrap();
        assert_eq!(batch.meta.name, "imports");
        assert_eq!(batch.meta.file.as_deref(), Some("src/lib.rs"));
        let Operations::Insert(ops) = batch.operations else {
            panic!("expected insert batch");
        };
        assert_eq!(ops.len(), 2);
        assert_eq!(ops[1].target_line, 10);
    }

    #[test]
    fn test_load_json_replace() {
        let json = r#"{
            "replace": [
                {"search": "foo", "replace": "bar", "ignore_case": "true", "start_line": 1, "end_line": "5"}
            ]
        }"#;
        let batch = load_from_str(json, BatchFormat::Json).unwrap();
        let Operations::Replace(ops) = batch.operations else {
            panic!("expected replace batch");
        };
        assert!(ops[0].ignore_case);
        assert!(!ops[0].use_regex);
        assert_eq!(ops[0].scope_end, Some(5));
    }

    #[test]
    fn test_invalid_toml_is_reported() {
        let err = load_from_str("[[insert]\n", BatchFormat::Toml).unwrap_err();
        assert!(matches!(err, ConfigError::Toml { path: None, .. }));
    }

    #[test]
    fn test_validation_error_carries_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.toml");
        fs::write(&path, "[meta]\nname = \"nothing\"\n").unwrap();

        let err = load_from_path(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Validation { path: Some(_), .. }));
        assert!(err.to_string().contains("contains no operations"));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = load_from_path("/nonexistent/batch.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
