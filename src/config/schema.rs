use crate::engine::{InsertOperation, RegexFlags, ReplaceOperation};
use serde::Deserialize;
use std::fmt;

/// An edit batch file as written by a person or an agent.
///
/// Field values are kept loose here (`"true"` or `true`, `"10"` or `10`);
/// [`BatchConfig::validate`] turns them into typed engine operations.
#[derive(Debug, Deserialize, Default, Clone)]
pub struct BatchConfig {
    #[serde(default)]
    pub meta: Metadata,
    #[serde(default)]
    pub insert: Vec<RawInsert>,
    #[serde(default)]
    pub replace: Vec<RawReplace>,
}

#[derive(Debug, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct Metadata {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Default target file when none is given on the command line.
    #[serde(default)]
    pub file: Option<String>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct RawInsert {
    #[serde(default)]
    pub start_line: Option<LineField>,
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct RawReplace {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub replace: Option<String>,
    #[serde(default)]
    pub start_line: Option<LineField>,
    #[serde(default)]
    pub end_line: Option<LineField>,
    #[serde(default)]
    pub use_regex: Option<FlagField>,
    #[serde(default)]
    pub ignore_case: Option<FlagField>,
    #[serde(default)]
    pub regex_flags: Option<String>,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum LineField {
    Number(i64),
    Text(String),
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum FlagField {
    Bool(bool),
    Text(String),
}

/// Typed operations of a single kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operations {
    Insert(Vec<InsertOperation>),
    Replace(Vec<ReplaceOperation>),
}

impl Operations {
    pub fn kind(&self) -> &'static str {
        match self {
            Operations::Insert(_) => "insert",
            Operations::Replace(_) => "replace",
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Operations::Insert(ops) => ops.len(),
            Operations::Replace(ops) => ops.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A validated batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditBatch {
    pub meta: Metadata,
    pub operations: Operations,
}

impl BatchConfig {
    /// Check every record and build the typed batch.
    ///
    /// All issues are collected before failing so a caller can fix a batch
    /// in one round.
    pub fn validate(&self) -> Result<EditBatch, ValidationError> {
        let mut issues = Vec::new();

        let operations = match (self.insert.is_empty(), self.replace.is_empty()) {
            (true, true) => {
                issues.push(ValidationIssue::EmptyBatch);
                None
            }
            (false, false) => {
                issues.push(ValidationIssue::MixedKinds);
                None
            }
            (false, true) => Some(Operations::Insert(
                self.insert
                    .iter()
                    .enumerate()
                    .filter_map(|(index, raw)| raw.validate(index, &mut issues))
                    .collect(),
            )),
            (true, false) => Some(Operations::Replace(
                self.replace
                    .iter()
                    .enumerate()
                    .filter_map(|(index, raw)| raw.validate(index, &mut issues))
                    .collect(),
            )),
        };

        match operations {
            Some(operations) if issues.is_empty() => Ok(EditBatch {
                meta: self.meta.clone(),
                operations,
            }),
            _ => Err(ValidationError { issues }),
        }
    }
}

impl RawInsert {
    fn validate(&self, index: usize, issues: &mut Vec<ValidationIssue>) -> Option<InsertOperation> {
        let target_line = match &self.start_line {
            None => {
                issues.push(ValidationIssue::MissingField {
                    index,
                    field: "start_line",
                });
                None
            }
            Some(field) => match field.parse() {
                Ok(Some(line)) => Some(line),
                Ok(None) => {
                    issues.push(ValidationIssue::MissingField {
                        index,
                        field: "start_line",
                    });
                    None
                }
                Err(message) => {
                    issues.push(ValidationIssue::InvalidValue {
                        index,
                        field: "start_line",
                        message,
                    });
                    None
                }
            },
        };

        let content = self.content.clone();
        if content.is_none() {
            issues.push(ValidationIssue::MissingField {
                index,
                field: "content",
            });
        }

        Some(InsertOperation {
            target_line: target_line?,
            content: content?,
        })
    }
}

impl RawReplace {
    fn validate(
        &self,
        index: usize,
        issues: &mut Vec<ValidationIssue>,
    ) -> Option<ReplaceOperation> {
        let before = issues.len();

        if self.search.is_none() {
            issues.push(ValidationIssue::MissingField {
                index,
                field: "search",
            });
        }
        if self.replace.is_none() {
            issues.push(ValidationIssue::MissingField {
                index,
                field: "replace",
            });
        }

        let mut line = |field: &Option<LineField>, name: &'static str| match field {
            None => None,
            Some(value) => value.parse().unwrap_or_else(|message| {
                issues.push(ValidationIssue::InvalidValue {
                    index,
                    field: name,
                    message,
                });
                None
            }),
        };
        let scope_start = line(&self.start_line, "start_line");
        let scope_end = line(&self.end_line, "end_line");

        let mut flag = |field: &Option<FlagField>, name: &'static str| match field {
            None => false,
            Some(value) => value.parse().unwrap_or_else(|message| {
                issues.push(ValidationIssue::InvalidValue {
                    index,
                    field: name,
                    message,
                });
                false
            }),
        };
        let use_regex = flag(&self.use_regex, "use_regex");
        let ignore_case = flag(&self.ignore_case, "ignore_case");

        let flags = match self.regex_flags.as_deref().map(RegexFlags::parse) {
            None => RegexFlags::default(),
            Some(Ok(flags)) => flags,
            Some(Err(err)) => {
                issues.push(ValidationIssue::InvalidValue {
                    index,
                    field: "regex_flags",
                    message: err.to_string(),
                });
                RegexFlags::default()
            }
        };
        if !flags.is_empty() && !use_regex {
            issues.push(ValidationIssue::InvalidCombo {
                index,
                message: "regex_flags requires use_regex = \"true\"".to_string(),
            });
        }
        if flags.ignore_case && ignore_case {
            issues.push(ValidationIssue::InvalidCombo {
                index,
                message: "ignore_case duplicates the 'i' regex flag".to_string(),
            });
        }

        if issues.len() > before {
            return None;
        }

        Some(ReplaceOperation {
            search: self.search.clone()?,
            replace: self.replace.clone()?,
            scope_start,
            scope_end,
            use_regex,
            ignore_case,
            flags,
        })
    }
}

impl LineField {
    /// `Ok(None)` for a blank string, which callers treat as absent.
    fn parse(&self) -> Result<Option<usize>, String> {
        match self {
            LineField::Number(n) => usize::try_from(*n)
                .map(Some)
                .map_err(|_| format!("line number must not be negative (got {n})")),
            LineField::Text(text) => {
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    return Ok(None);
                }
                trimmed.parse::<usize>().map(Some).map_err(|_| {
                    if trimmed.starts_with('-') {
                        format!("line number must not be negative (got {trimmed})")
                    } else {
                        format!("expected a line number, got '{trimmed}'")
                    }
                })
            }
        }
    }
}

impl FlagField {
    /// Only the literal text `"true"` enables a flag.
    fn parse(&self) -> Result<bool, String> {
        match self {
            FlagField::Bool(value) => Ok(*value),
            FlagField::Text(text) => match text.trim() {
                "true" => Ok(true),
                "false" | "" => Ok(false),
                other => Err(format!("expected \"true\" or \"false\", got '{other}'")),
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, issue) in self.issues.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    EmptyBatch,
    MixedKinds,
    MissingField {
        index: usize,
        field: &'static str,
    },
    InvalidValue {
        index: usize,
        field: &'static str,
        message: String,
    },
    InvalidCombo {
        index: usize,
        message: String,
    },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::EmptyBatch => write!(f, "edit batch contains no operations"),
            ValidationIssue::MixedKinds => {
                write!(f, "edit batch mixes insert and replace operations")
            }
            ValidationIssue::MissingField { index, field } => {
                write!(f, "operation {index} missing required field '{field}'")
            }
            ValidationIssue::InvalidValue {
                index,
                field,
                message,
            } => write!(f, "operation {index} has invalid '{field}': {message}"),
            ValidationIssue::InvalidCombo { index, message } => {
                write!(f, "operation {index} has invalid configuration: {message}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_replace(search: &str, replace: &str) -> RawReplace {
        RawReplace {
            search: Some(search.to_string()),
            replace: Some(replace.to_string()),
            ..RawReplace::default()
        }
    }

    #[test]
    fn test_flag_literal_true_only() {
        assert_eq!(FlagField::Text("true".into()).parse(), Ok(true));
        assert_eq!(FlagField::Text("false".into()).parse(), Ok(false));
        assert_eq!(FlagField::Bool(true).parse(), Ok(true));
        assert!(FlagField::Text("yes".into()).parse().is_err());
    }

    #[test]
    fn test_line_field_parsing() {
        assert_eq!(LineField::Number(3).parse(), Ok(Some(3)));
        assert_eq!(LineField::Text(" 12 ".into()).parse(), Ok(Some(12)));
        assert_eq!(LineField::Text("".into()).parse(), Ok(None));
        assert!(LineField::Number(-1).parse().is_err());
        assert!(LineField::Text("-4".into()).parse().unwrap_err().contains("negative"));
        assert!(LineField::Text("ten".into()).parse().is_err());
    }

    #[test]
    fn test_replace_defaults() {
        let config = BatchConfig {
            replace: vec![raw_replace("a", "b")],
            ..BatchConfig::default()
        };
        let batch = config.validate().unwrap();
        assert_eq!(
            batch.operations,
            Operations::Replace(vec![ReplaceOperation::literal("a", "b")])
        );
    }

    #[test]
    fn test_replace_full_record() {
        let config = BatchConfig {
            replace: vec![RawReplace {
                start_line: Some(LineField::Text("2".into())),
                end_line: Some(LineField::Number(4)),
                use_regex: Some(FlagField::Text("true".into())),
                ignore_case: Some(FlagField::Text("true".into())),
                regex_flags: Some("gm".into()),
                ..raw_replace(r"old\w+", "new$&")
            }],
            ..BatchConfig::default()
        };
        let batch = config.validate().unwrap();
        let Operations::Replace(ops) = batch.operations else {
            panic!("expected replace batch");
        };
        assert_eq!(ops[0].scope_start, Some(2));
        assert_eq!(ops[0].scope_end, Some(4));
        assert!(ops[0].use_regex);
        assert!(ops[0].ignore_case);
        assert!(ops[0].flags.multi_line);
    }

    #[test]
    fn test_issues_are_collected() {
        let config = BatchConfig {
            replace: vec![
                RawReplace {
                    search: None,
                    ..raw_replace("", "x")
                },
                RawReplace {
                    start_line: Some(LineField::Number(-2)),
                    regex_flags: Some("m".into()),
                    ..raw_replace("a", "b")
                },
            ],
            ..BatchConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert_eq!(err.issues.len(), 3);
        assert_eq!(
            err.issues[0],
            ValidationIssue::MissingField {
                index: 0,
                field: "search"
            }
        );
        assert!(matches!(
            err.issues[1],
            ValidationIssue::InvalidValue {
                index: 1,
                field: "start_line",
                ..
            }
        ));
        assert!(matches!(
            err.issues[2],
            ValidationIssue::InvalidCombo { index: 1, .. }
        ));
    }

    #[test]
    fn test_empty_and_mixed_batches() {
        let err = BatchConfig::default().validate().unwrap_err();
        assert_eq!(err.issues, vec![ValidationIssue::EmptyBatch]);

        let config = BatchConfig {
            insert: vec![RawInsert {
                start_line: Some(LineField::Number(1)),
                content: Some("x".into()),
            }],
            replace: vec![raw_replace("a", "b")],
            ..BatchConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert_eq!(err.issues, vec![ValidationIssue::MixedKinds]);
    }

    #[test]
    fn test_insert_missing_fields() {
        let config = BatchConfig {
            insert: vec![RawInsert::default()],
            ..BatchConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert_eq!(err.issues.len(), 2);
        assert!(err.to_string().contains("missing required field 'start_line'"));
        assert!(err.to_string().contains("missing required field 'content'"));
    }
}
