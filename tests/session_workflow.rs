//! End-to-end workflow against the filesystem.
//!
//! Load a batch file, preview, approve, write, then check what landed on disk.

use std::fs;
use std::path::Path;
use tempfile::TempDir;
use text_mutator::{
    load_from_path, AutoApprove, EditSession, FsStorage, Operations, Outcome, RejectAll,
    SessionError, StorageError,
};

fn setup_workspace() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join("src")).unwrap();
    fs::create_dir_all(dir.path().join("batches")).unwrap();

    fs::write(
        dir.path().join("src/config.rs"),
        "pub const HOST: &str = \"localhost\";\n\
         pub const PORT: u16 = 8080;\n\
         \n\
         pub fn endpoint() -> String {\n\
         \x20   format!(\"http://{HOST}:{PORT}\")\n\
         }\n",
    )
    .unwrap();

    dir
}

#[test]
fn test_replace_batch_from_toml_is_written() {
    let dir = setup_workspace();
    let batch_path = dir.path().join("batches/port.toml");
    fs::write(
        &batch_path,
        r#"
[meta]
name = "bump-port"
file = "src/config.rs"

[[replace]]
search = "8080"
replace = "9090"

[[replace]]
search = 'format!\("http://'
replace = "format!(\"https://"
use_regex = "true"
"#,
    )
    .unwrap();

    let batch = load_from_path(&batch_path).unwrap();
    assert_eq!(batch.meta.name, "bump-port");
    let file = batch.meta.file.clone().unwrap();

    let storage = FsStorage::new(dir.path()).unwrap();
    let mut session = EditSession::new(storage, AutoApprove);
    let report = session.run(Path::new(&file), &batch.operations).unwrap();

    assert_eq!(report.outcome, Outcome::Applied);
    assert_eq!(report.match_counts, vec![1, 1]);
    assert_eq!(report.preview.summary().added, 2);
    assert_eq!(report.preview.summary().removed, 2);

    let written = fs::read_to_string(dir.path().join("src/config.rs")).unwrap();
    assert!(written.contains("PORT: u16 = 9090;"));
    assert!(written.contains("format!(\"https://{HOST}:{PORT}\")"));
    assert!(written.ends_with("}\n"));
}

#[test]
fn test_insert_batch_from_json_uses_original_line_numbers() {
    let dir = setup_workspace();
    let batch_path = dir.path().join("batches/docs.json");
    fs::write(
        &batch_path,
        r#"{
  "meta": { "name": "docs" },
  "insert": [
    { "start_line": 4, "content": "/// Full endpoint URL.\n" },
    { "start_line": "1", "content": "//! Connection settings.\n\n" }
  ]
}"#,
    )
    .unwrap();

    let batch = load_from_path(&batch_path).unwrap();
    assert!(matches!(batch.operations, Operations::Insert(ref ops) if ops.len() == 2));

    let storage = FsStorage::new(dir.path()).unwrap();
    let mut session = EditSession::new(storage, AutoApprove);
    let report = session
        .run(Path::new("src/config.rs"), &batch.operations)
        .unwrap();
    assert_eq!(report.outcome, Outcome::Applied);

    let written = fs::read_to_string(dir.path().join("src/config.rs")).unwrap();
    let lines: Vec<&str> = written.lines().collect();
    assert_eq!(lines[0], "//! Connection settings.");
    assert_eq!(lines[1], "");
    assert_eq!(lines[2], "pub const HOST: &str = \"localhost\";");
    assert_eq!(lines[5], "/// Full endpoint URL.");
    assert_eq!(lines[6], "pub fn endpoint() -> String {");
}

#[test]
fn test_rejected_batch_leaves_disk_untouched() {
    let dir = setup_workspace();
    let before = fs::read_to_string(dir.path().join("src/config.rs")).unwrap();

    let storage = FsStorage::new(dir.path()).unwrap();
    let mut session = EditSession::new(storage, RejectAll);
    let report = session
        .replace(
            Path::new("src/config.rs"),
            &[text_mutator::ReplaceOperation::literal("localhost", "0.0.0.0")],
        )
        .unwrap();

    assert_eq!(report.outcome, Outcome::Rejected);
    assert!(report.preview.has_changes());
    let after = fs::read_to_string(dir.path().join("src/config.rs")).unwrap();
    assert_eq!(before, after);
}

#[test]
fn test_failed_batch_leaves_disk_untouched() {
    let dir = setup_workspace();
    let before = fs::read_to_string(dir.path().join("src/config.rs")).unwrap();

    let storage = FsStorage::new(dir.path()).unwrap();
    let mut session = EditSession::new(storage, AutoApprove);
    let err = session
        .replace(
            Path::new("src/config.rs"),
            &[
                text_mutator::ReplaceOperation::literal("localhost", "0.0.0.0"),
                text_mutator::ReplaceOperation::literal("PORT", "P").scoped(5, 99),
            ],
        )
        .unwrap_err();

    match err {
        SessionError::Batch(batch) => assert_eq!(batch.index, 1),
        other => panic!("expected batch error, got {other:?}"),
    }
    let after = fs::read_to_string(dir.path().join("src/config.rs")).unwrap();
    assert_eq!(before, after);
}

#[test]
fn test_crlf_file_keeps_line_endings() {
    let dir = setup_workspace();
    fs::write(dir.path().join("notes.txt"), "one\r\ntwo\r\n").unwrap();

    let storage = FsStorage::new(dir.path()).unwrap();
    let mut session = EditSession::new(storage, AutoApprove);
    let report = session
        .insert(
            Path::new("notes.txt"),
            &[text_mutator::InsertOperation::new(2, "one and a half\n")],
        )
        .unwrap();
    assert_eq!(report.outcome, Outcome::Applied);

    let written = fs::read_to_string(dir.path().join("notes.txt")).unwrap();
    assert_eq!(written, "one\r\none and a half\r\ntwo\r\n");
}

#[test]
fn test_paths_outside_workspace_are_refused() {
    let dir = TempDir::new().unwrap();
    let workspace = dir.path().join("workspace");
    fs::create_dir_all(&workspace).unwrap();
    fs::write(dir.path().join("secret.txt"), "keep out\n").unwrap();

    let storage = FsStorage::new(&workspace).unwrap();
    let mut session = EditSession::new(storage, AutoApprove);
    let err = session
        .replace(
            Path::new("../secret.txt"),
            &[text_mutator::ReplaceOperation::literal("keep", "come")],
        )
        .unwrap_err();

    assert!(matches!(err, SessionError::Storage(StorageError::Safety(_))));
    let after = fs::read_to_string(dir.path().join("secret.txt")).unwrap();
    assert_eq!(after, "keep out\n");
}

#[test]
fn test_missing_file_is_not_found() {
    let dir = setup_workspace();
    let storage = FsStorage::new(dir.path()).unwrap();
    let mut session = EditSession::new(storage, AutoApprove);

    let err = session
        .insert(
            Path::new("src/missing.rs"),
            &[text_mutator::InsertOperation::new(1, "x\n")],
        )
        .unwrap_err();
    assert!(matches!(err, SessionError::Storage(StorageError::NotFound(_))));
}
