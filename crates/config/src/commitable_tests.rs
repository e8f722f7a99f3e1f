// SPDX-License-Identifier: MIT

use super::*;
use tempfile::tempdir;

fn always_ok(_s: &str) -> Result<(), String> {
    Ok(())
}

#[test]
fn write_then_read_round_trips() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("state.yaml");

    CommitableWriter::write(&path, "a: 1\n").unwrap();
    let contents = CommitableReader::read(&path, always_ok).unwrap();
    assert_eq!(contents, "a: 1\n");
}

#[test]
fn second_write_backs_up_first() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("state.yaml");

    CommitableWriter::write(&path, "a: 1\n").unwrap();
    CommitableWriter::write(&path, "a: 2\n").unwrap();

    let bak = dir.path().join("state.yaml.bak");
    assert_eq!(std::fs::read_to_string(bak).unwrap(), "a: 1\n");
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "a: 2\n");
}

#[test]
fn read_falls_back_to_backup_when_primary_fails_validation() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("state.yaml");

    CommitableWriter::write(&path, "good\n").unwrap();
    CommitableWriter::write(&path, "corrupt\n").unwrap();

    let contents = CommitableReader::read(&path, |s| {
        if s.trim() == "corrupt" {
            Err("corrupt contents".to_string())
        } else {
            Ok(())
        }
    })
    .unwrap();
    assert_eq!(contents, "good\n");
}

#[test]
fn read_fails_when_neither_primary_nor_backup_exist() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("missing.yaml");
    assert!(CommitableReader::read(&path, always_ok).is_err());
}
