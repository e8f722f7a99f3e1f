// SPDX-License-Identifier: MIT

use assert_cmd::Command;
use std::io::Write;

fn write_seed(dir: &std::path::Path, yaml: &str) -> std::path::PathBuf {
    let path = dir.join("seed.yaml");
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(yaml.as_bytes()).unwrap();
    path
}

#[test]
fn boot_creates_the_persisted_layout_and_prints_the_resolved_tree() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path().join("root");
    let seed = write_seed(tmp.path(), "services:\n  main:\n    foo: bar\n");

    let mut cmd = Command::cargo_bin("kestrel").unwrap();
    cmd.args([
        "--install",
        "--dryrun",
        "--print",
        "--config",
        seed.to_str().unwrap(),
        "--root",
        root.to_str().unwrap(),
    ]);

    let output = cmd.assert().success();
    let stdout = String::from_utf8(output.get_output().stdout.clone()).unwrap();
    assert!(stdout.contains("services"));
    assert!(stdout.contains("main"));

    assert!(root.join("config/config.yaml").exists());
    assert!(root.join("bin").is_dir());
    assert!(root.join("work").is_dir());
}

#[test]
fn boot_aborts_with_a_nonzero_exit_when_no_main_service_is_declared() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path().join("root");
    let seed = write_seed(tmp.path(), "services:\n  other: {}\n");

    let mut cmd = Command::cargo_bin("kestrel").unwrap();
    cmd.args([
        "--install",
        "--dryrun",
        "--config",
        seed.to_str().unwrap(),
        "--root",
        root.to_str().unwrap(),
    ]);

    cmd.assert().failure();
}

#[test]
fn install_only_does_not_hang_waiting_for_a_shutdown_signal() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path().join("root");
    let seed = write_seed(tmp.path(), "services:\n  main: {}\n");

    let mut cmd = Command::cargo_bin("kestrel").unwrap();
    cmd.args([
        "--install",
        "--dryrun",
        "--config",
        seed.to_str().unwrap(),
        "--root",
        root.to_str().unwrap(),
    ]);
    cmd.timeout(std::time::Duration::from_secs(10));

    cmd.assert().success();
}
