// SPDX-License-Identifier: MIT

use super::*;
use kestrel_config::ConfigTree;

fn write_seed(dir: &std::path::Path, yaml: &str) -> PathBuf {
    let source = dir.join("seed.yaml");
    std::fs::write(&source, yaml).unwrap();
    source
}

#[tokio::test]
async fn boot_wires_components_and_creates_directories() {
    let tmp = tempfile::tempdir().unwrap();
    let source = write_seed(tmp.path(), "services:\n  main: {}\n");

    let supervisor = Supervisor::boot(BootOptions {
        root: tmp.path().join("root"),
        config_source: Some(source),
        main_name: None,
        install_only: true,
        dry_run: true,
    })
    .await
    .unwrap();

    assert!(!supervisor.is_broken());
    assert_eq!(supervisor.main_name(), "main");
    assert!(supervisor.registry.get("main").is_some());

    let paths = supervisor.paths();
    assert!(paths.root.is_dir());
    assert!(paths.config.is_dir());
    assert!(paths.bin.is_dir());
    assert!(paths.work.is_dir());
    assert!(paths.config_yaml().exists());

    assert!(supervisor.context.get::<Arc<ConfigTree>>().is_some());
    assert!(supervisor.context.get::<Arc<LifecycleRegistry>>().is_some());
    assert!(supervisor.context.get::<Arc<Supervisor>>().is_some());
}

#[tokio::test]
async fn boot_falls_back_to_fallback_main_when_declared_main_is_absent() {
    let tmp = tempfile::tempdir().unwrap();
    let source = write_seed(tmp.path(), "services:\n  fallbackMain: {}\n");

    let supervisor = Supervisor::boot(BootOptions {
        root: tmp.path().join("root"),
        config_source: Some(source),
        main_name: None,
        install_only: true,
        dry_run: true,
    })
    .await
    .unwrap();

    assert_eq!(supervisor.main_name(), FALLBACK_MAIN);
}

#[tokio::test]
async fn boot_aborts_when_neither_main_nor_fallback_is_declared() {
    let tmp = tempfile::tempdir().unwrap();
    let source = write_seed(tmp.path(), "services:\n  other: {}\n");

    let result = Supervisor::boot(BootOptions {
        root: tmp.path().join("root"),
        config_source: Some(source),
        main_name: None,
        install_only: true,
        dry_run: true,
    })
    .await;

    assert!(matches!(result, Err(SupervisorError::UnrecoverableBoot { .. })));
}

#[tokio::test]
async fn boot_marks_broken_on_malformed_config_and_skips_install() {
    let tmp = tempfile::tempdir().unwrap();
    let source = write_seed(tmp.path(), "services: [this, is, not, a, map]\nmain: *nope\n");

    let supervisor = Supervisor::boot(BootOptions {
        root: tmp.path().join("root"),
        config_source: Some(source),
        main_name: None,
        install_only: true,
        dry_run: true,
    })
    .await
    .unwrap();

    assert!(supervisor.is_broken());
    assert!(supervisor.registry.names().is_empty());
}

#[tokio::test]
async fn install_cli_tool_expands_templates_and_writes_an_executable_launcher() {
    let tmp = tempfile::tempdir().unwrap();
    let source = write_seed(tmp.path(), "services:\n  main: {}\n");

    let supervisor = Supervisor::boot(BootOptions {
        root: tmp.path().join("root"),
        config_source: Some(source),
        main_name: None,
        install_only: true,
        dry_run: true,
    })
    .await
    .unwrap();

    supervisor.install_cli_tool("kestrelctl", "#!/bin/sh\ncd $[root]\n").unwrap();

    let dest = supervisor.paths().bin.join("kestrelctl");
    let contents = std::fs::read_to_string(&dest).unwrap();
    assert!(contents.contains(&supervisor.paths().root.display().to_string()));

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = std::fs::metadata(&dest).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o550);
    }
}

#[tokio::test]
async fn shutdown_is_safe_to_call_with_nothing_running() {
    let tmp = tempfile::tempdir().unwrap();
    let source = write_seed(tmp.path(), "services:\n  main: {}\n");

    let supervisor = Supervisor::boot(BootOptions {
        root: tmp.path().join("root"),
        config_source: Some(source),
        main_name: None,
        install_only: true,
        dry_run: true,
    })
    .await
    .unwrap();

    supervisor.shutdown().await;
}
