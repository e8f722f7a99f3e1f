// SPDX-License-Identifier: MIT

use super::*;

#[test]
fn under_derives_the_standard_layout() {
    let paths = SupervisorPaths::under("/tmp/kestrel-root");
    assert_eq!(paths.config, PathBuf::from("/tmp/kestrel-root/config"));
    assert_eq!(paths.bin, PathBuf::from("/tmp/kestrel-root/bin"));
    assert_eq!(paths.work, PathBuf::from("/tmp/kestrel-root/work"));
    assert_eq!(paths.config_yaml(), PathBuf::from("/tmp/kestrel-root/config/config.yaml"));
    assert_eq!(paths.config_tlog(), PathBuf::from("/tmp/kestrel-root/config/config.tlog"));
}

#[test]
fn ensure_dirs_creates_every_directory_owner_only() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path().join("x");
    let paths = SupervisorPaths::under(&root);
    paths.ensure_dirs().unwrap();

    for dir in [&paths.root, &paths.config, &paths.bin, &paths.work] {
        assert!(dir.is_dir());
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(dir).unwrap().permissions().mode() & 0o777;
            assert_eq!(mode, 0o700);
        }
    }
}
