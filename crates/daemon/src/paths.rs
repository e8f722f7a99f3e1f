// SPDX-License-Identifier: MIT

//! Derived path layout under the root directory, recomputed whenever
//! `system.rootpath` changes: `config/`, `bin/`, `work/`, each created
//! with owner-only permissions where the platform supports it.

use crate::error::SupervisorError;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct SupervisorPaths {
    pub root: PathBuf,
    pub config: PathBuf,
    pub bin: PathBuf,
    pub work: PathBuf,
}

impl SupervisorPaths {
    pub fn under(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            config: root.join("config"),
            bin: root.join("bin"),
            work: root.join("work"),
            root,
        }
    }

    pub fn config_yaml(&self) -> PathBuf {
        self.config.join("config.yaml")
    }

    pub fn config_tlog(&self) -> PathBuf {
        self.config.join("config.tlog")
    }

    /// Creates every directory in the layout, each restricted to the
    /// owner on platforms that support Unix permission bits. Windows
    /// permission semantics are left at the filesystem's default.
    pub fn ensure_dirs(&self) -> Result<(), SupervisorError> {
        for dir in [&self.root, &self.config, &self.bin, &self.work] {
            ensure_owner_only_dir(dir)?;
        }
        Ok(())
    }
}

fn ensure_owner_only_dir(dir: &Path) -> Result<(), SupervisorError> {
    std::fs::create_dir_all(dir).map_err(|source| SupervisorError::PathCreation {
        path: dir.to_path_buf(),
        source,
    })?;
    restrict_to_owner(dir)
}

#[cfg(unix)]
fn restrict_to_owner(dir: &Path) -> Result<(), SupervisorError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(dir, std::fs::Permissions::from_mode(0o700)).map_err(|source| {
        SupervisorError::PathCreation { path: dir.to_path_buf(), source }
    })
}

#[cfg(not(unix))]
fn restrict_to_owner(_dir: &Path) -> Result<(), SupervisorError> {
    Ok(())
}

#[cfg(test)]
#[path = "paths_tests.rs"]
mod tests;
