// SPDX-License-Identifier: MIT

//! Populates the configuration tree at boot: either from a `-config`
//! source (persisted as the new `config.yaml` baseline, clearing any
//! stale tlog) or by replaying the existing `config.yaml` followed by
//! `config.tlog`.

use crate::error::SupervisorError;
use crate::paths::SupervisorPaths;
use kestrel_config::{tlog, yaml, ConfigTree, Path as CPath};
use std::path::Path as FsPath;

/// Load `source` (YAML/JSON, dispatched by extension) into `tree`, then
/// write it out as the new `config.yaml` baseline and drop any tlog left
/// over from a previous run, per the `-config` reseed behavior.
pub fn seed_from_source(
    tree: &ConfigTree,
    paths: &SupervisorPaths,
    source: &FsPath,
    modtime: i64,
) -> Result<(), SupervisorError> {
    yaml::load_into(tree, &CPath::from(""), modtime, source).map_err(|source_err| {
        SupervisorError::ConfigParse { path: source.to_path_buf(), source: source_err }
    })?;
    yaml::save_from(&tree.root(), &paths.config_yaml())?;
    if paths.config_tlog().exists() {
        std::fs::remove_file(paths.config_tlog()).map_err(|source| SupervisorError::Io {
            path: paths.config_tlog(),
            source,
        })?;
    }
    Ok(())
}

/// Replay the persisted `config.yaml` baseline, then the `config.tlog`
/// tail of mutations recorded since that baseline was written.
pub fn replay_existing(tree: &ConfigTree, paths: &SupervisorPaths) -> Result<(), SupervisorError> {
    let yaml_path = paths.config_yaml();
    if yaml_path.exists() {
        yaml::load_into(tree, &CPath::from(""), 0, &yaml_path).map_err(|source_err| {
            SupervisorError::ConfigParse { path: yaml_path.clone(), source: source_err }
        })?;
    }
    let tlog_path = paths.config_tlog();
    if tlog_path.exists() {
        for entry in tlog::replay(&tlog_path)? {
            match entry.op {
                tlog::Op::Set => {
                    let path = CPath::from(entry.path.as_str());
                    let topic = tree.lookup(&path)?;
                    tree.set_value(&topic, entry.timestamp, entry.value)?;
                }
                tlog::Op::Remove => {
                    tracing::warn!(path = %entry.path, "tlog remove record replayed, but subtree removal is not yet supported; skipping");
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "config_seed_tests.rs"]
mod tests;
