// SPDX-License-Identifier: MIT

//! Atomic, crash-safe file persistence for the configuration tree.
//!
//! A write never touches the live file directly: it writes to a
//! `.new` sibling, fsyncs it, backs up whatever currently occupies the
//! target path to `.bak`, then renames `.new` into place. A reader that
//! finds the primary file unreadable or rejected by its validator falls
//! back to `.bak` rather than failing outright.

use crate::error::ConfigError;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

pub struct CommitableWriter;

impl CommitableWriter {
    /// Atomically replace `path`'s contents with `contents`.
    pub fn write(path: &Path, contents: &str) -> Result<(), ConfigError> {
        let tmp = sibling(path, "new");
        {
            let mut file = File::create(&tmp).map_err(|source| io_err(&tmp, source))?;
            file.write_all(contents.as_bytes())
                .map_err(|source| io_err(&tmp, source))?;
            file.sync_all().map_err(|source| io_err(&tmp, source))?;
        }
        if path.exists() {
            let bak = sibling(path, "bak");
            fs::rename(path, &bak).map_err(|source| io_err(&bak, source))?;
        }
        fs::rename(&tmp, path).map_err(|source| io_err(path, source))?;
        Ok(())
    }
}

pub struct CommitableReader;

impl CommitableReader {
    /// Read `path`, validating its contents with `validate`. On I/O
    /// failure or validator rejection, falls back to the `.bak` sibling
    /// left by the last successful [`CommitableWriter::write`].
    pub fn read(
        path: &Path,
        validate: impl Fn(&str) -> Result<(), String>,
    ) -> Result<String, ConfigError> {
        if let Ok(contents) = fs::read_to_string(path) {
            if validate(&contents).is_ok() {
                return Ok(contents);
            }
            tracing::warn!(path = %path.display(), "primary configuration file failed validation, falling back to backup");
        }
        let bak = sibling(path, "bak");
        let contents = fs::read_to_string(&bak).map_err(|source| io_err(&bak, source))?;
        validate(&contents).map_err(ConfigError::ValidationFailed)?;
        Ok(contents)
    }
}

fn sibling(path: &Path, ext: &str) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_owned()).unwrap_or_default();
    name.push(".");
    name.push(ext);
    path.with_file_name(name)
}

fn io_err(path: &Path, source: std::io::Error) -> ConfigError {
    ConfigError::Io {
        path: path.to_path_buf(),
        source,
    }
}

#[cfg(test)]
#[path = "commitable_tests.rs"]
mod tests;
