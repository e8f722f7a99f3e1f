// SPDX-License-Identifier: MIT

//! Append-only transaction log: one length-prefixed record per accepted
//! write, so a tree can be replayed from a snapshot plus its tail of log
//! entries. Each record is a 4-byte little-endian length followed by
//! that many bytes of JSON-encoded `{modtime, operation, path-segments,
//! value}`.

use crate::error::ConfigError;
use crate::path::Path;
use kestrel_core::Any;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::Path as FsPath;

/// Records larger than this are rejected on read as corrupt rather than
/// trusted outright; guards against a garbage length prefix causing an
/// enormous allocation.
const MAX_RECORD_LEN: u32 = 64 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Op {
    Set,
    Remove,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TlogEntry {
    pub timestamp: i64,
    pub path: String,
    pub op: Op,
    pub value: Any,
}

impl TlogEntry {
    pub fn set(timestamp: i64, path: &Path, value: Any) -> Self {
        Self {
            timestamp,
            path: path.to_string(),
            op: Op::Set,
            value,
        }
    }

    pub fn remove(timestamp: i64, path: &Path) -> Self {
        Self {
            timestamp,
            path: path.to_string(),
            op: Op::Remove,
            value: Any::Null,
        }
    }
}

/// An append-only, length-prefixed-record log of tree writes.
pub struct TransactionLog {
    file: File,
}

impl TransactionLog {
    pub fn open(path: &FsPath) -> Result<Self, ConfigError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Self { file })
    }

    /// Append one entry as `[u32 LE length][JSON bytes]` and fsync so a
    /// crash after this call returns cannot lose it.
    pub fn append(&mut self, entry: &TlogEntry) -> Result<(), ConfigError> {
        let body = serde_json::to_vec(entry).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        let len = u32::try_from(body.len())
            .map_err(|_| ConfigError::ParseError("tlog record too large".to_string()))?;
        self.file
            .write_all(&len.to_le_bytes())
            .and_then(|_| self.file.write_all(&body))
            .and_then(|_| self.file.sync_data())
            .map_err(|source| ConfigError::Io {
                path: std::path::PathBuf::new(),
                source,
            })
    }
}

/// Read every entry from a transaction log file, in order. A truncated
/// final record (as can happen after a crash mid-write, either in the
/// length prefix or in the body) is dropped rather than treated as
/// corruption.
pub fn replay(path: &FsPath) -> Result<Vec<TlogEntry>, ConfigError> {
    let mut file = File::open(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut entries = Vec::new();
    let mut offset: u64 = 0;
    loop {
        let mut len_bytes = [0u8; 4];
        match read_exact_or_eof(&mut file, &mut len_bytes, path)? {
            ReadOutcome::Eof => break,
            ReadOutcome::Partial => break,
            ReadOutcome::Full => {}
        }
        let len = u32::from_le_bytes(len_bytes);
        if len > MAX_RECORD_LEN {
            return Err(ConfigError::CorruptTlog {
                offset,
                message: format!("record length {len} exceeds maximum"),
            });
        }
        let mut body = vec![0u8; len as usize];
        match read_exact_or_eof(&mut file, &mut body, path)? {
            ReadOutcome::Eof | ReadOutcome::Partial => {
                // The length prefix landed but the body was cut short by a
                // crash mid-write; drop this trailing record.
                break;
            }
            ReadOutcome::Full => {}
        }
        match serde_json::from_slice(&body) {
            Ok(entry) => entries.push(entry),
            Err(e) => {
                return Err(ConfigError::CorruptTlog {
                    offset,
                    message: e.to_string(),
                })
            }
        }
        offset += 4 + len as u64;
    }
    Ok(entries)
}

enum ReadOutcome {
    Full,
    Partial,
    Eof,
}

/// Fills `buf` entirely, or reports whether the stream ended cleanly
/// before any bytes (`Eof`) or partway through (`Partial`).
fn read_exact_or_eof(file: &mut File, buf: &mut [u8], path: &FsPath) -> Result<ReadOutcome, ConfigError> {
    let mut filled = 0;
    while filled < buf.len() {
        let n = file.read(&mut buf[filled..]).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        if n == 0 {
            return Ok(if filled == 0 { ReadOutcome::Eof } else { ReadOutcome::Partial });
        }
        filled += n;
    }
    Ok(ReadOutcome::Full)
}

#[cfg(test)]
#[path = "tlog_tests.rs"]
mod tests;
