// SPDX-License-Identifier: MIT

use crate::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("node at {0} is a leaf (Topic), not an interior node (Topics)")]
    NotTopics(Path),
    #[error("no node at {0}")]
    NotFound(Path),
    #[error("node at {0} is an interior node (Topics), not a leaf (Topic)")]
    NotTopic(Path),
    #[error("validator rejected value at {0}: {1}")]
    Rejected(Path, String),
    #[error("configuration file failed validation: {0}")]
    ValidationFailed(String),
    #[error("malformed configuration document: {0}")]
    ParseError(String),
    #[error("I/O error at {path}: {source}")]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("unknown configuration file extension: {0}")]
    UnknownExtension(String),
    #[error("corrupt transaction log record at offset {offset}: {message}")]
    CorruptTlog { offset: u64, message: String },
}
