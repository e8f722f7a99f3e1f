// SPDX-License-Identifier: MIT

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error("failed to create directory {path}: {source}")]
    PathCreation {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed configuration source {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: kestrel_config::ConfigError,
    },
    #[error("neither main service {main:?} nor fallback {fallback:?} is declared; aborting boot")]
    UnrecoverableBoot { main: String, fallback: String },
    #[error(transparent)]
    Config(#[from] kestrel_config::ConfigError),
    #[error(transparent)]
    Lifecycle(#[from] kestrel_lifecycle::LifecycleError),
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
