// SPDX-License-Identifier: MIT

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("failed to spawn {command}: {source}")]
    SpawnFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{command} timed out after {timeout_ms}ms and was killed")]
    Timeout { command: String, timeout_ms: u64 },
    #[error("{command} was cancelled by a newer transition")]
    Cancelled { command: String },
    #[error("neither argv nor a shell command was given")]
    EmptySpec,
}
