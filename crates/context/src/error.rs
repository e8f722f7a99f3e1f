// SPDX-License-Identifier: MIT

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ContextError {
    #[error("construction cycle detected while building {0}")]
    ConstructionCycle(String),
    #[error("registered value for {0} does not match the requested type")]
    TypeMismatch(String),
}
