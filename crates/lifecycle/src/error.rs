// SPDX-License-Identifier: MIT

#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    #[error(transparent)]
    Config(#[from] kestrel_config::ConfigError),
}
