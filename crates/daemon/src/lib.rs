// SPDX-License-Identifier: MIT

//! Boot/shutdown wiring for the kernel: derives the on-disk path layout
//! from `system.rootpath`, seeds or replays the configuration tree, and
//! drives every declared service through install and start in
//! dependency order via [`supervisor::Supervisor`].

pub mod config_seed;
pub mod error;
pub mod paths;
pub mod signal;
pub mod supervisor;
pub mod template_eval;

pub use error::SupervisorError;
pub use paths::SupervisorPaths;
pub use supervisor::{BootOptions, Supervisor, DEFAULT_MAIN, FALLBACK_MAIN};
pub use template_eval::SystemEvaluator;
