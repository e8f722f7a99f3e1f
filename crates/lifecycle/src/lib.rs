// SPDX-License-Identifier: MIT

//! Per-service state machine: state transitions, dependency gating and
//! declaration parsing, and topological ordering for install/start/stop.

pub mod dependency;
pub mod error;
pub mod hooks;
pub mod lifecycle;
pub mod registry;
pub mod resolver;
pub mod state;

pub use dependency::{parse_dependencies, DependencyEntry};
pub use error::LifecycleError;
pub use hooks::{GenericService, HookFuture, ServiceHooks};
pub use lifecycle::{ErrorInfo, Lifecycle};
pub use registry::LifecycleRegistry;
pub use resolver::DependencyResolver;
pub use state::State;
