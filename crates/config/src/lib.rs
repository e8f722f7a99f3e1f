// SPDX-License-Identifier: MIT

//! Hierarchical, reactive configuration tree: `ConfigTree` holds a graph
//! of interior `Topics` nodes and leaf `Topic` nodes, dispatches change
//! notifications through a single ordered [`queue::PublishQueue`], and
//! can be persisted atomically via [`commitable`] and audited via
//! [`tlog`].

pub mod commitable;
pub mod error;
pub mod merge;
pub mod node;
pub mod path;
pub mod queue;
pub mod subscriber;
pub mod tlog;
pub mod yaml;

pub use error::ConfigError;
pub use merge::MergePolicy;
pub use node::{ConfigTree, Node, Validator};
pub use path::Path;
pub use subscriber::{Subscriber, WhatHappened};
