// SPDX-License-Identifier: MIT

//! The system template evaluator the Supervisor registers first:
//! `root`/`work`/`bin`/`config` resolve to the current path layout; any
//! other expression is split on `.` and looked up in the configuration
//! tree.

use crate::paths::SupervisorPaths;
use kestrel_config::{ConfigTree, Path as CPath};
use kestrel_template::Evaluator;
use parking_lot::RwLock;
use std::sync::Arc;

/// Reads the live `SupervisorPaths` (recomputed whenever `system.rootpath`
/// changes) and, failing a path-name match, the configuration tree.
pub struct SystemEvaluator {
    paths: Arc<RwLock<SupervisorPaths>>,
    tree: Arc<ConfigTree>,
}

impl SystemEvaluator {
    pub fn new(paths: Arc<RwLock<SupervisorPaths>>, tree: Arc<ConfigTree>) -> Self {
        Self { paths, tree }
    }
}

impl Evaluator for SystemEvaluator {
    fn evaluate(&self, expr: &str) -> Option<String> {
        let paths = self.paths.read();
        let resolved = match expr {
            "root" => Some(paths.root.display().to_string()),
            "work" => Some(paths.work.display().to_string()),
            "bin" => Some(paths.bin.display().to_string()),
            "config" => Some(paths.config.display().to_string()),
            _ => None,
        };
        if resolved.is_some() {
            return resolved;
        }
        drop(paths);
        let node = self.tree.find(&CPath::from(expr))?;
        let value = node.value().ok()?;
        if value.is_null() {
            None
        } else {
            Some(value.coerce_to_string())
        }
    }
}

#[cfg(test)]
#[path = "template_eval_tests.rs"]
mod tests;
