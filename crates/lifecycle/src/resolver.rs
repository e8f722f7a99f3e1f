// SPDX-License-Identifier: MIT

//! Topological ordering of the service dependency graph, with cycle
//! exclusion rather than failure.

use std::collections::HashSet;

pub struct DependencyResolver;

impl DependencyResolver {
    /// Computes an install/start ordering for `roots` and everything they
    /// transitively depend on, via `deps_of(name)`.
    ///
    /// 1. Collect the transitive closure from `roots` via depth-first
    ///    traversal.
    /// 2. Repeatedly remove from the pending set every node whose
    ///    dependencies are all already in the result, appending each in
    ///    removal order.
    /// 3. If a pass makes no progress, the remaining nodes form (or sit
    ///    behind) a cycle; they are excluded from the result.
    pub fn ordered_dependencies<F>(roots: &[String], deps_of: F) -> Vec<String>
    where
        F: Fn(&str) -> Vec<String>,
    {
        let mut seen = HashSet::new();
        let mut pending = Vec::new();
        for root in roots {
            Self::collect(root, &deps_of, &mut seen, &mut pending);
        }

        let mut ready = Vec::new();
        let mut ready_set: HashSet<String> = HashSet::new();
        let mut remaining = pending;

        loop {
            let mut progressed = false;
            let mut next_remaining = Vec::new();
            for name in remaining {
                let deps = deps_of(&name);
                if deps.iter().all(|d| ready_set.contains(d)) {
                    ready_set.insert(name.clone());
                    ready.push(name);
                    progressed = true;
                } else {
                    next_remaining.push(name);
                }
            }
            remaining = next_remaining;
            if !progressed || remaining.is_empty() {
                break;
            }
        }

        ready
    }

    fn collect<F>(name: &str, deps_of: &F, seen: &mut HashSet<String>, pending: &mut Vec<String>)
    where
        F: Fn(&str) -> Vec<String>,
    {
        if !seen.insert(name.to_string()) {
            return;
        }
        pending.push(name.to_string());
        for dep in deps_of(name) {
            Self::collect(&dep, deps_of, seen, pending);
        }
    }
}

#[cfg(test)]
#[path = "resolver_tests.rs"]
mod tests;
