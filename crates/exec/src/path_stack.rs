// SPDX-License-Identifier: MIT

//! A synchronized PATH stack. Subsystems that want to prepend or remove
//! a directory from every future child process's `PATH` go through this
//! instead of mutating the process environment directly.

use parking_lot::RwLock;

#[derive(Default)]
pub struct PathStack {
    prefixes: RwLock<Vec<String>>,
}

impl PathStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prepend a directory so it is searched before anything already on
    /// the stack.
    pub fn add_first(&self, dir: impl Into<String>) {
        self.prefixes.write().insert(0, dir.into());
    }

    /// Remove every occurrence of `dir` from the stack.
    pub fn remove(&self, dir: &str) {
        self.prefixes.write().retain(|d| d != dir);
    }

    /// Render the full `PATH` value: the stack's prefixes, most recently
    /// added first, followed by the process's inherited `PATH`.
    pub fn render(&self) -> String {
        let prefixes = self.prefixes.read();
        let inherited = std::env::var("PATH").unwrap_or_default();
        if prefixes.is_empty() {
            return inherited;
        }
        let mut parts = prefixes.clone();
        if !inherited.is_empty() {
            parts.push(inherited);
        }
        parts.join(":")
    }
}

#[cfg(test)]
#[path = "path_stack_tests.rs"]
mod tests;
