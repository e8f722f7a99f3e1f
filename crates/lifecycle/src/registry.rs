// SPDX-License-Identifier: MIT

//! Process-wide table of every constructed [`Lifecycle`], used to resolve
//! dependency names to live state and to drive the fixed-point readiness
//! recheck.

use crate::lifecycle::Lifecycle;
use crate::state::State;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Default)]
pub struct LifecycleRegistry {
    services: RwLock<HashMap<String, Arc<Lifecycle>>>,
}

impl LifecycleRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn register(&self, lifecycle: Arc<Lifecycle>) {
        self.services.write().insert(lifecycle.name().to_string(), lifecycle);
    }

    pub fn get(&self, name: &str) -> Option<Arc<Lifecycle>> {
        self.services.read().get(name).cloned()
    }

    pub fn names(&self) -> Vec<String> {
        self.services.read().keys().cloned().collect()
    }

    pub fn dependency_names_of(&self, name: &str) -> Vec<String> {
        self.get(name).map(|lc| lc.dependency_names()).unwrap_or_default()
    }

    /// Advances every service in `AwaitingStartup` whose dependencies are
    /// now satisfied, repeating until a pass makes no further progress so
    /// a chain of newly-unblocked services resolves in one logical step.
    pub fn recheck_all(&self) {
        loop {
            let mut progressed = false;
            let candidates: Vec<Arc<Lifecycle>> = self
                .services
                .read()
                .values()
                .filter(|lc| lc.current_state() == State::AwaitingStartup)
                .cloned()
                .collect();
            for lc in candidates {
                if lc.dependencies_satisfied() {
                    if let Ok(true) = lc.set_state(State::Starting) {
                        progressed = true;
                    }
                }
            }
            if !progressed {
                break;
            }
        }
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
