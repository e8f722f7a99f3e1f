// SPDX-License-Identifier: MIT

//! The per-service state machine: subscribes to its own `_State` topic
//! and runs the transition action for whatever state it observes there.

use crate::dependency::{DependencyEntry, DEPENDENCY_KEYS};
use crate::error::LifecycleError;
use crate::hooks::ServiceHooks;
use crate::registry::LifecycleRegistry;
use crate::state::State;
use kestrel_config::{ConfigTree, Node};
use kestrel_core::outcome::ScriptOutcome;
use kestrel_exec::Cancellation;
use kestrel_platform::PlatformSelector;
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::{SystemTime, UNIX_EPOCH};

fn epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}

#[derive(Debug, Clone)]
pub struct ErrorInfo {
    pub message: String,
    pub cause: Option<String>,
}

pub struct Lifecycle {
    name: String,
    tree: Arc<ConfigTree>,
    #[allow(dead_code)]
    config: Node,
    state_topic: Node,
    registry: Weak<LifecycleRegistry>,
    hooks: Arc<dyn ServiceHooks>,
    /// Last state this Lifecycle actually reacted to; used only to ignore
    /// a duplicate `Initialized`/`Changed` delivery of an already-handled
    /// value. Dependency checks read `state_topic` directly instead, so
    /// they always see a just-written value synchronously.
    last_observed: RwLock<Option<State>>,
    error: RwLock<Option<ErrorInfo>>,
    /// Captured at construction time so transition actions can be spawned
    /// onto the application's own runtime even when the state-change
    /// callback that triggers them runs on the config tree's publish-queue
    /// worker thread, which carries its own dedicated runtime separate
    /// from this one.
    runtime: tokio::runtime::Handle,
    /// The transition action currently running, paired with the
    /// [`Cancellation`] that lets a newer transition preempt it
    /// cooperatively instead of aborting its task outright, which would
    /// drop an in-flight `tokio::process::Child` without giving it a
    /// chance to be killed.
    backing_task: Mutex<Option<(Cancellation, tokio::task::JoinHandle<()>)>>,
    dependencies: RwLock<Vec<DependencyEntry>>,
    status: RwLock<Option<String>>,
    handling_error: AtomicBool,
}

impl Lifecycle {
    pub fn new(
        name: impl Into<String>,
        tree: Arc<ConfigTree>,
        config: Node,
        hooks: Arc<dyn ServiceHooks>,
        platform: &PlatformSelector,
        registry: &Arc<LifecycleRegistry>,
    ) -> Result<Arc<Self>, LifecycleError> {
        let name = name.into();
        let state_topic = tree.lookup(&config.full_path().child("_State"))?;
        let (dependencies, problems) = Self::parse_dependencies(&config, platform);

        let lifecycle = Arc::new(Self {
            name,
            tree: tree.clone(),
            config,
            state_topic: state_topic.clone(),
            registry: Arc::downgrade(registry),
            hooks,
            last_observed: RwLock::new(None),
            error: RwLock::new(None),
            runtime: tokio::runtime::Handle::current(),
            backing_task: Mutex::new(None),
            dependencies: RwLock::new(dependencies),
            status: RwLock::new(None),
            handling_error: AtomicBool::new(false),
        });

        if state_topic.value()?.is_null() {
            tree.set_value(&state_topic, epoch_ms(), State::New.to_any())?;
        }

        let weak = Arc::downgrade(&lifecycle);
        tree.subscribe_immediate(
            &state_topic,
            Arc::new(move |_what, value| {
                if let (Some(lc), Some(state)) = (weak.upgrade(), State::from_any(value)) {
                    lc.on_state_observed(state);
                }
            }),
        )?;

        // A malformed `requires` string is local to this one service: the
        // service still exists and is reachable, it just starts out
        // `Errored` instead of `New` rather than aborting the whole boot.
        if !problems.is_empty() {
            lifecycle.errored(format!("bad dependency syntax: {}", problems.join("; ")), None);
        }

        Ok(lifecycle)
    }

    /// Best-effort: malformed entries are skipped (and surfaced via the
    /// returned problem list) rather than failing construction outright.
    /// A key that's an OS-variant map (`all`/`linux`/`debian`/...) rather
    /// than a plain string is resolved through `platform` first.
    fn parse_dependencies(config: &Node, platform: &PlatformSelector) -> (Vec<DependencyEntry>, Vec<String>) {
        for key in DEPENDENCY_KEYS {
            let Some(child) = config.child(key) else { continue };
            let leaf = if child.is_topics() {
                let Some(resolved) = platform.pick_by_os(&child) else { continue };
                resolved
            } else {
                child
            };
            let Ok(value) = leaf.value() else { continue };
            let Some(raw) = value.as_str() else { continue };
            return crate::dependency::parse_dependencies(raw);
        }
        (Vec::new(), Vec::new())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The authoritative current state: read straight off the tree, so it
    /// reflects a `set_state` immediately, not just after the publish
    /// queue delivers the change.
    pub fn current_state(&self) -> State {
        self.state_topic
            .value()
            .ok()
            .as_ref()
            .and_then(State::from_any)
            .unwrap_or(State::New)
    }

    pub fn dependency_names(&self) -> Vec<String> {
        self.dependencies.read().iter().map(|d| d.name.clone()).collect()
    }

    pub fn last_status(&self) -> Option<String> {
        self.status.read().clone()
    }

    pub fn last_error(&self) -> Option<ErrorInfo> {
        self.error.read().clone()
    }

    /// Writes a new desired state to the tree. Idempotent: if the tree
    /// already holds this value, `set_value`'s own no-op check makes this
    /// a no-op and `Ok(false)` is returned.
    pub fn set_state(&self, new_state: State) -> Result<bool, LifecycleError> {
        Ok(self.tree.set_value(&self.state_topic, epoch_ms(), new_state.to_any())?)
    }

    pub(crate) fn dependencies_satisfied(&self) -> bool {
        let Some(registry) = self.registry.upgrade() else { return true };
        self.dependencies.read().iter().all(|dep| {
            registry
                .get(&dep.name)
                .map(|lc| lc.current_state().satisfies(dep.required))
                .unwrap_or(true)
        })
    }

    fn on_state_observed(self: Arc<Self>, state: State) {
        {
            let mut last = self.last_observed.write();
            if *last == Some(state) {
                return;
            }
            *last = Some(state);
        }
        tracing::info!(service = %self.name, state = state.as_str(), "state transition");

        match state {
            State::AwaitingStartup | State::Errored | State::New | State::Finished | State::Unstable => {}
            State::Installing | State::Starting | State::Running | State::Shutdown => {
                self.schedule_action(state);
            }
        }

        if let Some(registry) = self.registry.upgrade() {
            registry.recheck_all();
        }
    }

    fn schedule_action(self: &Arc<Self>, state: State) {
        let mut backing = self.backing_task.lock();
        if let Some((cancel, _handle)) = backing.take() {
            // Ask the superseded transition to stop cooperatively rather
            // than aborting its task: an abort mid-`.await` would drop an
            // in-flight child process without running its kill sequence.
            cancel.cancel();
        }
        let cancel = Cancellation::new();
        let this = self.clone();
        let task_cancel = cancel.clone();
        let handle = self.runtime.spawn(async move {
            this.run_transition_action(state, task_cancel).await;
        });
        *backing = Some((cancel, handle));
    }

    async fn run_transition_action(self: Arc<Self>, state: State, cancel: Cancellation) {
        match state {
            State::Installing => match self.hooks.install(cancel).await {
                ScriptOutcome::Ok | ScriptOutcome::NothingDone => {
                    let _ = self.set_state(State::AwaitingStartup);
                }
                ScriptOutcome::Errored(message) => self.errored(message, None),
                ScriptOutcome::Cancelled => {}
            },
            State::Starting => {
                match self.hooks.awaiting_startup(cancel.clone()).await {
                    ScriptOutcome::Errored(message) => {
                        self.errored(message, None);
                        return;
                    }
                    ScriptOutcome::Cancelled => return,
                    ScriptOutcome::Ok | ScriptOutcome::NothingDone => {}
                }
                match self.hooks.startup(cancel).await {
                    ScriptOutcome::Ok | ScriptOutcome::NothingDone => {
                        let next =
                            if self.hooks.has_periodic_timer() { State::Finished } else { State::Running };
                        let _ = self.set_state(next);
                    }
                    ScriptOutcome::Errored(message) => self.errored(message, None),
                    ScriptOutcome::Cancelled => {}
                }
            }
            State::Running => match self.hooks.run(cancel).await {
                ScriptOutcome::Ok | ScriptOutcome::NothingDone => {
                    let _ = self.set_state(State::Finished);
                }
                ScriptOutcome::Errored(message) => self.errored(message, None),
                ScriptOutcome::Cancelled => {}
            },
            State::Shutdown => match self.hooks.shutdown(cancel).await {
                ScriptOutcome::Errored(message) => {
                    tracing::warn!(service = %self.name, error = %message, "shutdown script failed");
                }
                ScriptOutcome::Ok | ScriptOutcome::NothingDone | ScriptOutcome::Cancelled => {}
            },
            State::New | State::AwaitingStartup | State::Finished | State::Errored | State::Unstable => {}
        }
    }

    /// Records the root cause and transitions to `Errored`. Guarded
    /// against re-entrant failures raised from within the error path
    /// itself.
    fn errored(self: &Arc<Self>, message: String, cause: Option<String>) {
        if self.handling_error.swap(true, Ordering::AcqRel) {
            tracing::warn!(service = %self.name, "error handler re-entered, ignoring");
            return;
        }
        tracing::warn!(service = %self.name, error = %message, "service errored");
        *self.status.write() = Some(message.clone());
        *self.error.write() = Some(ErrorInfo { message, cause });
        let _ = self.set_state(State::Errored);
        self.handling_error.store(false, Ordering::Release);
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
