// SPDX-License-Identifier: MIT

//! The capability set a service implements: install / awaitingStartup /
//! startup / run / shutdown. [`GenericService`] is the fallback
//! implementation, driving each hook from a script string under the
//! service's config subtree via a [`ServiceRunner`].

use kestrel_config::{ConfigTree, Node};
use kestrel_core::outcome::ScriptOutcome;
use kestrel_exec::{Cancellation, ExecError, ServiceContext, ServiceRunner};
use kestrel_platform::PlatformSelector;
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

pub type HookFuture = Pin<Box<dyn Future<Output = ScriptOutcome> + Send>>;

pub trait ServiceHooks: Send + Sync {
    /// `cancel` is triggered if a newer state transition preempts this
    /// one before the hook's script finishes; a well-behaved hook should
    /// stop the script and return [`ScriptOutcome::Cancelled`].
    fn install(&self, cancel: Cancellation) -> HookFuture;
    fn awaiting_startup(&self, cancel: Cancellation) -> HookFuture;
    fn startup(&self, cancel: Cancellation) -> HookFuture;
    fn run(&self, cancel: Cancellation) -> HookFuture;
    fn shutdown(&self, cancel: Cancellation) -> HookFuture;

    /// Whether `startup` re-triggers `Running` on a timer rather than
    /// settling directly into it. Default: no periodicity.
    fn has_periodic_timer(&self) -> bool {
        false
    }
}

fn epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}

/// Drives a service purely from its config subtree: `install`,
/// `awaitingStartup`, `startup`, `run`, `shutdown` script strings, an
/// `exists` skip-if path, and a `periodic` marker.
#[derive(Clone)]
pub struct GenericService {
    name: String,
    config: Node,
    tree: Arc<ConfigTree>,
    runner: Arc<ServiceRunner>,
    platform: Arc<PlatformSelector>,
    work_dir: PathBuf,
    root_dir: PathBuf,
    svcuid: String,
}

impl GenericService {
    pub fn new(
        name: impl Into<String>,
        tree: Arc<ConfigTree>,
        config: Node,
        runner: Arc<ServiceRunner>,
        platform: Arc<PlatformSelector>,
        work_dir: PathBuf,
        root_dir: PathBuf,
    ) -> Result<Self, kestrel_config::ConfigError> {
        let name = name.into();
        let svcuid = Self::resolve_svcuid(&tree, &config)?;
        Ok(Self { name, config, tree, runner, platform, work_dir, root_dir, svcuid })
    }

    /// Reads the `_UID` leaf if present, otherwise generates and persists
    /// one so it is stable across restarts.
    fn resolve_svcuid(tree: &ConfigTree, config: &Node) -> Result<String, kestrel_config::ConfigError> {
        let path = config.full_path().child("_UID");
        let topic = tree.lookup(&path)?;
        if let Some(existing) = topic.value()?.as_str() {
            if !existing.is_empty() {
                return Ok(existing.to_string());
            }
        }
        let generated = kestrel_core::id::new_svcuid();
        tree.set_value(&topic, epoch_ms(), kestrel_core::Any::String(generated.clone()))?;
        Ok(generated)
    }

    /// Reads `key` as a leaf string, or, if it's an OS-variant map
    /// (`all`/`linux`/`debian`/... child keys), resolves it through the
    /// platform selector first and reads the winning child as a string.
    fn string_child(&self, key: &str) -> Option<String> {
        let child = self.config.child(key)?;
        let leaf = if child.is_topics() { self.platform.pick_by_os(&child)? } else { child };
        leaf.value().ok()?.as_str().map(str::to_string).filter(|s| !s.trim().is_empty())
    }

    fn bashtimeout(&self) -> Option<Duration> {
        self.config
            .child("bashtimeout")
            .and_then(|n| n.value().ok())
            .and_then(|v| v.as_int())
            .map(|secs| Duration::from_secs(secs.max(0) as u64))
    }

    fn service_context(&self) -> ServiceContext {
        ServiceContext {
            name: self.name.clone(),
            work_dir: self.work_dir.clone(),
            root_dir: self.root_dir.clone(),
            svcuid: self.svcuid.clone(),
            bashtimeout: self.bashtimeout(),
            setenv: self.setenv_chain(),
        }
    }

    /// `setenv` blocks from every ancestor of this service's config node,
    /// root first, so a more specific one (e.g. the service's own) can
    /// override a value set further up the chain.
    fn setenv_chain(&self) -> Vec<(String, String)> {
        let mut ancestors = Vec::new();
        let mut current = Some(self.config.clone());
        while let Some(node) = current {
            current = node.parent();
            ancestors.push(node);
        }

        let mut entries: Vec<(String, String)> = Vec::new();
        for node in ancestors.into_iter().rev() {
            let Some(setenv) = node.child("setenv") else { continue };
            let Ok(keys) = setenv.child_names() else { continue };
            for key in keys {
                let Some(value) = setenv.child(&key).and_then(|c| c.value().ok()) else { continue };
                let Some(value) = value.as_str() else { continue };
                match entries.iter_mut().find(|(k, _)| k == &key) {
                    Some(entry) => entry.1 = value.to_string(),
                    None => entries.push((key, value.to_string())),
                }
            }
        }
        entries
    }

    /// `exists: <path>` skip-if: when the path is present on the host,
    /// the install phase is skipped rather than run.
    fn install_should_skip(&self) -> bool {
        self.string_child("exists")
            .map(|path| std::path::Path::new(&path).exists())
            .unwrap_or(false)
    }

    async fn run_script(&self, key: &str, cancel: Cancellation) -> ScriptOutcome {
        use tracing::Instrument;

        let span = tracing::info_span!(
            "service_script",
            service = %self.name,
            svcuid = %self.svcuid,
            phase = key,
        );
        async move {
            let Some(command) = self.string_child(key) else {
                return ScriptOutcome::NothingDone;
            };
            let ctx = self.service_context();
            let Some(exec) = self.runner.setup(key, &command, &ctx) else {
                return ScriptOutcome::NothingDone;
            };
            match self.runner.successful(exec, &command, None, cancel).await {
                Ok(true) => ScriptOutcome::Ok,
                Ok(false) => {
                    tracing::warn!("script exited non-zero");
                    ScriptOutcome::Errored(format!("{key} script exited non-zero"))
                }
                Err(ExecError::Cancelled { .. }) => ScriptOutcome::Cancelled,
                Err(e) => {
                    tracing::warn!(error = %e, "script execution failed");
                    ScriptOutcome::Errored(e.to_string())
                }
            }
        }
        .instrument(span)
        .await
    }
}

impl ServiceHooks for GenericService {
    fn install(&self, cancel: Cancellation) -> HookFuture {
        let this = self.clone();
        Box::pin(async move {
            if this.install_should_skip() {
                tracing::info!(service = %this.name, "Skipping");
                return ScriptOutcome::NothingDone;
            }
            this.run_script("install", cancel).await
        })
    }

    fn awaiting_startup(&self, cancel: Cancellation) -> HookFuture {
        let this = self.clone();
        Box::pin(async move { this.run_script("awaitingStartup", cancel).await })
    }

    fn startup(&self, cancel: Cancellation) -> HookFuture {
        let this = self.clone();
        Box::pin(async move { this.run_script("startup", cancel).await })
    }

    fn run(&self, cancel: Cancellation) -> HookFuture {
        let this = self.clone();
        Box::pin(async move { this.run_script("run", cancel).await })
    }

    fn shutdown(&self, cancel: Cancellation) -> HookFuture {
        let this = self.clone();
        Box::pin(async move { this.run_script("shutdown", cancel).await })
    }

    fn has_periodic_timer(&self) -> bool {
        self.config
            .child("periodic")
            .and_then(|n| n.value().ok())
            .map(|v| !v.is_null())
            .unwrap_or(false)
    }
}

#[cfg(test)]
#[path = "hooks_tests.rs"]
mod tests;
