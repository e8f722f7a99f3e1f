// SPDX-License-Identifier: MIT

//! Boots the kernel: wires every component into the shared [`Context`],
//! seeds the configuration tree, constructs a [`Lifecycle`] for every
//! declared service and drives install/start/shutdown in dependency
//! order.

use crate::config_seed::{replay_existing, seed_from_source};
use crate::error::SupervisorError;
use crate::paths::SupervisorPaths;
use crate::template_eval::SystemEvaluator;
use kestrel_config::{ConfigTree, Path as CPath};
use kestrel_context::Context;
use kestrel_core::Any;
use kestrel_exec::{DryRunShellRunner, Executor, ServiceRunner, ShellRunner};
use kestrel_lifecycle::{DependencyResolver, GenericService, Lifecycle, LifecycleRegistry, State};
use kestrel_platform::PlatformSelector;
use kestrel_template::TemplateEngine;
use parking_lot::RwLock;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::{SystemTime, UNIX_EPOCH};

/// Service name tried first when resolving the entry point of the whole
/// tree; `FALLBACK_MAIN` is tried once before boot aborts.
pub const DEFAULT_MAIN: &str = "main";
pub const FALLBACK_MAIN: &str = "fallbackMain";

fn epoch_ms() -> i64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis() as i64
}

/// Inputs to [`Supervisor::boot`], one field per supported CLI flag.
#[derive(Debug, Clone, Default)]
pub struct BootOptions {
    pub root: PathBuf,
    pub config_source: Option<PathBuf>,
    pub main_name: Option<String>,
    pub install_only: bool,
    pub dry_run: bool,
}

pub struct Supervisor {
    pub context: Context,
    pub tree: Arc<ConfigTree>,
    pub registry: Arc<LifecycleRegistry>,
    pub platform: Arc<PlatformSelector>,
    pub template: Arc<RwLock<TemplateEngine>>,
    pub runner: Arc<ServiceRunner>,
    paths: Arc<RwLock<SupervisorPaths>>,
    broken: AtomicBool,
    main_name: RwLock<String>,
    boot_order: RwLock<Vec<String>>,
}

impl Supervisor {
    /// Runs the full boot sequence and returns the running supervisor.
    /// Configuration errors set the broken flag and skip install/start
    /// (shutdown still works); an unresolvable main service aborts boot
    /// entirely, since nothing meaningful can run without it.
    pub async fn boot(options: BootOptions) -> Result<Arc<Self>, SupervisorError> {
        let context = Context::new();
        let tree = Arc::new(ConfigTree::new());
        let registry = LifecycleRegistry::new();
        let platform = Arc::new(PlatformSelector::detect());
        let template = Arc::new(RwLock::new(TemplateEngine::new()));
        let runner: Arc<ServiceRunner> = Arc::new(if options.dry_run {
            ServiceRunner::DryRun(DryRunShellRunner::new())
        } else {
            ServiceRunner::Real(ShellRunner::new(Executor::new()))
        });
        let paths = Arc::new(RwLock::new(SupervisorPaths::under(options.root.clone())));

        context.put(tree.clone());
        context.put(registry.clone());
        context.put(platform.clone());
        context.put(template.clone());
        context.put(runner.clone());

        let supervisor = Arc::new(Self {
            context,
            tree: tree.clone(),
            registry,
            platform,
            template: template.clone(),
            runner,
            paths: paths.clone(),
            broken: AtomicBool::new(false),
            main_name: RwLock::new(
                options.main_name.clone().unwrap_or_else(|| DEFAULT_MAIN.to_string()),
            ),
            boot_order: RwLock::new(Vec::new()),
        });
        supervisor.context.put(supervisor.clone());

        // Step 2: directories track `system.rootpath`, recomputed on every change.
        let rootpath_topic = tree.lookup(&CPath::from("system.rootpath"))?;
        let weak_paths = Arc::downgrade(&paths);
        tree.subscribe_immediate(
            &rootpath_topic,
            Arc::new(move |_what, value| on_rootpath_changed(&weak_paths, value)),
        )?;
        tree.set_value(&rootpath_topic, epoch_ms(), Any::String(options.root.display().to_string()))?;
        tree.wait_for_clear();

        // Step 3: seed the tree, either from `-config` or from the persisted layout.
        let mut broken = false;
        let seed_result = match &options.config_source {
            Some(source) => seed_from_source(&tree, &paths.read().clone(), source, epoch_ms()),
            None => replay_existing(&tree, &paths.read().clone()),
        };
        if let Err(e) = seed_result {
            tracing::error!(error = %e, "configuration load failed; supervisor marked broken");
            broken = true;
        }

        // Step 4: start recording future mutations, even if boot is broken.
        if let Err(e) = tree.log_transactions_to(&paths.read().config_tlog()) {
            tracing::error!(error = %e, "failed to open transaction log; supervisor marked broken");
            broken = true;
        }
        supervisor.broken.store(broken, Ordering::Release);

        // Step 5: the system template evaluator (root/work/bin/config + dotted lookup).
        template.write().register(SystemEvaluator::new(paths.clone(), tree.clone()));

        if broken {
            tracing::warn!("skipping main resolution and install/start: supervisor is broken");
            return Ok(supervisor);
        }

        // Step 6: resolve the main service, falling back once before aborting.
        let declared_main = supervisor.main_name.read().clone();
        let resolved_main = resolve_main(&tree, &declared_main)?;
        *supervisor.main_name.write() = resolved_main;

        // Steps 7-8.
        supervisor.install_everything()?;
        if !options.install_only {
            supervisor.start_everything()?;
        }

        Ok(supervisor)
    }

    pub fn is_broken(&self) -> bool {
        self.broken.load(Ordering::Acquire)
    }

    pub fn main_name(&self) -> String {
        self.main_name.read().clone()
    }

    pub fn paths(&self) -> SupervisorPaths {
        self.paths.read().clone()
    }

    /// Constructs a [`Lifecycle`] for every service declared under
    /// `services`, then sets each to `Installing` in dependency order.
    pub fn install_everything(&self) -> Result<(), SupervisorError> {
        let names = self
            .tree
            .find(&CPath::from("services"))
            .and_then(|n| n.child_names().ok())
            .unwrap_or_default();

        for name in &names {
            self.construct_lifecycle(name)?;
        }

        let order =
            DependencyResolver::ordered_dependencies(&names, |n| self.registry.dependency_names_of(n));
        *self.boot_order.write() = order.clone();

        for name in &order {
            if let Some(lifecycle) = self.registry.get(name) {
                lifecycle.set_state(State::Installing)?;
            }
        }
        Ok(())
    }

    /// Sets every service to `AwaitingStartup` in the order computed by
    /// [`install_everything`]; dependency gating inside `Lifecycle`
    /// takes it from there.
    pub fn start_everything(&self) -> Result<(), SupervisorError> {
        let order = self.boot_order.read().clone();
        for name in &order {
            if let Some(lifecycle) = self.registry.get(name) {
                lifecycle.set_state(State::AwaitingStartup)?;
            }
        }
        Ok(())
    }

    /// Reverse-dependency-order shutdown: every currently `Running`
    /// service is asked to stop. Per-service failures are logged, not
    /// propagated, so one stuck service cannot block the rest.
    pub async fn shutdown(&self) {
        let order = self.boot_order.read().clone();
        for name in order.iter().rev() {
            let Some(lifecycle) = self.registry.get(name) else { continue };
            if lifecycle.current_state() == State::Running {
                if let Err(e) = lifecycle.set_state(State::Shutdown) {
                    tracing::warn!(service = %name, error = %e, "failed to signal shutdown");
                }
            }
        }
        self.tree.wait_for_clear();
    }

    fn construct_lifecycle(&self, name: &str) -> Result<(), SupervisorError> {
        if self.registry.get(name).is_some() {
            return Ok(());
        }
        let config = self.tree.lookup_topics(&CPath::from(format!("services.{name}").as_str()))?;
        let paths = self.paths.read().clone();
        let work_dir = paths.work.join(name);
        let service = GenericService::new(
            name,
            self.tree.clone(),
            config.clone(),
            self.runner.clone(),
            self.platform.clone(),
            work_dir,
            paths.root,
        )?;
        let lifecycle = Lifecycle::new(
            name,
            self.tree.clone(),
            config,
            Arc::new(service),
            &self.platform,
            &self.registry,
        )?;
        self.registry.register(lifecycle);
        Ok(())
    }

    /// Reads `resource` (an embedded launcher script), rewrites its
    /// `$[...]` tokens against this supervisor's paths, and writes it
    /// atomically to `bin/`, owner+group read/execute.
    pub fn install_cli_tool(&self, name: &str, resource: &str) -> Result<(), SupervisorError> {
        let expanded = self.template.read().expand(resource);
        let dest = self.paths.read().bin.join(name);
        kestrel_config::commitable::CommitableWriter::write(&dest, &expanded)?;
        set_launcher_permissions(&dest)?;
        Ok(())
    }
}

fn on_rootpath_changed(paths: &Weak<RwLock<SupervisorPaths>>, value: &Any) {
    let Some(paths) = paths.upgrade() else { return };
    let Some(root) = value.as_str() else { return };
    let new_paths = SupervisorPaths::under(root);
    if let Err(e) = new_paths.ensure_dirs() {
        tracing::error!(error = %e, "failed to create directory layout");
        return;
    }
    *paths.write() = new_paths;
}

fn resolve_main(tree: &ConfigTree, declared: &str) -> Result<String, SupervisorError> {
    if tree.find(&CPath::from(format!("services.{declared}").as_str())).is_some() {
        return Ok(declared.to_string());
    }
    if tree.find(&CPath::from(format!("services.{FALLBACK_MAIN}").as_str())).is_some() {
        tracing::warn!(main = %declared, fallback = FALLBACK_MAIN, "main service not declared, using fallback");
        return Ok(FALLBACK_MAIN.to_string());
    }
    Err(SupervisorError::UnrecoverableBoot {
        main: declared.to_string(),
        fallback: FALLBACK_MAIN.to_string(),
    })
}

fn set_launcher_permissions(path: &std::path::Path) -> Result<(), SupervisorError> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o550))
            .map_err(|source| SupervisorError::Io { path: path.to_path_buf(), source })?;
    }
    #[cfg(not(unix))]
    {
        let _ = path;
    }
    Ok(())
}

#[cfg(test)]
#[path = "supervisor_tests.rs"]
mod tests;
