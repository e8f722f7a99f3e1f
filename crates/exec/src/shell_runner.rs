// SPDX-License-Identifier: MIT

//! Wraps [`Executor`] with service context: working directory, a stable
//! per-service id injected as `SVCUID`, a timeout override, and sinks
//! that log output and feed it back into the service's `status` topic.

use crate::{Cancellation, Exec, ExecError, Executor};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Everything a lifecycle script needs from its owning service to be
/// launched: where it runs, its stable identity, any timeout override,
/// and the `setenv` entries resolved from its config chain.
pub struct ServiceContext {
    pub name: String,
    pub work_dir: PathBuf,
    pub root_dir: PathBuf,
    pub svcuid: String,
    pub bashtimeout: Option<Duration>,
    pub setenv: Vec<(String, String)>,
}

/// Called with `(service_name, line)` for every line of output a
/// lifecycle script produces, so the caller can update the service's
/// `status` topic.
pub type StatusSink = Arc<dyn Fn(&str, &str) + Send + Sync>;

pub struct ShellRunner {
    executor: Executor,
    default_timeout: Duration,
    on_status: Option<StatusSink>,
}

impl ShellRunner {
    pub fn new(executor: Executor) -> Self {
        Self {
            executor,
            default_timeout: DEFAULT_TIMEOUT,
            on_status: None,
        }
    }

    pub fn with_status_sink(mut self, sink: StatusSink) -> Self {
        self.on_status = Some(sink);
        self
    }

    pub fn executor(&self) -> &Executor {
        &self.executor
    }

    /// `None` when `command` is empty or whitespace-only. Otherwise
    /// builds a shell [`Exec`] with the service's timeout, working
    /// directory, `HOME`/`GGHOME`/`SVCUID`, and any `setenv` overrides,
    /// wired to log and update status.
    pub fn setup(&self, note: &str, command: &str, ctx: &ServiceContext) -> Option<Exec> {
        if command.trim().is_empty() {
            return None;
        }
        let timeout = ctx.bashtimeout.unwrap_or(self.default_timeout);
        let mut spec = Exec::shell(command.to_string())
            .cwd(ctx.work_dir.clone())
            .env("HOME", ctx.work_dir.display().to_string())
            .env("GGHOME", ctx.root_dir.display().to_string())
            .env("SVCUID", ctx.svcuid.clone())
            .timeout(timeout);
        for (key, value) in &ctx.setenv {
            spec = spec.env(key.clone(), value.clone());
        }

        let note = note.to_string();
        let service = ctx.name.clone();
        let on_status = self.on_status.clone();
        spec = spec.on_stdout(line_sink(service.clone(), note.clone(), on_status.clone()));
        spec = spec.on_stderr(line_sink(service, note, on_status));
        Some(spec)
    }

    /// Run `exec` (the caller must have gotten it from [`setup`]).
    /// `background`, when given, starts the script without blocking and
    /// invokes the continuation with the eventual exit code; `successful`
    /// then reports whether it was started. Without it, blocks and
    /// reports whether the exit code was 0; `cancel` lets the caller stop
    /// a foreground run early, surfaced as `Err(ExecError::Cancelled)`
    /// (ignored in the background case, which has its own
    /// `BackgroundHandle`-based cancellation).
    pub async fn successful(
        &self,
        exec: Exec,
        background: Option<Box<dyn FnOnce(i32) + Send>>,
        cancel: Cancellation,
    ) -> Result<bool, ExecError> {
        match background {
            Some(on_exit) => match self.executor.run_background(exec, move |code| on_exit(code)) {
                Ok(_handle) => Ok(true),
                Err(e) => {
                    tracing::warn!(error = %e, "failed to start background script");
                    Err(e)
                }
            },
            None => self.executor.run_cancellable(exec, cancel).await.map(|outcome| outcome.success()),
        }
    }
}

fn line_sink(service: String, note: String, on_status: Option<StatusSink>) -> crate::LineSink {
    Arc::new(move |line: &str| {
        tracing::info!(service = %service, note = %note, "{line}");
        if let Some(on_status) = &on_status {
            on_status(&service, line);
        }
    })
}

/// Prints commands instead of executing them; selected when the
/// operator runs in simulation mode.
pub struct DryRunShellRunner;

impl DryRunShellRunner {
    pub fn new() -> Self {
        Self
    }

    pub fn setup(&self, _note: &str, command: &str, _ctx: &ServiceContext) -> Option<Exec> {
        if command.trim().is_empty() {
            None
        } else {
            Some(Exec::shell(command.to_string()))
        }
    }

    /// Never actually runs `exec`; only prints the command it would
    /// have run, and reports success.
    pub fn successful(&self, command: &str, background: Option<Box<dyn FnOnce(i32) + Send>>) -> bool {
        println!("[dryrun] {command}");
        if let Some(on_exit) = background {
            on_exit(0);
        }
        true
    }
}

impl Default for DryRunShellRunner {
    fn default() -> Self {
        Self::new()
    }
}

/// Either a real or a dry-run runner, selected once at boot.
pub enum ServiceRunner {
    Real(ShellRunner),
    DryRun(DryRunShellRunner),
}

impl ServiceRunner {
    pub fn setup(&self, note: &str, command: &str, ctx: &ServiceContext) -> Option<Exec> {
        match self {
            ServiceRunner::Real(r) => r.setup(note, command, ctx),
            ServiceRunner::DryRun(r) => r.setup(note, command, ctx),
        }
    }

    pub async fn successful(
        &self,
        exec: Exec,
        command: &str,
        background: Option<Box<dyn FnOnce(i32) + Send>>,
        cancel: Cancellation,
    ) -> Result<bool, ExecError> {
        match self {
            ServiceRunner::Real(r) => r.successful(exec, background, cancel).await,
            ServiceRunner::DryRun(r) => Ok(r.successful(command, background)),
        }
    }
}

#[cfg(test)]
#[path = "shell_runner_tests.rs"]
mod tests;
