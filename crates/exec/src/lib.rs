// SPDX-License-Identifier: MIT

//! Platform-aware process launcher: builds a runnable [`Exec`] spec and
//! runs it in the foreground (blocking until exit or timeout) or the
//! background (returning a cancellable handle).

pub mod error;
pub mod path_stack;
pub mod shell_runner;

pub use error::ExecError;
pub use path_stack::PathStack;
pub use shell_runner::{DryRunShellRunner, ServiceContext, ServiceRunner, ShellRunner, StatusSink};

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Child;

/// A line-delivery sink: invoked once per line of output, on the
/// caller's task, not the child process's.
pub type LineSink = Arc<dyn Fn(&str) + Send + Sync>;

/// What to run: either an argv vector or a shell string run via `sh -c`.
enum Program {
    Argv(Vec<String>),
    Shell(String),
}

/// A runnable process specification, built incrementally.
pub struct Exec {
    program: Program,
    cwd: Option<PathBuf>,
    env: HashMap<String, String>,
    timeout: Option<Duration>,
    on_stdout: Option<LineSink>,
    on_stderr: Option<LineSink>,
}

impl Exec {
    pub fn argv(args: Vec<String>) -> Self {
        Self {
            program: Program::Argv(args),
            cwd: None,
            env: HashMap::new(),
            timeout: None,
            on_stdout: None,
            on_stderr: None,
        }
    }

    pub fn shell(command: impl Into<String>) -> Self {
        Self {
            program: Program::Shell(command.into()),
            cwd: None,
            env: HashMap::new(),
            timeout: None,
            on_stdout: None,
            on_stderr: None,
        }
    }

    pub fn cwd(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn timeout(mut self, duration: Duration) -> Self {
        self.timeout = Some(duration);
        self
    }

    pub fn on_stdout(mut self, sink: LineSink) -> Self {
        self.on_stdout = Some(sink);
        self
    }

    pub fn on_stderr(mut self, sink: LineSink) -> Self {
        self.on_stderr = Some(sink);
        self
    }

    fn validate(&self) -> Result<(), ExecError> {
        match &self.program {
            Program::Argv(args) if args.is_empty() => Err(ExecError::EmptySpec),
            Program::Shell(s) if s.trim().is_empty() => Err(ExecError::EmptySpec),
            _ => Ok(()),
        }
    }

    fn command_label(&self) -> String {
        match &self.program {
            Program::Argv(args) => args.first().cloned().unwrap_or_default(),
            Program::Shell(s) => s.clone(),
        }
    }

    /// `kill_on_drop` should be `true` for a foreground run (dropping the
    /// `Child` without an explicit kill sequence must not leak the OS
    /// process) and `false` for a backgrounded one, where
    /// [`BackgroundHandle`] dropping without `close()` is documented to
    /// leave the process running.
    fn build(&self, path_stack: &PathStack, kill_on_drop: bool) -> tokio::process::Command {
        let mut cmd = match &self.program {
            Program::Argv(args) => {
                let mut c = tokio::process::Command::new(&args[0]);
                c.args(&args[1..]);
                c
            }
            Program::Shell(s) => {
                let mut c = tokio::process::Command::new("sh");
                c.arg("-c").arg(s);
                c
            }
        };
        if let Some(cwd) = &self.cwd {
            cmd.current_dir(cwd);
        }
        cmd.env("PATH", path_stack.render());
        cmd.envs(&self.env);
        cmd.stdout(std::process::Stdio::piped());
        cmd.stderr(std::process::Stdio::piped());
        cmd.kill_on_drop(kill_on_drop);
        cmd
    }
}

/// How long a cancelled or background-closed process is given to exit on
/// its own `SIGTERM` before it's force-killed.
pub const DEFAULT_GRACE: Duration = Duration::from_secs(5);

/// A cooperative stop signal for a foreground [`Executor::run_cancellable`]
/// call. Triggering it makes the in-flight run send `SIGTERM` to the
/// child, wait up to a grace period, then `SIGKILL` it and return
/// [`ExecError::Cancelled`] — the same sequence [`BackgroundHandle::close`]
/// uses, reachable from a transition that preempts another before it
/// finishes instead of only from an explicit background-process stop.
#[derive(Clone, Default)]
pub struct Cancellation(Arc<tokio::sync::Notify>);

impl Cancellation {
    pub fn new() -> Self {
        Self(Arc::new(tokio::sync::Notify::new()))
    }

    /// Idempotent: calling this more than once, or with no run ever
    /// consuming it, has no effect.
    pub fn cancel(&self) {
        self.0.notify_one();
    }

    /// Resolves once [`cancel`](Self::cancel) has been called. Exposed so
    /// a hook implementation that does its own long-running work (not
    /// just a single foreground [`Executor::run_cancellable`] call) can
    /// notice preemption and stop cooperatively.
    pub async fn cancelled(&self) {
        self.0.notified().await;
    }
}

/// Outcome of a foreground run.
#[derive(Debug, Clone, Copy)]
pub struct RunOutcome {
    pub exit_code: i32,
    pub duration_ms: u64,
}

impl RunOutcome {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// A handle to a backgrounded process. Dropping it leaves the process
/// running; call [`BackgroundHandle::close`] to terminate it.
pub struct BackgroundHandle {
    child: Arc<tokio::sync::Mutex<Option<Child>>>,
    label: String,
}

impl BackgroundHandle {
    /// Send a graceful termination signal, then force-kill after a
    /// grace period if the process is still alive.
    pub async fn close(&self, grace: Duration) {
        let mut guard = self.child.lock().await;
        if let Some(child) = guard.as_mut() {
            terminate(child, &self.label, grace).await;
        }
        *guard = None;
    }
}

/// Sends `SIGTERM`, waits up to `grace` for natural exit, then `SIGKILL`s.
async fn terminate(child: &mut Child, label: &str, grace: Duration) {
    if let Some(pid) = child.id() {
        let _ = nix::sys::signal::kill(
            nix::unistd::Pid::from_raw(pid as i32),
            nix::sys::signal::Signal::SIGTERM,
        );
    }
    if tokio::time::timeout(grace, child.wait()).await.is_err() {
        tracing::warn!(command = %label, "grace period elapsed, force-killing");
        let _ = child.kill().await;
    }
}

/// Runs [`Exec`] specs, owning the shared PATH stack.
pub struct Executor {
    path_stack: PathStack,
}

impl Default for Executor {
    fn default() -> Self {
        Self::new()
    }
}

impl Executor {
    pub fn new() -> Self {
        Self { path_stack: PathStack::new() }
    }

    pub fn path_stack(&self) -> &PathStack {
        &self.path_stack
    }

    /// Run to completion, streaming stdout/stderr lines to the spec's
    /// sinks as they arrive. If `timeout` elapses first, the process is
    /// killed and [`ExecError::Timeout`] is returned. Equivalent to
    /// [`Executor::run_cancellable`] with a `Cancellation` nothing ever
    /// triggers.
    pub async fn run(&self, spec: Exec) -> Result<RunOutcome, ExecError> {
        self.run_impl(spec, None).await
    }

    /// Like [`Executor::run`], but `cancel` can stop the process early:
    /// `SIGTERM`, a grace period, then `SIGKILL`, settling into
    /// [`ExecError::Cancelled`] rather than leaving the `tokio::process::Child`
    /// to be silently dropped (and the OS process orphaned) by whatever
    /// aborts the calling task.
    pub async fn run_cancellable(
        &self,
        spec: Exec,
        cancel: Cancellation,
    ) -> Result<RunOutcome, ExecError> {
        self.run_impl(spec, Some(cancel)).await
    }

    async fn run_impl(&self, spec: Exec, cancel: Option<Cancellation>) -> Result<RunOutcome, ExecError> {
        spec.validate()?;
        let label = spec.command_label();
        let start = Instant::now();
        let timeout = spec.timeout;
        let mut cmd = spec.build(&self.path_stack, true);

        let mut child = cmd.spawn().map_err(|source| ExecError::SpawnFailed {
            command: label.clone(),
            source,
        })?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let stdout_task = spawn_line_relay(stdout, spec.on_stdout.clone());
        let stderr_task = spawn_line_relay(stderr, spec.on_stderr.clone());

        let sleep = async {
            match timeout {
                Some(duration) => tokio::time::sleep(duration).await,
                None => std::future::pending::<()>().await,
            }
        };
        tokio::pin!(sleep);
        let cancelled = async {
            match &cancel {
                Some(c) => c.cancelled().await,
                None => std::future::pending::<()>().await,
            }
        };
        tokio::pin!(cancelled);

        let status = tokio::select! {
            result = child.wait() => result.map_err(|source| ExecError::SpawnFailed {
                command: label.clone(),
                source,
            })?,
            _ = &mut sleep => {
                let _ = child.kill().await;
                return Err(ExecError::Timeout {
                    command: label,
                    timeout_ms: timeout.unwrap_or_default().as_millis() as u64,
                });
            }
            _ = &mut cancelled => {
                terminate(&mut child, &label, DEFAULT_GRACE).await;
                return Err(ExecError::Cancelled { command: label });
            }
        };

        if let Some(task) = stdout_task {
            let _ = task.await;
        }
        if let Some(task) = stderr_task {
            let _ = task.await;
        }

        Ok(RunOutcome {
            exit_code: status.code().unwrap_or(-1),
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }

    /// Spawn and return immediately. `on_exit` runs on completion with
    /// the exit code.
    pub fn run_background(
        &self,
        spec: Exec,
        on_exit: impl FnOnce(i32) + Send + 'static,
    ) -> Result<BackgroundHandle, ExecError> {
        spec.validate()?;
        let label = spec.command_label();
        let mut cmd = spec.build(&self.path_stack, false);
        let mut child = cmd.spawn().map_err(|source| ExecError::SpawnFailed {
            command: label.clone(),
            source,
        })?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        spawn_line_relay(stdout, spec.on_stdout.clone());
        spawn_line_relay(stderr, spec.on_stderr.clone());

        let shared = Arc::new(tokio::sync::Mutex::new(Some(child)));
        let waiter = shared.clone();
        tokio::spawn(async move {
            let status = {
                let mut guard = waiter.lock().await;
                match guard.as_mut() {
                    Some(child) => child.wait().await.ok(),
                    None => None,
                }
            };
            if let Some(status) = status {
                on_exit(status.code().unwrap_or(-1));
            }
        });

        Ok(BackgroundHandle { child: shared, label })
    }

    /// Resolve `name` against the configured `PATH`, the same way a
    /// shell would, without actually spawning anything.
    pub fn which(&self, name: &str) -> Option<PathBuf> {
        if name.contains('/') {
            let p = PathBuf::from(name);
            return if is_executable(&p) { Some(p) } else { None };
        }
        for dir in self.path_stack.render().split(':') {
            if dir.is_empty() {
                continue;
            }
            let candidate = PathBuf::from(dir).join(name);
            if is_executable(&candidate) {
                return Some(candidate);
            }
        }
        None
    }

    /// Synchronous convenience: run `command` via the shell and return
    /// captured stdout, or an empty string on any failure.
    pub fn sh(&self, command: &str) -> String {
        std::process::Command::new("sh")
            .arg("-c")
            .arg(command)
            .env("PATH", self.path_stack.render())
            .output()
            .ok()
            .filter(|o| o.status.success())
            .map(|o| String::from_utf8_lossy(&o.stdout).trim_end().to_string())
            .unwrap_or_default()
    }
}

fn is_executable(path: &std::path::Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

fn spawn_line_relay<R>(
    reader: Option<R>,
    sink: Option<LineSink>,
) -> Option<tokio::task::JoinHandle<()>>
where
    R: tokio::io::AsyncRead + Unpin + Send + 'static,
{
    let reader = reader?;
    let sink = sink?;
    Some(tokio::spawn(async move {
        let mut lines = BufReader::new(reader).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            sink(&line);
        }
    }))
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
