// SPDX-License-Identifier: MIT

//! Binary entry point: parses CLI flags, boots the supervisor, then
//! waits for a termination signal before shutting everything down.

mod env;

use anyhow::{Context as _, Result};
use clap::Parser;
use kestrel_config::yaml::subtree_to_any;
use kestrel_daemon::{BootOptions, Supervisor};
use std::path::PathBuf;

/// Runs the declared services under the given root until a termination
/// signal arrives.
///
/// Exit code `126` is reserved by the original tool for an unrecoverable
/// configuration error, but that path is not wired up here either — a
/// boot failure just propagates as a normal non-zero exit.
#[derive(Parser, Debug)]
#[command(name = "kestrel", version, about)]
struct Cli {
    /// Run the install phase only; skip starting services.
    #[arg(long)]
    install: bool,

    /// Use the dry-run ShellRunner: print commands instead of running them.
    #[arg(long, conflicts_with = "forreal")]
    dryrun: bool,

    /// Use the real ShellRunner. The default; only useful to override a
    /// conflicting environment-level default.
    #[arg(long)]
    forreal: bool,

    /// Seed the configuration tree from this file.
    #[arg(short = 'i', long = "config")]
    config: Option<PathBuf>,

    /// Write logs to this file in addition to stderr.
    #[arg(short = 'l', long = "log")]
    log: Option<PathBuf>,

    /// Root directory for the persisted layout (config/bin/work).
    #[arg(short = 'r', long = "root")]
    root: Option<PathBuf>,

    /// Override the main service name (default `main`).
    #[arg(long = "main")]
    main_name: Option<String>,

    /// Dump the resolved configuration tree to stdout and exit without
    /// starting anything.
    #[arg(long)]
    print: bool,
}

fn init_logging(log_path: Option<&PathBuf>) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match log_path {
        Some(path) => {
            let dir = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or_else(|| std::path::Path::new("."));
            let file_name = path.file_name().map(|n| n.to_os_string()).unwrap_or_else(|| "kestrel.log".into());
            let appender = tracing_appender::rolling::never(dir, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            fmt().with_env_filter(filter).with_writer(writer).with_ansi(false).init();
            Some(guard)
        }
        None => {
            fmt().with_env_filter(filter).init();
            None
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _log_guard = init_logging(cli.log.as_ref());

    let options = BootOptions {
        root: cli.root.unwrap_or_else(env::default_root),
        config_source: cli.config,
        main_name: cli.main_name,
        install_only: cli.install,
        dry_run: cli.dryrun && !cli.forreal,
    };

    let supervisor = Supervisor::boot(options).await.context("supervisor boot failed")?;

    if cli.print {
        let doc = subtree_to_any(&supervisor.tree.root()).context("failed to serialize configuration tree")?;
        let rendered = serde_yaml::to_string(&doc).context("failed to render configuration as YAML")?;
        println!("{rendered}");
        return Ok(());
    }

    if !cli.install {
        kestrel_daemon::signal::run_until_signal(supervisor).await;
    }

    Ok(())
}
