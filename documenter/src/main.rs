//! Persist `createFile` port messages emitted by an application.
//!
//! The application is either a program whose stdout carries port messages as
//! JSON lines, or the same lines piped into stdin. Every `createFile` payload
//! `{name, content}` is written to `<base_dir><name>` (default `./src/`).

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use documenter::exit_codes;
use documenter::io::config::{DEFAULT_CONFIG_PATH, ShimConfig, load_config, write_config};
use documenter::io::host::{LineApplication, ProcessApplication};
use documenter::io::sink::SinkReport;
use documenter::logging;
use documenter::shim::run_shim;

#[derive(Parser)]
#[command(
    name = "documenter",
    version,
    about = "Persist createFile port messages emitted by an application"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create `documenter.toml` with default settings if missing.
    Init {
        /// Overwrite an existing file.
        #[arg(short, long)]
        force: bool,

        #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
        config: PathBuf,
    },
    /// Run the application and write every createFile message it emits.
    Run {
        #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
        config: PathBuf,

        /// Directory names are appended to (overrides `base_dir`).
        #[arg(long)]
        base_dir: Option<PathBuf>,

        /// Reject names that climb above the base directory.
        #[arg(long)]
        confine: bool,

        /// Application command. Port messages are read from stdin when omitted.
        #[arg(last = true)]
        command: Vec<String>,
    },
}

#[tokio::main]
async fn main() {
    logging::init();
    if let Err(err) = run().await {
        eprintln!("{:#}", err);
        std::process::exit(exit_codes::for_error(&err));
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::Init { force, config } => cmd_init(&config, force),
        Command::Run {
            config,
            base_dir,
            confine,
            command,
        } => {
            let cfg = resolve_config(&config, base_dir, confine, command)?;
            let report = cmd_run(&cfg).await?;
            info!(written = report.written, "done");
            Ok(())
        }
    }
}

fn cmd_init(path: &Path, force: bool) -> Result<()> {
    if !force && path.exists() {
        info!(path = %path.display(), "config exists, leaving it untouched");
        return Ok(());
    }
    write_config(path, &ShimConfig::default())
}

/// Load the config file and apply command-line overrides.
fn resolve_config(
    path: &Path,
    base_dir: Option<PathBuf>,
    confine: bool,
    command: Vec<String>,
) -> Result<ShimConfig> {
    let mut cfg = load_config(path)?;
    if let Some(base_dir) = base_dir {
        cfg.base_dir = base_dir;
    }
    if confine {
        cfg.confine_to_base_dir = true;
    }
    if !command.is_empty() {
        cfg.app.command = command;
    }
    cfg.validate().context("invalid command-line overrides")?;
    Ok(cfg)
}

async fn cmd_run(cfg: &ShimConfig) -> Result<SinkReport> {
    if cfg.app.command.is_empty() {
        return run_shim(LineApplication::stdin(), cfg).await;
    }
    let app = ProcessApplication::spawn(&cfg.app.command)?;
    run_shim(app, cfg).await
}
