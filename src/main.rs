// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use sysgit_install::{
    config::{InstallConfig, Overrides},
    confirm::{AssumeYes, ConfirmPort, TerminalPort},
    install::Installer,
    BootstrapConvention,
};

use anyhow::Result;
use clap::Parser;
use std::{path::PathBuf, process::exit};
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Debug, Clone, Parser)]
#[command(
    about,
    override_usage = "sysgit-install [options] [-- <bootstrap-args>...]",
    version
)]
struct Cli {
    /// Show debug output.
    #[arg(short, long)]
    pub verbose: bool,

    /// Never prompt; every confirmation proceeds automatically.
    #[arg(long)]
    pub non_interactive: bool,

    /// URL of the configuration repository to clone.
    #[arg(long, value_name = "url")]
    pub config_repo: Option<String>,

    /// Branch of the configuration repository to checkout.
    #[arg(long, value_name = "branch")]
    pub config_repo_branch: Option<String>,

    /// Directory the bare repository is cloned to.
    #[arg(long, value_name = "path")]
    pub home: Option<PathBuf>,

    /// Directory the tracked files deploy to.
    #[arg(long, value_name = "path")]
    pub workspace: Option<PathBuf>,

    /// Directory the sysgit wrapper script is installed to.
    #[arg(long, value_name = "path")]
    pub executable_path: Option<PathBuf>,

    /// Bootstrap script convention to honor ("xdg" or "root").
    #[arg(long, value_name = "convention")]
    pub bootstrap_convention: Option<BootstrapConvention>,

    /// Arguments after "--" are forwarded to the bootstrap script.
    #[arg(last = true, value_name = "bootstrap_args")]
    pub bootstrap_args: Vec<String>,
}

impl From<Cli> for Overrides {
    fn from(cli: Cli) -> Self {
        Self {
            repo_url: cli.config_repo,
            branch: cli.config_repo_branch,
            home: cli.home,
            workspace: cli.workspace,
            executable_dir: cli.executable_path,
            non_interactive: cli.non_interactive,
            convention: cli.bootstrap_convention,
            bootstrap_args: cli.bootstrap_args,
        }
    }
}

fn main() {
    // Abort paths exit 1, including unknown flags; help and version exit 0.
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(error) => {
            let code = if error.use_stderr() { 1 } else { 0 };
            let _ = error.print();
            exit(code);
        }
    };

    let layer = fmt::layer()
        .compact()
        .with_target(false)
        .without_time();
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(if cli.verbose { "debug" } else { "info" }))
        .unwrap();
    tracing_subscriber::registry()
        .with(layer)
        .with(filter)
        .init();

    if let Err(error) = run(cli) {
        error!("{error:?}");
        exit(1);
    }

    exit(0)
}

fn run(cli: Cli) -> Result<()> {
    let config = InstallConfig::resolve(cli.into(), || {
        TerminalPort.ask_line("url of configuration repository").ok()
    })?;

    let terminal = TerminalPort;
    let yes = AssumeYes;
    let port: &dyn ConfirmPort = if config.interactive { &terminal } else { &yes };

    let report = Installer::new(&config, port).run()?;

    if let Some(backup_dir) = &report.backup_dir {
        info!(
            "{} pre-existing files moved into {}",
            report.moved.len(),
            backup_dir.display()
        );
    }
    info!("manage your dotfiles with {}", report.wrapper_path.display());

    Ok(())
}
