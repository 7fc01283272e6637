// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Installation driver.
//!
//! One linear flow, no independent components: validate the environment,
//! clone (or reopen) the configuration repository as a bare repository,
//! reconcile workspace conflicts through a timestamped backup, checkout,
//! install the `sysgit` wrapper, and run the repository's bootstrap script
//! if it ships one. Each destructive step goes through the
//! describe/confirm/execute primitive from [`confirm`](crate::confirm);
//! declining any of them aborts the run.
//!
//! There is no retry logic and no partial rollback. If a later step fails
//! after an earlier destructive step succeeded, the completed side effects
//! stay in place, e.g., backup moves are not undone.

pub mod backup;
pub mod bootstrap;
pub mod wrapper;

use crate::{
    config::InstallConfig,
    confirm::{gated, ConfirmError, ConfirmPort},
    repo::SysRepo,
};

use std::{path::PathBuf, process::Command, time};
use tracing::{debug, info, warn};

/// What a finished installation run did.
///
/// Returned by [`Installer::run`] so callers and tests can observe side
/// effects without rescanning the filesystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallReport {
    /// Whether a fresh clone happened, as opposed to reopening one.
    pub cloned: bool,

    /// Backup directory, present only when conflicts were moved.
    pub backup_dir: Option<PathBuf>,

    /// Conflicting paths moved into the backup directory, workspace-relative.
    pub moved: Vec<PathBuf>,

    /// Where the wrapper script lives.
    pub wrapper_path: PathBuf,

    /// Whether the wrapper was (re)written this run.
    pub wrapper_written: bool,

    /// Whether a bootstrap script was found and executed.
    pub bootstrap_ran: bool,
}

/// The installer itself.
///
/// Borrows an immutable [`InstallConfig`] and a confirmation port; holds no
/// state of its own between runs.
pub struct Installer<'a> {
    config: &'a InstallConfig,
    port: &'a dyn ConfirmPort,
}

impl<'a> Installer<'a> {
    /// Construct new installer.
    pub fn new(config: &'a InstallConfig, port: &'a dyn ConfirmPort) -> Self {
        Self { config, port }
    }

    /// Run the full installation flow.
    ///
    /// # Errors
    ///
    /// - Return [`InstallError::UnsupportedOs`], [`InstallError::GitNotFound`],
    ///   or [`InstallError::ShellNotFound`] if the environment fails validation.
    /// - Return [`InstallError::Confirm`] if any gate is declined or a
    ///   prompt fails.
    /// - Return the wrapped step error if cloning, checkout, backup moves,
    ///   wrapper installation, or bootstrap fail.
    pub fn run(&self) -> Result<InstallReport> {
        preflight()?;

        let (repo, cloned) = self.obtain_repo()?;

        mkdirp::mkdirp(&self.config.workspace).map_err(|err| InstallError::Workspace {
            source: err,
            path: self.config.workspace.clone(),
        })?;
        let (backup_dir, moved) = self.reconcile_conflicts(&repo)?;

        repo.checkout(&self.config.workspace)?;
        repo.hide_untracked()?;

        let (wrapper_path, wrapper_written) = self.install_wrapper()?;
        let bootstrap_ran = self.run_bootstrap()?;

        info!("installation complete");
        Ok(InstallReport {
            cloned,
            backup_dir,
            moved,
            wrapper_path,
            wrapper_written,
            bootstrap_ran,
        })
    }

    fn obtain_repo(&self) -> Result<(SysRepo, bool)> {
        let config = self.config;

        if SysRepo::exists(&config.home) {
            info!(
                "repository already cloned at {}, reusing it",
                config.home.display()
            );
            return Ok((SysRepo::try_open(&config.home)?, false));
        }

        let operation = format!(
            "git clone --bare -b {} {} {}",
            config.branch,
            config.repo_url,
            config.home.display(),
        );
        let repo = gated::<_, InstallError, _>(
            self.port,
            "clone configuration repository as a bare repository",
            &operation,
            || {
                Ok(SysRepo::try_clone(
                    &config.repo_url,
                    &config.branch,
                    &config.home,
                    config.interactive,
                )?)
            },
        )?;

        Ok((repo, true))
    }

    fn reconcile_conflicts(&self, repo: &SysRepo) -> Result<(Option<PathBuf>, Vec<PathBuf>)> {
        let config = self.config;
        let conflicts = repo.conflicting_paths(&config.workspace)?;
        if conflicts.is_empty() {
            debug!("no conflicting workspace files, skipping backup");
            return Ok((None, Vec::new()));
        }

        warn!(
            "{} workspace files would be overwritten by checkout",
            conflicts.len()
        );
        for path in &conflicts {
            warn!("  {}", path.display());
        }

        let backup_dir = config
            .workspace
            .join(backup::backup_dir_name(unix_timestamp()));
        let operation = format!(
            "mv {} conflicting files into {}",
            conflicts.len(),
            backup_dir.display(),
        );
        let moved = gated::<_, InstallError, _>(
            self.port,
            "move pre-existing workspace files into a backup directory",
            &operation,
            || Ok(backup::move_conflicts(&config.workspace, &backup_dir, &conflicts)?),
        )?;

        Ok((Some(backup_dir), moved))
    }

    fn install_wrapper(&self) -> Result<(PathBuf, bool)> {
        let config = self.config;
        let path = config.wrapper_path();
        let contents = wrapper::render(&config.home, &config.workspace);

        if wrapper::already_installed(&path, &contents) {
            info!("wrapper {} already up to date", path.display());
            return Ok((path, false));
        }

        let intent = if path.exists() {
            "overwrite existing sysgit wrapper script"
        } else {
            "install sysgit wrapper script"
        };
        let operation = format!("write {} and mark it executable", path.display());
        gated::<_, InstallError, _>(self.port, intent, &operation, || {
            Ok(wrapper::install(&path, &contents)?)
        })?;

        Ok((path, true))
    }

    fn run_bootstrap(&self) -> Result<bool> {
        let config = self.config;
        let script = config.bootstrap_path();
        if !script.exists() {
            debug!("no bootstrap script at {}", script.display());
            return Ok(false);
        }

        let forwarded: &[String] = if config.convention.forwards_args() {
            &config.bootstrap_args
        } else {
            &[]
        };
        let operation = format!(
            "sh {} {}",
            script.display(),
            forwarded.join(" "),
        );
        gated::<_, InstallError, _>(
            self.port,
            "run repository-supplied bootstrap script",
            operation.trim_end(),
            || Ok(bootstrap::run(&script, forwarded)?),
        )?;

        Ok(true)
    }
}

/// Validate environment prerequisites before touching anything.
///
/// The installer itself talks to Git through libgit2, but the installed
/// wrapper and bootstrap scripts need a system `git` binary and a unix
/// shell, so both are required up front.
fn preflight() -> Result<()> {
    if !cfg!(unix) {
        return Err(InstallError::UnsupportedOs);
    }

    if !binary_works("git", &["--version"]) {
        return Err(InstallError::GitNotFound);
    }
    if !binary_works("sh", &["-c", "exit 0"]) {
        return Err(InstallError::ShellNotFound);
    }

    Ok(())
}

fn binary_works(binary: &str, args: &[&str]) -> bool {
    Command::new(binary)
        .args(args)
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}

fn unix_timestamp() -> u64 {
    time::SystemTime::now()
        .duration_since(time::UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or_default()
}

/// Installation error types.
#[derive(Debug, thiserror::Error)]
pub enum InstallError {
    /// Only unix-like systems are supported.
    #[error("unsupported operating system, sysgit requires a unix-like system")]
    UnsupportedOs,

    /// No usable git binary on the executable search path.
    #[error("cannot find git binary on PATH")]
    GitNotFound,

    /// No usable unix shell on the executable search path.
    #[error("cannot find sh binary on PATH")]
    ShellNotFound,

    /// Workspace directory cannot be created.
    #[error("cannot create workspace directory {path:?}")]
    Workspace {
        source: std::io::Error,
        path: PathBuf,
    },

    /// A gate was declined or prompting failed.
    #[error(transparent)]
    Confirm(#[from] ConfirmError),

    /// Repository operations fail.
    #[error(transparent)]
    Repo(#[from] crate::repo::RepoError),

    /// Backup moves fail.
    #[error(transparent)]
    Backup(#[from] backup::BackupError),

    /// Wrapper installation fails.
    #[error(transparent)]
    Wrapper(#[from] wrapper::WrapperError),

    /// Bootstrap script fails.
    #[error(transparent)]
    Bootstrap(#[from] bootstrap::BootstrapError),
}

/// Friendly result alias :3
type Result<T, E = InstallError> = std::result::Result<T, E>;
