// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Installer configuration resolution.
//!
//! The installer pulls its settings from three sources with a fixed
//! precedence: explicit command-line flags beat environment variables, which
//! beat built-in defaults. Resolution happens exactly once at startup, and
//! the resulting [`InstallConfig`] stays immutable for the rest of the run.
//! Every later step receives the configuration explicitly, so no ambient
//! state is consulted after this module finishes its job.
//!
//! # Environment Variables
//!
//! | Variable                    | Overrides                               |
//! |-----------------------------|-----------------------------------------|
//! | `SYSGIT_CONFIG_REPO`        | URL of the configuration repository     |
//! | `SYSGIT_CONFIG_REPO_BRANCH` | Branch to checkout                      |
//! | `SYSGIT_HOME`               | Git directory of the bare repository    |
//! | `SYSGIT_WORKSPACE`          | Work tree alias                         |
//! | `SYSGIT_EXECUTABLE_PATH`    | Directory the wrapper is installed to   |
//! | `SYSGIT_BOOTSTRAP_ARGS`     | Arguments forwarded to bootstrap script |
//! | `NONINTERACTIVE`            | Disable all prompting                   |
//! | `INTERACTIVE`               | Force prompting                         |
//!
//! Setting both `NONINTERACTIVE` and `INTERACTIVE` is rejected as an input
//! error. Path-valued settings undergo shell expansion, so tilde prefixes
//! and `$VAR` references behave the same way they would in a shell.

use crate::path::{default_executable_dir, default_repo_dir, home_dir};

use std::{
    env,
    fmt::{Display, Formatter, Result as FmtResult},
    path::PathBuf,
    str::FromStr,
};
use tracing::debug;

/// Environment variable naming the configuration repository URL.
pub const ENV_CONFIG_REPO: &str = "SYSGIT_CONFIG_REPO";

/// Environment variable naming the branch to checkout.
pub const ENV_CONFIG_REPO_BRANCH: &str = "SYSGIT_CONFIG_REPO_BRANCH";

/// Environment variable overriding the bare repository's Git directory.
pub const ENV_HOME: &str = "SYSGIT_HOME";

/// Environment variable overriding the work tree alias.
pub const ENV_WORKSPACE: &str = "SYSGIT_WORKSPACE";

/// Environment variable overriding the wrapper installation directory.
pub const ENV_EXECUTABLE_PATH: &str = "SYSGIT_EXECUTABLE_PATH";

/// Environment variable holding whitespace-separated bootstrap arguments.
pub const ENV_BOOTSTRAP_ARGS: &str = "SYSGIT_BOOTSTRAP_ARGS";

/// Environment variable disabling all prompting.
pub const ENV_NONINTERACTIVE: &str = "NONINTERACTIVE";

/// Environment variable forcing prompting.
pub const ENV_INTERACTIVE: &str = "INTERACTIVE";

/// Branch used when neither flag nor environment selects one.
pub const DEFAULT_BRANCH: &str = "master";

/// Resolved installer settings.
///
/// Built once by [`InstallConfig::resolve`], immutable afterward. Every
/// installation step receives this structure by reference instead of
/// consulting the process environment on its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallConfig {
    /// URL of the configuration repository to clone.
    pub repo_url: String,

    /// Branch of the configuration repository to checkout.
    pub branch: String,

    /// Git directory of the bare repository.
    pub home: PathBuf,

    /// Work tree alias the tracked files deploy to.
    pub workspace: PathBuf,

    /// Directory the `sysgit` wrapper script is installed to.
    pub executable_dir: PathBuf,

    /// Whether confirmation and URL prompts are allowed.
    pub interactive: bool,

    /// Which bootstrap script location to honor.
    pub convention: BootstrapConvention,

    /// Residual arguments forwarded to the bootstrap script.
    pub bootstrap_args: Vec<String>,
}

/// Settings collected from the command line before resolution.
///
/// Unset fields fall through to the matching environment variable, then to
/// the built-in default.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub repo_url: Option<String>,
    pub branch: Option<String>,
    pub home: Option<PathBuf>,
    pub workspace: Option<PathBuf>,
    pub executable_dir: Option<PathBuf>,
    pub non_interactive: bool,
    pub convention: Option<BootstrapConvention>,
    pub bootstrap_args: Vec<String>,
}

impl InstallConfig {
    /// Resolve installer settings from flags, environment, and defaults.
    ///
    /// The `ask_url` callback runs at most once: only when no flag or
    /// environment variable names the configuration repository and the run
    /// is interactive. Non-interactive runs never invoke it.
    ///
    /// # Errors
    ///
    /// - Return [`ConfigError::ConflictingInteractivity`] if both
    ///   `NONINTERACTIVE` and `INTERACTIVE` are set.
    /// - Return [`ConfigError::MissingRepoUrl`] if no repository URL could
    ///   be determined from any source.
    /// - Return [`ConfigError::ShellExpansion`] if a path setting fails
    ///   shell expansion.
    /// - Return [`ConfigError::NoWayHome`] if a default path needs the home
    ///   directory and it cannot be determined.
    pub fn resolve(
        overrides: Overrides,
        ask_url: impl FnOnce() -> Option<String>,
    ) -> Result<Self> {
        let interactive = resolve_interactivity(overrides.non_interactive)?;

        let repo_url = overrides
            .repo_url
            .or_else(|| env_setting(ENV_CONFIG_REPO))
            .or_else(|| {
                if interactive {
                    debug!("no repository url from flags or environment, prompting");
                    ask_url().filter(|url| !url.trim().is_empty())
                } else {
                    None
                }
            })
            .ok_or(ConfigError::MissingRepoUrl)?;

        let branch = overrides
            .branch
            .or_else(|| env_setting(ENV_CONFIG_REPO_BRANCH))
            .unwrap_or_else(|| DEFAULT_BRANCH.into());

        let home = match path_setting(overrides.home, ENV_HOME)? {
            Some(path) => path,
            None => default_repo_dir()?,
        };

        let workspace = match path_setting(overrides.workspace, ENV_WORKSPACE)? {
            Some(path) => path,
            None => home_dir()?,
        };

        let executable_dir = match path_setting(overrides.executable_dir, ENV_EXECUTABLE_PATH)? {
            Some(path) => path,
            None => default_executable_dir()?,
        };

        // INVARIANT: Arguments given after "--" beat SYSGIT_BOOTSTRAP_ARGS.
        let bootstrap_args = if overrides.bootstrap_args.is_empty() {
            env_setting(ENV_BOOTSTRAP_ARGS)
                .map(|args| args.split_whitespace().map(String::from).collect())
                .unwrap_or_default()
        } else {
            overrides.bootstrap_args
        };

        Ok(Self {
            repo_url,
            branch,
            home,
            workspace,
            executable_dir,
            interactive,
            convention: overrides.convention.unwrap_or_default(),
            bootstrap_args,
        })
    }

    /// Full path the wrapper script is installed to.
    pub fn wrapper_path(&self) -> PathBuf {
        self.executable_dir.join("sysgit")
    }

    /// Full path of the bootstrap script under the selected convention.
    pub fn bootstrap_path(&self) -> PathBuf {
        self.convention.script_path(&self.workspace)
    }
}

/// Recognized bootstrap script locations.
///
/// Configuration repositories in the wild follow one of two conventions for
/// their bootstrap entry point, so the installer treats the choice as an
/// explicit setting instead of silently picking one.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapConvention {
    /// `<workspace>/.config/sysgit/bootstrap.sh`, residual arguments
    /// forwarded.
    #[default]
    Xdg,

    /// `<workspace>/.sysgit-bootstrap`, no arguments forwarded.
    RepoRoot,
}

impl BootstrapConvention {
    /// Where the bootstrap script is expected inside the work tree alias.
    pub fn script_path(&self, workspace: impl Into<PathBuf>) -> PathBuf {
        let workspace = workspace.into();
        match self {
            Self::Xdg => workspace.join(".config").join("sysgit").join("bootstrap.sh"),
            Self::RepoRoot => workspace.join(".sysgit-bootstrap"),
        }
    }

    /// Whether residual arguments are forwarded to the bootstrap script.
    pub fn forwards_args(&self) -> bool {
        matches!(self, Self::Xdg)
    }
}

impl FromStr for BootstrapConvention {
    type Err = ConfigError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            "xdg" => Ok(Self::Xdg),
            "root" => Ok(Self::RepoRoot),
            unknown => Err(ConfigError::UnknownConvention(unknown.into())),
        }
    }
}

impl Display for BootstrapConvention {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Xdg => fmt.write_str("xdg"),
            Self::RepoRoot => fmt.write_str("root"),
        }
    }
}

/// Read environment variable, treating empty values as unset.
fn env_setting(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.is_empty())
}

/// Resolve path setting with shell expansion applied to both sources.
fn path_setting(flag: Option<PathBuf>, key: &str) -> Result<Option<PathBuf>> {
    let raw = match flag {
        Some(path) => Some(path.to_string_lossy().into_owned()),
        None => env_setting(key),
    };

    match raw {
        Some(value) => {
            let expanded = shellexpand::full(value.as_str())
                .map_err(ConfigError::ShellExpansion)?
                .into_owned();
            Ok(Some(PathBuf::from(expanded)))
        }
        None => Ok(None),
    }
}

fn resolve_interactivity(non_interactive_flag: bool) -> Result<bool> {
    let forced_off = env_setting(ENV_NONINTERACTIVE).is_some();
    let forced_on = env_setting(ENV_INTERACTIVE).is_some();

    if forced_off && forced_on {
        return Err(ConfigError::ConflictingInteractivity);
    }

    if non_interactive_flag || forced_off {
        return Ok(false);
    }

    Ok(true)
}

/// Configuration resolution error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// No repository URL from flags, environment, or prompt.
    #[error("no configuration repository url given, set --config-repo or SYSGIT_CONFIG_REPO")]
    MissingRepoUrl,

    /// Both NONINTERACTIVE and INTERACTIVE are set.
    #[error("NONINTERACTIVE and INTERACTIVE are mutually exclusive")]
    ConflictingInteractivity,

    /// Bootstrap convention name is not recognized.
    #[error("unknown bootstrap convention {0:?}, expected \"xdg\" or \"root\"")]
    UnknownConvention(String),

    /// Failed to perform shell expansion on a path setting.
    #[error(transparent)]
    ShellExpansion(#[from] shellexpand::LookupError<env::VarError>),

    /// Default paths need a home directory that cannot be determined.
    #[error(transparent)]
    NoWayHome(#[from] crate::path::NoWayHome),
}

/// Friendly result alias :3
type Result<T, E = ConfigError> = std::result::Result<T, E>;
