// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Configure a bare Git repository as a dotfiles manager.
//!
//! Sysgit manages dotfiles through a single __bare-alias__ repository.
//! Although bare repositories lack a working tree by definition, Git allows
//! users to force a working tree by designating a directory as an alias for a
//! working tree using the "--work-tree" argument. This functionality enables
//! us to define a bare repository where the Git directory and the alias
//! working tree are kept separate. This unique feature allows us to treat an
//! entire directory, typically the user's home directory, as a Git repository
//! without needing to initialize it as one.
//!
//! The installer clones the user's configuration repository as a bare
//! repository, reconciles pre-existing workspace files by moving checkout
//! conflicts into a timestamped backup directory, checks the tracked files
//! out into the workspace, and installs a small `sysgit` wrapper script that
//! re-invokes Git with the resolved "--git-dir" and "--work-tree" arguments.
//! An optional repository-supplied bootstrap script runs last.
//!
//! # See Also
//!
//! 1. [ArchWiki - dotfiles](https://wiki.archlinux.org/title/Dotfiles#Tracking_dotfiles_directly_with_Git)

pub mod config;
pub mod confirm;
pub mod install;
pub mod path;
pub mod repo;

pub use config::{BootstrapConvention, InstallConfig};
pub use confirm::{AssumeYes, ConfirmPort, TerminalPort};
pub use install::{InstallReport, Installer};
pub use repo::SysRepo;
