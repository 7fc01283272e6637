// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Backup of conflicting workspace files.
//!
//! A workspace that predates the installer usually already contains a few of
//! the files the configuration repository tracks, e.g., a hand-written
//! `.zshrc`. Checking out over them would destroy user data, so every
//! conflicting path is moved, not copied, into a backup directory before the
//! real checkout runs. The backup directory sits at the top of the workspace
//! with a unix-timestamp suffix, and conflicting files keep their relative
//! structure inside it, so restoring one by hand is a single move back.
//!
//! Nothing here deletes data. The move is still irreversible as far as the
//! installer is concerned, because no later step moves files back on
//! failure.

use std::{
    fs,
    io,
    path::{Path, PathBuf},
};
use tracing::{debug, info};

/// Prefix of every backup directory the installer creates.
pub const BACKUP_DIR_PREFIX: &str = "sysgit_existing_config_backup";

/// Name of the backup directory for a given unix timestamp.
pub fn backup_dir_name(timestamp: u64) -> String {
    format!("{BACKUP_DIR_PREFIX}.{timestamp}")
}

/// Move conflicting workspace files into the backup directory.
///
/// Each path in `conflicts` is relative to the workspace. Its parent
/// directory structure is recreated under `backup_dir` before the file moves
/// over, so relative paths survive the trip. The backup directory itself
/// only comes into existence when there is at least one file to move.
///
/// Returns the moved paths, still relative, in the order they were given.
///
/// # Errors
///
/// - Return [`BackupError::CreateDir`] if a parent directory under the
///   backup directory cannot be created.
/// - Return [`BackupError::Move`] if a conflicting file cannot be moved.
pub fn move_conflicts(
    workspace: impl AsRef<Path>,
    backup_dir: impl AsRef<Path>,
    conflicts: &[PathBuf],
) -> Result<Vec<PathBuf>> {
    let workspace = workspace.as_ref();
    let backup_dir = backup_dir.as_ref();
    let mut moved = Vec::with_capacity(conflicts.len());

    for relative in conflicts {
        let source = workspace.join(relative);
        let target = backup_dir.join(relative);

        if let Some(parent) = target.parent() {
            mkdirp::mkdirp(parent).map_err(|err| BackupError::CreateDir {
                source: err,
                path: parent.to_path_buf(),
            })?;
        }

        debug!("move {} -> {}", source.display(), target.display());
        fs::rename(&source, &target).map_err(|err| BackupError::Move {
            source: err,
            path: source.clone(),
        })?;
        moved.push(relative.clone());
    }

    if !moved.is_empty() {
        info!(
            "backed up {} conflicting files into {}",
            moved.len(),
            backup_dir.display()
        );
    }

    Ok(moved)
}

/// Backup error types.
#[derive(Debug, thiserror::Error)]
pub enum BackupError {
    /// Parent directory inside the backup directory cannot be created.
    #[error("cannot create backup directory {path:?}")]
    CreateDir { source: io::Error, path: PathBuf },

    /// Conflicting file cannot be moved into the backup directory.
    #[error("cannot move {path:?} into backup directory")]
    Move { source: io::Error, path: PathBuf },
}

/// Friendly result alias :3
type Result<T, E = BackupError> = std::result::Result<T, E>;
