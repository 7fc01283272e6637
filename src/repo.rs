// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Bare configuration repository handling.
//!
//! The configuration repository is a __bare-alias__ repository: a bare clone
//! whose working tree is an alias for the user's workspace, supplied through
//! "--work-tree" at every Git invocation instead of living next to the Git
//! directory. This module owns every libgit2 interaction the installer
//! needs: the bare clone itself, checkout into the workspace, and the
//! detection of workspace files a checkout would overwrite.
//!
//! # Conflict Detection
//!
//! The classic shell recipe for this kind of installer greps the indented
//! file list out of "git checkout" stderr, which breaks the moment the
//! diagnostic format shifts. We instead walk the tree of HEAD and compare
//! each tracked blob against the bytes currently sitting at the matching
//! workspace path, so the list of endangered paths comes from structured
//! repository data rather than text scraping. A libgit2 checkout dry-run is
//! no use here: after a bare clone the checkout baseline already matches
//! HEAD, so its plan comes up empty and pre-existing workspace files never
//! surface.

use auth_git2::{GitAuthenticator, Prompter};
use git2::{
    build::{CheckoutBuilder, RepoBuilder},
    Config, FetchOptions, ObjectType, Oid, RemoteCallbacks, Repository,
};
use indicatif::{ProgressBar, ProgressStyle};
use inquire::{Password, Text};
use std::{
    collections::VecDeque,
    ffi::OsStr,
    fs,
    path::{Path, PathBuf},
    time,
};
use tracing::{debug, info, instrument, warn};

/// The bare configuration repository.
pub struct SysRepo {
    repository: Repository,
}

impl SysRepo {
    /// Clone configuration repository as a bare repository.
    ///
    /// Clone progress is displayed through a progress bar. If the remote
    /// demands credentials, the user is prompted accordingly and the
    /// progress bar blocks for input; with `prompt_auth` unset (the
    /// non-interactive case) only non-prompting credential sources like the
    /// ssh-agent are consulted.
    ///
    /// # Errors
    ///
    /// - Return [`RepoError::Git2`] if the clone itself fails.
    /// - Return [`RepoError::StyleTemplate`] if the progress bar template
    ///   cannot be parsed.
    #[instrument(skip(url, gitdir), level = "debug")]
    pub fn try_clone(
        url: impl AsRef<str>,
        branch: &str,
        gitdir: impl AsRef<Path>,
        prompt_auth: bool,
    ) -> Result<Self> {
        info!(
            "clone {} into {}",
            url.as_ref(),
            gitdir.as_ref().display()
        );

        let style = ProgressStyle::with_template(
            "{elapsed_precise:.green}  {msg:<50}  [{wide_bar:.yellow/blue}]",
        )?
        .progress_chars("-Cco.");
        let bar = ProgressBar::no_length().with_style(style);
        bar.set_message(url.as_ref().to_string());
        bar.enable_steady_tick(time::Duration::from_millis(100));

        let prompter = TerminalPrompter::new(bar.clone());
        let mut authenticator = GitAuthenticator::default();
        if prompt_auth {
            authenticator = authenticator.set_prompter(prompter);
        }
        let config = Config::open_default()?;

        let mut throttle = time::Instant::now();
        let mut rc = RemoteCallbacks::new();
        rc.credentials(authenticator.credentials(&config));
        rc.transfer_progress(move |progress| {
            let stats = progress.to_owned();
            if throttle.elapsed() > time::Duration::from_millis(10) {
                throttle = time::Instant::now();
                bar.set_length(stats.total_objects() as u64);
                bar.set_position(stats.received_objects() as u64);
            }
            true
        });

        let mut fo = FetchOptions::new();
        fo.remote_callbacks(rc);
        let repository = RepoBuilder::new()
            .bare(true)
            .branch(branch)
            .fetch_options(fo)
            .clone(url.as_ref(), gitdir.as_ref())?;

        Ok(Self { repository })
    }

    /// Open configuration repository cloned by an earlier run.
    ///
    /// # Errors
    ///
    /// - Return [`RepoError::Git2`] if no bare repository lives at `gitdir`.
    #[instrument(skip(gitdir), level = "debug")]
    pub fn try_open(gitdir: impl AsRef<Path>) -> Result<Self> {
        debug!("open existing repository {}", gitdir.as_ref().display());
        let repository = Repository::open_bare(gitdir.as_ref())?;
        Ok(Self { repository })
    }

    /// Check whether a repository already lives at `gitdir`.
    pub fn exists(gitdir: impl AsRef<Path>) -> bool {
        Repository::open_bare(gitdir.as_ref()).is_ok()
    }

    /// List workspace paths a checkout would overwrite.
    ///
    /// Walks the tree of HEAD and compares each tracked blob against the
    /// bytes at the matching workspace path. A path counts as a conflict
    /// when something already occupies it with content that differs from
    /// the tracked blob, including anything unreadable as a plain file.
    /// Paths with identical content are not conflicts; neither are paths
    /// with nothing at them. Returned paths are relative to the workspace,
    /// in tree walk order. An empty list means checkout destroys nothing.
    ///
    /// # Errors
    ///
    /// - Return [`RepoError::Git2`] if the tree of HEAD cannot be walked.
    #[instrument(skip(self, workspace), level = "debug")]
    pub fn conflicting_paths(&self, workspace: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
        if self.is_empty() {
            return Ok(Vec::new());
        }

        let mut conflicts = Vec::new();
        for (path, blob_id) in self.tracked_files()? {
            let existing = workspace.as_ref().join(&path);

            // INVARIANT: symlink_metadata spots dangling symlinks that
            // exists() would miss.
            if existing.symlink_metadata().is_err() {
                continue;
            }

            let blob = self.repository.find_blob(blob_id)?;
            let same = fs::read(&existing)
                .map(|contents| contents == blob.content())
                .unwrap_or(false);
            if !same {
                conflicts.push(path);
            }
        }

        debug!("{} conflicting paths found", conflicts.len());
        Ok(conflicts)
    }

    /// Checkout HEAD into the workspace.
    ///
    /// Force mode, so tracked files land in the workspace even when the
    /// checkout plan is empty. Callers are expected to reconcile conflicts
    /// first through [`SysRepo::conflicting_paths`]; after that the only
    /// content force can replace is either identical to HEAD or already
    /// moved aside. Untracked workspace files are not part of any delta and
    /// stay untouched.
    ///
    /// # Errors
    ///
    /// - Return [`RepoError::Git2`] if the checkout fails.
    #[instrument(skip(self, workspace), level = "debug")]
    pub fn checkout(&self, workspace: impl AsRef<Path>) -> Result<()> {
        if self.is_empty() {
            warn!(
                "repository {} has no commits, nothing to checkout",
                self.repository.path().display()
            );
            return Ok(());
        }

        info!("checkout into {}", workspace.as_ref().display());
        let mut opts = CheckoutBuilder::new();
        opts.target_dir(workspace.as_ref()).force();
        self.repository.checkout_head(Some(&mut opts))?;
        Ok(())
    }

    /// Stop Git from listing the entire workspace as untracked.
    ///
    /// Sets `status.showUntrackedFiles = no` on the repository's local
    /// configuration, the standard companion setting for bare-alias
    /// repositories whose work tree is a home directory.
    ///
    /// # Errors
    ///
    /// - Return [`RepoError::Git2`] if the local configuration cannot be
    ///   written.
    pub fn hide_untracked(&self) -> Result<()> {
        let mut config = self.repository.config()?;
        config.set_str("status.showUntrackedFiles", "no")?;
        Ok(())
    }

    fn is_empty(&self) -> bool {
        self.repository
            .head()
            .ok()
            .and_then(|head| head.target())
            .and_then(|oid| self.repository.find_commit(oid).ok())
            .is_none()
    }

    // Thank you Eric at https://www.hydrogen18.com/blog/list-all-files-git-repo-pygit2.html.
    fn tracked_files(&self) -> Result<Vec<(PathBuf, Oid)>> {
        let mut entries = Vec::new();
        let commit = self.repository.head()?.peel_to_commit()?;
        let tree = commit.tree()?;
        let mut trees_and_paths = VecDeque::new();
        trees_and_paths.push_front((tree, PathBuf::new()));

        // Use DFS to traverse index tree.
        while let Some((tree, path)) = trees_and_paths.pop_front() {
            for tree_entry in &tree {
                match tree_entry.kind() {
                    // INVARIANT: Hit a tree? Traverse it!
                    Some(ObjectType::Tree) => {
                        let next_tree = self.repository.find_tree(tree_entry.id())?;
                        let next_path = path.join(bytes_to_path(tree_entry.name_bytes()));
                        trees_and_paths.push_front((next_tree, next_path));
                    }
                    // INVARIANT: Hit a blob? Record our current path!
                    Some(ObjectType::Blob) => {
                        let full_path = path.join(bytes_to_path(tree_entry.name_bytes()));
                        entries.push((full_path, tree_entry.id()));
                    }
                    _ => continue,
                }
            }
        }

        Ok(entries)
    }
}

/// Git2 authentication prompter for progress bar.
#[derive(Debug, Clone)]
struct TerminalPrompter {
    bar: ProgressBar,
}

impl TerminalPrompter {
    fn new(bar: ProgressBar) -> Self {
        Self { bar }
    }
}

impl Prompter for TerminalPrompter {
    #[instrument(skip(self, url, _config), level = "debug")]
    fn prompt_username_password(
        &mut self,
        url: &str,
        _config: &git2::Config,
    ) -> Option<(String, String)> {
        info!("authentication required at {url}");
        self.bar.suspend(|| {
            let username = Text::new("username").prompt().ok()?;
            let password = Password::new("password")
                .without_confirmation()
                .prompt()
                .ok()?;
            Some((username, password))
        })
    }

    #[instrument(skip(self, username, url, _config), level = "debug")]
    fn prompt_password(
        &mut self,
        username: &str,
        url: &str,
        _config: &git2::Config,
    ) -> Option<String> {
        info!("authentication required at {url} for user {username}");
        self.bar
            .suspend(|| Password::new("password").without_confirmation().prompt().ok())
    }

    #[instrument(skip(self, ssh_key_path, _config), level = "debug")]
    fn prompt_ssh_key_passphrase(
        &mut self,
        ssh_key_path: &Path,
        _config: &git2::Config,
    ) -> Option<String> {
        info!(
            "authentication required with ssh key at {}",
            ssh_key_path.display()
        );
        self.bar
            .suspend(|| Password::new("password").without_confirmation().prompt().ok())
    }
}

// Thanks from:
//
// https://github.com/rust-lang/git2-rs/blob/5bc3baa9694a94db2ca9cc256b5bce8a215f9013/
// src/util.rs#L85
#[cfg(unix)]
fn bytes_to_path(bytes: &[u8]) -> &Path {
    use std::os::unix::prelude::*;
    Path::new(OsStr::from_bytes(bytes))
}
#[cfg(windows)]
fn bytes_to_path(bytes: &[u8]) -> &Path {
    use std::str;
    Path::new(str::from_utf8(bytes).unwrap())
}

/// Repository error types.
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    /// Operations from libgit2 fail.
    #[error(transparent)]
    Git2(#[from] git2::Error),

    /// Style template cannot be set for progress bars.
    #[error(transparent)]
    StyleTemplate(#[from] indicatif::style::TemplateError),
}

/// Friendly result alias :3
type Result<T, E = RepoError> = std::result::Result<T, E>;
