// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use crate::OriginFixture;

use sysgit_install::{
    config::{BootstrapConvention, InstallConfig},
    confirm::{AssumeYes, ConfirmError, ConfirmPort},
    install::{backup::BACKUP_DIR_PREFIX, InstallError, Installer},
};

use pretty_assertions::assert_eq;
use sealed_test::prelude::*;
use std::{
    env, fs,
    path::{Path, PathBuf},
};

/// Decline every gate, the way a wary user mashing "n" would.
struct DeclineAll;

impl ConfirmPort for DeclineAll {
    fn confirm(&self, _message: &str) -> Result<bool, ConfirmError> {
        Ok(false)
    }

    fn ask_line(&self, _message: &str) -> Result<String, ConfirmError> {
        Err(ConfirmError::NonInteractive)
    }
}

fn test_config(root: &Path) -> InstallConfig {
    InstallConfig {
        repo_url: root.join("origin.git").to_string_lossy().into_owned(),
        branch: "master".into(),
        home: root.join("sysgit"),
        workspace: root.join("workspace"),
        executable_dir: root.join("bin"),
        interactive: false,
        convention: BootstrapConvention::Xdg,
        bootstrap_args: Vec::new(),
    }
}

fn backup_dirs(workspace: &Path) -> Vec<PathBuf> {
    fs::read_dir(workspace)
        .into_iter()
        .flatten()
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .map(|name| name.to_string_lossy().starts_with(BACKUP_DIR_PREFIX))
                .unwrap_or(false)
        })
        .collect()
}

#[sealed_test]
fn installer_backs_up_conflicting_files() -> anyhow::Result<()> {
    let root = env::current_dir()?;
    let origin = OriginFixture::new(root.join("origin.git"))?;
    origin.stage_and_commit(".zshrc", "export EDITOR=vim\n")?;

    fs::create_dir_all(root.join("workspace"))?;
    fs::write(root.join("workspace/.zshrc"), "alias ls='ls -G'\n")?;
    fs::write(root.join("workspace/.vimrc"), "set number\n")?;

    let config = test_config(&root);
    let report = Installer::new(&config, &AssumeYes).run()?;

    assert!(report.cloned);
    assert_eq!(report.moved, vec![PathBuf::from(".zshrc")]);

    // Old content lands in the backup, repo content in the workspace.
    let backups = backup_dirs(&config.workspace);
    assert_eq!(backups.len(), 1);
    assert_eq!(Some(backups[0].as_path()), report.backup_dir.as_deref());
    assert_eq!(
        fs::read_to_string(backups[0].join(".zshrc"))?,
        "alias ls='ls -G'\n"
    );
    assert_eq!(
        fs::read_to_string(root.join("workspace/.zshrc"))?,
        "export EDITOR=vim\n"
    );

    // Non-conflicting files stay put.
    assert_eq!(
        fs::read_to_string(root.join("workspace/.vimrc"))?,
        "set number\n"
    );

    // Wrapper binds the exact directory arguments.
    assert!(report.wrapper_written);
    let wrapper = fs::read_to_string(root.join("bin/sysgit"))?;
    assert!(wrapper.contains(&format!(
        "git --git-dir={}/ --work-tree={} \"$@\"",
        config.home.display(),
        config.workspace.display(),
    )));

    Ok(())
}

#[sealed_test]
fn identical_workspace_files_are_not_conflicts() -> anyhow::Result<()> {
    let root = env::current_dir()?;
    let origin = OriginFixture::new(root.join("origin.git"))?;
    origin.stage_and_commit(".zshrc", "export EDITOR=vim\n")?;

    fs::create_dir_all(root.join("workspace"))?;
    fs::write(root.join("workspace/.zshrc"), "export EDITOR=vim\n")?;

    let config = test_config(&root);
    let report = Installer::new(&config, &AssumeYes).run()?;

    assert!(report.moved.is_empty());
    assert!(report.backup_dir.is_none());
    assert!(backup_dirs(&config.workspace).is_empty());
    assert_eq!(
        fs::read_to_string(root.join("workspace/.zshrc"))?,
        "export EDITOR=vim\n"
    );

    Ok(())
}

#[sealed_test]
fn second_run_restores_deleted_tracked_file() -> anyhow::Result<()> {
    let root = env::current_dir()?;
    let origin = OriginFixture::new(root.join("origin.git"))?;
    origin.stage_and_commit(".zshrc", "export EDITOR=vim\n")?;
    fs::create_dir_all(root.join("workspace"))?;

    let config = test_config(&root);
    Installer::new(&config, &AssumeYes).run()?;
    fs::remove_file(root.join("workspace/.zshrc"))?;

    let second = Installer::new(&config, &AssumeYes).run()?;
    assert!(second.moved.is_empty());
    assert_eq!(
        fs::read_to_string(root.join("workspace/.zshrc"))?,
        "export EDITOR=vim\n"
    );

    Ok(())
}

#[sealed_test]
fn installer_is_idempotent_without_conflicts() -> anyhow::Result<()> {
    let root = env::current_dir()?;
    let origin = OriginFixture::new(root.join("origin.git"))?;
    origin.stage_and_commit(".zshrc", "export EDITOR=vim\n")?;
    fs::create_dir_all(root.join("workspace"))?;

    let config = test_config(&root);
    let first = Installer::new(&config, &AssumeYes).run()?;
    assert!(first.cloned);
    assert!(first.backup_dir.is_none());
    assert!(first.wrapper_written);

    let second = Installer::new(&config, &AssumeYes).run()?;
    assert!(!second.cloned);
    assert!(second.backup_dir.is_none());
    assert!(second.moved.is_empty());
    assert!(!second.wrapper_written);

    assert!(backup_dirs(&config.workspace).is_empty());
    assert_eq!(
        fs::read_to_string(root.join("workspace/.zshrc"))?,
        "export EDITOR=vim\n"
    );

    // Untracked workspace files must stay hidden from status output.
    let repo = git2::Repository::open_bare(&config.home)?;
    let setting = repo
        .config()?
        .snapshot()?
        .get_string("status.showUntrackedFiles")?;
    assert_eq!(setting, "no");

    Ok(())
}

#[sealed_test]
fn declined_clone_leaves_filesystem_unchanged() -> anyhow::Result<()> {
    let root = env::current_dir()?;
    let origin = OriginFixture::new(root.join("origin.git"))?;
    origin.stage_and_commit(".zshrc", "export EDITOR=vim\n")?;

    fs::create_dir_all(root.join("workspace"))?;
    fs::write(root.join("workspace/.zshrc"), "alias ls='ls -G'\n")?;

    let config = test_config(&root);
    let result = Installer::new(&config, &DeclineAll).run();

    assert!(matches!(
        result,
        Err(InstallError::Confirm(ConfirmError::Declined(_)))
    ));
    assert!(!config.home.exists());
    assert!(!config.wrapper_path().exists());
    assert!(backup_dirs(&config.workspace).is_empty());
    assert_eq!(
        fs::read_to_string(root.join("workspace/.zshrc"))?,
        "alias ls='ls -G'\n"
    );

    Ok(())
}

#[sealed_test]
fn bootstrap_script_runs_with_forwarded_args() -> anyhow::Result<()> {
    let root = env::current_dir()?;
    let origin = OriginFixture::new(root.join("origin.git"))?;
    origin.stage_and_commit(".zshrc", "export EDITOR=vim\n")?;
    origin.stage_and_commit(
        ".config/sysgit/bootstrap.sh",
        "cd \"$(dirname \"$0\")\" && printf '%s ' \"$@\" > ran.txt\n",
    )?;
    fs::create_dir_all(root.join("workspace"))?;

    let mut config = test_config(&root);
    config.bootstrap_args = vec!["--profile".into(), "work".into()];
    let report = Installer::new(&config, &AssumeYes).run()?;

    assert!(report.bootstrap_ran);
    assert_eq!(
        fs::read_to_string(root.join("workspace/.config/sysgit/ran.txt"))?,
        "--profile work "
    );

    Ok(())
}

#[sealed_test]
fn repo_root_bootstrap_receives_no_args() -> anyhow::Result<()> {
    let root = env::current_dir()?;
    let origin = OriginFixture::new(root.join("origin.git"))?;
    origin.stage_and_commit(
        ".sysgit-bootstrap",
        "cd \"$(dirname \"$0\")\" && printf 'argc:%s' \"$#\" > marker.txt\n",
    )?;
    fs::create_dir_all(root.join("workspace"))?;

    let mut config = test_config(&root);
    config.convention = BootstrapConvention::RepoRoot;
    config.bootstrap_args = vec!["ignored".into()];
    let report = Installer::new(&config, &AssumeYes).run()?;

    assert!(report.bootstrap_ran);
    assert_eq!(
        fs::read_to_string(root.join("workspace/marker.txt"))?,
        "argc:0"
    );

    Ok(())
}

#[sealed_test]
fn missing_bootstrap_script_is_skipped() -> anyhow::Result<()> {
    let root = env::current_dir()?;
    let origin = OriginFixture::new(root.join("origin.git"))?;
    origin.stage_and_commit(".zshrc", "export EDITOR=vim\n")?;
    fs::create_dir_all(root.join("workspace"))?;

    let config = test_config(&root);
    let report = Installer::new(&config, &AssumeYes).run()?;

    assert!(!report.bootstrap_ran);

    Ok(())
}
