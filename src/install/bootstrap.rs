// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Bootstrap script invocation.
//!
//! Configuration repositories may ship a bootstrap script that performs
//! environment-specific setup once the tracked files land in the workspace,
//! e.g., installing packages or generating host-local files. The installer
//! runs it through `sh` as the final step, inheriting stdio, with no
//! sandboxing and no output capture. A non-zero exit propagates as the
//! installer's own failure.

use std::{io, path::Path, process::Command};
use tracing::{info, instrument};

/// Run the bootstrap script, forwarding residual arguments.
///
/// Blocks the current process until the script finishes. Callers decide
/// which arguments to forward; the repo-root convention forwards none.
///
/// # Errors
///
/// - Return [`BootstrapError::Spawn`] if `sh` cannot be spawned.
/// - Return [`BootstrapError::Failed`] if the script exits non-zero.
#[instrument(skip(script, args), level = "debug")]
pub fn run(script: impl AsRef<Path>, args: &[String]) -> Result<()> {
    let script = script.as_ref();
    info!("run bootstrap script {}", script.display());

    let status = Command::new("sh")
        .arg(script)
        .args(args)
        .spawn()
        .map_err(BootstrapError::Spawn)?
        .wait()
        .map_err(BootstrapError::Spawn)?;

    if !status.success() {
        return Err(BootstrapError::Failed {
            code: status.code(),
        });
    }

    Ok(())
}

/// Bootstrap error types.
#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    /// The `sh` interpreter cannot be spawned or waited on.
    #[error("cannot run bootstrap script")]
    Spawn(#[source] io::Error),

    /// Bootstrap script exited non-zero.
    #[error("bootstrap script failed with exit code {code:?}")]
    Failed { code: Option<i32> },
}

/// Friendly result alias :3
type Result<T, E = BootstrapError> = std::result::Result<T, E>;
