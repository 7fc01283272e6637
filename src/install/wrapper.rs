// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! The `sysgit` wrapper script.
//!
//! Day-to-day interaction with the configuration repository happens through
//! a tiny wrapper script rather than the installer: `sysgit status`,
//! `sysgit add .vimrc`, and so on. The wrapper just re-invokes Git with the
//! resolved Git directory and work tree alias bound through "--git-dir" and
//! "--work-tree", forwarding all of its arguments verbatim.

use std::{
    fs,
    io,
    path::{Path, PathBuf},
};
use tracing::{debug, info};

/// Render wrapper script contents for the resolved paths.
pub fn render(home: impl AsRef<Path>, workspace: impl AsRef<Path>) -> String {
    format!(
        "#!/bin/sh\nexec git --git-dir={}/ --work-tree={} \"$@\"\n",
        home.as_ref().display(),
        workspace.as_ref().display(),
    )
}

/// Check whether an identical wrapper is already installed.
pub fn already_installed(path: impl AsRef<Path>, contents: &str) -> bool {
    fs::read_to_string(path.as_ref())
        .map(|existing| existing == contents)
        .unwrap_or(false)
}

/// Write the wrapper script and mark it executable.
///
/// Creates the target directory if needed. An existing wrapper is
/// overwritten; callers gate that case behind confirmation.
///
/// # Errors
///
/// - Return [`WrapperError::CreateDir`] if the target directory cannot be
///   created.
/// - Return [`WrapperError::Write`] if the script cannot be written or
///   marked executable.
pub fn install(path: impl AsRef<Path>, contents: &str) -> Result<()> {
    let path = path.as_ref();

    if let Some(parent) = path.parent() {
        mkdirp::mkdirp(parent).map_err(|err| WrapperError::CreateDir {
            source: err,
            path: parent.to_path_buf(),
        })?;
    }

    debug!("write wrapper script {}", path.display());
    fs::write(path, contents).map_err(|err| WrapperError::Write {
        source: err,
        path: path.to_path_buf(),
    })?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o755)).map_err(|err| {
            WrapperError::Write {
                source: err,
                path: path.to_path_buf(),
            }
        })?;
    }

    info!("installed wrapper {}", path.display());
    Ok(())
}

/// Wrapper installation error types.
#[derive(Debug, thiserror::Error)]
pub enum WrapperError {
    /// Executable directory cannot be created.
    #[error("cannot create executable directory {path:?}")]
    CreateDir { source: io::Error, path: PathBuf },

    /// Wrapper script cannot be written or marked executable.
    #[error("cannot install wrapper script {path:?}")]
    Write { source: io::Error, path: PathBuf },
}

/// Friendly result alias :3
type Result<T, E = WrapperError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;
    use sealed_test::prelude::*;

    #[test]
    fn render_binds_exact_directory_arguments() {
        let result = render("/home/blah/.sysgit", "/home/blah");
        let expect = indoc! {r#"
            #!/bin/sh
            exec git --git-dir=/home/blah/.sysgit/ --work-tree=/home/blah "$@"
        "#};
        assert_eq!(result, expect);
    }

    #[sealed_test]
    fn install_writes_executable_script() -> anyhow::Result<()> {
        let contents = render("/home/blah/.sysgit", "/home/blah");
        install("bin/sysgit", &contents)?;

        assert_eq!(fs::read_to_string("bin/sysgit")?, contents);
        assert!(already_installed("bin/sysgit", &contents));

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata("bin/sysgit")?.permissions().mode();
            assert_eq!(mode & 0o777, 0o755);
        }

        Ok(())
    }

    #[sealed_test]
    fn already_installed_spots_differing_content() -> anyhow::Result<()> {
        let contents = render("/home/blah/.sysgit", "/home/blah");
        install("bin/sysgit", &contents)?;

        let other = render("/home/blah/.other", "/home/blah");
        assert!(!already_installed("bin/sysgit", &other));
        assert!(!already_installed("bin/missing", &contents));

        Ok(())
    }
}
