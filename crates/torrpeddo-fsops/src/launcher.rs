//! Desktop folder launcher.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::info;

use crate::error::{FsOpsError, FsOpsResult};

const XDG_OPEN: &str = "xdg-open";

/// External program that opens a folder in the user's file manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DesktopLauncher {
    program: &'static str,
}

impl DesktopLauncher {
    /// The freedesktop `xdg-open` launcher.
    #[must_use]
    pub const fn xdg_open() -> Self {
        Self { program: XDG_OPEN }
    }

    /// Launcher backed by an arbitrary program name.
    #[must_use]
    pub const fn with_program(program: &'static str) -> Self {
        Self { program }
    }

    /// Program name looked up on `PATH`.
    #[must_use]
    pub const fn program(&self) -> &'static str {
        self.program
    }

    /// Resolve the launcher on `PATH`.
    ///
    /// # Errors
    ///
    /// Returns [`FsOpsError::LauncherMissing`] when the program is not installed.
    pub fn locate(&self) -> FsOpsResult<PathBuf> {
        which::which(self.program).map_err(|_| FsOpsError::LauncherMissing {
            launcher: self.program,
        })
    }

    /// Spawn the launcher for `folder` without waiting for it.
    ///
    /// # Errors
    ///
    /// Returns [`FsOpsError::LauncherMissing`] when the program is not installed, or
    /// [`FsOpsError::Io`] when it cannot be spawned.
    pub fn open(&self, folder: &Path) -> FsOpsResult<()> {
        let program = self.locate()?;
        Command::new(&program)
            .arg(folder)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|err| FsOpsError::io("spawn_launcher", folder, err))?;
        info!(launcher = %program.display(), folder = %folder.display(), "opened folder");
        Ok(())
    }
}

impl Default for DesktopLauncher {
    fn default() -> Self {
        Self::xdg_open()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_program_is_reported() {
        let launcher = DesktopLauncher::with_program("torrpeddo-no-such-launcher");
        assert!(matches!(
            launcher.locate(),
            Err(FsOpsError::LauncherMissing {
                launcher: "torrpeddo-no-such-launcher"
            })
        ));
        assert!(matches!(
            launcher.open(Path::new("/tmp")),
            Err(FsOpsError::LauncherMissing { .. })
        ));
    }

    #[test]
    fn default_is_xdg_open() {
        assert_eq!(DesktopLauncher::default().program(), "xdg-open");
    }
}
