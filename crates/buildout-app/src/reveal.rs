//! Opening the standardized folder in the host file browser.

use std::io;
use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};

use tracing::{debug, warn};

/// Shows a folder to the user once standardization finishes.
pub trait Revealer: Send + Sync {
    /// Open `path` in the host file browser.
    ///
    /// # Errors
    ///
    /// Returns an error when the file browser cannot be launched.
    fn reveal(&self, path: &Path) -> io::Result<()>;
}

/// Launches the platform file browser (`explorer`, `open` or `xdg-open`).
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRevealer;

impl SystemRevealer {
    /// Program used to open folders on this platform.
    #[must_use]
    pub const fn program() -> &'static str {
        if cfg!(target_os = "windows") {
            "explorer"
        } else if cfg!(target_os = "macos") {
            "open"
        } else {
            "xdg-open"
        }
    }
}

impl Revealer for SystemRevealer {
    fn reveal(&self, path: &Path) -> io::Result<()> {
        launch_detached(Self::program(), path).map(drop)
    }
}

/// Start `program` on `path` and reap it on a background thread.
///
/// The returned handle yields the exit status; dropping it detaches the reaper.
fn launch_detached(
    program: &'static str,
    path: &Path,
) -> io::Result<JoinHandle<Option<ExitStatus>>> {
    let mut child = Command::new(program)
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()?;
    let pid = child.id();
    debug!(program, pid, path = %path.display(), "file browser launched");
    thread::Builder::new()
        .name("buildout-reveal".to_string())
        .spawn(move || match child.wait() {
            Ok(status) => {
                debug!(program, pid, %status, "file browser exited");
                Some(status)
            }
            Err(err) => {
                warn!(program, pid, error = %err, "file browser could not be reaped");
                None
            }
        })
}

/// Revealer that does nothing; used when revealing is disabled or headless.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopRevealer;

impl Revealer for NoopRevealer {
    fn reveal(&self, _path: &Path) -> io::Result<()> {
        Ok(())
    }
}
