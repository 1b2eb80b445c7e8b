//! Process execution utilities with timeout support
//!
//! External tools (yt-dlp, ffmpeg underneath it) can hang on a stalled
//! connection; every invocation goes through [`run_with_timeout`] so a stuck
//! child is killed instead of pinning a handler forever.

use std::process::Output;
use std::time::Duration;
use tokio::process::Command;

use crate::fetch::DownloadError;

/// Timeout for `--version` style probes
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(15);

/// Run an async Command with a timeout.
///
/// The child is killed when the timeout fires. Returns the process Output on
/// success, [`DownloadError::Spawn`] when the binary cannot be started and
/// [`DownloadError::Timeout`] when it runs too long.
pub async fn run_with_timeout(cmd: &mut Command, timeout: Duration) -> Result<Output, DownloadError> {
    let program = cmd.as_std().get_program().to_string_lossy().into_owned();
    cmd.kill_on_drop(true);

    match tokio::time::timeout(timeout, cmd.output()).await {
        Ok(Ok(output)) => Ok(output),
        Ok(Err(source)) => Err(DownloadError::Spawn { program, source }),
        Err(_) => {
            log::warn!("{} timed out after {}s, killed", program, timeout.as_secs());
            Err(DownloadError::Timeout(timeout))
        }
    }
}
