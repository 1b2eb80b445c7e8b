use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use url::Url;

use super::{classify_ytdlp_failure, DownloadError, FetchedMedia, FetcherSettings, MediaFetcher};
use crate::cookies::SessionCookie;
use crate::process::{run_with_timeout, PROBE_TIMEOUT};

const COOKIE_FILE_NAME: &str = "cookies.txt";
const OUTPUT_TEMPLATE: &str = "%(title)s.%(ext)s";
/// Printed once the merged file is in its final place
const PRINT_TEMPLATE: &str = "after_move:%(.{title,ext,filepath})j";

/// What yt-dlp prints for the finished file
#[derive(Debug, Deserialize)]
struct PrintedMedia {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    filepath: Option<PathBuf>,
}

/// Runs yt-dlp once per request, each in its own job directory.
pub struct YtDlpFetcher {
    settings: FetcherSettings,
}

impl YtDlpFetcher {
    pub fn new(settings: FetcherSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &FetcherSettings {
        &self.settings
    }

    /// `yt-dlp --version`, logged at startup
    pub async fn version(&self) -> Result<String, DownloadError> {
        let output = run_with_timeout(Command::new(&self.settings.ytdl_bin).arg("--version"), PROBE_TIMEOUT).await?;
        if !output.status.success() {
            return Err(classify_ytdlp_failure(&String::from_utf8_lossy(&output.stderr)));
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    fn build_args(url: &Url, cookie_file: &Path, work_dir: &Path) -> Vec<String> {
        let output = work_dir.join(OUTPUT_TEMPLATE);
        vec![
            "--cookies".to_string(),
            cookie_file.display().to_string(),
            "--no-playlist".to_string(),
            "-f".to_string(),
            "bestvideo+bestaudio/best".to_string(),
            "--merge-output-format".to_string(),
            "mkv".to_string(),
            "-o".to_string(),
            output.display().to_string(),
            "--no-simulate".to_string(),
            "--no-progress".to_string(),
            "--print".to_string(),
            PRINT_TEMPLATE.to_string(),
            url.to_string(),
        ]
    }

    async fn locate_output(stdout: &str, work_dir: &Path) -> Result<(PathBuf, Option<String>), DownloadError> {
        let printed = stdout
            .lines()
            .rev()
            .find_map(|line| serde_json::from_str::<PrintedMedia>(line.trim()).ok());

        if let Some(PrintedMedia {
            filepath: Some(path),
            title,
            ..
        }) = printed
        {
            return Ok((path, title));
        }

        // older yt-dlp builds ignore the print template; take the biggest file
        log::warn!("yt-dlp did not report the output path, scanning {}", work_dir.display());
        let mut best: Option<(u64, PathBuf)> = None;
        let mut entries = fs_err::tokio::read_dir(work_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let name = entry.file_name().to_string_lossy().into_owned();
            if name == COOKIE_FILE_NAME || name.ends_with(".part") || name.ends_with(".ytdl") {
                continue;
            }
            let size = entry.metadata().await?.len();
            if best.as_ref().map_or(true, |(best_size, _)| size > *best_size) {
                best = Some((size, path));
            }
        }

        best.map(|(_, path)| (path, None))
            .ok_or_else(|| DownloadError::FileNotFound(work_dir.to_path_buf()))
    }
}

#[async_trait]
impl MediaFetcher for YtDlpFetcher {
    fn name(&self) -> &str {
        "yt-dlp"
    }

    async fn fetch(&self, url: &Url, cookie: &SessionCookie) -> Result<FetchedMedia, DownloadError> {
        let job = JobDir::create(&self.settings.download_dir).await?;
        let cookie_file = job.path().join(COOKIE_FILE_NAME);
        write_cookie_file(&cookie_file, cookie).await?;

        let args = Self::build_args(url, &cookie_file, job.path());
        log::info!("Running {} for {} in {}", self.settings.ytdl_bin, url, job.path().display());

        let result = run_with_timeout(
            Command::new(&self.settings.ytdl_bin).args(&args),
            self.settings.timeout,
        )
        .await;

        // the session file must not outlive the run
        if let Err(e) = fs_err::tokio::remove_file(&cookie_file).await {
            log::warn!("Failed to remove cookie file: {}", e);
        }

        let output = result?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let err = classify_ytdlp_failure(&stderr);
            log::error!("yt-dlp failed for {} ({}): {}", url, err.kind(), stderr.trim());
            return Err(err);
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let (path, title) = Self::locate_output(&stdout, job.path()).await?;

        let size_bytes = match fs_err::tokio::metadata(&path).await {
            Ok(meta) => meta.len(),
            Err(_) => return Err(DownloadError::FileNotFound(path)),
        };
        if size_bytes > self.settings.max_file_size {
            log::warn!(
                "Downloaded file {} is {} bytes, over the {} byte limit",
                path.display(),
                size_bytes,
                self.settings.max_file_size
            );
            return Err(DownloadError::TooLarge {
                size_bytes,
                limit_bytes: self.settings.max_file_size,
            });
        }

        let format = path
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
            .unwrap_or_else(|| "mkv".to_string());
        let title = title
            .filter(|t| !t.is_empty())
            .or_else(|| path.file_stem().map(|s| s.to_string_lossy().into_owned()))
            .unwrap_or_else(|| "video".to_string());

        log::info!("Downloaded \"{}\" ({} bytes) from {}", title, size_bytes, url);
        Ok(FetchedMedia::in_work_dir(path, title, format, size_bytes, job.keep()))
    }
}

async fn write_cookie_file(path: &Path, cookie: &SessionCookie) -> Result<(), DownloadError> {
    fs_err::tokio::write(path, cookie.to_netscape()).await?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs_err::tokio::set_permissions(path, std::fs::Permissions::from_mode(0o600)).await?;
    }
    Ok(())
}

/// Per-request scratch directory, removed on drop unless kept.
struct JobDir {
    path: PathBuf,
    keep: bool,
}

impl JobDir {
    async fn create(root: &Path) -> Result<Self, DownloadError> {
        let path = root.join(format!("job-{}", uuid::Uuid::new_v4()));
        fs_err::tokio::create_dir_all(&path).await?;
        Ok(Self { path, keep: false })
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn keep(mut self) -> PathBuf {
        self.keep = true;
        self.path.clone()
    }
}

impl Drop for JobDir {
    fn drop(&mut self) {
        if !self.keep {
            if let Err(e) = std::fs::remove_dir_all(&self.path) {
                log::warn!("Failed to remove {}: {}", self.path.display(), e);
            }
        }
    }
}
