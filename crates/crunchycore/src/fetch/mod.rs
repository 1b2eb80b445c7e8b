//! Download invoker
//!
//! [`MediaFetcher`] is the seam between the bot and whatever produces the
//! media file. The only production implementation is [`YtDlpFetcher`]; tests
//! plug in fakes.

mod error;
mod ytdlp;

pub use error::{classify_ytdlp_failure, DownloadError};
pub use ytdlp::YtDlpFetcher;

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

use crate::config::BotConfig;
use crate::cookies::SessionCookie;

/// A downloaded file waiting to be uploaded.
///
/// The file lives in its own job directory; call [`FetchedMedia::remove_file`]
/// once it has been sent.
#[derive(Debug, Clone)]
pub struct FetchedMedia {
    pub path: PathBuf,
    pub title: String,
    /// Container extension (`mkv`, `mp4`, ...)
    pub format: String,
    pub size_bytes: u64,
    work_dir: Option<PathBuf>,
}

impl FetchedMedia {
    /// Media that owns a job directory which is removed with it
    pub fn in_work_dir(path: PathBuf, title: String, format: String, size_bytes: u64, work_dir: PathBuf) -> Self {
        Self {
            path,
            title,
            format,
            size_bytes,
            work_dir: Some(work_dir),
        }
    }

    /// Media at a standalone path
    pub fn new(path: PathBuf, title: String, format: String, size_bytes: u64) -> Self {
        Self {
            path,
            title,
            format,
            size_bytes,
            work_dir: None,
        }
    }

    pub fn size_mb(&self) -> f64 {
        self.size_bytes as f64 / (1024.0 * 1024.0)
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| format!("{}.{}", self.title, self.format))
    }

    /// Deletes the file (and its job directory). Failures are only logged.
    pub async fn remove_file(&self) {
        let result = match &self.work_dir {
            Some(dir) => fs_err::tokio::remove_dir_all(dir).await,
            None => fs_err::tokio::remove_file(&self.path).await,
        };
        if let Err(e) = result {
            log::warn!("Failed to clean up downloaded file: {}", e);
        }
    }

    /// Moves the file to `dest_dir`, leaving nothing in the job directory.
    pub async fn persist_to(self, dest_dir: &Path) -> Result<PathBuf, DownloadError> {
        fs_err::tokio::create_dir_all(dest_dir).await?;
        let dest = dest_dir.join(self.file_name());
        match fs_err::tokio::rename(&self.path, &dest).await {
            Ok(()) if self.work_dir.is_none() => {}
            Ok(()) => self.remove_file().await,
            Err(_) => {
                // across filesystems rename fails; fall back to a copy
                fs_err::tokio::copy(&self.path, &dest).await?;
                self.remove_file().await;
            }
        }
        Ok(dest)
    }
}

/// Produces a local media file from a URL and the user's session
#[async_trait]
pub trait MediaFetcher: Send + Sync {
    /// Human-readable name of this fetcher (e.g. "yt-dlp")
    fn name(&self) -> &str;

    /// Download `url` authenticated with `cookie`.
    async fn fetch(&self, url: &Url, cookie: &SessionCookie) -> Result<FetchedMedia, DownloadError>;
}

/// Settings for [`YtDlpFetcher`]
#[derive(Debug, Clone)]
pub struct FetcherSettings {
    pub ytdl_bin: String,
    pub download_dir: PathBuf,
    pub timeout: Duration,
    pub max_file_size: u64,
}

impl FetcherSettings {
    pub fn from_config(config: &BotConfig) -> Self {
        Self {
            ytdl_bin: config.ytdl_bin.clone(),
            download_dir: config.download_dir.clone(),
            timeout: config.ytdlp_timeout,
            max_file_size: config.max_upload_bytes,
        }
    }
}

impl Default for FetcherSettings {
    fn default() -> Self {
        Self {
            ytdl_bin: "yt-dlp".to_string(),
            download_dir: PathBuf::from(crate::config::DEFAULT_DOWNLOAD_FOLDER),
            timeout: crate::config::download::ytdlp_timeout(),
            max_file_size: crate::config::download::MAX_UPLOAD_MB * 1024 * 1024,
        }
    }
}
