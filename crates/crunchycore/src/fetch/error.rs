use std::io;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Longest yt-dlp message relayed to the user
const MAX_MESSAGE_CHARS: usize = 400;

/// Why a download did not produce a file.
///
/// The `Display` text is shown to the user as is.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// Crunchyroll rejected the session
    #[error("Your cookies were rejected: {0}")]
    CookieInvalid(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("File is {} MB, over the {} MB upload limit", mb(.size_bytes), mb(.limit_bytes))]
    TooLarge { size_bytes: u64, limit_bytes: u64 },

    #[error("Download timed out after {} minutes", .0.as_secs() / 60)]
    Timeout(Duration),

    #[error("Failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("yt-dlp finished but the file is missing: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("Could not prepare the download folder: {0}")]
    Io(#[from] io::Error),
}

impl DownloadError {
    /// Short machine-friendly name, used in log lines
    pub fn kind(&self) -> &'static str {
        match self {
            DownloadError::CookieInvalid(_) => "cookie_invalid",
            DownloadError::DownloadFailed(_) => "download_failed",
            DownloadError::TooLarge { .. } => "too_large",
            DownloadError::Timeout(_) => "timeout",
            DownloadError::Spawn { .. } => "spawn",
            DownloadError::FileNotFound(_) => "file_not_found",
            DownloadError::Io(_) => "io",
        }
    }

    /// Whether sending fresh cookies could fix this
    pub fn is_cookie_problem(&self) -> bool {
        matches!(self, DownloadError::CookieInvalid(_))
    }
}

fn mb(bytes: &u64) -> String {
    format!("{:.1}", *bytes as f64 / (1024.0 * 1024.0))
}

/// Turns yt-dlp's stderr into a [`DownloadError`].
///
/// The user sees yt-dlp's own last `ERROR:` line. Messages that point at the
/// session (expired login, premium-only content) become `CookieInvalid`.
pub fn classify_ytdlp_failure(stderr: &str) -> DownloadError {
    let message = extract_message(stderr);
    let lower = stderr.to_lowercase();

    let cookie_related = lower.contains("cookies are no longer valid")
        || lower.contains("cookies have likely been rotated")
        || lower.contains("cookies have expired")
        || lower.contains("login required")
        || lower.contains("please sign in")
        || lower.contains("please log in")
        || lower.contains("sign in to")
        || lower.contains("use --cookies")
        || lower.contains("premium")
        || lower.contains("http error 401")
        || lower.contains("unauthorized");

    if cookie_related {
        DownloadError::CookieInvalid(message)
    } else {
        DownloadError::DownloadFailed(message)
    }
}

fn extract_message(stderr: &str) -> String {
    let lines: Vec<&str> = stderr.lines().map(str::trim).filter(|l| !l.is_empty()).collect();

    let picked = lines
        .iter()
        .rev()
        .find_map(|l| l.strip_prefix("ERROR:"))
        .or_else(|| lines.last().copied())
        .map(str::trim)
        .unwrap_or("yt-dlp exited with an error");

    if picked.chars().count() > MAX_MESSAGE_CHARS {
        let mut cut: String = picked.chars().take(MAX_MESSAGE_CHARS).collect();
        cut.push('…');
        cut
    } else {
        picked.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_premium_is_cookie_problem() {
        let stderr = "[crunchyroll] Extracting URL: https://www.crunchyroll.com/watch/X\n\
                      ERROR: [crunchyroll] X: This video is for premium members only. Use --cookies-from-browser or --cookies";
        let err = classify_ytdlp_failure(stderr);
        assert!(err.is_cookie_problem());
        assert_eq!(
            err.to_string(),
            "Your cookies were rejected: [crunchyroll] X: This video is for premium members only. Use --cookies-from-browser or --cookies"
        );
    }

    #[test]
    fn test_unauthorized_is_cookie_problem() {
        let err = classify_ytdlp_failure("ERROR: Unable to download JSON metadata: HTTP Error 401: Unauthorized");
        assert_eq!(err.kind(), "cookie_invalid");
    }

    #[test]
    fn test_generic_failure_keeps_last_error_line() {
        let stderr = "WARNING: something minor\nERROR: first\nERROR: Unsupported URL: https://www.crunchyroll.com/\n";
        let err = classify_ytdlp_failure(stderr);
        assert_eq!(err.kind(), "download_failed");
        assert_eq!(err.to_string(), "Download failed: Unsupported URL: https://www.crunchyroll.com/");
    }

    #[test]
    fn test_no_error_prefix_uses_last_line() {
        let err = classify_ytdlp_failure("Traceback (most recent call last):\n  ...\nKeyError: 'id'\n");
        assert_eq!(err.to_string(), "Download failed: KeyError: 'id'");
    }

    #[test]
    fn test_empty_stderr() {
        let err = classify_ytdlp_failure("");
        assert_eq!(err.to_string(), "Download failed: yt-dlp exited with an error");
    }

    #[test]
    fn test_long_message_is_truncated() {
        let stderr = format!("ERROR: {}", "x".repeat(1000));
        let message = classify_ytdlp_failure(&stderr).to_string();
        assert!(message.chars().count() < 450);
        assert!(message.ends_with('…'));
    }

    #[test]
    fn test_too_large_message() {
        let err = DownloadError::TooLarge {
            size_bytes: 3 * 1024 * 1024 * 1024,
            limit_bytes: 2000 * 1024 * 1024,
        };
        assert_eq!(err.to_string(), "File is 3072.0 MB, over the 2000.0 MB upload limit");
    }

    #[test]
    fn test_timeout_message() {
        assert_eq!(
            DownloadError::Timeout(Duration::from_secs(1800)).to_string(),
            "Download timed out after 30 minutes"
        );
    }
}
