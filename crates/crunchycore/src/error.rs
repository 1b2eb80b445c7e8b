use thiserror::Error;

use crate::access::AccessError;
use crate::config::ConfigError;
use crate::cookies::CookieParseError;
use crate::fetch::DownloadError;

/// Centralized error type for the application
///
/// Failures from configuration, access control, cookie parsing and download
/// jobs all convert into this enum, so the Telegram layer has one place to
/// turn errors into replies and logs share the same category names.
///
/// # Example
///
/// ```no_run
/// use crunchycore::error::AppError;
///
/// fn handle_error(err: AppError) {
///     eprintln!("Error: {}", err);
/// }
/// ```
#[derive(Error, Debug)]
pub enum AppError {
    /// Startup configuration is missing or malformed
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Sudo management refused or could not be saved
    #[error(transparent)]
    Access(#[from] AccessError),

    /// Submitted cookie data could not be parsed
    #[error("Invalid cookie data: {0}")]
    InvalidFormat(#[from] CookieParseError),

    /// Download requested by a user with no cookie on file
    #[error("No session cookies on file for user {0}")]
    MissingCookie(i64),

    /// yt-dlp failure, relayed to the user as is
    #[error(transparent)]
    Download(#[from] DownloadError),

    /// Telegram API errors
    #[cfg(feature = "telegram")]
    #[error("Telegram error: {0}")]
    Telegram(#[from] teloxide::RequestError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Type alias for Result with AppError
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Short category name used in log lines
    pub fn category(&self) -> &'static str {
        match self {
            AppError::Config(_) => "config",
            AppError::Access(AccessError::PermissionDenied) => "permission_denied",
            AppError::Access(AccessError::Storage { .. }) => "storage",
            AppError::InvalidFormat(_) => "invalid_format",
            AppError::MissingCookie(_) => "missing_cookie",
            AppError::Download(e) => e.kind(),
            #[cfg(feature = "telegram")]
            AppError::Telegram(_) => "telegram",
            AppError::Io(_) => "io",
        }
    }
}
