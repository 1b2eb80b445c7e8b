//! crunchycore - everything behind the crunchydl bot that does not speak Telegram
//!
//! # Module Structure
//!
//! - `access`: the Admin and the persisted sudo-user list
//! - `cookies`: session cookie parsing and the in-memory per-user jar
//! - `media_url`: recognizing Crunchyroll links
//! - `fetch`: the yt-dlp download invoker
//! - `config`, `error`, `logging`, `process`: ambient plumbing

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

pub mod access;
pub mod config;
pub mod cookies;
pub mod error;
pub mod fetch;
pub mod logging;
pub mod media_url;
pub mod process;

// Re-export commonly used types for convenience
pub use access::{AccessError, AccessStore, Role, StorageError, SudoChange, SudoFile};
pub use config::{BotConfig, ConfigError};
pub use cookies::{looks_like_cookie_payload, parse_cookie_payload, CookieJar, CookieParseError, CookieSummary, SessionCookie};
pub use error::{AppError, AppResult};
pub use fetch::{DownloadError, FetchedMedia, FetcherSettings, MediaFetcher, YtDlpFetcher};
pub use media_url::find_media_url;
