//! Runtime configuration read from the process environment.
//!
//! Two values are required: the bot token and the Admin's numeric id. Both
//! missing or malformed values are reported as [`ConfigError`] and the binary
//! refuses to start. Everything else has a default.

use secrecy::SecretString;
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Environment variables probed for the bot token, in priority order
pub const TOKEN_VARS: &[&str] = &["BOT_TOKEN", "TELOXIDE_TOKEN", "TELEGRAM_BOT_TOKEN"];

/// Environment variable holding the Admin's Telegram user id
pub const ADMIN_VAR: &str = "ADMIN_USER_ID";

/// Default location of the persisted sudo list
pub const DEFAULT_SUDO_FILE: &str = "sudo_users.json";

/// Default directory that yt-dlp downloads into
pub const DEFAULT_DOWNLOAD_FOLDER: &str = "downloads";

/// Default log file
pub const DEFAULT_LOG_FILE: &str = "crunchydl.log";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} environment variable is not set")]
    Missing(&'static str),

    #[error("{name} has an invalid value {value:?}: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: &'static str,
    },
}

/// Download configuration
pub mod download {
    use super::Duration;

    /// Timeout for a single yt-dlp run (in seconds). Full episodes are large.
    pub const YTDLP_TIMEOUT_SECS: u64 = 1800; // 30 minutes

    /// Upper bound on what we try to upload (in megabytes).
    /// 2000 MB is the local Bot API server ceiling.
    pub const MAX_UPLOAD_MB: u64 = 2000;

    /// Largest file the public Bot API accepts through send_video
    pub const STANDARD_UPLOAD_LIMIT_BYTES: u64 = 50 * 1024 * 1024;

    /// yt-dlp command timeout duration
    pub fn ytdlp_timeout() -> Duration {
        Duration::from_secs(YTDLP_TIMEOUT_SECS)
    }
}

/// Network configuration
pub mod network {
    use super::Duration;

    /// Request timeout for Bot API calls (in seconds).
    /// Large video uploads through a local Bot API server take a while.
    pub const REQUEST_TIMEOUT_SECS: u64 = 900; // 15 minutes

    /// Request timeout duration
    pub fn timeout() -> Duration {
        Duration::from_secs(REQUEST_TIMEOUT_SECS)
    }
}

/// Log file path
/// Read from LOG_FILE_PATH, independent of the required values so that
/// configuration errors can be logged.
pub fn log_file_path() -> String {
    env::var("LOG_FILE_PATH").unwrap_or_else(|_| DEFAULT_LOG_FILE.to_string())
}

/// Everything the bot needs at startup
#[derive(Debug)]
pub struct BotConfig {
    pub bot_token: SecretString,
    pub admin_id: i64,
    pub sudo_file: PathBuf,
    pub download_dir: PathBuf,
    pub ytdl_bin: String,
    pub ytdlp_timeout: Duration,
    pub max_upload_bytes: u64,
    pub bot_api_url: Option<String>,
}

impl BotConfig {
    /// Read configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Read configuration through an arbitrary lookup function.
    ///
    /// Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let bot_token = TOKEN_VARS
            .iter()
            .find_map(|name| get(*name))
            .map(SecretString::from)
            .ok_or(ConfigError::Missing(TOKEN_VARS[0]))?;

        let admin_raw = get(ADMIN_VAR).ok_or(ConfigError::Missing(ADMIN_VAR))?;
        let admin_id = admin_raw.parse::<i64>().map_err(|_| ConfigError::Invalid {
            name: ADMIN_VAR,
            value: admin_raw.clone(),
            reason: "expected a numeric Telegram user id",
        })?;
        if admin_id == 0 {
            return Err(ConfigError::Invalid {
                name: ADMIN_VAR,
                value: admin_raw,
                reason: "0 is not a valid user id",
            });
        }

        let sudo_file = expand_path(get("SUDO_USERS_FILE").as_deref().unwrap_or(DEFAULT_SUDO_FILE));
        let download_dir = expand_path(get("DOWNLOAD_FOLDER").as_deref().unwrap_or(DEFAULT_DOWNLOAD_FOLDER));
        let ytdl_bin = get("YTDL_BIN").unwrap_or_else(|| "yt-dlp".to_string());

        let ytdlp_timeout = match get("YTDL_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(parse_positive("YTDL_TIMEOUT_SECS", raw)?),
            None => download::ytdlp_timeout(),
        };

        let max_upload_bytes = match get("MAX_UPLOAD_MB") {
            Some(raw) => parse_positive("MAX_UPLOAD_MB", raw.clone())?
                .checked_mul(1024 * 1024)
                .ok_or(ConfigError::Invalid {
                    name: "MAX_UPLOAD_MB",
                    value: raw,
                    reason: "too large",
                })?,
            None => download::MAX_UPLOAD_MB * 1024 * 1024,
        };

        Ok(Self {
            bot_token,
            admin_id,
            sudo_file,
            download_dir,
            ytdl_bin,
            ytdlp_timeout,
            max_upload_bytes,
            bot_api_url: get("BOT_API_URL"),
        })
    }
}

fn parse_positive(name: &'static str, raw: String) -> Result<u64, ConfigError> {
    match raw.parse::<u64>() {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(ConfigError::Invalid {
            name,
            value: raw,
            reason: "expected a positive integer",
        }),
    }
}

/// Supports tilde (~) expansion for home directory
fn expand_path(raw: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(raw).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn test_required_values_present() {
        let config = BotConfig::from_lookup(lookup(&[("BOT_TOKEN", "123:abc"), ("ADMIN_USER_ID", "100")])).unwrap();
        assert_eq!(config.bot_token.expose_secret(), "123:abc");
        assert_eq!(config.admin_id, 100);
        assert_eq!(config.sudo_file, PathBuf::from(DEFAULT_SUDO_FILE));
        assert_eq!(config.ytdl_bin, "yt-dlp");
        assert_eq!(config.ytdlp_timeout, download::ytdlp_timeout());
        assert_eq!(config.max_upload_bytes, download::MAX_UPLOAD_MB * 1024 * 1024);
        assert!(config.bot_api_url.is_none());
    }

    #[test]
    fn test_token_fallback_order() {
        let config = BotConfig::from_lookup(lookup(&[
            ("TELEGRAM_BOT_TOKEN", "third"),
            ("TELOXIDE_TOKEN", "second"),
            ("ADMIN_USER_ID", "7"),
        ]))
        .unwrap();
        assert_eq!(config.bot_token.expose_secret(), "second");
    }

    #[test]
    fn test_missing_token_is_fatal() {
        let err = BotConfig::from_lookup(lookup(&[("ADMIN_USER_ID", "100")])).unwrap_err();
        assert_eq!(err, ConfigError::Missing("BOT_TOKEN"));
    }

    #[test]
    fn test_missing_admin_is_fatal() {
        let err = BotConfig::from_lookup(lookup(&[("BOT_TOKEN", "x"), ("ADMIN_USER_ID", "  ")])).unwrap_err();
        assert_eq!(err, ConfigError::Missing(ADMIN_VAR));
    }

    #[test]
    fn test_invalid_admin_rejected() {
        for bad in ["abc", "0", "12.5"] {
            let err = BotConfig::from_lookup(lookup(&[("BOT_TOKEN", "x"), ("ADMIN_USER_ID", bad)])).unwrap_err();
            assert!(matches!(err, ConfigError::Invalid { name: ADMIN_VAR, .. }), "{bad}");
        }
    }

    #[test]
    fn test_optional_overrides() {
        let config = BotConfig::from_lookup(lookup(&[
            ("BOT_TOKEN", "x"),
            ("ADMIN_USER_ID", "-42"),
            ("SUDO_USERS_FILE", "/data/sudo.json"),
            ("DOWNLOAD_FOLDER", "/data/dl"),
            ("YTDL_BIN", "/usr/local/bin/yt-dlp"),
            ("YTDL_TIMEOUT_SECS", "60"),
            ("MAX_UPLOAD_MB", "50"),
            ("BOT_API_URL", "http://localhost:8081"),
        ]))
        .unwrap();
        assert_eq!(config.admin_id, -42);
        assert_eq!(config.sudo_file, PathBuf::from("/data/sudo.json"));
        assert_eq!(config.download_dir, PathBuf::from("/data/dl"));
        assert_eq!(config.ytdl_bin, "/usr/local/bin/yt-dlp");
        assert_eq!(config.ytdlp_timeout, Duration::from_secs(60));
        assert_eq!(config.max_upload_bytes, 50 * 1024 * 1024);
        assert_eq!(config.bot_api_url.as_deref(), Some("http://localhost:8081"));
    }

    #[test]
    fn test_invalid_limits_rejected() {
        let err = BotConfig::from_lookup(lookup(&[("BOT_TOKEN", "x"), ("ADMIN_USER_ID", "1"), ("MAX_UPLOAD_MB", "0")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "MAX_UPLOAD_MB", .. }));
    }

    #[test]
    fn test_upload_limit_overflow_rejected() {
        for huge in ["18446744073709551615", "17592186044416"] {
            let err = BotConfig::from_lookup(lookup(&[("BOT_TOKEN", "x"), ("ADMIN_USER_ID", "1"), ("MAX_UPLOAD_MB", huge)]))
                .unwrap_err();
            assert!(
                matches!(&err, ConfigError::Invalid { name: "MAX_UPLOAD_MB", reason: "too large", .. }),
                "{huge}: {err:?}"
            );
        }
    }

    #[test]
    fn test_debug_does_not_leak_token() {
        let config = BotConfig::from_lookup(lookup(&[("BOT_TOKEN", "super-secret"), ("ADMIN_USER_ID", "1")])).unwrap();
        assert!(!format!("{:?}", config).contains("super-secret"));
    }
}
