//! Logging initialization and startup diagnostics
//!
//! This module provides:
//! - Logger initialization (console + file)
//! - The startup banner with the non-secret configuration

use anyhow::Result;
use simplelog::*;
use std::str::FromStr;

use crate::config::BotConfig;

/// Environment variable overriding the log level (`error` .. `trace`)
pub const LOG_LEVEL_VAR: &str = "LOG_LEVEL";

/// Level from `LOG_LEVEL`, `Info` when unset or unknown
pub fn level_from_env() -> LevelFilter {
    std::env::var(LOG_LEVEL_VAR)
        .ok()
        .and_then(|v| LevelFilter::from_str(v.trim()).ok())
        .unwrap_or(LevelFilter::Info)
}

/// Initialize logger for both console and file output
///
/// The log file is appended to, so restarts keep history.
///
/// # Arguments
/// * `log_file_path` - Path to the log file
pub fn init_logger(log_file_path: &str) -> Result<()> {
    let log_file = fs_err::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file_path)
        .map_err(|e| anyhow::anyhow!("Failed to open log file: {}", e))?;

    let level = level_from_env();
    let config = ConfigBuilder::new()
        .add_filter_ignore_str("hyper")
        .add_filter_ignore_str("rustls")
        .add_filter_ignore_str("reqwest")
        .build();

    CombinedLogger::init(vec![
        TermLogger::new(level, config.clone(), TerminalMode::Mixed, ColorChoice::Auto),
        WriteLogger::new(level, config, log_file),
    ])
    .map_err(|e| anyhow::anyhow!("Failed to initialize logger: {}", e))?;

    Ok(())
}

/// Logs the configuration the bot starts with. The token is never logged.
pub fn log_startup_configuration(config: &BotConfig) {
    log::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    log::info!("🎌 crunchydl starting");
    log::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    log::info!("Admin user id: {}", config.admin_id);
    log::info!("Sudo users file: {}", config.sudo_file.display());
    log::info!("Download folder: {}", config.download_dir.display());
    log::info!("yt-dlp binary: {}", config.ytdl_bin);
    log::info!("yt-dlp timeout: {}s", config.ytdlp_timeout.as_secs());
    log::info!("Upload limit: {} MB", config.max_upload_bytes / (1024 * 1024));
    match &config.bot_api_url {
        Some(url) => log::info!("Bot API: {}", url),
        None => log::info!("Bot API: api.telegram.org"),
    }
    if config.bot_api_url.is_none() && config.max_upload_bytes > crate::config::download::STANDARD_UPLOAD_LIMIT_BYTES {
        log::warn!("⚠️  The public Bot API rejects uploads over 50 MB; set BOT_API_URL to a local server for episodes");
    }
}
