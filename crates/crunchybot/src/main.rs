use anyhow::{anyhow, Result};
use dotenvy::dotenv;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::update_listeners::Polling;

use crunchybot::cli::{Cli, Commands};
use crunchybot::telegram::{create_bot, schema, setup_bot_commands, HandlerDeps};
use crunchycore::config::{self, BotConfig};
use crunchycore::logging::{init_logger, log_startup_configuration};
use crunchycore::{
    find_media_url, parse_cookie_payload, AccessStore, AppError, AppResult, CookieJar, FetcherSettings, MediaFetcher,
    SessionCookie, SudoFile, YtDlpFetcher,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();

    // Load environment variables from .env if present, before the logger reads LOG_FILE_PATH
    let _ = dotenv();

    // Initialize logger (console + file)
    init_logger(&config::log_file_path())?;

    match cli.command {
        None | Some(Commands::Run) => run_bot().await,
        Some(Commands::CheckConfig) => check_config().await,
        Some(Commands::Fetch { url, cookies, output }) => run_cli_fetch(&url, &cookies, &output).await,
    }
}

fn load_config() -> Result<BotConfig> {
    BotConfig::from_env().map_err(|e| {
        let err = AppError::from(e);
        log::error!("❌ [{}] {}", err.category(), err);
        err.into()
    })
}

/// Reads a cookie export from disk
async fn load_cookie_file(path: &Path) -> AppResult<SessionCookie> {
    let payload = fs_err::tokio::read_to_string(path).await?;
    Ok(parse_cookie_payload(&payload)?)
}

async fn run_bot() -> Result<()> {
    let config = load_config()?;
    log_startup_configuration(&config);

    let fetcher = YtDlpFetcher::new(FetcherSettings::from_config(&config));
    match fetcher.version().await {
        Ok(version) => log::info!("yt-dlp version: {}", version),
        Err(e) => log::warn!("⚠️  yt-dlp is not usable, downloads will fail: {}", e),
    }

    let access = Arc::new(AccessStore::open(config.admin_id, SudoFile::new(config.sudo_file.clone())));
    let cookies = Arc::new(CookieJar::new());

    let bot = create_bot(&config)?;
    let me = bot
        .get_me()
        .await
        .map_err(|e| anyhow!("Failed to connect to Bot API: {}", e))?;
    log::info!("Logged in as @{} ({})", me.username(), me.id);

    if let Err(e) = setup_bot_commands(&bot).await {
        log::warn!("Failed to register bot commands: {}", e);
    }

    let deps = HandlerDeps::new(access, cookies, Arc::new(fetcher), me.user.username.clone(), me.id);

    // Create polling listener that drops pending updates on start
    let listener = Polling::builder(bot.clone()).drop_pending_updates().build();

    log::info!("Bot started, waiting for updates");
    Dispatcher::builder(bot, schema(deps))
        .enable_ctrlc_handler()
        .build()
        .dispatch_with_listener(
            listener,
            LoggingErrorHandler::with_custom_text("An error from the update listener"),
        )
        .await;

    log::info!("Dispatcher shutdown gracefully");
    Ok(())
}

async fn check_config() -> Result<()> {
    let config = load_config()?;
    log_startup_configuration(&config);

    let fetcher = YtDlpFetcher::new(FetcherSettings::from_config(&config));
    let version = fetcher
        .version()
        .await
        .map_err(|e| anyhow!("yt-dlp check failed: {}", e))?;
    log::info!("yt-dlp version: {}", version);

    let sudo = SudoFile::new(config.sudo_file.clone());
    match sudo.load() {
        Ok(ids) => log::info!("Sudo users file OK ({} entries)", ids.len()),
        Err(e) => log::warn!("⚠️  Sudo users file unreadable, it will be replaced on the next change: {}", e),
    }

    log::info!("✅ Configuration OK");
    Ok(())
}

async fn run_cli_fetch(url: &str, cookie_path: &Path, output: &Path) -> Result<()> {
    let url = find_media_url(url).ok_or_else(|| anyhow!("Not a Crunchyroll URL: {}", url))?;
    let cookie = load_cookie_file(cookie_path).await?;
    log::info!("Loaded {} cookies ({}) from {}", cookie.len(), cookie.format(), cookie_path.display());

    let mut settings = FetcherSettings {
        max_file_size: u64::MAX,
        ..FetcherSettings::default()
    };
    if let Ok(bin) = std::env::var("YTDL_BIN") {
        settings.ytdl_bin = bin;
    }
    if let Ok(dir) = std::env::var("DOWNLOAD_FOLDER") {
        settings.download_dir = PathBuf::from(shellexpand::tilde(&dir).into_owned());
    }

    let fetcher = YtDlpFetcher::new(settings);
    let media = fetcher.fetch(&url, &cookie).await?;
    log::info!("Downloaded {} ({:.2} MB)", media.title, media.size_mb());

    let dest = media.persist_to(output).await?;
    log::info!("✅ Saved to {}", dest.display());
    Ok(())
}
