//! Outgoing messages and the download → upload flow

use std::sync::Arc;

use crunchycore::{AppResult, FetchedMedia, MediaFetcher, SessionCookie};
use teloxide::prelude::*;
use teloxide::types::{InputFile, Message, ParseMode};
use teloxide::RequestError;
use url::Url;

use crate::telegram::replies;

fn is_html_parse_error(err: &RequestError) -> bool {
    err.to_string().to_lowercase().contains("can't parse entities")
}

/// Send an HTML message, falling back to plain text if Telegram rejects the markup.
pub async fn send_reply(bot: &Bot, chat_id: ChatId, text: impl Into<String>) -> ResponseResult<Message> {
    let text = text.into();
    match bot.send_message(chat_id, text.clone()).parse_mode(ParseMode::Html).await {
        Ok(msg) => Ok(msg),
        Err(e) if is_html_parse_error(&e) => {
            log::warn!("HTML rejected for chat {}, resending as plain text: {}", chat_id, e);
            bot.send_message(chat_id, text).await
        }
        Err(e) => Err(e),
    }
}

/// Replace the status message text, or post a new one if there is none
async fn update_status(bot: &Bot, chat_id: ChatId, status: Option<&Message>, text: String) {
    let result = match status {
        Some(status) => bot
            .edit_message_text(chat_id, status.id, text)
            .parse_mode(ParseMode::Html)
            .await
            .map(|_| ()),
        None => send_reply(bot, chat_id, text).await.map(|_| ()),
    };
    if let Err(e) = result {
        log::warn!("Failed to update status in chat {}: {}", chat_id, e);
    }
}

/// Upload a fetched file as a streamable video, or as a document when
/// Telegram refuses it as video.
pub async fn send_fetched_media(bot: &Bot, chat_id: ChatId, media: &FetchedMedia) -> ResponseResult<Message> {
    let caption = replies::caption(media);
    let video = bot
        .send_video(chat_id, InputFile::file(media.path.clone()).file_name(media.file_name()))
        .caption(caption.clone())
        .parse_mode(ParseMode::Html)
        .supports_streaming(true)
        .await;

    match video {
        Ok(msg) => Ok(msg),
        // a dropped connection will not do better the second time
        Err(e @ RequestError::Network(_)) => Err(e),
        Err(e) => {
            log::warn!("send_video failed for {} ({}), retrying as document", media.file_name(), e);
            bot.send_document(chat_id, InputFile::file(media.path.clone()).file_name(media.file_name()))
                .caption(caption)
                .parse_mode(ParseMode::Html)
                .await
        }
    }
}

/// Fetch `url` with the user's session and deliver the file to `chat_id`.
///
/// Progress is reported by editing one status message; on success it is
/// deleted once the file is delivered. The local file never outlives the call.
pub async fn download_and_send(
    bot: Bot,
    chat_id: ChatId,
    fetcher: Arc<dyn MediaFetcher>,
    url: Url,
    cookie: SessionCookie,
) {
    log::info!("Download requested in chat {}: {}", chat_id, url);

    let status = match send_reply(&bot, chat_id, replies::STARTING_DOWNLOAD).await {
        Ok(msg) => Some(msg),
        Err(e) => {
            log::warn!("Failed to post status in chat {}: {}", chat_id, e);
            None
        }
    };
    update_status(&bot, chat_id, status.as_ref(), replies::DOWNLOADING.to_string()).await;

    match fetch_and_upload(&bot, chat_id, fetcher.as_ref(), &url, &cookie, status.as_ref()).await {
        Ok(()) => {
            if let Some(status) = &status {
                if let Err(e) = bot.delete_message(chat_id, status.id).await {
                    log::debug!("Could not delete status message: {}", e);
                }
            }
        }
        Err(e) => {
            log::error!("{} for chat {} failed [{}]: {}", url, chat_id, e.category(), e);
            update_status(&bot, chat_id, status.as_ref(), replies::app_error(&e)).await;
        }
    }
}

async fn fetch_and_upload(
    bot: &Bot,
    chat_id: ChatId,
    fetcher: &dyn MediaFetcher,
    url: &Url,
    cookie: &SessionCookie,
    status: Option<&Message>,
) -> AppResult<()> {
    let media = fetcher.fetch(url, cookie).await?;
    log::info!(
        "{} fetched {} ({:.2} MB) for chat {}",
        fetcher.name(),
        media.file_name(),
        media.size_mb(),
        chat_id
    );
    update_status(bot, chat_id, status, replies::uploading(media.size_mb())).await;

    let sent = send_fetched_media(bot, chat_id, &media).await;
    media.remove_file().await;
    sent?;

    log::info!("Delivered {} to chat {}", media.file_name(), chat_id);
    Ok(())
}
