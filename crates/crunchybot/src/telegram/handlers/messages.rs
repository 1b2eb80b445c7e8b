//! Plain-text message handling: cookie capture and Crunchyroll links

use crunchycore::{find_media_url, looks_like_cookie_payload, AppError, SessionCookie};
use url::Url;

use super::commands::store_cookie;
use super::types::HandlerDeps;
use crate::telegram::replies;

/// What to do with a non-command text message
#[derive(Debug)]
pub enum TextAction {
    Reply(String),
    Download { url: Url, cookie: SessionCookie },
}

/// Decides the action for `text` from `user_id`.
///
/// Cookie submissions are recognized before links: a Netscape export is full
/// of `.crunchyroll.com` domains and would otherwise read as a download.
pub fn text_action(deps: &HandlerDeps, user_id: i64, text: &str) -> TextAction {
    if !deps.access.is_authorized(user_id) {
        log::warn!("Unauthorized message from user {}", user_id);
        return TextAction::Reply(replies::UNAUTHORIZED_CONTACT_ADMIN.to_string());
    }

    if deps.pending_cookies.remove(&user_id).is_some() {
        if looks_like_cookie_payload(text) || find_media_url(text).is_none() {
            let reply = store_cookie(deps, user_id, text).unwrap_or_else(|reply| {
                // still waiting for a usable export
                deps.pending_cookies.insert(user_id);
                reply
            });
            return TextAction::Reply(reply);
        }
        log::debug!("User {} sent a link instead of cookies, dropping capture", user_id);
    } else if looks_like_cookie_payload(text) {
        return TextAction::Reply(store_cookie(deps, user_id, text).unwrap_or_else(|reply| reply));
    }

    match find_media_url(text) {
        Some(url) => match deps.cookies.get_cookie(user_id) {
            Some(cookie) => TextAction::Download { url, cookie },
            None => {
                let err = AppError::MissingCookie(user_id);
                log::info!("Link from user {} refused [{}]", user_id, err.category());
                TextAction::Reply(replies::app_error(&err))
            }
        },
        None => TextAction::Reply(replies::DEFAULT_REPLY.to_string()),
    }
}
