//! Handler types and dependencies

use std::sync::Arc;

use crunchycore::{AccessStore, CookieJar, MediaFetcher};
use dashmap::DashSet;
use teloxide::types::{Message, UserId};

/// Error type for handlers
pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Dependencies required by handlers
#[derive(Clone)]
pub struct HandlerDeps {
    pub access: Arc<AccessStore>,
    pub cookies: Arc<CookieJar>,
    pub fetcher: Arc<dyn MediaFetcher>,
    /// Users whose next plain message is a cookie payload (armed by a bare /setcookie)
    pub pending_cookies: Arc<DashSet<i64>>,
    pub bot_username: Option<String>,
    pub bot_id: UserId,
}

impl HandlerDeps {
    /// Create new handler dependencies
    pub fn new(
        access: Arc<AccessStore>,
        cookies: Arc<CookieJar>,
        fetcher: Arc<dyn MediaFetcher>,
        bot_username: Option<String>,
        bot_id: UserId,
    ) -> Self {
        Self {
            access,
            cookies,
            fetcher,
            pending_cookies: Arc::new(DashSet::new()),
            bot_username,
            bot_id,
        }
    }
}

/// Telegram user id of the sender, as the stores key it.
///
/// Messages without a sender (channel posts) have none and are ignored.
pub fn sender_id(msg: &Message) -> Option<i64> {
    msg.from.as_ref().and_then(|u| i64::try_from(u.id.0).ok())
}
