use dashmap::DashMap;

use super::{parse_cookie_payload, CookieFormat, CookieParseError, SessionCookie};

/// What was stored by a successful [`CookieJar::set_cookie`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CookieSummary {
    pub count: usize,
    pub format: CookieFormat,
    pub expired: usize,
}

/// Per-user session cookies, in memory only.
///
/// Nothing here survives a restart. Each user's entry is replaced as a whole,
/// and different users never contend for the same shard entry.
#[derive(Debug, Default)]
pub struct CookieJar {
    sessions: DashMap<i64, SessionCookie>,
}

impl CookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses `payload` and stores it for `user_id`, replacing any previous
    /// cookie. On a parse error the previous cookie is left untouched.
    pub fn set_cookie(&self, user_id: i64, payload: &str) -> Result<CookieSummary, CookieParseError> {
        let cookie = parse_cookie_payload(payload)?;
        let summary = CookieSummary {
            count: cookie.len(),
            format: cookie.format(),
            expired: cookie.expired_count(),
        };

        self.sessions.insert(user_id, cookie);
        log::info!(
            "Stored {} cookie(s) for user {} ({}, {} expired)",
            summary.count,
            user_id,
            summary.format,
            summary.expired
        );
        Ok(summary)
    }

    /// A copy of the user's cookie, so no map guard outlives the call
    pub fn get_cookie(&self, user_id: i64) -> Option<SessionCookie> {
        self.sessions.get(&user_id).map(|c| c.value().clone())
    }

    /// Drops the user's cookie. Returns whether one was stored.
    pub fn clear_cookie(&self, user_id: i64) -> bool {
        let removed = self.sessions.remove(&user_id).is_some();
        if removed {
            log::info!("Cleared cookies for user {}", user_id);
        }
        removed
    }

    pub fn has_cookie(&self, user_id: i64) -> bool {
        self.sessions.contains_key(&user_id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
