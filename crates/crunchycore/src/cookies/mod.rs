//! Session cookies submitted by users
//!
//! Users paste their browser session in one of three shapes:
//! - JSON as exported by Cookie-Editor (a list of cookie objects, an object
//!   with a `cookies` list, or a plain `name -> value` map)
//! - a raw `Cookie:` header (`name=value; name2=value2`)
//! - a Netscape cookies.txt export (7 tab-separated fields per line)
//!
//! Whatever the input, it is normalized into a list of [`CookieEntry`] so it
//! can be rendered back as a Netscape file for yt-dlp. Cookies live only in
//! the in-memory [`CookieJar`]; they are never written anywhere except the
//! short-lived file a single yt-dlp run reads.

mod jar;
mod parse;

pub use jar::{CookieJar, CookieSummary};
pub use parse::{looks_like_cookie_payload, parse_cookie_payload};

use std::fmt;
use strum::Display;
use thiserror::Error;

/// Domain assumed when a submission does not name one
pub const DEFAULT_DOMAIN: &str = ".crunchyroll.com";

const NETSCAPE_HEADER: &str = "# Netscape HTTP Cookie File";
const HTTP_ONLY_PREFIX: &str = "#HttpOnly_";

#[derive(Debug, Error)]
pub enum CookieParseError {
    #[error("cookie data is empty")]
    Empty,

    #[error("not valid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),

    #[error("unsupported JSON layout: expected a list of cookies with `name` and `value`")]
    UnsupportedJson,

    #[error("line {line}: {reason}")]
    MalformedLine { line: usize, reason: &'static str },

    #[error("`{segment}` is not a name=value pair")]
    MalformedPair { segment: String },

    #[error("cookie `{name}` contains a tab or line break")]
    ControlCharacter { name: String },

    #[error("no cookies found")]
    NoCookies,
}

/// Shape a payload was submitted in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum CookieFormat {
    #[strum(serialize = "JSON")]
    Json,
    #[strum(serialize = "Cookie header")]
    Header,
    #[strum(serialize = "Netscape")]
    Netscape,
}

/// One cookie, in the fields a Netscape file carries
#[derive(Clone, PartialEq, Eq)]
pub struct CookieEntry {
    pub domain: String,
    pub include_subdomains: bool,
    pub path: String,
    pub secure: bool,
    /// Unix timestamp, 0 for session cookies
    pub expires: i64,
    pub name: String,
    pub value: String,
    pub http_only: bool,
}

impl CookieEntry {
    /// Show only the first and last few chars of the value
    pub fn masked_value(&self) -> String {
        let chars: Vec<char> = self.value.chars().collect();
        let len = chars.len();
        if len <= 8 {
            "*".repeat(len)
        } else {
            let head: String = chars[..4].iter().collect();
            let tail: String = chars[len - 4..].iter().collect();
            format!("{}...{}", head, tail)
        }
    }

    pub fn is_session(&self) -> bool {
        self.expires == 0
    }

    /// Check if cookie is expired at `now` (unix seconds)
    pub fn is_expired_at(&self, now: i64) -> bool {
        !self.is_session() && self.expires < now
    }

    fn netscape_line(&self) -> String {
        let domain = if self.http_only {
            format!("{}{}", HTTP_ONLY_PREFIX, self.domain)
        } else {
            self.domain.clone()
        };
        format!(
            "{}\t{}\t{}\t{}\t{}\t{}\t{}",
            domain,
            bool_flag(self.include_subdomains),
            self.path,
            bool_flag(self.secure),
            self.expires,
            self.name,
            self.value
        )
    }
}

impl fmt::Debug for CookieEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CookieEntry")
            .field("domain", &self.domain)
            .field("path", &self.path)
            .field("secure", &self.secure)
            .field("expires", &self.expires)
            .field("name", &self.name)
            .field("value", &self.masked_value())
            .finish()
    }
}

fn bool_flag(value: bool) -> &'static str {
    if value {
        "TRUE"
    } else {
        "FALSE"
    }
}

/// A parsed session, ready to hand to yt-dlp
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionCookie {
    format: CookieFormat,
    entries: Vec<CookieEntry>,
}

impl SessionCookie {
    pub(crate) fn new(format: CookieFormat, entries: Vec<CookieEntry>) -> Self {
        Self { format, entries }
    }

    pub fn entries(&self) -> &[CookieEntry] {
        &self.entries
    }

    pub fn format(&self) -> CookieFormat {
        self.format
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Render as a cookies.txt file
    pub fn to_netscape(&self) -> String {
        let mut out = String::from(NETSCAPE_HEADER);
        out.push('\n');
        for entry in &self.entries {
            out.push_str(&entry.netscape_line());
            out.push('\n');
        }
        out
    }

    /// Render as a `Cookie` request header value
    pub fn header_value(&self) -> String {
        self.entries
            .iter()
            .map(|e| format!("{}={}", e.name, e.value))
            .collect::<Vec<_>>()
            .join("; ")
    }

    /// Number of cookies already past their expiry
    pub fn expired_count(&self) -> usize {
        let now = chrono::Utc::now().timestamp();
        self.entries.iter().filter(|e| e.is_expired_at(now)).count()
    }
}
