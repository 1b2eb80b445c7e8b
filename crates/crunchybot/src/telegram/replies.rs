//! User-facing texts. Everything is sent with HTML parse mode.

use crunchycore::cookies::CookieSummary;
use crunchycore::{AccessError, AppError, CookieParseError, DownloadError, FetchedMedia, Role};
use indoc::{formatdoc, indoc};
use itertools::Itertools;
use teloxide::utils::html::escape;

pub const NOT_AUTHORIZED: &str = "⚠️ You are not authorized to use this bot.";
pub const UNAUTHORIZED_CONTACT_ADMIN: &str = "⚠️ Unauthorized. Contact admin.";
pub const ADMIN_ONLY: &str = "⛔ Only the admin can manage sudo users.";
pub const COOKIES_CLEARED: &str = "🧹 Cookies cleared successfully!";
pub const NO_COOKIES_TO_CLEAR: &str = "🧹 You had no cookies saved.";
pub const MISSING_COOKIE: &str = "⚠️ Set your cookies first using /setcookie";
pub const DEFAULT_REPLY: &str = "Send a Crunchyroll link or /help.";
pub const NO_SUDO_USERS: &str = "No sudo users.";
pub const INVALID_ID: &str = "❌ Invalid ID";
pub const ADMIN_IS_PERMANENT: &str = "👑 The admin always has access; nothing to change.";
pub const STARTING_DOWNLOAD: &str = "⏳ Starting download...";
pub const DOWNLOADING: &str = "📥 Downloading video... please wait";
pub const SUDO_NOT_SAVED: &str = "⚠️ The change is active but could not be saved to disk; see the logs.";

pub fn start() -> String {
    indoc! {"
        🎌 <b>Crunchyroll Downloader Bot</b>

        <b>Commands:</b>
        /start - Show this message
        /help - Help on using cookies
        /setcookie - Set your Crunchyroll cookies
        /clearcookie - Clear your saved cookies
        /mysudo - Check your sudo status

        <b>Admin:</b>
        /addsudo &lt;id&gt;, /removesudo &lt;id&gt;, /listsudo

        <b>Usage:</b>
        1️⃣ Get your cookies using Cookie-Editor (Export JSON)
        2️⃣ Send /setcookie and paste the JSON
        3️⃣ Send a Crunchyroll URL to download
    "}
    .to_string()
}

pub fn help() -> String {
    indoc! {"
        <b>How to get Crunchyroll cookies (JSON):</b>
        1. Install the Cookie-Editor extension
        2. Log in to https://www.crunchyroll.com
        3. Click Cookie-Editor → Export → JSON
        4. Copy the full JSON text
        5. Send /setcookie and paste the JSON directly here

        A Netscape <code>cookies.txt</code> export or a raw <code>Cookie:</code> header works too.

        After that, send any Crunchyroll video URL to download 🎥
    "}
    .to_string()
}

pub fn setcookie_instructions() -> String {
    indoc! {r#"
        Please send your Crunchyroll cookies as JSON (from Cookie-Editor → Export → JSON).

        Example:
        <pre>[
          {"domain": ".crunchyroll.com", "name": "etp_rt", "value": "abc123"}
        ]</pre>

        Your next message will be saved as your cookies.
    "#}
    .to_string()
}

pub fn cookies_saved(summary: &CookieSummary) -> String {
    let mut text = format!(
        "✅ Cookies saved successfully! ({} cookie{}, {})",
        summary.count,
        if summary.count == 1 { "" } else { "s" },
        summary.format
    );
    if summary.expired > 0 {
        text.push_str(&format!(
            "\n⚠️ {} of them already expired; downloads may fail until you export fresh ones.",
            summary.expired
        ));
    }
    text
}

pub fn invalid_cookies(err: &CookieParseError) -> String {
    formatdoc! {"
        ❌ Invalid cookie data: {}

        Send /setcookie and paste your cookies again.",
        escape(&err.to_string())
    }
}

pub fn my_sudo(user_id: i64, role: Role) -> String {
    let role = match role {
        Role::Admin => "👑 Admin",
        Role::Sudo => "🔐 Sudo",
        Role::User => "👤 User",
    };
    format!("<b>User ID:</b> <code>{}</code>\n<b>Role:</b> {}", user_id, role)
}

pub fn usage(verb: &str) -> String {
    format!("Usage: /{} &lt;user_id&gt;", verb)
}

pub fn sudo_added(user_id: i64) -> String {
    format!("✅ Added sudo user <code>{}</code>", user_id)
}

pub fn sudo_already_present(user_id: i64) -> String {
    format!("ℹ️ <code>{}</code> is already a sudo user", user_id)
}

pub fn sudo_removed(user_id: i64) -> String {
    format!("🗑 Removed sudo user <code>{}</code>", user_id)
}

pub fn sudo_not_present(user_id: i64) -> String {
    format!("❌ <code>{}</code> is not in the sudo list.", user_id)
}

pub fn sudo_list(ids: &[i64]) -> String {
    if ids.is_empty() {
        return NO_SUDO_USERS.to_string();
    }
    format!(
        "<b>Sudo Users:</b>\n{}",
        ids.iter().map(|id| format!("• <code>{}</code>", id)).join("\n")
    )
}

pub fn uploading(size_mb: f64) -> String {
    format!("📤 Uploading to Telegram...\nSize: {:.2} MB", size_mb)
}

pub fn caption(media: &FetchedMedia) -> String {
    format!("🎌 {}\n📦 {:.2} MB", escape(&media.title), media.size_mb())
}

pub fn download_error(err: &DownloadError) -> String {
    let mut text = format!("❌ Error: {}", escape(&err.to_string()));
    if err.is_cookie_problem() {
        text.push_str("\n\nExport fresh cookies and send them with /setcookie.");
    }
    text
}

pub fn upload_error(err: &teloxide::RequestError) -> String {
    format!("❌ Error: upload failed: {}", escape(&err.to_string()))
}

/// Reply for any failure that reaches the user
pub fn app_error(err: &AppError) -> String {
    match err {
        AppError::Access(AccessError::PermissionDenied) => ADMIN_ONLY.to_string(),
        AppError::Access(AccessError::Storage { .. }) => SUDO_NOT_SAVED.to_string(),
        AppError::InvalidFormat(e) => invalid_cookies(e),
        AppError::MissingCookie(_) => MISSING_COOKIE.to_string(),
        AppError::Download(e) => download_error(e),
        AppError::Telegram(e) => upload_error(e),
        other => format!("❌ Error: {}", escape(&other.to_string())),
    }
}
