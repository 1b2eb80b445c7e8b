//! Conversations driven through the public handler API, from raw message
//! text to the reply or download decision.

use std::sync::Arc;

use async_trait::async_trait;
use crunchybot::telegram::handlers::{command_reply, text_action, TextAction};
use crunchybot::telegram::{parse_command, replies, HandlerDeps};
use crunchycore::{AccessStore, CookieJar, DownloadError, FetchedMedia, MediaFetcher, SessionCookie, SudoFile};
use pretty_assertions::assert_eq;
use teloxide::types::UserId;
use tempfile::TempDir;
use url::Url;

const ADMIN: i64 = 100;
const BOT: &str = "crunchy_bot";

struct UnusedFetcher;

#[async_trait]
impl MediaFetcher for UnusedFetcher {
    fn name(&self) -> &str {
        "unused"
    }

    async fn fetch(&self, _url: &Url, _cookie: &SessionCookie) -> Result<FetchedMedia, DownloadError> {
        Err(DownloadError::DownloadFailed("unused".to_string()))
    }
}

struct Harness {
    dir: TempDir,
    deps: HandlerDeps,
}

impl Harness {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let deps = Self::deps_for(&dir);
        Self { dir, deps }
    }

    fn deps_for(dir: &TempDir) -> HandlerDeps {
        let access = AccessStore::open(ADMIN, SudoFile::new(dir.path().join("sudo_users.json")));
        HandlerDeps::new(
            Arc::new(access),
            Arc::new(CookieJar::new()),
            Arc::new(UnusedFetcher),
            Some(BOT.to_string()),
            UserId(42),
        )
    }

    /// Simulates a restart: same sudo file, fresh memory
    fn restart(&mut self) {
        self.deps = Self::deps_for(&self.dir);
    }

    /// Routes `text` the way the dispatcher does: commands first, then plain text
    fn send(&self, user_id: i64, text: &str) -> TextAction {
        match parse_command(text, BOT) {
            Some(cmd) => TextAction::Reply(command_reply(&self.deps, user_id, &cmd)),
            None => text_action(&self.deps, user_id, text),
        }
    }

    fn reply(&self, user_id: i64, text: &str) -> String {
        match self.send(user_id, text) {
            TextAction::Reply(reply) => reply,
            TextAction::Download { url, .. } => panic!("unexpected download of {}", url),
        }
    }
}

#[test]
fn test_sudo_user_onboarding_to_download() {
    let h = Harness::new();
    let episode = "https://www.crunchyroll.com/watch/GRDQPM1ZY/to-you-2000-years-from-now";

    assert_eq!(h.reply(200, episode), replies::UNAUTHORIZED_CONTACT_ADMIN);
    assert!(h.reply(200, "/mysudo").contains("<code>200</code>"));

    assert_eq!(h.reply(ADMIN, "/addsudo 200"), replies::sudo_added(200));

    assert_eq!(h.reply(200, episode), replies::MISSING_COOKIE);
    let saved = h.reply(
        200,
        "/setcookie\n[{\"domain\": \".crunchyroll.com\", \"name\": \"etp_rt\", \"value\": \"tok\"}]",
    );
    assert!(saved.starts_with("✅ Cookies saved successfully! (1 cookie, JSON)"));

    match h.send(200, episode) {
        TextAction::Download { url, cookie } => {
            assert_eq!(url.as_str(), episode);
            assert_eq!(
                cookie.to_netscape().lines().last().unwrap(),
                ".crunchyroll.com\tTRUE\t/\tFALSE\t0\tetp_rt\ttok"
            );
        }
        other => panic!("expected download, got {:?}", other),
    }
}

#[test]
fn test_sudo_survives_restart_but_cookies_do_not() {
    let mut h = Harness::new();
    h.reply(ADMIN, "/addsudo 200");
    h.reply(200, "/setcookie etp_rt=tok");
    assert!(h.deps.cookies.has_cookie(200));

    h.restart();

    assert!(h.reply(200, "/mysudo").contains("🔐 Sudo"));
    assert!(!h.deps.cookies.has_cookie(200));
    assert_eq!(
        h.reply(200, "https://www.crunchyroll.com/watch/GRDQPM1ZY"),
        replies::MISSING_COOKIE
    );
}

#[test]
fn test_revoked_user_loses_access() {
    let h = Harness::new();
    h.reply(ADMIN, "/addsudo 200");
    assert_eq!(h.reply(ADMIN, "/removesudo 200"), replies::sudo_removed(200));

    assert_eq!(h.reply(200, "/start"), replies::NOT_AUTHORIZED);
    assert_eq!(h.reply(ADMIN, "/listsudo"), replies::NO_SUDO_USERS);
}

#[test]
fn test_two_step_setcookie() {
    let h = Harness::new();
    assert_eq!(h.reply(ADMIN, "/setcookie"), replies::setcookie_instructions());

    let export = "# Netscape HTTP Cookie File\n.crunchyroll.com\tTRUE\t/\tTRUE\t0\tetp_rt\tabc\n";
    let saved = h.reply(ADMIN, export);
    assert!(saved.starts_with("✅ Cookies saved successfully! (1 cookie, Netscape)"));
    assert_eq!(h.deps.cookies.get_cookie(ADMIN).unwrap().header_value(), "etp_rt=abc");
}

#[test]
fn test_commands_for_other_bots_are_not_ours() {
    let h = Harness::new();
    // falls through to plain text handling
    assert_eq!(h.reply(ADMIN, "/start@other_bot"), replies::DEFAULT_REPLY);
    assert_eq!(h.reply(ADMIN, "/start@crunchy_bot"), replies::start());
}
