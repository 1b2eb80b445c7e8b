//! Cookie submissions as users paste them

use crunchycore::cookies::CookieFormat;
use crunchycore::{AppError, CookieJar, CookieParseError};
use pretty_assertions::assert_eq;

const COOKIE_EDITOR_EXPORT: &str = r#"[
{
    "domain": ".crunchyroll.com",
    "expirationDate": 1924991999.123,
    "hostOnly": false,
    "httpOnly": true,
    "name": "etp_rt",
    "path": "/",
    "sameSite": "lax",
    "secure": true,
    "session": false,
    "storeId": "0",
    "value": "a1b2c3d4-e5f6-7890"
},
{
    "domain": "www.crunchyroll.com",
    "hostOnly": true,
    "httpOnly": false,
    "name": "ajs_anonymous_id",
    "path": "/",
    "secure": false,
    "session": true,
    "value": "anon"
}
]"#;

#[test]
fn test_malformed_submission_leaves_nothing() {
    let jar = CookieJar::new();
    let err = jar.set_cookie(200, "<malformed>").unwrap_err();
    assert!(jar.get_cookie(200).is_none());

    let app_err = AppError::from(err);
    assert_eq!(app_err.category(), "invalid_format");
}

#[test]
fn test_cookie_editor_export_renders_for_ytdlp() {
    let jar = CookieJar::new();
    let summary = jar.set_cookie(200, COOKIE_EDITOR_EXPORT).unwrap();
    assert_eq!(summary.count, 2);
    assert_eq!(summary.format, CookieFormat::Json);
    assert_eq!(summary.expired, 0);

    let cookie = jar.get_cookie(200).unwrap();
    assert_eq!(
        cookie.to_netscape(),
        "# Netscape HTTP Cookie File\n\
         .crunchyroll.com\tTRUE\t/\tTRUE\t1924991999\tetp_rt\ta1b2c3d4-e5f6-7890\n\
         www.crunchyroll.com\tFALSE\t/\tFALSE\t0\tajs_anonymous_id\tanon\n"
    );
}

#[test]
fn test_all_three_formats_are_accepted() {
    let jar = CookieJar::new();

    let json = jar.set_cookie(1, r#"[{"name": "etp_rt", "value": "x"}]"#).unwrap();
    let header = jar.set_cookie(2, "etp_rt=x; session_id=y").unwrap();
    let netscape = jar
        .set_cookie(3, "# Netscape HTTP Cookie File\n.crunchyroll.com\tTRUE\t/\tTRUE\t0\tetp_rt\tx\n")
        .unwrap();

    assert_eq!(json.format, CookieFormat::Json);
    assert_eq!(header.format, CookieFormat::Header);
    assert_eq!(netscape.format, CookieFormat::Netscape);
    assert_eq!(jar.len(), 3);
}

#[test]
fn test_expired_cookies_are_counted_but_stored() {
    let jar = CookieJar::new();
    let summary = jar
        .set_cookie(200, r#"[{"name": "etp_rt", "value": "x", "expirationDate": 1000}]"#)
        .unwrap();
    assert_eq!(summary.expired, 1);
    assert!(jar.has_cookie(200));
}

#[test]
fn test_failed_overwrite_keeps_working_session() {
    let jar = CookieJar::new();
    jar.set_cookie(200, COOKIE_EDITOR_EXPORT).unwrap();

    assert!(matches!(jar.set_cookie(200, "   "), Err(CookieParseError::Empty)));
    assert!(matches!(jar.set_cookie(200, "[not json"), Err(CookieParseError::InvalidJson(_))));

    assert_eq!(jar.get_cookie(200).unwrap().len(), 2);
}
