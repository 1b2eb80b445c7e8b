use lazy_regex::regex_is_match;
use serde::Deserialize;
use std::collections::BTreeMap;

use super::{CookieEntry, CookieFormat, CookieParseError, SessionCookie, DEFAULT_DOMAIN, HTTP_ONLY_PREFIX, NETSCAPE_HEADER};

/// Cookie object as exported by Cookie-Editor and similar extensions
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JsonCookie {
    name: String,
    value: String,
    #[serde(default)]
    domain: Option<String>,
    #[serde(default)]
    path: Option<String>,
    #[serde(default)]
    secure: bool,
    #[serde(default)]
    expiration_date: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum JsonPayload {
    List(Vec<JsonCookie>),
    Wrapped { cookies: Vec<JsonCookie> },
    Single(JsonCookie),
    Map(BTreeMap<String, String>),
}

/// Parse a user submission into a [`SessionCookie`].
///
/// The shape is picked from the text itself: a leading `[` or `{` means JSON,
/// a Netscape header or a 7-field tab line means cookies.txt, anything else is
/// read as a raw `Cookie` header.
pub fn parse_cookie_payload(input: &str) -> Result<SessionCookie, CookieParseError> {
    let text = strip_code_fence(input.trim());
    if text.is_empty() {
        return Err(CookieParseError::Empty);
    }

    let (format, entries) = if text.starts_with('[') || text.starts_with('{') {
        (CookieFormat::Json, parse_json(text)?)
    } else if looks_like_netscape(text) {
        (CookieFormat::Netscape, parse_netscape(text)?)
    } else {
        (CookieFormat::Header, parse_header(text)?)
    };

    if entries.is_empty() {
        return Err(CookieParseError::NoCookies);
    }
    for entry in &entries {
        check_fields(entry)?;
    }

    Ok(SessionCookie::new(format, entries))
}

/// True for text that should be taken as a cookie submission even without
/// `/setcookie`: JSON-looking input or a Netscape export.
pub fn looks_like_cookie_payload(input: &str) -> bool {
    let text = strip_code_fence(input.trim());
    text.starts_with('[') || text.starts_with('{') || looks_like_netscape(text)
}

/// Telegram users often paste exports inside a ``` block
fn strip_code_fence(text: &str) -> &str {
    let Some(inner) = text.strip_prefix("```") else {
        return text;
    };
    let inner = inner.strip_suffix("```").unwrap_or(inner);
    // drop an optional language tag on the opening line
    let inner = match inner.split_once('\n') {
        Some((tag, rest)) if regex_is_match!(r"^[A-Za-z]*$", tag.trim()) => rest,
        _ => inner,
    };
    inner.trim()
}

fn looks_like_netscape(text: &str) -> bool {
    text.lines().any(|l| l.contains(NETSCAPE_HEADER))
        || text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && (!l.starts_with('#') || l.starts_with(HTTP_ONLY_PREFIX)))
            .any(|l| l.split('\t').count() >= 7)
}

fn parse_json(text: &str) -> Result<Vec<CookieEntry>, CookieParseError> {
    let value: serde_json::Value = serde_json::from_str(text).map_err(CookieParseError::InvalidJson)?;
    let payload: JsonPayload = serde_json::from_value(value).map_err(|_| CookieParseError::UnsupportedJson)?;

    let entries = match payload {
        JsonPayload::List(cookies) | JsonPayload::Wrapped { cookies } => {
            cookies.into_iter().filter(|c| !c.name.is_empty()).map(from_json).collect()
        }
        JsonPayload::Single(cookie) => vec![from_json(cookie)],
        JsonPayload::Map(map) => map
            .into_iter()
            .filter(|(name, _)| !name.is_empty())
            .map(|(name, value)| default_entry(name, value))
            .collect(),
    };
    Ok(entries)
}

fn from_json(cookie: JsonCookie) -> CookieEntry {
    let domain = cookie
        .domain
        .filter(|d| !d.is_empty())
        .unwrap_or_else(|| DEFAULT_DOMAIN.to_string());
    CookieEntry {
        include_subdomains: domain.starts_with('.'),
        domain,
        path: cookie.path.filter(|p| !p.is_empty()).unwrap_or_else(|| "/".to_string()),
        secure: cookie.secure,
        // float seconds; truncation is what cookies.txt exporters do
        expires: cookie.expiration_date.map(|e| e as i64).unwrap_or(0),
        name: cookie.name,
        value: cookie.value,
        http_only: false,
    }
}

fn default_entry(name: String, value: String) -> CookieEntry {
    CookieEntry {
        domain: DEFAULT_DOMAIN.to_string(),
        include_subdomains: true,
        path: "/".to_string(),
        secure: false,
        expires: 0,
        name,
        value,
        http_only: false,
    }
}

fn parse_netscape(text: &str) -> Result<Vec<CookieEntry>, CookieParseError> {
    let mut entries = Vec::new();

    for (idx, raw) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }

        let (line, http_only) = match line.strip_prefix(HTTP_ONLY_PREFIX) {
            Some(rest) => (rest, true),
            None if line.trim_start().starts_with('#') => continue,
            None => (line, false),
        };

        // tabs sometimes turn into spaces when copied through a chat client
        let parts: Vec<&str> = if line.contains('\t') {
            line.split('\t').collect()
        } else {
            line.split_whitespace().collect()
        };
        if parts.len() < 7 {
            return Err(CookieParseError::MalformedLine {
                line: line_no,
                reason: "expected 7 tab-separated fields",
            });
        }

        let include_subdomains = parse_flag(parts[1]).ok_or(CookieParseError::MalformedLine {
            line: line_no,
            reason: "include-subdomains flag must be TRUE or FALSE",
        })?;
        let secure = parse_flag(parts[3]).ok_or(CookieParseError::MalformedLine {
            line: line_no,
            reason: "secure flag must be TRUE or FALSE",
        })?;
        let expires = parts[4].trim().parse::<i64>().map_err(|_| CookieParseError::MalformedLine {
            line: line_no,
            reason: "expiry must be a unix timestamp",
        })?;
        let name = parts[5].trim();
        if name.is_empty() {
            return Err(CookieParseError::MalformedLine {
                line: line_no,
                reason: "cookie name is empty",
            });
        }

        entries.push(CookieEntry {
            domain: parts[0].trim().to_string(),
            include_subdomains,
            path: parts[2].trim().to_string(),
            secure,
            expires,
            name: name.to_string(),
            // values may legitimately contain spaces; rejoin the split remainder
            value: parts[6..].join(if line.contains('\t') { "\t" } else { " " }),
            http_only,
        });
    }

    Ok(entries)
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_uppercase().as_str() {
        "TRUE" => Some(true),
        "FALSE" => Some(false),
        _ => None,
    }
}

fn parse_header(text: &str) -> Result<Vec<CookieEntry>, CookieParseError> {
    let body = match text.split_once(':') {
        Some((prefix, rest)) if prefix.trim().eq_ignore_ascii_case("cookie") => rest,
        _ => text,
    };

    body.split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|segment| match segment.split_once('=') {
            Some((name, value)) if regex_is_match!(r"^[!#$%&'*+\-.^_`|~0-9A-Za-z]+$", name.trim()) => {
                Ok(default_entry(name.trim().to_string(), value.trim().to_string()))
            }
            _ => Err(CookieParseError::MalformedPair {
                segment: segment.chars().take(32).collect(),
            }),
        })
        .collect()
}

fn check_fields(entry: &CookieEntry) -> Result<(), CookieParseError> {
    let bad = |s: &str| s.contains(['\t', '\n', '\r']);
    if bad(&entry.name) || bad(&entry.value) || bad(&entry.domain) || bad(&entry.path) {
        return Err(CookieParseError::ControlCharacter {
            name: entry.name.clone(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_cookie_editor_json() {
        let json = r#"[
            {"domain": ".crunchyroll.com", "name": "etp_rt", "value": "abc123", "secure": true,
             "expirationDate": 1900000000.75, "path": "/", "httpOnly": true, "hostOnly": false},
            {"domain": "www.crunchyroll.com", "name": "device_id", "value": "xyz"},
            {"name": "session_id", "value": "s1"}
        ]"#;
        let cookie = parse_cookie_payload(json).unwrap();
        assert_eq!(cookie.format(), CookieFormat::Json);
        assert_eq!(
            cookie.to_netscape(),
            "# Netscape HTTP Cookie File\n\
             .crunchyroll.com\tTRUE\t/\tTRUE\t1900000000\tetp_rt\tabc123\n\
             www.crunchyroll.com\tFALSE\t/\tFALSE\t0\tdevice_id\txyz\n\
             .crunchyroll.com\tTRUE\t/\tFALSE\t0\tsession_id\ts1\n"
        );
    }

    #[test]
    fn test_json_wrapped_single_and_map() {
        let wrapped = parse_cookie_payload(r#"{"cookies": [{"name": "a", "value": "1"}]}"#).unwrap();
        assert_eq!(wrapped.header_value(), "a=1");

        let single = parse_cookie_payload(r#"{"name": "etp_rt", "value": "tok"}"#).unwrap();
        assert_eq!(single.header_value(), "etp_rt=tok");

        let map = parse_cookie_payload(r#"{"etp_rt": "tok", "device_id": "d"}"#).unwrap();
        assert_eq!(map.header_value(), "device_id=d; etp_rt=tok");
    }

    #[test]
    fn test_json_errors() {
        assert!(matches!(parse_cookie_payload("[{oops"), Err(CookieParseError::InvalidJson(_))));
        assert!(matches!(parse_cookie_payload("[1, 2]"), Err(CookieParseError::UnsupportedJson)));
        assert!(matches!(parse_cookie_payload("[]"), Err(CookieParseError::NoCookies)));
    }

    #[test]
    fn test_header_string() {
        let cookie = parse_cookie_payload("Cookie: etp_rt=abc; device_id=xyz;").unwrap();
        assert_eq!(cookie.format(), CookieFormat::Header);
        assert_eq!(cookie.len(), 2);
        assert_eq!(cookie.entries()[0].domain, DEFAULT_DOMAIN);
        assert_eq!(cookie.header_value(), "etp_rt=abc; device_id=xyz");

        // values may contain '='
        let cookie = parse_cookie_payload("token=a=b==").unwrap();
        assert_eq!(cookie.entries()[0].value, "a=b==");
    }

    #[test]
    fn test_malformed_header() {
        for bad in ["<malformed>", "hello world", "=value", "a=1; broken"] {
            assert!(
                matches!(parse_cookie_payload(bad), Err(CookieParseError::MalformedPair { .. })),
                "{bad}"
            );
        }
    }

    #[test]
    fn test_netscape_export() {
        let text = "# Netscape HTTP Cookie File\n\
                    # generated by a browser\n\
                    \n\
                    .crunchyroll.com\tTRUE\t/\tTRUE\t1900000000\tetp_rt\tabc\n\
                    #HttpOnly_.crunchyroll.com\tTRUE\t/\tFALSE\t0\tsession_id\ts1\n";
        let cookie = parse_cookie_payload(text).unwrap();
        assert_eq!(cookie.format(), CookieFormat::Netscape);
        assert_eq!(cookie.len(), 2);
        assert!(cookie.entries()[1].http_only);
        assert_eq!(cookie.entries()[0].expires, 1_900_000_000);
        assert_eq!(
            cookie.to_netscape(),
            "# Netscape HTTP Cookie File\n\
             .crunchyroll.com\tTRUE\t/\tTRUE\t1900000000\tetp_rt\tabc\n\
             #HttpOnly_.crunchyroll.com\tTRUE\t/\tFALSE\t0\tsession_id\ts1\n"
        );
    }

    #[test]
    fn test_netscape_with_spaces_instead_of_tabs() {
        let text = "# Netscape HTTP Cookie File\n.crunchyroll.com TRUE / TRUE 0 etp_rt abc";
        let cookie = parse_cookie_payload(text).unwrap();
        assert_eq!(cookie.entries()[0].name, "etp_rt");
        assert_eq!(cookie.entries()[0].value, "abc");
    }

    #[test]
    fn test_netscape_bad_lines() {
        let short = "# Netscape HTTP Cookie File\n.crunchyroll.com\tTRUE\t/";
        assert!(matches!(
            parse_cookie_payload(short),
            Err(CookieParseError::MalformedLine { line: 2, .. })
        ));

        let bad_flag = "# Netscape HTTP Cookie File\n.crunchyroll.com\tYES\t/\tTRUE\t0\tn\tv";
        assert!(matches!(parse_cookie_payload(bad_flag), Err(CookieParseError::MalformedLine { .. })));

        let header_only = "# Netscape HTTP Cookie File\n";
        assert!(matches!(parse_cookie_payload(header_only), Err(CookieParseError::NoCookies)));
    }

    #[test]
    fn test_code_fence_is_stripped() {
        let fenced = "```json\n[{\"name\": \"a\", \"value\": \"1\"}]\n```";
        assert_eq!(parse_cookie_payload(fenced).unwrap().header_value(), "a=1");
        assert!(looks_like_cookie_payload(fenced));
    }

    #[test]
    fn test_empty_input() {
        assert!(matches!(parse_cookie_payload("   \n"), Err(CookieParseError::Empty)));
    }

    #[test]
    fn test_control_characters_rejected() {
        let json = r#"[{"name": "a", "value": "line\nbreak"}]"#;
        assert!(matches!(
            parse_cookie_payload(json),
            Err(CookieParseError::ControlCharacter { .. })
        ));
    }

    #[test]
    fn test_looks_like_cookie_payload() {
        assert!(looks_like_cookie_payload("[{}]"));
        assert!(looks_like_cookie_payload("  {\"a\": 1}"));
        assert!(looks_like_cookie_payload(".crunchyroll.com\tTRUE\t/\tTRUE\t0\tn\tv"));
        assert!(!looks_like_cookie_payload("https://www.crunchyroll.com/watch/G4VUQ"));
        assert!(!looks_like_cookie_payload("hello"));
    }
}
