//! Recognizing Crunchyroll links in chat messages

use lazy_regex::regex;
use url::Url;

const MEDIA_HOST: &str = "crunchyroll.com";

/// Chars that end a sentence rather than a URL
const TRAILING_PUNCTUATION: &[char] = &['.', ',', ';', ':', '!', '?', ')', ']', '}', '>', '\'', '"'];

/// Finds the first Crunchyroll URL in `text`.
///
/// Scheme-less links (`www.crunchyroll.com/watch/...`) are accepted and
/// returned as https. Hosts that merely contain the name
/// (`crunchyroll.com.example.net`) are rejected, and so is the name showing
/// up inside another link: a candidate must start the text or follow
/// whitespace or an opening bracket or quote.
pub fn find_media_url(text: &str) -> Option<Url> {
    regex!(r#"(?i)(?:^|[\s(\[<{"'])((?:https?://)?[a-z0-9.-]*crunchyroll\.com\S*)"#)
        .captures_iter(text)
        .filter_map(|caps| parse_candidate(caps.get(1)?.as_str()))
        .next()
}

pub fn is_media_url(url: &Url) -> bool {
    matches!(url.scheme(), "http" | "https")
        && url.host_str().is_some_and(|host| {
            let host = host.to_ascii_lowercase();
            host == MEDIA_HOST || host.ends_with(&format!(".{}", MEDIA_HOST))
        })
}

fn parse_candidate(raw: &str) -> Option<Url> {
    let trimmed = raw.trim_end_matches(TRAILING_PUNCTUATION);
    let lower = trimmed.to_ascii_lowercase();
    let has_scheme = lower.starts_with("http://") || lower.starts_with("https://");

    let url = if has_scheme {
        Url::parse(trimmed).ok()?
    } else {
        Url::parse(&format!("https://{}", trimmed)).ok()?
    };
    is_media_url(&url).then_some(url)
}
