//! URL detection in entry text

use regex::Regex;
use std::sync::OnceLock;

/// Displayed URLs longer than this are shortened with "..."
pub const MAX_DISPLAY_LEN: usize = 50;

/// http(s) URLs, not ending in trailing punctuation
fn url_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r#"https?://[^\s<]+[^<.,:;"')\]\s]"#).unwrap())
}

/// A piece of entry text: plain, or a link with its display form
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment<'a> {
    Text(&'a str),
    Link { href: &'a str, display: String },
}

/// Split text into plain and link segments, preserving every character
pub fn linkify(text: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut last = 0;

    for m in url_regex().find_iter(text) {
        if m.start() > last {
            segments.push(Segment::Text(&text[last..m.start()]));
        }
        segments.push(Segment::Link {
            href: m.as_str(),
            display: truncate_url(m.as_str(), MAX_DISPLAY_LEN),
        });
        last = m.end();
    }

    if last < text.len() {
        segments.push(Segment::Text(&text[last..]));
    }

    segments
}

pub fn truncate_url(url: &str, max_len: usize) -> String {
    match url.char_indices().nth(max_len) {
        Some((cut, _)) => format!("{}...", &url[..cut]),
        None => url.to_string(),
    }
}

/// Render text for a terminal: shortened links keep their full target in
/// angle brackets so nothing is lost.
pub fn render_plain(text: &str) -> String {
    linkify(text)
        .into_iter()
        .map(|segment| match segment {
            Segment::Text(t) => t.to_string(),
            Segment::Link { href, display } if display.len() < href.len() => {
                format!("{} <{}>", display, href)
            }
            Segment::Link { href, .. } => href.to_string(),
        })
        .collect()
}
