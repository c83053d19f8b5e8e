//! Pulls the generated document out of a model reply.
//!
//! The policy is fixed: the first ```` ```html ```` block wins, otherwise the first
//! fenced block of any kind, otherwise the whole reply. Nothing here checks that
//! the result is valid markup.

use regex::Regex;
use std::sync::OnceLock;

/// Where the extracted markup came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionSource {
    HtmlFence,
    AnyFence,
    /// No fence matched; the raw reply is used as-is.
    Fallback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Extraction<'a> {
    pub markup: &'a str,
    pub source: ExtractionSource,
}

fn html_fence_regex() -> &'static Regex {
    static CACHED: OnceLock<Regex> = OnceLock::new();
    CACHED.get_or_init(|| Regex::new(r"(?s)```html\n(.*?)\n```").expect("html fence regex must compile"))
}

fn any_fence_regex() -> &'static Regex {
    static CACHED: OnceLock<Regex> = OnceLock::new();
    CACHED.get_or_init(|| Regex::new(r"(?s)```(.*?)```").expect("fence regex must compile"))
}

/// Extract markup and report which rule produced it.
pub fn extract_artifact(reply: &str) -> Extraction<'_> {
    let candidates = [
        (html_fence_regex(), ExtractionSource::HtmlFence),
        (any_fence_regex(), ExtractionSource::AnyFence),
    ];

    for (regex, source) in candidates {
        if let Some(capture) = regex.captures(reply).and_then(|c| c.get(1)) {
            return Extraction {
                markup: capture.as_str(),
                source,
            };
        }
    }

    Extraction {
        markup: reply,
        source: ExtractionSource::Fallback,
    }
}

/// Total: always returns something renderable.
pub fn extract(reply: &str) -> &str {
    extract_artifact(reply).markup
}
