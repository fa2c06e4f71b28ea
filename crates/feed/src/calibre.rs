// ABOUTME: Extraction of the metadata lines Calibre embeds in entry content.
// ABOUTME: Matches `KEYWORD: value<br/>` for the recognized keywords and stores results in app_meta.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::{Entry, Feed};

/// Keywords Calibre writes ahead of the book description.
pub const CALIBRE_KEYWORDS: &[&str] = &["SERIES", "TAGS", "RATING"];

/// `(KEYWORD): value<br/>`, where the value runs up to the next `<`.
static CALIBRE_META_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"({}): *([^<]+)<br */>",
        CALIBRE_KEYWORDS.join("|")
    ))
    .unwrap()
});

/// `Series Name [3.50]`
static SERIES_POSITION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(.*?)\s*\[(\d+(?:\.\d+)?)\]\s*$").unwrap());

/// Returns every `(keyword, value)` pair in order of appearance.
/// Values are verbatim; a series value keeps its `[3.50]` suffix.
pub fn extract_calibre_fields(text: &str) -> Vec<(String, String)> {
    CALIBRE_META_RE
        .captures_iter(text)
        .map(|caps| (caps[1].to_string(), caps[2].to_string()))
        .collect()
}

/// Splits a Calibre series value into its name and position.
/// Values without a well-formed `[n]` suffix come back trimmed with no position.
pub fn split_series(value: &str) -> (String, Option<f32>) {
    match SERIES_POSITION_RE.captures(value) {
        Some(caps) => (caps[1].trim().to_string(), caps[2].parse().ok()),
        None => (value.trim().to_string(), None),
    }
}

impl Entry {
    /// Stores every metadata line found in the content into `app_meta`.
    /// A keyword seen twice keeps its last value; no match leaves `app_meta` untouched.
    pub fn parse_calibre_metadata(&mut self) {
        for (key, value) in extract_calibre_fields(&self.content.content) {
            self.app_meta.insert(key, value);
        }
    }

    /// The `TAGS` value split on commas, or empty if extraction found none.
    pub fn calibre_tags(&self) -> Vec<String> {
        self.app_meta
            .get("TAGS")
            .map(|tags| {
                tags.split(',')
                    .map(str::trim)
                    .filter(|tag| !tag.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl Feed {
    /// Runs Calibre extraction on every entry of an acquisition feed.
    /// Navigation feeds are left untouched.
    pub fn parse_calibre_metadata(&mut self) {
        if self.is_navigation() {
            return;
        }
        for entry in &mut self.entries {
            entry.parse_calibre_metadata();
        }
    }
}
