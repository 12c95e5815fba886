//! Markup removal for dialogue service replies

use regex::Regex;
use std::sync::LazyLock;

/// Regex matching a single tag, shortest body first
static TAG_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<.+?>").expect("valid regex"));

/// Strip every `<...>` tag from a reply before it is spoken or logged
///
/// Text outside tags is left untouched, including surrounding whitespace.
#[must_use]
pub fn strip_markup(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }

    TAG_REGEX.replace_all(raw, "").into_owned()
}
