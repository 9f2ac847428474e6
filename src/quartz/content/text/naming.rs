use std::sync::LazyLock;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use regex::Regex;

/// Number of normalised characters compared by the prefix fallback.
pub const PREFIX_MATCH_LEN: usize = 10;

static UNDERSCORE_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"_+").expect("static regex is valid"));

static TRAILING_COUNTER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+\d+$").expect("static regex is valid"));

/// Characters left untouched when a site path is embedded in a markdown link.
const LINK_PATH: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'/')
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// File stem used for a book page. Existing pages were named this way, so the
/// mapping must not change. Path separators become `-` as well, since they
/// cannot appear in a file name.
pub fn title_to_stem(title: &str) -> String {
    title.replace([':', '/', '\\'], "-").trim().to_string()
}

/// Markdown file name for a book page.
pub fn title_to_filename(title: &str) -> String {
    format!("{}.md", title_to_stem(title))
}

/// Cover image file name for a book title.
pub fn title_to_cover_filename(title: &str) -> String {
    let mut name = String::with_capacity(title.len());
    for ch in title.trim().chars() {
        match ch {
            ' ' | '@' | '=' => name.push('_'),
            ':' | '/' | '\\' => name.push('-'),
            '&' => name.push_str("__"),
            '\'' | ',' | '(' | ')' | '!' | '"' => {}
            other => name.push(other),
        }
    }
    let collapsed = UNDERSCORE_RUNS.replace_all(&name, "_");
    format!("{}.jpg", collapsed.trim_matches('_'))
}

/// Lowercases and keeps only ASCII letters and digits.
pub fn normalize_key(value: &str) -> String {
    value
        .to_lowercase()
        .chars()
        .filter(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit())
        .collect()
}

/// True when both normalised keys are long enough and share their leading
/// `PREFIX_MATCH_LEN` characters.
pub fn shares_prefix(left: &str, right: &str) -> bool {
    left.len() > PREFIX_MATCH_LEN
        && right.len() > PREFIX_MATCH_LEN
        && left[..PREFIX_MATCH_LEN] == right[..PREFIX_MATCH_LEN]
}

/// Shortened title used for a second cover search: the text before the first
/// `:` and the first `(`.
pub fn simplified_title(title: &str) -> &str {
    let head = title.split(':').next().unwrap_or(title);
    head.split('(').next().unwrap_or(head).trim()
}

/// Drops a trailing numeric counter such as the `2` in `Matheran 2`.
pub fn strip_trailing_counter(name: &str) -> &str {
    match TRAILING_COUNTER.find(name) {
        Some(found) => &name[..found.start()],
        None => name,
    }
}

/// Percent-encodes a site path for use inside a markdown link, keeping `/`.
pub fn encode_link_path(path: &str) -> String {
    utf8_percent_encode(path, LINK_PATH).to_string()
}
