//! Text rules shared by the editor and the document store.
//!
//! # Responsibility
//! - Derive URL slugs from titles.
//! - Normalize heading labels for the index-log outline.
//! - Provide word count / reading time and tag input parsing.
//!
//! # Invariants
//! - `generate_slug` output only contains `[a-z0-9-]`, never starts or ends
//!   with whitespace, and is at most 80 characters.
//! - Heading normalization is idempotent.

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

const MAX_SLUG_CHARS: usize = 80;
const WORDS_PER_MINUTE: usize = 200;

static SLUG_DISALLOWED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z0-9\s-]").expect("valid slug filter regex"));
static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));
static HYPHEN_RUN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"-+").expect("valid hyphen regex"));
static HEADING_NUMBER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+_+").expect("valid heading prefix regex"));

/// Converts a title like `"My Cool Project 2024"` to `"my-cool-project-2024"`.
///
/// Rules, in order: lower-case; NFD-decompose and drop combining diacritics
/// (U+0300..=U+036F); drop anything outside `[a-z0-9\s-]`; trim; whitespace
/// runs to `-`; collapse repeated `-`; keep the first 80 characters.
pub fn generate_slug(title: &str) -> String {
    let lowered = title.to_lowercase();
    let stripped = lowered
        .nfd()
        .filter(|c| !('\u{0300}'..='\u{036f}').contains(c))
        .collect::<String>();
    let filtered = SLUG_DISALLOWED_RE.replace_all(&stripped, "");
    let hyphenated = WHITESPACE_RE.replace_all(filtered.trim(), "-");
    let collapsed = HYPHEN_RUN_RE.replace_all(&hyphenated, "-");
    collapsed.chars().take(MAX_SLUG_CHARS).collect()
}

/// Heading text with any `NN_` numbering removed and whitespace runs turned
/// into underscores. Case is preserved.
///
/// Returns `None` for blank headings, which never get a number.
pub fn heading_label(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    let unnumbered = HEADING_NUMBER_RE.replace(trimmed, "");
    Some(WHITESPACE_RE.replace_all(&unnumbered, "_").into_owned())
}

/// Two-digit, zero-padded heading number (`01`, `02`, ..., `100`).
pub fn heading_number(position: usize) -> String {
    format!("{position:02}")
}

/// Whitespace-separated word count over all texts.
pub fn word_count<'a>(texts: impl IntoIterator<Item = &'a str>) -> usize {
    texts
        .into_iter()
        .map(|text| text.split_whitespace().count())
        .sum()
}

/// Reading time in minutes at 200 words per minute, never below 1.
pub fn reading_time_minutes(words: usize) -> usize {
    words.div_ceil(WORDS_PER_MINUTE).max(1)
}

/// Splits comma-separated tag input, trimming and dropping empty entries.
/// Order is preserved.
pub fn parse_tags_input(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{
        generate_slug, heading_label, heading_number, parse_tags_input, reading_time_minutes,
        word_count,
    };

    #[test]
    fn slug_strips_accents_punctuation_and_collapses_separators() {
        assert_eq!(generate_slug("Café Project – 2024!"), "cafe-project-2024");
        assert_eq!(generate_slug("My Cool Project 2024"), "my-cool-project-2024");
        assert_eq!(generate_slug("  a -- b  "), "a-b");
        assert_eq!(generate_slug("Ñandú  Über\tStraße"), "nandu-uber-strae");
    }

    #[test]
    fn slug_of_empty_title_is_empty() {
        assert_eq!(generate_slug(""), "");
        assert_eq!(generate_slug("!!!"), "");
    }

    #[test]
    fn slug_is_truncated_to_80_chars() {
        let title = "word ".repeat(40);
        let slug = generate_slug(&title);
        assert_eq!(slug.chars().count(), 80);
        assert!(slug.starts_with("word-word"));
    }

    #[test]
    fn heading_label_is_idempotent_over_numbering() {
        assert_eq!(heading_label("  Getting   started "), Some("Getting_started".to_string()));
        assert_eq!(heading_label("03__Getting_started"), Some("Getting_started".to_string()));
        assert_eq!(heading_label("   "), None);
        assert_eq!(heading_number(7), "07");
        assert_eq!(heading_number(123), "123");
    }

    #[test]
    fn reading_time_rounds_up_with_one_minute_floor() {
        assert_eq!(reading_time_minutes(0), 1);
        assert_eq!(reading_time_minutes(200), 1);
        assert_eq!(reading_time_minutes(201), 2);
        assert_eq!(word_count(["one two", "", " three  "]), 3);
    }

    #[test]
    fn tag_input_is_split_and_trimmed() {
        assert_eq!(
            parse_tags_input(" rust, ,wasm ,  ui"),
            vec!["rust".to_string(), "wasm".to_string(), "ui".to_string()]
        );
    }
}
