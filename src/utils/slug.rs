// src/utils/slug.rs

//! URL slugs derived from post titles.
//!
//! Chinese characters are transliterated to toneless pinyin, one syllable per
//! hyphen-separated segment; accented Latin letters lose their marks; anything
//! outside `[a-z0-9-]` is dropped.

use std::sync::LazyLock;
use std::sync::atomic::{AtomicU64, Ordering};

use pinyin::ToPinyin;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

pub const DEFAULT_SLUG: &str = "untitled";
pub const MAX_SLUG_LENGTH: usize = 100;

/// When truncating, cut back to a hyphen if one sits this close to the limit.
const WORD_BOUNDARY_WINDOW: usize = 10;

static SEPARATORS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\s_]+").expect("valid separator pattern"));
static DISALLOWED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9-]").expect("valid disallowed pattern"));
static HYPHEN_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-{2,}").expect("valid hyphen pattern"));
static VALID_SLUG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9]+(-[a-z0-9]+)*$").expect("valid slug pattern"));

static LAST_STAMP: AtomicU64 = AtomicU64::new(0);

/// Deterministic slug for `title`, at most 100 characters.
pub fn generate_slug(title: &str) -> String {
    let lowered = title.trim().to_lowercase();
    if lowered.is_empty() {
        return DEFAULT_SLUG.to_string();
    }

    let mut transliterated = String::with_capacity(lowered.len() * 2);
    for ch in lowered.chars() {
        match ch.to_pinyin() {
            Some(py) => {
                transliterated.push(' ');
                transliterated.push_str(py.plain());
                transliterated.push(' ');
            }
            None => transliterated.push(ch),
        }
    }

    let decomposed: String = transliterated.nfkd().collect();
    let hyphenated = SEPARATORS.replace_all(&decomposed, "-");
    let cleaned = DISALLOWED.replace_all(&hyphenated, "");
    let collapsed = HYPHEN_RUNS.replace_all(&cleaned, "-");
    let slug = truncate(collapsed.trim_matches('-'), MAX_SLUG_LENGTH);

    if slug.is_empty() {
        DEFAULT_SLUG.to_string()
    } else {
        slug
    }
}

/// `generate_slug` plus a millisecond stamp that never repeats within the
/// process, so two calls always differ.
pub fn generate_unique_slug(title: &str) -> String {
    let stamp = next_stamp().to_string();
    let base = generate_slug(title);
    let base = truncate(&base, MAX_SLUG_LENGTH - stamp.len() - 1);
    let base = if base.is_empty() { DEFAULT_SLUG } else { base.as_str() };
    format!("{}-{}", base, stamp)
}

pub fn is_valid_slug(slug: &str) -> bool {
    slug.len() <= MAX_SLUG_LENGTH && VALID_SLUG.is_match(slug)
}

/// Expects ASCII input (the output of the cleaning pass).
fn truncate(slug: &str, max: usize) -> String {
    if slug.len() <= max {
        return slug.to_string();
    }
    let mut cut = &slug[..max];
    if cut.ends_with('-') {
        cut = cut.trim_end_matches('-');
    } else if let Some(pos) = cut.rfind('-') {
        if max - pos <= WORD_BOUNDARY_WINDOW {
            cut = &cut[..pos];
        }
    }
    cut.trim_matches('-').to_string()
}

fn next_stamp() -> u64 {
    let now = chrono::Utc::now().timestamp_millis().max(0) as u64;
    let mut last = LAST_STAMP.load(Ordering::Relaxed);
    loop {
        let next = now.max(last + 1);
        match LAST_STAMP.compare_exchange_weak(last, next, Ordering::Relaxed, Ordering::Relaxed) {
            Ok(_) => return next,
            Err(actual) => last = actual,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chinese_title_is_transliterated() {
        let slug = generate_slug("食堂推荐！");
        assert_eq!(slug, "shi-tang-tui-jian");
        assert!(is_valid_slug(&slug));
        assert_eq!(generate_slug("食堂推荐！"), slug);
    }

    #[test]
    fn latin_titles_are_normalized() {
        assert_eq!(generate_slug("  Hello,   World!  "), "hello-world");
        assert_eq!(generate_slug("Café résumé"), "cafe-resume");
        assert_eq!(generate_slug("snake_case -- title"), "snake-case-title");
        assert_eq!(generate_slug("C++ 复习"), "c-fu-xi");
    }

    #[test]
    fn full_width_characters_fold_to_ascii() {
        assert_eq!(generate_slug("ＣＳ１０１ 复习"), "cs101-fu-xi");
        assert_eq!(generate_slug("２０２４\u{3000}迎新"), "2024-ying-xin");
    }

    #[test]
    fn empty_or_symbol_only_titles_fall_back() {
        assert_eq!(generate_slug(""), DEFAULT_SLUG);
        assert_eq!(generate_slug("   "), DEFAULT_SLUG);
        assert_eq!(generate_slug("!!! ???"), DEFAULT_SLUG);
    }

    #[test]
    fn long_titles_are_cut_at_a_word_boundary() {
        let title = "word ".repeat(40);
        let slug = generate_slug(&title);
        assert!(slug.len() <= MAX_SLUG_LENGTH);
        assert!(!slug.ends_with('-') && !slug.starts_with('-'));
        assert!(slug.ends_with("word"));
        assert!(is_valid_slug(&slug));

        let unbroken = "a".repeat(150);
        assert_eq!(generate_slug(&unbroken).len(), MAX_SLUG_LENGTH);
    }

    #[test]
    fn unique_slugs_differ_and_stay_bounded() {
        let a = generate_unique_slug("食堂推荐！");
        let b = generate_unique_slug("食堂推荐！");
        assert_ne!(a, b);
        assert!(a.starts_with("shi-tang-tui-jian-"));
        assert!(is_valid_slug(&a) && is_valid_slug(&b));

        let long = generate_unique_slug(&"x".repeat(300));
        assert!(long.len() <= MAX_SLUG_LENGTH);
        assert!(is_valid_slug(&long));
    }

    #[test]
    fn validity_check() {
        assert!(is_valid_slug("abc-123"));
        assert!(!is_valid_slug("-abc"));
        assert!(!is_valid_slug("abc--def"));
        assert!(!is_valid_slug("ABC"));
        assert!(!is_valid_slug(""));
    }
}
