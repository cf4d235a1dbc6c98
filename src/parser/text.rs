use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static NON_TEXT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\w\s.,!?-]").unwrap());
static NON_WORD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\p{L}\p{N}\s]+").unwrap());

/// Common English words excluded from frequency counts.
static STOP_WORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "the", "be", "to", "of", "and", "a", "in", "that", "have", "i",
        "it", "for", "not", "on", "with", "he", "as", "you", "do", "at",
        "this", "but", "his", "by", "from",
    ]
    .into_iter()
    .collect()
});

/// Drop everything outside word characters, whitespace, and basic
/// punctuation, collapse whitespace runs to a single space, and trim the
/// ends. Filtering runs before the collapse so removed characters cannot
/// leave double spaces behind.
pub fn normalize(raw: &str) -> String {
    let cleaned = NON_TEXT_RE.replace_all(raw, "");
    let collapsed = WHITESPACE_RE.replace_all(&cleaned, " ");
    collapsed.trim().to_string()
}

/// Lowercase the text, collapse every punctuation run to a space, and split
/// into countable words. Tokens of one or two characters and stop words are
/// dropped; duplicates and left-to-right order are preserved.
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    let stripped = NON_WORD_RE.replace_all(&lowered, " ");
    stripped
        .split_whitespace()
        .filter(|w| w.chars().count() > 2 && !STOP_WORDS.contains(w))
        .map(str::to_string)
        .collect()
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_collapses_whitespace() {
        assert_eq!(normalize("a\t b\n\nc"), "a b c");
    }

    #[test]
    fn normalize_keeps_basic_punctuation() {
        assert_eq!(normalize("Wait, really?! Yes - 100%."), "Wait, really?! Yes - 100.");
    }

    #[test]
    fn normalize_trims() {
        assert_eq!(normalize("  padded  "), "padded");
    }

    #[test]
    fn normalize_empty() {
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn normalize_is_idempotent() {
        for s in ["", "  a\tb © c  ", "plain text", "¡dash—and…emoji🙂!", "b © c"] {
            let once = normalize(s);
            assert_eq!(normalize(&once), once);
        }
    }

    #[test]
    fn normalize_removed_chars_leave_no_double_space() {
        assert_eq!(normalize("b © c"), "b c");
    }

    #[test]
    fn tokenize_empty() {
        assert!(tokenize("").is_empty());
    }

    #[test]
    fn tokenize_is_case_insensitive() {
        assert_eq!(tokenize("THE Cat"), vec!["cat"]);
    }

    #[test]
    fn tokenize_drops_short_tokens() {
        assert_eq!(tokenize("go to an ocean"), vec!["ocean"]);
    }

    #[test]
    fn tokenize_drops_stop_words() {
        assert!(tokenize("the and not with from").is_empty());
    }

    #[test]
    fn tokenize_strips_punctuation_kept_by_normalize() {
        assert_eq!(tokenize("well-known, obviously!"), vec!["well", "known", "obviously"]);
    }

    #[test]
    fn tokenize_keeps_order_and_duplicates() {
        assert_eq!(tokenize("word test word"), vec!["word", "test", "word"]);
    }

    #[test]
    fn tokens_always_pass_filters() {
        for token in tokenize("The quick brown fox does not jump over this lazy dog") {
            assert!(token.chars().count() > 2);
            assert!(!STOP_WORDS.contains(token.as_str()));
        }
    }
}
