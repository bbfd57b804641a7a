// src/text/punctuation.rs

use std::sync::LazyLock;

use aho_corasick::{AhoCorasick, AhoCorasickBuilder, MatchKind};
use regex::Regex;

/// Bracket and quote variants folded onto the forms the vocabulary knows.
pub const REPLACEMENT_PUNCTUATION: &[(&str, &str)] = &[
    ("{", "("),
    ("}", ")"),
    ("[", "("),
    ("]", ")"),
    ("`", "'"),
    ("\u{2014}", "-"),
    ("\u{02BC}", "'"),
];

static REPLACER: LazyLock<AhoCorasick> = LazyLock::new(|| {
    AhoCorasickBuilder::new()
        .match_kind(MatchKind::LeftmostLongest)
        .build(REPLACEMENT_PUNCTUATION.iter().map(|(from, _)| from))
        .expect("static replacement table")
});

static EXTRANEOUS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[@#%_=\$\^&\*\+\\]").expect("static symbol pattern"));

/// Substitute bracket/quote variants, then drop symbols that are never spoken.
pub fn remove_extraneous_punctuation(word: &str) -> String {
    let replacements: Vec<&str> = REPLACEMENT_PUNCTUATION.iter().map(|(_, to)| *to).collect();
    let replaced = REPLACER.replace_all(word, &replacements);
    EXTRANEOUS.replace_all(&replaced, "").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_brackets_become_parentheses() {
        assert_eq!(remove_extraneous_punctuation("{hello}"), "(hello)");
        assert_eq!(remove_extraneous_punctuation("[a]"), "(a)");
    }

    #[test]
    fn test_quote_and_dash_variants() {
        assert_eq!(remove_extraneous_punctuation("`x\u{02BC}"), "'x'");
        assert_eq!(remove_extraneous_punctuation("a\u{2014}b"), "a-b");
    }

    #[test]
    fn test_symbols_are_stripped() {
        assert_eq!(remove_extraneous_punctuation("test@123"), "test123");
        assert_eq!(remove_extraneous_punctuation(r"#%_=$^&*+\"), "");
        assert_eq!(remove_extraneous_punctuation("a-b, c."), "a-b, c.");
    }
}
