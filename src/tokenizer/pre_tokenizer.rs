// src/tokenizer/pre_tokenizer.rs

use std::sync::LazyLock;

use regex::Regex;

use crate::result::Result;
use crate::tokenizer::Token;

static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("static whitespace pattern"));

static WORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\w+").expect("static word pattern"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitDelimiterBehavior {
    /// Drop the matches, keep what lies between them.
    Removed,
    /// Keep both the matches and the gaps as separate pieces.
    Isolated,
}

/// One piece of the input. `tokens` is set once the piece has been
/// resolved, either as an added token or by the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedString {
    content: String,
    tokens: Option<Vec<Token>>,
}

impl NormalizedString {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            tokens: None,
        }
    }

    pub fn with_tokens(content: impl Into<String>, tokens: Vec<Token>) -> Self {
        Self {
            content: content.into(),
            tokens: Some(tokens),
        }
    }

    pub fn get(&self) -> &str {
        &self.content
    }

    pub fn tokens(&self) -> Option<&[Token]> {
        self.tokens.as_deref()
    }

    pub fn split(
        &self,
        pattern: &Regex,
        behavior: SplitDelimiterBehavior,
    ) -> Vec<NormalizedString> {
        let text = self.get();
        let mut result = Vec::new();
        let mut last_end = 0;
        for mat in pattern.find_iter(text) {
            if last_end < mat.start() {
                result.push(NormalizedString::new(&text[last_end..mat.start()]));
            }
            if behavior == SplitDelimiterBehavior::Isolated && !mat.as_str().is_empty() {
                result.push(NormalizedString::new(mat.as_str()));
            }
            last_end = mat.end();
        }
        if last_end < text.len() {
            result.push(NormalizedString::new(&text[last_end..]));
        }
        result
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreTokenizedString {
    splits: Vec<NormalizedString>,
}

impl PreTokenizedString {
    pub fn new(text: &str) -> Self {
        Self {
            splits: vec![NormalizedString::new(text)],
        }
    }

    pub fn from_splits(splits: Vec<NormalizedString>) -> Self {
        Self { splits }
    }

    pub fn take_splits(self) -> Vec<NormalizedString> {
        self.splits
    }

    pub fn get_splits(&self) -> &[NormalizedString] {
        &self.splits
    }

    /// Re-split every piece that has not been resolved to tokens yet.
    pub fn split<F>(&mut self, mut split_fn: F) -> Result<()>
    where
        F: FnMut(usize, NormalizedString) -> Result<Vec<NormalizedString>>,
    {
        let old_splits = std::mem::take(&mut self.splits);
        let mut new_splits = Vec::with_capacity(old_splits.len() * 2);

        for (i, split) in old_splits.into_iter().enumerate() {
            if split.tokens.is_some() {
                new_splits.push(split);
            } else {
                new_splits.extend(split_fn(i, split)?);
            }
        }
        self.splits = new_splits;
        Ok(())
    }

    /// Resolve every remaining piece with `tokenize_fn`.
    pub fn tokenize<F>(&mut self, tokenize_fn: F) -> Result<()>
    where
        F: Fn(&NormalizedString) -> Result<Vec<Token>>,
    {
        for split in self.splits.iter_mut().filter(|s| s.tokens.is_none()) {
            split.tokens = Some(tokenize_fn(split)?);
        }
        Ok(())
    }

    /// Every token in order. Pieces that were never resolved are skipped.
    pub fn into_tokens(self) -> Vec<Token> {
        self.splits
            .into_iter()
            .filter_map(|s| s.tokens)
            .flatten()
            .collect()
    }
}

pub trait PreTokenizer {
    fn pre_tokenize(&self, pretokenized: &mut PreTokenizedString) -> Result<()>;
}

/// Splits on whitespace, then separates word characters from punctuation,
/// which is the same as matching `\w+|[^\w\s]+`.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct Whitespace;

impl Whitespace {
    pub fn new() -> Self {
        Whitespace
    }

    /// Convenience used while feeding the trainer.
    pub fn words(&self, text: &str) -> Result<Vec<String>> {
        let mut pretokenized = PreTokenizedString::new(text);
        self.pre_tokenize(&mut pretokenized)?;
        Ok(pretokenized
            .take_splits()
            .into_iter()
            .map(|s| s.content)
            .collect())
    }
}

impl PreTokenizer for Whitespace {
    fn pre_tokenize(&self, pretokenized: &mut PreTokenizedString) -> Result<()> {
        pretokenized.split(|_, normalized| {
            Ok(normalized
                .split(&WHITESPACE_RE, SplitDelimiterBehavior::Removed)
                .into_iter()
                .flat_map(|piece| piece.split(&WORD_RE, SplitDelimiterBehavior::Isolated))
                .collect())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whitespace_splits_words_and_punctuation() {
        let words = Whitespace.words("tôi đi học. (xin) chào,  bạn!?").unwrap();
        assert_eq!(
            words,
            vec!["tôi", "đi", "học", ".", "(", "xin", ")", "chào", ",", "bạn", "!?"]
        );
    }

    #[test]
    fn test_resolved_splits_are_left_alone() {
        let mut pts = PreTokenizedString::from_splits(vec![
            NormalizedString::new("a b"),
            NormalizedString::with_tokens("[SPACE]", vec![Token::new(2, "[SPACE]".into(), (0, 7))]),
            NormalizedString::new("c"),
        ]);
        Whitespace.pre_tokenize(&mut pts).unwrap();
        let contents: Vec<&str> = pts.get_splits().iter().map(|s| s.get()).collect();
        assert_eq!(contents, vec!["a", "b", "[SPACE]", "c"]);
    }

    #[test]
    fn test_empty_input() {
        assert!(Whitespace.words("").unwrap().is_empty());
        assert!(Whitespace.words("   \t").unwrap().is_empty());
    }
}
