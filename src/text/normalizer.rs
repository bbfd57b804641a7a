// src/text/normalizer.rs

use std::sync::LazyLock;

use regex::Regex;

use crate::text::punctuation::remove_extraneous_punctuation;
use crate::text::vietnamese::{LinguisticNormalizer, VietnameseNormalizer};

pub(crate) static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("static whitespace pattern"));

/// Transcript cleaner shared by training and inference.
///
/// Runs the linguistic normalizer, lowercases, drops double quotes and
/// collapses whitespace runs to a single space. Leading/trailing spaces are
/// kept.
#[derive(Debug, Clone, Default)]
pub struct TextNormalizer<L = VietnameseNormalizer> {
    linguistic: L,
}

impl TextNormalizer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<L: LinguisticNormalizer> TextNormalizer<L> {
    pub fn with_linguistic(linguistic: L) -> Self {
        Self { linguistic }
    }

    pub fn normalize(&self, raw: &str) -> String {
        let text = self.linguistic.normalize(raw).to_lowercase().replace('"', "");
        WHITESPACE_RE.replace_all(&text, " ").into_owned()
    }

    /// `normalize` followed by punctuation substitution. Stripped symbols
    /// never leave a double space behind.
    pub fn clean(&self, raw: &str) -> String {
        let text = remove_extraneous_punctuation(&self.normalize(raw));
        WHITESPACE_RE.replace_all(&text, " ").into_owned()
    }
}

/// [`TextNormalizer::normalize`] with the default Vietnamese normalizer.
pub fn text_cleaners(text: &str) -> String {
    TextNormalizer::new().normalize(text)
}
