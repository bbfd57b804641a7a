// src/text/whitelist.rs

use std::sync::LazyLock;

use log::warn;
use regex::Regex;

use crate::text::normalizer::TextNormalizer;

static ALLOWED_CHARACTERS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"^[a-z0-9àáâãèéêìíòóôõùúăđĩũơưạảấầẩẫậắằẳẵặẹẻẽềểễệỉịọỏốồổỗộớờởỡợụủứừửữựyýỳỵỹĩỷêềếệễơấầẫậấ!:;"/, \-\(\)\.'\?ʼ]+$"#,
    )
    .expect("static allow-list pattern")
});

/// True when every character of `text` is in the training allow-list.
pub fn is_allowed(text: &str) -> bool {
    ALLOWED_CHARACTERS.is_match(text)
}

/// Data-quality gate run on every corpus word before it reaches the trainer.
#[derive(Debug, Clone, Default)]
pub struct WhitelistFilter {
    normalizer: TextNormalizer,
}

impl WhitelistFilter {
    pub fn new(normalizer: TextNormalizer) -> Self {
        Self { normalizer }
    }

    /// Returns the cleaned word, or an empty string when any character of
    /// the cleaned form falls outside the allow-list.
    pub fn filter_word(&self, word: &str, report: bool) -> String {
        let cleaned = self.normalizer.clean(word);
        if !is_allowed(&cleaned) {
            if report && !cleaned.is_empty() {
                warn!("REPORTING: '{}'", cleaned);
            }
            return String::new();
        }
        cleaned
    }
}

/// [`WhitelistFilter::filter_word`] with the default normalizer.
pub fn preprocess_word(word: &str, report: bool) -> String {
    WhitelistFilter::default().filter_word(word, report)
}
