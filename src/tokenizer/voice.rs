// src/tokenizer/voice.rs

use std::path::Path;

use log::info;
use serde::{Deserialize, Serialize};

use crate::result::{Error, Result};
use crate::text::{TextNormalizer, WhitelistFilter};
use crate::tokenizer::serialization::{patch_language, TokenizerArtifact};
use crate::tokenizer::{
    AddedToken, AddedVocabulary, BpeTrainer, Model, PreTokenizedString, PreTokenizer, Trainer,
    Whitespace, BPE,
};

pub const STOP_TOKEN: &str = "[STOP]";
pub const UNK_TOKEN: &str = "[UNK]";
pub const SPACE_TOKEN: &str = "[SPACE]";

pub fn default_special_tokens() -> Vec<String> {
    [STOP_TOKEN, UNK_TOKEN, SPACE_TOKEN]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_vocab_size() -> usize {
    256
}

fn default_batch_size() -> usize {
    1000
}

fn default_true() -> bool {
    true
}

fn default_language() -> String {
    "vi".to_string()
}

/// Knobs for [`VoiceBpeTokenizer::train`]. Also the `tokenizer` section of the
/// pipeline config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingOptions {
    #[serde(default = "default_vocab_size")]
    pub vocab_size: usize,
    #[serde(default = "default_special_tokens")]
    pub special_tokens: Vec<String>,
    #[serde(default)]
    pub min_frequency: u64,
    /// Lines handed to the trainer at once. Does not change the result.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Log every word rejected by the allow-list.
    #[serde(default = "default_true")]
    pub report_rejected: bool,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default)]
    pub limit_alphabet: Option<usize>,
    /// Characters kept in the alphabet even when the corpus never uses them.
    #[serde(default)]
    pub initial_alphabet: Vec<char>,
    /// Longest merged token, in bytes.
    #[serde(default)]
    pub max_token_length: Option<usize>,
    #[serde(default)]
    pub show_progress: bool,
}

impl Default for TrainingOptions {
    fn default() -> Self {
        Self {
            vocab_size: default_vocab_size(),
            special_tokens: default_special_tokens(),
            min_frequency: 0,
            batch_size: default_batch_size(),
            report_rejected: true,
            language: default_language(),
            limit_alphabet: None,
            initial_alphabet: Vec::new(),
            max_token_length: None,
            show_progress: false,
        }
    }
}

impl TrainingOptions {
    pub fn validate(&self) -> Result<()> {
        if self.special_tokens.is_empty() {
            return Err(Error::InvalidConfig(
                "at least one special token is required".into(),
            ));
        }
        if self.vocab_size < self.special_tokens.len() {
            return Err(Error::InvalidConfig(format!(
                "vocab_size {} cannot hold {} special tokens",
                self.vocab_size,
                self.special_tokens.len()
            )));
        }
        if self.batch_size == 0 {
            return Err(Error::InvalidConfig("batch_size must be positive".into()));
        }
        Ok(())
    }
}

/// Text to ids and back for the Vietnamese voice models.
///
/// Every input goes through the same cleaning as the training corpus, spaces
/// become `[SPACE]` markers and the rest is segmented by the BPE model.
#[derive(Debug, Clone)]
pub struct VoiceBpeTokenizer {
    model: BPE,
    added_vocabulary: AddedVocabulary,
    pre_tokenizer: Whitespace,
    normalizer: TextNormalizer,
    language: String,
}

impl VoiceBpeTokenizer {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let artifact = TokenizerArtifact::from_file(path)?;
        Self::from_artifact(artifact)
    }

    pub fn from_artifact(artifact: TokenizerArtifact) -> Result<Self> {
        let model = artifact.build_model()?;
        let tokens: Vec<AddedToken> = artifact
            .added_tokens
            .into_iter()
            .map(|entry| entry.token)
            .collect();
        let mut added_vocabulary = AddedVocabulary::new();
        added_vocabulary.add_tokens(&tokens, &model);
        Ok(Self {
            model,
            added_vocabulary,
            pre_tokenizer: Whitespace::new(),
            normalizer: TextNormalizer::new(),
            language: artifact.model.language.unwrap_or_else(default_language),
        })
    }

    /// Learns a vocabulary from transcript lines.
    ///
    /// Lines are split on whitespace and every word goes through the
    /// allow-list filter. Rejected words are dropped, never fatal.
    pub fn train<I, S>(lines: I, options: &TrainingOptions) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        options.validate()?;

        let special_tokens: Vec<AddedToken> = options
            .special_tokens
            .iter()
            .map(|t| AddedToken::from(t.as_str(), true))
            .collect();
        let mut builder = BpeTrainer::builder()
            .vocab_size(options.vocab_size)
            .min_frequency(options.min_frequency)
            .show_progress(options.show_progress)
            .special_tokens(special_tokens)
            .initial_alphabet(options.initial_alphabet.iter().copied().collect())
            .max_token_length(options.max_token_length);
        if let Some(limit) = options.limit_alphabet {
            builder = builder.limit_alphabet(limit);
        }
        let mut trainer = builder.build();

        let filter = WhitelistFilter::default();
        let pre_tokenizer = Whitespace::new();
        let report = options.report_rejected;
        let process = |line: &str| -> Result<Vec<String>> {
            let mut words = Vec::new();
            for word in line.split_whitespace() {
                let word = filter.filter_word(word, report);
                if !word.is_empty() {
                    words.extend(pre_tokenizer.words(&word)?);
                }
            }
            Ok(words)
        };

        let mut lines = lines.into_iter();
        let mut total = 0;
        loop {
            let batch: Vec<String> = lines
                .by_ref()
                .take(options.batch_size)
                .map(|line| line.as_ref().to_owned())
                .collect();
            if batch.is_empty() {
                break;
            }
            total += batch.len();
            trainer.feed(batch.iter(), process)?;
        }
        info!(
            "Fed {} lines, {} distinct words",
            total,
            trainer.word_counts().len()
        );

        let mut model = if options.special_tokens.iter().any(|t| t == UNK_TOKEN) {
            BPE::with_unk_token(UNK_TOKEN)
        } else {
            BPE::default()
        };
        let special_tokens = trainer.train(&mut model)?;

        let mut added_vocabulary = AddedVocabulary::new();
        added_vocabulary.add_tokens(&special_tokens, &model);
        info!("Trained vocabulary of {} tokens", model.get_vocab_size());

        Ok(Self {
            model,
            added_vocabulary,
            pre_tokenizer,
            normalizer: TextNormalizer::new(),
            language: options.language.clone(),
        })
    }

    pub fn to_artifact(&self) -> TokenizerArtifact {
        TokenizerArtifact::from_parts(
            &self.model,
            self.added_vocabulary.to_entries(),
            Some(self.language.clone()),
        )
    }

    /// Writes the artifact, then stamps `model.language` into it.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        self.to_artifact().save(path)?;
        patch_language(path, &self.language)?;
        info!("Saved tokenizer to {}", path.display());
        Ok(())
    }

    pub fn preprocess_text(&self, text: &str) -> String {
        self.normalizer.clean(text)
    }

    pub fn encode(&self, text: &str) -> Result<Vec<u32>> {
        let text = self.preprocess_text(text).replace(' ', SPACE_TOKEN);

        let mut pretokenized: PreTokenizedString = self.added_vocabulary.extract(&text);
        self.pre_tokenizer.pre_tokenize(&mut pretokenized)?;
        pretokenized.tokenize(|piece| self.model.tokenize(piece.get()))?;

        Ok(pretokenized.into_tokens().into_iter().map(|t| t.id).collect())
    }

    /// Ids back to text. `[SPACE]` becomes a space, `[STOP]` and `[UNK]`
    /// render as nothing.
    ///
    /// Unlike the HuggingFace decoder, which silently skips ids it does not
    /// know, an id outside the vocabulary is an error
    /// ([`Error::UnknownTokenId`]).
    pub fn decode(&self, ids: &[u32]) -> Result<String> {
        let mut text = String::new();
        for &id in ids {
            match self.id_to_token(id) {
                Some(token) => text.push_str(&token),
                None => return Err(Error::UnknownTokenId { id }),
            }
        }
        Ok(text
            .replace(SPACE_TOKEN, " ")
            .replace(STOP_TOKEN, "")
            .replace(UNK_TOKEN, ""))
    }

    pub fn token_to_id(&self, token: &str) -> Option<u32> {
        self.added_vocabulary.token_to_id(token, &self.model)
    }

    pub fn id_to_token(&self, id: u32) -> Option<String> {
        self.added_vocabulary
            .simple_id_to_token(id)
            .map(str::to_owned)
            .or_else(|| self.model.id_to_token(id))
    }

    pub fn vocab_size(&self) -> usize {
        self.model.get_vocab_size()
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn get_model(&self) -> &BPE {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CORPUS: [&str; 4] = [
        "Tôi đi học.",
        "Tôi đi chơi!",
        "Học sinh đi học, tôi về nhà.",
        "Anh ấy đi làm (ở xa)?",
    ];

    fn options(vocab_size: usize) -> TrainingOptions {
        TrainingOptions {
            vocab_size,
            batch_size: 2,
            report_rejected: false,
            ..Default::default()
        }
    }

    fn trained() -> VoiceBpeTokenizer {
        VoiceBpeTokenizer::train(CORPUS, &options(128)).unwrap()
    }

    #[test]
    fn test_special_tokens_take_first_ids() {
        let tokenizer = trained();
        assert_eq!(tokenizer.token_to_id(STOP_TOKEN), Some(0));
        assert_eq!(tokenizer.token_to_id(UNK_TOKEN), Some(1));
        assert_eq!(tokenizer.token_to_id(SPACE_TOKEN), Some(2));
        assert!(tokenizer.vocab_size() <= 128);
    }

    #[test]
    fn test_round_trip() {
        let tokenizer = trained();
        let ids = tokenizer.encode("Tôi  đi HỌC.").unwrap();
        assert!(ids.contains(&2));
        assert_eq!(tokenizer.decode(&ids).unwrap(), "tôi đi học.");

        let line = "học sinh về nhà, anh ấy đi chơi (ở xa)!";
        let ids = tokenizer.encode(line).unwrap();
        assert_eq!(tokenizer.decode(&ids).unwrap(), line);
    }

    #[test]
    fn test_round_trip_with_spaced_quotes() {
        let tokenizer = VoiceBpeTokenizer::train(["anh nói xin chào nhé"], &options(64)).unwrap();
        let ids = tokenizer.encode("anh nói \" xin chào \" nhé").unwrap();
        assert_eq!(tokenizer.decode(&ids).unwrap(), "anh nói xin chào nhé");
        let ids = tokenizer.encode("anh nói \" xin chào").unwrap();
        assert_eq!(tokenizer.decode(&ids).unwrap(), "anh nói xin chào");
    }

    #[test]
    fn test_initial_alphabet_and_max_token_length() {
        let tokenizer = VoiceBpeTokenizer::train(
            CORPUS,
            &TrainingOptions {
                initial_alphabet: vec!['z'],
                max_token_length: Some(2),
                ..options(128)
            },
        )
        .unwrap();
        assert!(tokenizer.token_to_id("z").is_some());
        let merged: Vec<String> = tokenizer
            .get_model()
            .get_vocab()
            .into_keys()
            .filter(|t| !t.starts_with('[') && t.chars().count() > 1)
            .collect();
        assert!(merged.iter().any(|t| t == "nh"));
        assert!(merged.iter().all(|t| t.len() <= 2));

        let ids = tokenizer.encode("tôi đi học").unwrap();
        assert_eq!(tokenizer.decode(&ids).unwrap(), "tôi đi học");
    }

    #[test]
    fn test_unknown_characters_vanish_on_decode() {
        let tokenizer = trained();
        let ids = tokenizer.encode("tôi qwz").unwrap();
        assert!(ids.contains(&1));
        assert_eq!(tokenizer.decode(&ids).unwrap(), "tôi ");
    }

    #[test]
    fn test_decode_markers() {
        let tokenizer = trained();
        let t = tokenizer.token_to_id("t").unwrap();
        assert_eq!(tokenizer.decode(&[0, t, 2, 1, t, 0]).unwrap(), "t t");
        assert!(matches!(
            tokenizer.decode(&[100_000]),
            Err(Error::UnknownTokenId { id: 100_000 })
        ));
    }

    #[test]
    fn test_batch_size_does_not_change_the_vocabulary() {
        let small = VoiceBpeTokenizer::train(CORPUS, &options(64)).unwrap();
        let whole = VoiceBpeTokenizer::train(
            CORPUS,
            &TrainingOptions {
                batch_size: 1000,
                ..options(64)
            },
        )
        .unwrap();
        assert_eq!(small.get_model(), whole.get_model());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tokenizer.json");
        let tokenizer = trained();
        tokenizer.save(&path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("\"language\": \"vi\""));

        let loaded = VoiceBpeTokenizer::from_file(&path).unwrap();
        assert_eq!(loaded.language(), "vi");
        let text = "tôi đi học, anh ấy về nhà.";
        assert_eq!(loaded.encode(text).unwrap(), tokenizer.encode(text).unwrap());
    }

    #[test]
    fn test_invalid_options() {
        let no_specials = TrainingOptions {
            special_tokens: vec![],
            ..Default::default()
        };
        assert!(VoiceBpeTokenizer::train(CORPUS, &no_specials).is_err());
        assert!(VoiceBpeTokenizer::train(CORPUS, &options(2)).is_err());
    }
}
