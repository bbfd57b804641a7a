// src/tokenizer/mod.rs

pub mod added_vocabulary;
pub mod bpe;
pub mod bpe_trainer;
pub mod parallelism;
pub mod pre_tokenizer;
pub mod progress;
pub mod serialization;
pub mod voice;
pub mod word;

pub use added_vocabulary::{AddedToken, AddedVocabulary};
pub use bpe::BPE;
pub use bpe_trainer::{BpeTrainer, BpeTrainerBuilder};
pub use pre_tokenizer::{PreTokenizedString, PreTokenizer, Whitespace};
pub use serialization::TokenizerArtifact;
pub use voice::{TrainingOptions, VoiceBpeTokenizer};
pub use word::Word;

use crate::result::Result;
use rustc_hash::FxHashMap;
use std::collections::HashMap;

pub type Pair = (u32, u32);

/// `(a, b) -> (rank, merged id)`
pub type MergeMap = FxHashMap<Pair, (u32, u32)>;

/// A subword model able to split one pre-tokenized piece into tokens.
pub trait Model: Send + Sync {
    fn tokenize(&self, sequence: &str) -> Result<Vec<Token>>;

    fn token_to_id(&self, token: &str) -> Option<u32>;

    fn id_to_token(&self, id: u32) -> Option<String>;

    fn get_vocab(&self) -> HashMap<String, u32>;

    fn get_vocab_size(&self) -> usize;
}

/// Represents a single token with its ID, content, and offsets in its piece.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Token {
    pub id: u32,
    pub value: String,
    pub offsets: (usize, usize),
}

impl Token {
    pub fn new(id: u32, value: String, offsets: (usize, usize)) -> Self {
        Token { id, value, offsets }
    }
}

/// A trait defining the behavior of a tokenizer Trainer.
pub trait Trainer: Send + Sync {
    /// The type of Model this trainer can produce.
    type Model: Model;

    /// Trains `model` on everything fed so far and returns the special tokens
    /// that must be registered next to it.
    fn train(&self, model: &mut Self::Model) -> Result<Vec<AddedToken>>;

    /// Feeds data to the trainer.
    /// `process` turns one sequence into the words the trainer should count.
    fn feed<I, S, F>(&mut self, iterator: I, process: F) -> Result<()>
    where
        I: Iterator<Item = S> + Send,
        S: AsRef<str> + Send,
        F: Fn(&str) -> Result<Vec<String>> + Sync;
}
