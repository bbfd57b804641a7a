// src/tokenizer/bpe.rs

use std::collections::HashMap as StdHashMap;

use rustc_hash::FxHashMap as HashMap;

use crate::result::{Error, Result};
use crate::tokenizer::{MergeMap, Model, Token, Word};

/// Character level BPE model: a dense vocabulary plus ranked merge rules.
#[derive(Debug, Clone, PartialEq)]
pub struct BPE {
    vocab: HashMap<String, u32>,
    vocab_r: HashMap<u32, String>,
    merges: MergeMap,
    unk_token: Option<String>,
}

impl Default for BPE {
    fn default() -> Self {
        Self {
            vocab: HashMap::default(),
            vocab_r: HashMap::default(),
            merges: MergeMap::default(),
            unk_token: None,
        }
    }
}

impl BPE {
    /// Build the model from a vocabulary and merges given in rank order.
    pub fn new(
        vocab: StdHashMap<String, u32>,
        merges: Vec<(String, String)>,
        unk_token: Option<String>,
    ) -> Result<Self> {
        let vocab: HashMap<String, u32> = vocab.into_iter().collect();
        if let Some(unk) = &unk_token {
            if !vocab.contains_key(unk) {
                return Err(Error::MissingUnkToken(unk.clone()));
            }
        }

        let lookup = |token: &str| {
            vocab
                .get(token)
                .copied()
                .ok_or_else(|| Error::MergeTokenOutOfVocabulary(token.to_owned()))
        };
        let mut merge_map = MergeMap::default();
        for (rank, (a, b)) in merges.iter().enumerate() {
            let a_id = lookup(a)?;
            let b_id = lookup(b)?;
            let new_id = lookup(&format!("{a}{b}"))?;
            merge_map.insert((a_id, b_id), (rank as u32, new_id));
        }

        let vocab_r = vocab.iter().map(|(k, v)| (*v, k.clone())).collect();
        Ok(Self {
            vocab,
            vocab_r,
            merges: merge_map,
            unk_token,
        })
    }

    /// An empty model that will resolve unknown characters to `unk_token` once trained.
    pub fn with_unk_token(unk_token: impl Into<String>) -> Self {
        Self {
            unk_token: Some(unk_token.into()),
            ..Self::default()
        }
    }

    pub fn get_unk_token(&self) -> Option<&str> {
        self.unk_token.as_deref()
    }

    /// Merge rules in rank order.
    pub fn get_merges(&self) -> Vec<(String, String)> {
        let mut ranked: Vec<(u32, &(u32, u32))> =
            self.merges.iter().map(|(pair, (rank, _))| (*rank, pair)).collect();
        ranked.sort_unstable_by_key(|(rank, _)| *rank);
        ranked
            .into_iter()
            .map(|(_, (a, b))| (self.vocab_r[a].clone(), self.vocab_r[b].clone()))
            .collect()
    }

    fn word_for(&self, sequence: &str) -> Result<Word> {
        let mut word = Word::with_capacity(sequence.len());
        let unk_id = self
            .unk_token
            .as_ref()
            .and_then(|unk| self.vocab.get(unk).copied());
        for c in sequence.chars() {
            let mut buf = [0u8; 4];
            let s: &str = c.encode_utf8(&mut buf);
            match self.vocab.get(s).copied().or(unk_id) {
                Some(id) => word.add(id, s.len()),
                None => {
                    return Err(Error::Generic(format!(
                        "character {s:?} is not in the vocabulary and no unk token is set"
                    )));
                }
            }
        }
        word.merge_all(&self.merges);
        Ok(word)
    }
}

impl Model for BPE {
    fn tokenize(&self, sequence: &str) -> Result<Vec<Token>> {
        if sequence.is_empty() {
            return Ok(vec![]);
        }
        let word = self.word_for(sequence)?;
        Ok(word
            .get_chars()
            .iter()
            .zip(word.get_offsets())
            .map(|(id, offsets)| Token::new(*id, self.vocab_r[id].clone(), offsets))
            .collect())
    }

    fn token_to_id(&self, token: &str) -> Option<u32> {
        self.vocab.get(token).copied()
    }

    fn id_to_token(&self, id: u32) -> Option<String> {
        self.vocab_r.get(&id).cloned()
    }

    fn get_vocab(&self) -> StdHashMap<String, u32> {
        self.vocab.iter().map(|(k, v)| (k.clone(), *v)).collect()
    }

    fn get_vocab_size(&self) -> usize {
        self.vocab.len()
    }
}
