// src/tokenizer/added_vocabulary.rs

use aho_corasick::{AhoCorasick, AhoCorasickBuilder, MatchKind};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use super::pre_tokenizer::{NormalizedString, PreTokenizedString};
use super::{Model, Token};

/// Represent a token added on top of the model vocabulary, such as the
/// `[SPACE]` word boundary marker.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AddedToken {
    /// The content of the added token
    pub content: String,
    /// Whether this token must be a single word or can break words
    pub single_word: bool,
    /// Whether this token should strip whitespaces on its left
    pub lstrip: bool,
    /// Whether this token should strip whitespaces on its right
    pub rstrip: bool,
    /// Kept for artifact compatibility. Added tokens always match raw text here.
    pub normalized: bool,
    /// Whether this token is special
    pub special: bool,
}

impl AddedToken {
    /// Build this token from the given content, specifying if it is intended to be a
    /// special token.
    pub fn from<S: Into<String>>(content: S, special: bool) -> Self {
        Self {
            content: content.into(),
            special,
            ..Default::default()
        }
    }
    #[must_use]
    pub fn single_word(mut self, single_word: bool) -> Self {
        self.single_word = single_word;
        self
    }
    #[must_use]
    pub fn lstrip(mut self, lstrip: bool) -> Self {
        self.lstrip = lstrip;
        self
    }
    #[must_use]
    pub fn rstrip(mut self, rstrip: bool) -> Self {
        self.rstrip = rstrip;
        self
    }
}

impl Default for AddedToken {
    fn default() -> Self {
        Self {
            content: String::new(),
            single_word: false,
            lstrip: false,
            rstrip: false,
            normalized: false,
            special: true,
        }
    }
}

impl std::hash::Hash for AddedToken {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.content.hash(state);
    }
}

static STARTS_WITH_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\w").expect("static pattern"));
static ENDS_WITH_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\w$").expect("static pattern"));
static RIGHTMOST_SPACE_AT_START: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*").expect("static pattern"));
static LEFTMOST_SPACE_AT_END: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*$").expect("static pattern"));

fn ends_with_word(sentence: &str) -> bool {
    ENDS_WITH_WORD.is_match(sentence)
}

fn starts_with_word(sentence: &str) -> bool {
    STARTS_WITH_WORD.is_match(sentence)
}

fn space_leftmost_at_end(sentence: &str) -> usize {
    LEFTMOST_SPACE_AT_END
        .find(sentence)
        .map_or(sentence.len(), |m| m.start())
}

fn space_rightmost_at_start(sentence: &str) -> usize {
    RIGHTMOST_SPACE_AT_START.find(sentence).map_or(0, |m| m.end())
}

/// Added tokens sitting next to the model vocabulary.
///
/// Matching runs on the raw text before pre-tokenization, so an added token is
/// never split by the whitespace/punctuation rules and never reaches the BPE
/// merges.
#[derive(Clone, Debug)]
pub struct AddedVocabulary {
    added_tokens_map: HashMap<String, u32>,
    added_tokens_map_r: HashMap<u32, AddedToken>,
    /// In the order they were added.
    added_tokens: Vec<AddedToken>,
    special_tokens_set: HashSet<String>,
    split_trie: (AhoCorasick, Vec<u32>),
}

impl AddedVocabulary {
    pub fn new() -> Self {
        let trie = AhoCorasickBuilder::new()
            .match_kind(MatchKind::LeftmostLongest)
            .build::<_, &&[u8]>([])
            .expect("The trie should build correctly");
        Self {
            added_tokens_map: HashMap::new(),
            added_tokens_map_r: HashMap::new(),
            added_tokens: vec![],
            special_tokens_set: HashSet::new(),
            split_trie: (trie, vec![]),
        }
    }

    pub fn token_to_id(&self, token: &str, model: &impl Model) -> Option<u32> {
        self.added_tokens_map
            .get(token)
            .copied()
            .or_else(|| model.token_to_id(token))
    }

    pub fn simple_id_to_token(&self, id: u32) -> Option<&str> {
        self.added_tokens_map_r.get(&id).map(|t| t.content.as_str())
    }

    pub fn is_special_token(&self, token: &str) -> bool {
        self.special_tokens_set.contains(token)
    }

    /// Register `tokens`, reusing the model id when the content is already
    /// part of the vocabulary and appending after it otherwise. Returns the
    /// number of tokens actually added.
    pub fn add_tokens(&mut self, tokens: &[AddedToken], model: &impl Model) -> usize {
        let mut ignored = 0;
        for token in tokens {
            if token.content.is_empty() || self.added_tokens_map.contains_key(&token.content) {
                ignored += 1;
                continue;
            }
            let new_id = self.token_to_id(&token.content, model).unwrap_or_else(|| {
                let next_free = self
                    .added_tokens_map
                    .values()
                    .map(|id| id + 1)
                    .max()
                    .unwrap_or(0);
                next_free.max(model.get_vocab_size() as u32)
            });
            self.added_tokens_map.insert(token.content.clone(), new_id);
            self.added_tokens_map_r.insert(new_id, token.clone());
            if token.special {
                self.special_tokens_set.insert(token.content.clone());
            }
            self.added_tokens.push(token.clone());
        }

        self.refresh_added_tokens();
        tokens.len() - ignored
    }

    fn refresh_added_tokens(&mut self) {
        let ids: Vec<u32> = self
            .added_tokens
            .iter()
            .map(|token| self.added_tokens_map[&token.content])
            .collect();
        let trie = AhoCorasickBuilder::new()
            .match_kind(MatchKind::LeftmostLongest)
            .build(self.added_tokens.iter().map(|token| &token.content))
            .expect("Failed to build trie when refreshing tokens");
        self.split_trie = (trie, ids);
    }

    /// Find any AddedToken in the given sentence, honouring single_word,
    /// lstrip and rstrip. Offsets are byte offsets into `sentence`.
    pub fn find_matches(&self, sentence: &str) -> Vec<Token> {
        if sentence.is_empty() {
            return vec![];
        }

        let mut found = Vec::new();
        let mut last_stop = 0;
        for mat in self.split_trie.0.find_iter(sentence) {
            let mut start = mat.start();
            let mut stop = mat.end();
            let id = self.split_trie.1[mat.pattern().as_usize()];
            let Some(added_token) = self.added_tokens_map_r.get(&id) else {
                continue;
            };

            if added_token.single_word {
                let start_space = start == 0 || !ends_with_word(&sentence[..start]);
                let stop_space = stop == sentence.len() || !starts_with_word(&sentence[stop..]);
                if !stop_space || !start_space {
                    continue;
                }
            }
            if added_token.lstrip {
                start = space_leftmost_at_end(&sentence[last_stop..start]) + last_stop;
            }
            if added_token.rstrip {
                stop += space_rightmost_at_start(&sentence[stop..]);
            }
            last_stop = stop;
            found.push(Token::new(id, added_token.content.clone(), (start, stop)));
        }
        found
    }

    /// Cut `sentence` around every added token. Matched pieces come back
    /// already resolved, the rest is left for the pre-tokenizer.
    pub fn extract(&self, sentence: &str) -> PreTokenizedString {
        let mut splits = Vec::new();
        let mut last_end = 0;
        for token in self.find_matches(sentence) {
            let (start, stop) = token.offsets;
            // rstrip can swallow the whitespace another lstrip already took
            if start < last_end {
                continue;
            }
            if last_end < start {
                splits.push(NormalizedString::new(&sentence[last_end..start]));
            }
            let content = sentence[start..stop].to_owned();
            let len = content.len();
            splits.push(NormalizedString::with_tokens(
                content,
                vec![Token::new(token.id, token.value, (0, len))],
            ));
            last_end = stop;
        }
        if last_end < sentence.len() {
            splits.push(NormalizedString::new(&sentence[last_end..]));
        }
        PreTokenizedString::from_splits(splits)
    }
}

impl Default for AddedVocabulary {
    fn default() -> Self {
        Self::new()
    }
}

/// An added token together with its id, as stored in the artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddedTokenWithId {
    pub id: u32,
    #[serde(flatten)]
    pub token: AddedToken,
}

impl AddedVocabulary {
    /// Added tokens ordered by ascending id.
    pub fn to_entries(&self) -> Vec<AddedTokenWithId> {
        let mut entries: Vec<AddedTokenWithId> = self
            .added_tokens_map_r
            .iter()
            .map(|(id, token)| AddedTokenWithId {
                id: *id,
                token: token.clone(),
            })
            .collect();
        entries.sort_unstable_by_key(|e| e.id);
        entries
    }
}
