// src/tokenizer/word.rs

use crate::tokenizer::{MergeMap, Pair};
use std::borrow::Borrow;

/// Represents a single word, storing it as a vector of u32 (ids to the vocabulary)
/// and a vector of the byte lengths of those tokens.
#[derive(Debug, Default, PartialEq, Eq, Clone)]
pub struct Word {
    pub chars: Vec<u32>,
    pub char_byte_lengths: Vec<usize>,
}

impl Word {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            chars: Vec::with_capacity(capacity),
            char_byte_lengths: Vec::with_capacity(capacity),
        }
    }

    /// Add a new token to the word. Store its ID and its byte length.
    pub fn add(&mut self, char_id: u32, char_len: usize) {
        self.chars.push(char_id);
        self.char_byte_lengths.push(char_len);
    }

    pub fn get_chars(&self) -> &[u32] {
        self.chars.borrow()
    }

    /// Byte offsets of every symbol, relative to the start of the word.
    pub fn get_offsets(&self) -> Vec<(usize, usize)> {
        let mut pos = 0;
        self.char_byte_lengths
            .iter()
            .map(|len| {
                let offsets = (pos, pos + len);
                pos += len;
                offsets
            })
            .collect()
    }

    /// Merge every `(a, b)` occurrence into `new_id` during training.
    ///
    /// Returns the pair count changes caused by the merge: `-1` for pairs that
    /// disappeared and `1` for the pairs created around `new_id`.
    pub fn merge(
        &mut self,
        a: u32,
        b: u32,
        new_id: u32,
        max_token_length: usize,
    ) -> Vec<(Pair, i32)> {
        let mut changes = Vec::new();

        let mut i = 0;
        let mut new_chars = Vec::with_capacity(self.chars.len());
        let mut new_char_byte_lengths = Vec::with_capacity(self.char_byte_lengths.len());

        while i < self.chars.len() {
            if i + 1 < self.chars.len() && self.chars[i] == a && self.chars[i + 1] == b {
                let new_token_len = self.char_byte_lengths[i] + self.char_byte_lengths[i + 1];

                if new_token_len > max_token_length {
                    new_chars.push(self.chars[i]);
                    new_char_byte_lengths.push(self.char_byte_lengths[i]);
                    i += 1;
                    continue;
                }

                changes.push(((a, b), -1));

                if let Some(&previous_token) = new_chars.last() {
                    changes.push(((previous_token, a), -1));
                    changes.push(((previous_token, new_id), 1));
                }

                if i + 2 < self.chars.len() {
                    let next_token = self.chars[i + 2];
                    changes.push(((b, next_token), -1));
                    changes.push(((new_id, next_token), 1));
                }

                new_chars.push(new_id);
                new_char_byte_lengths.push(new_token_len);

                i += 2;
            } else {
                new_chars.push(self.chars[i]);
                new_char_byte_lengths.push(self.char_byte_lengths[i]);
                i += 1;
            }
        }
        self.chars = new_chars;
        self.char_byte_lengths = new_char_byte_lengths;

        changes
    }

    /// Apply the learned merges, lowest rank first, leftmost first on ties.
    pub fn merge_all(&mut self, merges: &MergeMap) {
        loop {
            let best = self
                .chars
                .windows(2)
                .enumerate()
                .filter_map(|(i, w)| {
                    merges
                        .get(&(w[0], w[1]))
                        .map(|&(rank, new_id)| (rank, i, new_id))
                })
                .min();
            let Some((_, i, new_id)) = best else {
                break;
            };
            self.chars[i] = new_id;
            self.char_byte_lengths[i] += self.char_byte_lengths[i + 1];
            self.chars.remove(i + 1);
            self.char_byte_lengths.remove(i + 1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_reports_changes() {
        // "hello" with h=0 e=1 l=2 o=3, merging (l, l) into 4
        let mut word = Word::new();
        for id in [0, 1, 2, 2, 3] {
            word.add(id, 1);
        }
        let changes = word.merge(2, 2, 4, usize::MAX);
        assert_eq!(word.get_chars(), &[0, 1, 4, 3]);
        assert_eq!(word.char_byte_lengths, vec![1, 1, 2, 1]);
        assert_eq!(
            changes,
            vec![((2, 2), -1), ((1, 2), -1), ((1, 4), 1), ((2, 3), -1), ((4, 3), 1)]
        );
    }

    #[test]
    fn test_merge_respects_max_token_length() {
        let mut word = Word::new();
        word.add(0, 2);
        word.add(1, 2);
        let changes = word.merge(0, 1, 2, 3);
        assert!(changes.is_empty());
        assert_eq!(word.get_chars(), &[0, 1]);
    }

    #[test]
    fn test_merge_all_uses_rank_order() {
        // a=0 b=1 c=2; (b, c) -> 3 rank 0, (a, b) -> 4 rank 1
        let mut merges = MergeMap::default();
        merges.insert((1, 2), (0, 3));
        merges.insert((0, 1), (1, 4));
        let mut word = Word::new();
        for id in [0, 1, 2] {
            word.add(id, 1);
        }
        word.merge_all(&merges);
        assert_eq!(word.get_chars(), &[0, 3]);
        assert_eq!(word.get_offsets(), vec![(0, 1), (1, 3)]);
    }
}
