// src/tokenizer/bpe_trainer.rs
#![allow(clippy::map_entry)]

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::result::Result;
use crate::tokenizer::bpe::BPE;
use crate::tokenizer::parallelism::{
    MaybeParallelBridge, MaybeParallelRefIterator, MaybeParallelRefMutIterator,
};
use crate::tokenizer::progress::{ProgressBar, ProgressStyle};
use crate::tokenizer::word::Word;
use crate::tokenizer::{AddedToken, Pair, Trainer};

#[derive(Debug, Eq)]
struct Merge {
    pair: Pair,
    count: u64,
    pos: HashSet<usize>,
}

impl PartialEq for Merge {
    fn eq(&self, other: &Self) -> bool {
        self.count == other.count && self.pair == other.pair
    }
}

impl PartialOrd for Merge {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Merge {
    fn cmp(&self, other: &Self) -> Ordering {
        // Highest count first; on equal counts the smaller pair wins.
        self.count
            .cmp(&other.count)
            .then_with(|| other.pair.cmp(&self.pair))
    }
}

struct Config {
    min_frequency: u64,
    vocab_size: usize,
    show_progress: bool,
    special_tokens: Vec<AddedToken>,
    limit_alphabet: Option<usize>,
    initial_alphabet: HashSet<char>,
    max_token_length: Option<usize>,
}

pub struct BpeTrainerBuilder {
    config: Config,
}

impl Default for BpeTrainerBuilder {
    fn default() -> Self {
        Self {
            config: Config {
                min_frequency: 0,
                vocab_size: 256,
                show_progress: true,
                special_tokens: vec![],
                limit_alphabet: None,
                initial_alphabet: HashSet::new(),
                max_token_length: None,
            },
        }
    }
}

impl BpeTrainerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn min_frequency(mut self, frequency: u64) -> Self {
        self.config.min_frequency = frequency;
        self
    }

    #[must_use]
    pub fn vocab_size(mut self, size: usize) -> Self {
        self.config.vocab_size = size;
        self
    }

    #[must_use]
    pub fn show_progress(mut self, show: bool) -> Self {
        self.config.show_progress = show;
        self
    }

    #[must_use]
    pub fn special_tokens(mut self, tokens: Vec<AddedToken>) -> Self {
        self.config.special_tokens = tokens;
        self
    }

    #[must_use]
    pub fn limit_alphabet(mut self, limit: usize) -> Self {
        self.config.limit_alphabet = Some(limit);
        self
    }

    #[must_use]
    pub fn initial_alphabet(mut self, alphabet: HashSet<char>) -> Self {
        self.config.initial_alphabet = alphabet;
        self
    }

    /// Longest token, in bytes, a merge may produce.
    #[must_use]
    pub fn max_token_length(mut self, max_token_length: Option<usize>) -> Self {
        self.config.max_token_length = max_token_length;
        self
    }

    pub fn build(self) -> BpeTrainer {
        BpeTrainer {
            min_frequency: self.config.min_frequency,
            vocab_size: self.config.vocab_size,
            show_progress: self.config.show_progress,
            special_tokens: self.config.special_tokens,
            limit_alphabet: self.config.limit_alphabet,
            initial_alphabet: self.config.initial_alphabet,
            max_token_length: self.config.max_token_length,
            words: HashMap::new(),
        }
    }
}

/// Learns a character level BPE vocabulary from word counts.
///
/// Special tokens take the first ids, in the order they were given. The
/// alphabet follows, sorted by code point, and then every merged token in the
/// order it was learned.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BpeTrainer {
    pub min_frequency: u64,
    pub vocab_size: usize,
    pub show_progress: bool,
    pub special_tokens: Vec<AddedToken>,
    pub limit_alphabet: Option<usize>,
    pub initial_alphabet: HashSet<char>,
    pub max_token_length: Option<usize>,

    words: HashMap<String, u64>,
}

impl Default for BpeTrainer {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl BpeTrainer {
    pub fn builder() -> BpeTrainerBuilder {
        BpeTrainerBuilder::new()
    }

    /// Word counts accumulated by every `feed` so far.
    pub fn word_counts(&self) -> &HashMap<String, u64> {
        &self.words
    }

    fn setup_progress(&self) -> Option<ProgressBar> {
        if self.show_progress {
            let p = ProgressBar::new(0);
            if let Ok(style) = ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {msg:<30!} {wide_bar} {pos:<9!}/{len:>9!}")
            {
                p.set_style(style);
            }
            Some(p)
        } else {
            None
        }
    }

    fn finalize_progress(&self, p: &Option<ProgressBar>, final_len: usize) {
        if let Some(p) = p {
            p.set_length(final_len as u64);
            p.finish();
        }
    }

    fn update_progress(&self, p: &Option<ProgressBar>, len: usize, message: &'static str) {
        if let Some(p) = p {
            p.set_message(message);
            p.set_length(len as u64);
            p.reset();
        }
    }

    fn add_special_tokens(&self, w2id: &mut HashMap<String, u32>, id2w: &mut Vec<String>) {
        for token in &self.special_tokens {
            if !w2id.contains_key(&token.content) {
                id2w.push(token.content.to_owned());
                w2id.insert(token.content.to_owned(), (id2w.len() - 1) as u32);
            }
        }
    }

    /// Adds every character of the corpus to the vocabulary. When the
    /// alphabet does not fit, the rarest characters are left out.
    fn compute_alphabet(
        &self,
        wc: &HashMap<String, u64>,
        w2id: &mut HashMap<String, u32>,
        id2w: &mut Vec<String>,
    ) {
        let mut alphabet: HashMap<char, u64> = HashMap::new();
        for (word, count) in wc {
            for c in word.chars() {
                *alphabet.entry(c).or_default() += *count;
            }
        }
        for c in &self.initial_alphabet {
            alphabet.insert(*c, u64::MAX);
        }

        let room = self.vocab_size.saturating_sub(w2id.len());
        let limit = self.limit_alphabet.map_or(room, |limit| limit.min(room));

        let mut kept = alphabet.into_iter().collect::<Vec<_>>();
        if kept.len() > limit {
            let to_remove = kept.len() - limit;
            kept.sort_unstable_by_key(|(c, count)| (*count, std::cmp::Reverse(*c)));
            let removed: Vec<char> = kept.drain(..to_remove).map(|(c, _)| c).collect();
            debug!("Dropping {} rare characters from the alphabet: {:?}", removed.len(), removed);
        }

        kept.sort_unstable_by_key(|(c, _)| *c as u32);
        for (c, _) in kept {
            let s = c.to_string();
            if !w2id.contains_key(&s) {
                id2w.push(s.clone());
                w2id.insert(s, (id2w.len() - 1) as u32);
            }
        }
    }

    /// Characters left out of the alphabet are skipped.
    fn tokenize_words(
        &self,
        wc: &HashMap<String, u64>,
        w2id: &HashMap<String, u32>,
        p: &Option<ProgressBar>,
    ) -> (Vec<Word>, Vec<u64>) {
        let mut words: Vec<Word> = Vec::with_capacity(wc.len());
        let mut counts: Vec<u64> = Vec::with_capacity(wc.len());

        // Sorted so that word indices, and with them training, are reproducible.
        let mut entries: Vec<(&String, &u64)> = wc.iter().collect();
        entries.sort_unstable();

        for (word_str, count) in entries {
            let mut current_word = Word::new();
            counts.push(*count);

            for c in word_str.chars() {
                let mut buf = [0u8; 4];
                let s: &str = c.encode_utf8(&mut buf);
                if let Some(&id) = w2id.get(s) {
                    current_word.add(id, s.len());
                }
            }
            words.push(current_word);

            if let Some(p) = p {
                p.inc(1);
            }
        }
        (words, counts)
    }

    fn count_pairs(
        &self,
        words: &[Word],
        counts: &[u64],
        p: &Option<ProgressBar>,
    ) -> (HashMap<Pair, i32>, HashMap<Pair, HashSet<usize>>) {
        words
            .maybe_par_iter()
            .enumerate()
            .map(|(i, word)| {
                let mut pair_counts = HashMap::new();
                let mut where_to_update: HashMap<Pair, HashSet<usize>> = HashMap::new();

                for window in word.get_chars().windows(2) {
                    let cur_pair: Pair = (window[0], window[1]);
                    *pair_counts.entry(cur_pair).or_insert(0) += counts[i] as i32;
                    where_to_update.entry(cur_pair).or_default().insert(i);
                }

                if let Some(p) = &p {
                    p.inc(1);
                }

                (pair_counts, where_to_update)
            })
            .reduce(
                || (HashMap::new(), HashMap::new()),
                |(mut pair_counts, mut where_to_update), (pc, wtu)| {
                    for (k, v) in pc {
                        *pair_counts.entry(k).or_insert(0) += v;
                    }
                    for (k, v) in wtu {
                        where_to_update.entry(k).or_default().extend(v);
                    }
                    (pair_counts, where_to_update)
                },
            )
    }

    /// Runs the merge loop over `word_counts` and replaces `model` with the
    /// result. The unk token of `model` is carried over.
    pub fn do_train(
        &self,
        word_counts: &HashMap<String, u64>,
        model: &mut BPE,
    ) -> Result<Vec<AddedToken>> {
        let mut word_to_id: HashMap<String, u32> = HashMap::with_capacity(self.vocab_size);
        let mut id_to_word: Vec<String> = Vec::with_capacity(self.vocab_size);
        let max_token_length = self.max_token_length.unwrap_or(usize::MAX);

        let progress = self.setup_progress();

        // 1. Special tokens come first
        self.add_special_tokens(&mut word_to_id, &mut id_to_word);
        let n_special = id_to_word.len();

        // 2. Then the alphabet
        self.compute_alphabet(word_counts, &mut word_to_id, &mut id_to_word);
        info!(
            "Alphabet of {} characters after {} special tokens",
            id_to_word.len() - n_special,
            n_special
        );

        // 3. Words as sequences of alphabet ids
        self.update_progress(&progress, word_counts.len(), "Tokenize words");
        let (mut words, counts) = self.tokenize_words(word_counts, &word_to_id, &progress);
        self.finalize_progress(&progress, words.len());

        // 4. Initial pair counts
        self.update_progress(&progress, words.len(), "Count pairs");
        let (mut pair_counts, mut where_to_update) = self.count_pairs(&words, &counts, &progress);
        let mut queue = BinaryHeap::with_capacity(pair_counts.len());
        where_to_update.drain().for_each(|(pair, pos)| {
            let count = pair_counts[&pair];
            if count > 0 {
                queue.push(Merge {
                    pair,
                    count: count as u64,
                    pos,
                });
            }
        });
        self.finalize_progress(&progress, words.len());

        // 5. Merge until the vocabulary is full or nothing frequent is left
        self.update_progress(&progress, self.vocab_size, "Compute merges");
        let mut merges: Vec<(Pair, u32)> = vec![];
        loop {
            if word_to_id.len() >= self.vocab_size {
                break;
            }

            let Some(mut top) = queue.pop() else {
                break;
            };

            let current = pair_counts.get(&top.pair).copied().unwrap_or(0).max(0) as u64;
            if top.count != current {
                top.count = current;
                queue.push(top);
                continue;
            }

            if top.count < 1 || self.min_frequency > top.count {
                break;
            }

            let part_a = &id_to_word[top.pair.0 as usize];
            let part_b = &id_to_word[top.pair.1 as usize];
            let new_token = format!("{part_a}{part_b}");
            if new_token.len() > max_token_length {
                continue;
            }

            let new_token_id = word_to_id
                .get(&new_token)
                .copied()
                .unwrap_or(id_to_word.len() as u32);
            if !word_to_id.contains_key(&new_token) {
                id_to_word.push(new_token.clone());
                word_to_id.insert(new_token, new_token_id);
            }
            merges.push((top.pair, new_token_id));

            // Merge the pair in every word containing it and gather the pair count changes
            let positions = &top.pos;
            let changes = words
                .maybe_par_iter_mut()
                .enumerate()
                .flat_map(|(i, word)| {
                    if positions.contains(&i) {
                        word.merge(top.pair.0, top.pair.1, new_token_id, max_token_length)
                            .into_iter()
                            .map(|change| (change, i))
                            .collect::<Vec<_>>()
                    } else {
                        vec![]
                    }
                })
                .collect::<Vec<_>>();

            for ((pair, change), iw) in changes {
                let count = change * counts[iw] as i32;
                *pair_counts.entry(pair).or_insert(0) += count;
                if change > 0 {
                    where_to_update.entry(pair).or_default().insert(iw);
                }
            }
            where_to_update.drain().for_each(|(pair, pos)| {
                let count = pair_counts[&pair];
                if count > 0 {
                    queue.push(Merge {
                        pair,
                        count: count as u64,
                        pos,
                    });
                }
            });

            if let Some(p) = &progress {
                p.inc(1);
            }
        }
        self.finalize_progress(&progress, merges.len());
        info!(
            "Learned {} merges, vocabulary size {}",
            merges.len(),
            word_to_id.len()
        );

        let merges = merges
            .into_iter()
            .map(|((a, b), _)| (id_to_word[a as usize].clone(), id_to_word[b as usize].clone()))
            .collect();
        let unk_token = model.get_unk_token().map(str::to_owned);
        *model = BPE::new(word_to_id.into_iter().collect(), merges, unk_token)?;

        Ok(self.special_tokens.clone())
    }
}

impl Trainer for BpeTrainer {
    type Model = BPE;

    fn train(&self, model: &mut BPE) -> Result<Vec<AddedToken>> {
        self.do_train(&self.words, model)
    }

    fn feed<I, S, F>(&mut self, iterator: I, process: F) -> Result<()>
    where
        I: Iterator<Item = S> + Send,
        S: AsRef<str> + Send,
        F: Fn(&str) -> Result<Vec<String>> + Sync,
    {
        let words: Result<HashMap<String, u64>> = iterator
            .maybe_par_bridge()
            .map(|sequence| {
                let words = process(sequence.as_ref())?;
                let mut map = HashMap::new();
                for word in words {
                    *map.entry(word).or_default() += 1;
                }
                Ok(map)
            })
            .reduce(
                || Ok(HashMap::new()),
                |acc, ws| {
                    let mut acc = acc?;
                    for (k, v) in ws? {
                        *acc.entry(k).or_default() += v;
                    }
                    Ok(acc)
                },
            );

        for (word, count) in words? {
            *self.words.entry(word).or_default() += count;
        }
        Ok(())
    }
}
