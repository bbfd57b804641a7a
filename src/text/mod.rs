// src/text/mod.rs

pub mod cleaners;
pub mod normalizer;
pub mod punctuation;
pub mod vietnamese;
pub mod whitelist;

pub use cleaners::Cleaner;
pub use normalizer::{TextNormalizer, text_cleaners};
pub use punctuation::remove_extraneous_punctuation;
pub use vietnamese::{LinguisticNormalizer, VietnameseNormalizer};
pub use whitelist::{WhitelistFilter, preprocess_word};
