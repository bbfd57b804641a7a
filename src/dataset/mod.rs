// src/dataset/mod.rs

pub mod corpus;
pub mod manifest;
pub mod sampler;
pub mod splitter;

pub use corpus::{build_text_file_from_priors, CorpusFormat, Prior};
pub use manifest::ManifestEntry;
pub use sampler::{sample_audio_and_transcriptions, SamplingConfig, SamplingSummary};
pub use splitter::{split_transcriptions, SplitConfig, SplitSummary};
