// src/lib.rs

//! Text normalization and BPE tokenization for Vietnamese text-to-speech
//! corpora, with small helpers to sample and split the audio manifests.

pub mod config;
pub mod dataset;
pub mod result;
pub mod text;
pub mod tokenizer;

pub use config::PipelineConfig;
pub use result::{Error, Result};
pub use tokenizer::{TrainingOptions, VoiceBpeTokenizer};
