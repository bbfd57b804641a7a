// src/config.rs

//! Settings for the whole pipeline, read from one JSON file.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::dataset::{SamplingConfig, SplitConfig};
use crate::result::{Error, Result};
use crate::tokenizer::TrainingOptions;

/// Every section falls back to its defaults when missing from the file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Tokenizer training
    pub tokenizer: TrainingOptions,
    /// Dataset sampling
    pub sampling: SamplingConfig,
    /// Train/valid split
    pub split: SplitConfig,
}

impl PipelineConfig {
    /// Load and validate a configuration from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::InvalidConfig(format!(
                "config file not found: {}",
                path.display()
            )));
        }

        let content = std::fs::read_to_string(path)?;
        let config: PipelineConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a JSON file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        self.tokenizer.validate()?;
        self.split.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.tokenizer.vocab_size, 256);
        assert_eq!(config.tokenizer.special_tokens, vec!["[STOP]", "[UNK]", "[SPACE]"]);
        assert_eq!(config.tokenizer.language, "vi");
        assert_eq!(config.sampling.sample_size, 250);
        assert_eq!(config.split.train_ratio, 0.8);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pipeline.json");
        let json = r#"{"tokenizer": {"vocab_size": 512}, "split": {"train_ratio": 0.9}}"#;
        std::fs::write(&path, json).unwrap();

        let config = PipelineConfig::load(&path).unwrap();
        assert_eq!(config.tokenizer.vocab_size, 512);
        assert_eq!(config.tokenizer.batch_size, 1000);
        assert_eq!(config.split.train_ratio, 0.9);
        assert_eq!(config.sampling, SamplingConfig::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pipeline.json");
        let mut config = PipelineConfig::default();
        config.sampling.sample_size = 10;
        config.save(&path).unwrap();
        assert_eq!(PipelineConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_invalid_values() {
        let mut config = PipelineConfig::default();
        config.split.train_ratio = -0.1;
        assert!(config.validate().is_err());

        let mut config = PipelineConfig::default();
        config.tokenizer.batch_size = 0;
        assert!(config.validate().is_err());

        let mut config = PipelineConfig::default();
        config.tokenizer.vocab_size = 2;
        assert!(config.validate().is_err());

        let dir = tempfile::tempdir().unwrap();
        assert!(PipelineConfig::load(dir.path().join("missing.json")).is_err());
    }
}
