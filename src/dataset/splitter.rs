// src/dataset/splitter.rs

use std::path::PathBuf;

use log::info;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::dataset::manifest;
use crate::result::{Error, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    pub manifest: PathBuf,
    pub train_file: PathBuf,
    pub valid_file: PathBuf,
    /// Share of lines that go to `train_file`, in `[0, 1]`.
    pub train_ratio: f64,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            manifest: PathBuf::from("wavs_sampled/universal/wavs_transcriptions.txt"),
            train_file: PathBuf::from("wavs_sampled/universal/train.txt"),
            valid_file: PathBuf::from("wavs_sampled/universal/valid.txt"),
            train_ratio: 0.8,
        }
    }
}

impl SplitConfig {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.train_ratio) {
            return Err(Error::InvalidConfig(format!(
                "train_ratio must be within [0, 1], got {}",
                self.train_ratio
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitSummary {
    pub train: usize,
    pub valid: usize,
}

/// Shuffles the manifest lines and writes the first `floor(n * train_ratio)`
/// to the train file and the rest to the valid file. Lines are not modified.
pub fn split_transcriptions<R>(config: &SplitConfig, rng: &mut R) -> Result<SplitSummary>
where
    R: Rng + ?Sized,
{
    config.validate()?;

    let mut lines = manifest::read_lines(&config.manifest)?;
    lines.shuffle(rng);

    let split_index = ((lines.len() as f64 * config.train_ratio).floor() as usize).min(lines.len());
    let (train, valid) = lines.split_at(split_index);

    manifest::write_lines(&config.train_file, train)?;
    manifest::write_lines(&config.valid_file, valid)?;

    info!(
        "Split {} lines into {} train / {} valid",
        lines.len(),
        train.len(),
        valid.len()
    );
    Ok(SplitSummary {
        train: train.len(),
        valid: valid.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;
    use std::path::Path;

    fn config(dir: &Path, ratio: f64) -> SplitConfig {
        SplitConfig {
            manifest: dir.join("wavs_transcriptions.txt"),
            train_file: dir.join("train.txt"),
            valid_file: dir.join("valid.txt"),
            train_ratio: ratio,
        }
    }

    fn write_manifest(dir: &Path, n: usize) -> Vec<String> {
        let lines: Vec<String> = (0..n).map(|i| format!("audio_{i}_x.wav|dòng {i}")).collect();
        manifest::write_lines(dir.join("wavs_transcriptions.txt"), &lines).unwrap();
        lines
    }

    #[test]
    fn test_ten_lines_split_eight_two() {
        let dir = tempfile::tempdir().unwrap();
        let lines = write_manifest(dir.path(), 10);
        let config = config(dir.path(), 0.8);
        let mut rng = StdRng::seed_from_u64(42);

        let summary = split_transcriptions(&config, &mut rng).unwrap();
        assert_eq!(summary, SplitSummary { train: 8, valid: 2 });

        let train = manifest::read_lines(&config.train_file).unwrap();
        let valid = manifest::read_lines(&config.valid_file).unwrap();
        assert_eq!(train.len(), 8);
        assert_eq!(valid.len(), 2);

        let all: HashSet<String> = train.into_iter().chain(valid).collect();
        assert_eq!(all, lines.into_iter().collect::<HashSet<_>>());
    }

    #[test]
    fn test_ratio_bounds() {
        let dir = tempfile::tempdir().unwrap();
        write_manifest(dir.path(), 3);
        let mut rng = StdRng::seed_from_u64(0);

        let all_train = split_transcriptions(&config(dir.path(), 1.0), &mut rng).unwrap();
        assert_eq!(all_train, SplitSummary { train: 3, valid: 0 });
        let all_valid = split_transcriptions(&config(dir.path(), 0.0), &mut rng).unwrap();
        assert_eq!(all_valid, SplitSummary { train: 0, valid: 3 });

        assert!(matches!(
            split_transcriptions(&config(dir.path(), 1.5), &mut rng),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_same_seed_same_split() {
        let dir = tempfile::tempdir().unwrap();
        write_manifest(dir.path(), 20);
        let config = config(dir.path(), 0.5);

        split_transcriptions(&config, &mut StdRng::seed_from_u64(9)).unwrap();
        let first = manifest::read_lines(&config.train_file).unwrap();
        split_transcriptions(&config, &mut StdRng::seed_from_u64(9)).unwrap();
        assert_eq!(manifest::read_lines(&config.train_file).unwrap(), first);
    }
}
