// src/dataset/sampler.rs

use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;

use log::{info, warn};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::dataset::manifest::{self, ManifestEntry};
use crate::result::{Error, Result};

/// Name of the manifest kept inside the sampled directory.
pub const TARGET_MANIFEST: &str = "wavs_transcriptions.txt";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    /// Manifest to draw from.
    pub source_manifest: PathBuf,
    /// Directory the audio paths of the source manifest are relative to.
    pub source_root: PathBuf,
    /// Where sampled audio and the sampled manifest go.
    pub target_dir: PathBuf,
    /// Written in front of the file name in every new manifest line.
    pub target_prefix: String,
    pub sample_size: usize,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            source_manifest: PathBuf::from("wavs/universal3/wavs_transcriptions.txt"),
            source_root: PathBuf::from("."),
            target_dir: PathBuf::from("wavs_sampled/universal"),
            target_prefix: "wavs_sampled/universal/".to_string(),
            sample_size: 250,
        }
    }
}

impl SamplingConfig {
    pub fn target_manifest(&self) -> PathBuf {
        self.target_dir.join(TARGET_MANIFEST)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplingSummary {
    /// Entries drawn in this run.
    pub sampled: usize,
    /// Entries that were not sampled before this run.
    pub available: usize,
    /// Lines in the target manifest afterwards.
    pub total: usize,
}

/// Draws up to `sample_size` entries that are not in the target manifest yet,
/// copies their audio next to it and rewrites the manifest sorted by audio id.
///
/// Entries are identified by file name on both sides. Asking for more than is
/// available takes everything that is left.
pub fn sample_audio_and_transcriptions<R>(
    config: &SamplingConfig,
    rng: &mut R,
) -> Result<SamplingSummary>
where
    R: Rng + ?Sized,
{
    let source = manifest::read_manifest(&config.source_manifest)?;

    let target_manifest = config.target_manifest();
    let existing_lines: Vec<String> = if target_manifest.exists() {
        manifest::read_lines(&target_manifest)?
            .into_iter()
            .map(|line| line.trim().to_string())
            .filter(|line| !line.is_empty())
            .collect()
    } else {
        vec![]
    };

    let mut seen: HashSet<String> = existing_lines
        .iter()
        .filter_map(|line| ManifestEntry::parse(line))
        .map(|entry| entry.file_name().to_string())
        .collect();
    let candidates: Vec<&ManifestEntry> = source
        .iter()
        .filter(|entry| seen.insert(entry.file_name().to_string()))
        .collect();

    let available = candidates.len();
    if config.sample_size > available {
        warn!(
            "Asked for {} samples but only {} are left, taking all of them",
            config.sample_size, available
        );
    }
    let sample_size = config.sample_size.min(available);
    let sampled: Vec<&ManifestEntry> = candidates
        .choose_multiple(rng, sample_size)
        .copied()
        .collect();

    fs::create_dir_all(&config.target_dir)?;
    let mut lines = existing_lines;
    for entry in &sampled {
        let name = entry.file_name();
        let from = config.source_root.join(&entry.audio_path);
        let to = config.target_dir.join(name);
        fs::copy(&from, &to).map_err(|e| {
            Error::Generic(format!(
                "copying {} to {}: {e}",
                from.display(),
                to.display()
            ))
        })?;
        lines.push(format!("{}{}|{}", config.target_prefix, name, entry.transcript));
    }

    lines.sort_by_key(|line| manifest::audio_sort_key(line));
    manifest::write_lines(&target_manifest, &lines)?;

    info!(
        "Sampled {} of {} available entries into {}",
        sampled.len(),
        available,
        target_manifest.display()
    );
    Ok(SamplingSummary {
        sampled: sampled.len(),
        available,
        total: lines.len(),
    })
}
