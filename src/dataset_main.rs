// src/dataset_main.rs

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;

use vi_voice_tokenizer::dataset::{
    build_text_file_from_priors, sample_audio_and_transcriptions, split_transcriptions, Prior,
};
use vi_voice_tokenizer::PipelineConfig;

/// Prepare speech manifests: sample, split, or gather transcripts.
#[derive(Parser)]
#[command(name = "dataset_tool", version)]
struct Cli {
    /// Pipeline configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Seed for reproducible sampling and shuffling
    #[arg(long, global = true)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Copy a random subset of not yet sampled entries into the target directory
    Sample {
        /// Overrides the configured sample size
        #[arg(short = 'n', long)]
        sample_size: Option<usize>,
    },
    /// Shuffle a manifest into train and valid files
    Split {
        /// Overrides the configured train ratio
        #[arg(short, long)]
        ratio: Option<f64>,
    },
    /// Write the transcripts of several corpora into one text file
    BuildCorpus {
        /// Corpora as `path:format`, format one of lj, libritts, tsv, mozilla_cv, voxpopuli
        #[arg(required = true)]
        priors: Vec<Prior>,

        #[arg(short, long, default_value = "all_texts.txt")]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => PipelineConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => PipelineConfig::default(),
    };
    let mut rng = match cli.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    match cli.command {
        Commands::Sample { sample_size } => {
            if let Some(n) = sample_size {
                config.sampling.sample_size = n;
            }
            let summary = sample_audio_and_transcriptions(&config.sampling, &mut rng)
                .context("sampling audio")?;
            info!(
                "{} new entries, {} in {}",
                summary.sampled,
                summary.total,
                config.sampling.target_manifest().display()
            );
        }
        Commands::Split { ratio } => {
            if let Some(ratio) = ratio {
                config.split.train_ratio = ratio;
            }
            let summary =
                split_transcriptions(&config.split, &mut rng).context("splitting manifest")?;
            info!("train: {}, valid: {}", summary.train, summary.valid);
        }
        Commands::BuildCorpus { priors, output } => {
            let total = build_text_file_from_priors(&priors, &output)?;
            info!("{} transcripts written to {}", total, output.display());
        }
    }
    Ok(())
}
