// src/main.rs

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use vi_voice_tokenizer::{PipelineConfig, VoiceBpeTokenizer};

/// Train the Vietnamese voice tokenizer on a transcript file.
#[derive(Parser)]
#[command(name = "vi_voice_tokenizer", version)]
struct Cli {
    /// Transcripts, one per line
    #[arg(short, long, default_value = "transcriptions.txt")]
    input: PathBuf,

    /// Where the vocabulary artifact is written
    #[arg(short, long, default_value = "custom_vietnamese_tokenizer.json")]
    output: PathBuf,

    /// Pipeline configuration file; its `tokenizer` section is used
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Overrides the configured vocabulary size
    #[arg(long)]
    vocab_size: Option<usize>,

    /// Overrides the configured batch size
    #[arg(long)]
    batch_size: Option<usize>,

    /// Show a progress bar while training
    #[arg(long)]
    progress: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => PipelineConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => PipelineConfig::default(),
    };
    let mut options = config.tokenizer;
    if let Some(vocab_size) = cli.vocab_size {
        options.vocab_size = vocab_size;
    }
    if let Some(batch_size) = cli.batch_size {
        options.batch_size = batch_size;
    }
    options.show_progress = cli.progress;

    let content = fs::read_to_string(&cli.input)
        .with_context(|| format!("reading {}", cli.input.display()))?;
    info!("Processing ASR texts from {}", cli.input.display());

    let tokenizer = VoiceBpeTokenizer::train(content.lines(), &options)?;
    tokenizer
        .save(&cli.output)
        .with_context(|| format!("writing {}", cli.output.display()))?;

    info!(
        "Vocabulary of {} tokens written to {}",
        tokenizer.vocab_size(),
        cli.output.display()
    );
    Ok(())
}
