// src/bpe_main.rs

use std::{
    fs::File,
    io::{BufRead, BufReader, BufWriter, Write},
    path::PathBuf,
};

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use vi_voice_tokenizer::VoiceBpeTokenizer;

/// Encode every line of a file with a trained tokenizer and decode it back.
#[derive(Parser)]
#[command(name = "bpe_main", version)]
struct Cli {
    /// Vocabulary artifact
    #[arg(short, long, default_value = "custom_vietnamese_tokenizer.json")]
    tokenizer: PathBuf,

    /// Lines to encode
    #[arg(short, long, default_value = "transcriptions.txt")]
    input: PathBuf,

    /// Directory receiving encoded.txt and decoded.txt
    #[arg(short, long, default_value = ".")]
    out_dir: PathBuf,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let tokenizer = VoiceBpeTokenizer::from_file(&cli.tokenizer)
        .with_context(|| format!("loading {}", cli.tokenizer.display()))?;

    let reader = BufReader::new(
        File::open(&cli.input).with_context(|| format!("opening {}", cli.input.display()))?,
    );
    let encoded_path = cli.out_dir.join("encoded.txt");
    let decoded_path = cli.out_dir.join("decoded.txt");
    let mut enc_w = BufWriter::new(File::create(&encoded_path)?);
    let mut dec_w = BufWriter::new(File::create(&decoded_path)?);

    let mut total_tokens = 0usize;
    for line in reader.lines() {
        let line = line?;
        let line = line.trim();

        let ids = tokenizer.encode(line)?;
        total_tokens += ids.len();
        writeln!(enc_w, "{}", serde_json::to_string(&ids)?)?;

        let text = tokenizer.decode(&ids)?;
        writeln!(dec_w, "{text}")?;
    }

    enc_w.flush()?;
    dec_w.flush()?;

    info!("total tokens written to {}: {}", encoded_path.display(), total_tokens);
    Ok(())
}
