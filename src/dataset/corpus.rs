// src/dataset/corpus.rs

//! Transcript loaders for the speech corpora the tokenizer is trained on.

use std::fmt;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use log::info;

use crate::result::{Error, Result};

/// Layout of a corpus manifest, resolved from its tag once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CorpusFormat {
    /// `path|text` lines (LJSpeech, LibriTTS exports).
    Lj,
    /// `text\tfile` lines, files relative to the manifest.
    Tsv,
    /// Common Voice `.tsv` with a header.
    MozillaCv,
    /// VoxPopuli `.tsv` with a header.
    Voxpopuli,
}

impl FromStr for CorpusFormat {
    type Err = Error;

    fn from_str(tag: &str) -> Result<Self> {
        match tag {
            "lj" | "libritts" => Ok(CorpusFormat::Lj),
            "tsv" => Ok(CorpusFormat::Tsv),
            "mozilla_cv" => Ok(CorpusFormat::MozillaCv),
            "voxpopuli" => Ok(CorpusFormat::Voxpopuli),
            other => Err(Error::UnsupportedCorpusFormat(other.to_string())),
        }
    }
}

impl fmt::Display for CorpusFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            CorpusFormat::Lj => "lj",
            CorpusFormat::Tsv => "tsv",
            CorpusFormat::MozillaCv => "mozilla_cv",
            CorpusFormat::Voxpopuli => "voxpopuli",
        };
        f.write_str(tag)
    }
}

fn malformed(path: &Path, line_no: usize, line: &str) -> Error {
    Error::MalformedManifestLine {
        path: path.to_path_buf(),
        line_no,
        line: line.to_string(),
    }
}

impl CorpusFormat {
    /// `(audio path, transcript)` for every entry of the manifest at `path`.
    pub fn load<P: AsRef<Path>>(&self, path: P) -> Result<Vec<(PathBuf, String)>> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let base = path.parent().unwrap_or_else(|| Path::new(""));
        let skip = match self {
            CorpusFormat::MozillaCv | CorpusFormat::Voxpopuli => 1,
            CorpusFormat::Lj | CorpusFormat::Tsv => 0,
        };

        let mut entries = Vec::new();
        for (i, line) in content.lines().enumerate().skip(skip) {
            if line.trim().is_empty() {
                continue;
            }
            let line_no = i + 1;
            let entry = match self {
                CorpusFormat::Lj => {
                    let (audio, text) = line
                        .split_once('|')
                        .ok_or_else(|| malformed(path, line_no, line))?;
                    (PathBuf::from(audio), text.to_string())
                }
                CorpusFormat::Tsv => {
                    let (text, file) = line
                        .split_once('\t')
                        .ok_or_else(|| malformed(path, line_no, line))?;
                    (base.join(file.trim()), text.to_string())
                }
                CorpusFormat::MozillaCv => {
                    let cols: Vec<&str> = line.split('\t').collect();
                    if cols.len() < 3 {
                        return Err(malformed(path, line_no, line));
                    }
                    (base.join("clips").join(cols[1]), cols[2].to_string())
                }
                CorpusFormat::Voxpopuli => {
                    let cols: Vec<&str> = line.split('\t').collect();
                    if cols.len() != 6 {
                        return Err(malformed(path, line_no, line));
                    }
                    let id = cols[0];
                    let year = id.get(..4).unwrap_or(id);
                    (base.join(year).join(format!("{id}.ogg.wav")), cols[1].to_string())
                }
            };
            entries.push(entry);
        }
        Ok(entries)
    }
}

/// A corpus manifest and its format, written `path:format` on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prior {
    pub path: PathBuf,
    pub format: CorpusFormat,
}

impl FromStr for Prior {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (path, tag) = s
            .rsplit_once(':')
            .ok_or_else(|| Error::Generic(format!("expected `path:format`, got {s:?}")))?;
        Ok(Prior {
            path: PathBuf::from(path),
            format: tag.parse()?,
        })
    }
}

/// Concatenates the transcripts of every prior into `output`, one per line.
/// Returns the number of lines written.
pub fn build_text_file_from_priors<P: AsRef<Path>>(priors: &[Prior], output: P) -> Result<usize> {
    let mut writer = BufWriter::new(fs::File::create(output)?);
    let mut total = 0;
    for prior in priors {
        let entries = prior.format.load(&prior.path)?;
        info!(
            "{} transcripts from {} ({})",
            entries.len(),
            prior.path.display(),
            prior.format
        );
        for (_, text) in &entries {
            writeln!(writer, "{text}")?;
        }
        writer.flush()?;
        total += entries.len();
    }
    Ok(total)
}
