// src/dataset/manifest.rs

//! Pipe-delimited `<audio path>|<transcript>` manifests.

use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::result::{Error, Result};

static AUDIO_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"audio_(\d+)_").expect("static audio id pattern"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    pub audio_path: String,
    pub transcript: String,
}

impl ManifestEntry {
    /// Splits on the first `|`. The transcript may contain more pipes.
    pub fn parse(line: &str) -> Option<Self> {
        let (audio_path, transcript) = line.split_once('|')?;
        Some(Self {
            audio_path: audio_path.trim().to_string(),
            transcript: transcript.trim().to_string(),
        })
    }

    pub fn file_name(&self) -> &str {
        file_name(&self.audio_path)
    }

    pub fn to_line(&self) -> String {
        format!("{}|{}", self.audio_path, self.transcript)
    }
}

/// Last component of a `/` or `\` separated path.
pub fn file_name(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

/// Numeric id from an `audio_<n>_` file name.
pub fn extract_audio_id(path: &str) -> Option<u64> {
    AUDIO_ID_RE
        .captures(path)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Sort key for manifest lines: ids ascending, lines without an id last.
pub fn audio_sort_key(line: &str) -> (bool, u64) {
    let path = line.split('|').next().unwrap_or(line);
    match extract_audio_id(path) {
        Some(id) => (false, id),
        None => (true, 0),
    }
}

/// Reads every non-blank line of a manifest. A line without `|` is an error.
pub fn read_manifest<P: AsRef<Path>>(path: P) -> Result<Vec<ManifestEntry>> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)?;
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            ManifestEntry::parse(line).ok_or_else(|| Error::MalformedManifestLine {
                path: path.to_path_buf(),
                line_no: i + 1,
                line: line.to_string(),
            })
        })
        .collect()
}

/// Reads the raw lines of a file, trailing newline characters removed.
pub fn read_lines<P: AsRef<Path>>(path: P) -> Result<Vec<String>> {
    Ok(fs::read_to_string(path)?
        .lines()
        .map(str::to_string)
        .collect())
}

/// Writes one line per item, each terminated by `\n`.
pub fn write_lines<P, I, S>(path: P, lines: I) -> Result<()>
where
    P: AsRef<Path>,
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut writer = BufWriter::new(fs::File::create(path)?);
    for line in lines {
        writer.write_all(line.as_ref().as_bytes())?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_entry() {
        let entry = ManifestEntry::parse("wavs/audio_12_a.wav|xin chào | bạn").unwrap();
        assert_eq!(entry.audio_path, "wavs/audio_12_a.wav");
        assert_eq!(entry.transcript, "xin chào | bạn");
        assert_eq!(entry.file_name(), "audio_12_a.wav");
        assert!(ManifestEntry::parse("no pipe here").is_none());
    }

    #[test]
    fn test_audio_ids() {
        assert_eq!(extract_audio_id("x/audio_007_speaker.wav"), Some(7));
        assert_eq!(extract_audio_id("x/clip_7.wav"), None);
        let mut lines = vec!["b.wav|b", "audio_10_x.wav|ten", "audio_2_x.wav|two", "a.wav|a"];
        lines.sort_by_key(|l| audio_sort_key(l));
        assert_eq!(lines, vec!["audio_2_x.wav|two", "audio_10_x.wav|ten", "b.wav|b", "a.wav|a"]);
    }

    #[test]
    fn test_read_manifest_reports_bad_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("m.txt");
        fs::write(&path, "a.wav|one\n\nbroken\n").unwrap();
        match read_manifest(&path) {
            Err(Error::MalformedManifestLine { line_no, line, .. }) => {
                assert_eq!(line_no, 3);
                assert_eq!(line, "broken");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_write_then_read_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");
        write_lines(&path, ["a|1", "b|2"]).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "a|1\nb|2\n");
        assert_eq!(read_lines(&path).unwrap(), vec!["a|1", "b|2"]);
    }
}
