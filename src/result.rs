// src/result.rs

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("regex error: {0}")]
    Regex(#[from] regex::Error),

    /// An id handed to `decode` that the vocabulary does not know.
    #[error("Invalid token for decoding: {id}")]
    UnknownTokenId { id: u32 },

    #[error("unk token `{0}` is not part of the vocabulary")]
    MissingUnkToken(String),

    #[error("merge references `{0}` which is missing from the vocabulary")]
    MergeTokenOutOfVocabulary(String),

    #[error("unsupported corpus format `{0}`")]
    UnsupportedCorpusFormat(String),

    #[error("unknown cleaner `{0}`")]
    UnknownCleaner(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("malformed manifest line {line_no} in {}: {line:?}", .path.display())]
    MalformedManifestLine {
        path: PathBuf,
        line_no: usize,
        line: String,
    },

    #[error("{0}")]
    Generic(String),
}

impl From<String> for Error {
    fn from(err: String) -> Self {
        Error::Generic(err)
    }
}

impl From<&str> for Error {
    fn from(err: &str) -> Self {
        Error::Generic(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
