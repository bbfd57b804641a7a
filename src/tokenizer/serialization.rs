// src/tokenizer/serialization.rs

//! The on-disk vocabulary artifact, laid out like a `tokenizer.json` file so
//! that other BPE runtimes can load it as well.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize, Serializer};
use serde_json::ser::PrettyFormatter;
use serde_json::Value;

use crate::result::{Error, Result};
use crate::tokenizer::added_vocabulary::AddedTokenWithId;
use crate::tokenizer::bpe::BPE;
use crate::tokenizer::Model;

pub const ARTIFACT_VERSION: &str = "1.0";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PreTokenizerConfig {
    Whitespace,
}

/// A merge rule. Older artifacts store merges as `"a b"` strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MergeEntry {
    Pair(String, String),
    Joined(String),
}

impl MergeEntry {
    pub fn into_pair(self) -> Result<(String, String)> {
        match self {
            MergeEntry::Pair(a, b) => Ok((a, b)),
            MergeEntry::Joined(joined) => joined
                .split_once(' ')
                .map(|(a, b)| (a.to_owned(), b.to_owned()))
                .ok_or_else(|| Error::Generic(format!("invalid merge entry {joined:?}"))),
        }
    }
}

fn serialize_ordered_vocab<S>(
    vocab: &HashMap<String, u32>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let mut entries: Vec<(&String, &u32)> = vocab.iter().collect();
    entries.sort_unstable_by_key(|(_, id)| **id);
    serializer.collect_map(entries)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub dropout: Option<f32>,
    #[serde(default)]
    pub unk_token: Option<String>,
    #[serde(default)]
    pub continuing_subword_prefix: Option<String>,
    #[serde(default)]
    pub end_of_word_suffix: Option<String>,
    #[serde(default)]
    pub fuse_unk: bool,
    #[serde(default)]
    pub byte_fallback: bool,
    #[serde(serialize_with = "serialize_ordered_vocab")]
    pub vocab: HashMap<String, u32>,
    pub merges: Vec<MergeEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenizerArtifact {
    pub version: String,
    #[serde(default)]
    pub truncation: Option<Value>,
    #[serde(default)]
    pub padding: Option<Value>,
    #[serde(default)]
    pub added_tokens: Vec<AddedTokenWithId>,
    #[serde(default)]
    pub normalizer: Option<Value>,
    #[serde(default)]
    pub pre_tokenizer: Option<PreTokenizerConfig>,
    #[serde(default)]
    pub post_processor: Option<Value>,
    #[serde(default)]
    pub decoder: Option<Value>,
    pub model: ModelArtifact,
}

impl TokenizerArtifact {
    pub fn from_parts(
        model: &BPE,
        added_tokens: Vec<AddedTokenWithId>,
        language: Option<String>,
    ) -> Self {
        Self {
            version: ARTIFACT_VERSION.to_string(),
            truncation: None,
            padding: None,
            added_tokens,
            normalizer: None,
            pre_tokenizer: Some(PreTokenizerConfig::Whitespace),
            post_processor: None,
            decoder: None,
            model: ModelArtifact {
                kind: "BPE".to_string(),
                dropout: None,
                unk_token: model.get_unk_token().map(str::to_owned),
                continuing_subword_prefix: None,
                end_of_word_suffix: None,
                fuse_unk: false,
                byte_fallback: false,
                vocab: model.get_vocab(),
                merges: model
                    .get_merges()
                    .into_iter()
                    .map(|(a, b)| MergeEntry::Pair(a, b))
                    .collect(),
                language,
            },
        }
    }

    /// Rebuild the BPE model stored in this artifact.
    pub fn build_model(&self) -> Result<BPE> {
        if self.model.kind != "BPE" {
            return Err(Error::Generic(format!(
                "unsupported model type `{}`",
                self.model.kind
            )));
        }
        let merges = self
            .model
            .merges
            .iter()
            .cloned()
            .map(MergeEntry::into_pair)
            .collect::<Result<Vec<_>>>()?;
        BPE::new(self.model.vocab.clone(), merges, self.model.unk_token.clone())
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn to_string_pretty(&self) -> Result<String> {
        let mut buf = Vec::new();
        write_pretty(&mut buf, self)?;
        String::from_utf8(buf).map_err(|e| Error::Generic(e.to_string()))
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        write_pretty(&mut writer, self)?;
        writer.flush()?;
        Ok(())
    }
}

/// Four space indent, UTF-8 left unescaped.
fn write_pretty<W: Write, T: Serialize>(writer: W, value: &T) -> Result<()> {
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(writer, formatter);
    value.serialize(&mut serializer)?;
    Ok(())
}

/// Sets `model.language` in the artifact at `path`, leaving every other
/// field and the key order untouched.
pub fn patch_language<P: AsRef<Path>>(path: P, language: &str) -> Result<()> {
    let path = path.as_ref();
    let mut document: Value = serde_json::from_str(&fs::read_to_string(path)?)?;
    let model = document
        .get_mut("model")
        .and_then(Value::as_object_mut)
        .ok_or_else(|| Error::Generic(format!("{} has no `model` object", path.display())))?;
    model.insert("language".to_string(), Value::String(language.to_string()));

    let mut writer = BufWriter::new(File::create(path)?);
    write_pretty(&mut writer, &document)?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::AddedToken;

    fn model() -> BPE {
        let vocab = [("[UNK]", 0), ("h", 1), ("ọ", 2), ("c", 3), ("họ", 4)]
            .into_iter()
            .map(|(t, i)| (t.to_string(), i))
            .collect();
        BPE::new(
            vocab,
            vec![("h".to_string(), "ọ".to_string())],
            Some("[UNK]".to_string()),
        )
        .unwrap()
    }

    fn artifact() -> TokenizerArtifact {
        let added = vec![AddedTokenWithId {
            id: 0,
            token: AddedToken::from("[UNK]", true),
        }];
        TokenizerArtifact::from_parts(&model(), added, Some("vi".into()))
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tokenizer.json");
        let artifact = artifact();
        artifact.save(&path).unwrap();

        let loaded = TokenizerArtifact::from_file(&path).unwrap();
        assert_eq!(loaded, artifact);
        assert_eq!(loaded.build_model().unwrap(), model());
    }

    #[test]
    fn test_layout() {
        let json = artifact().to_string_pretty().unwrap();
        assert!(json.starts_with("{\n    \"version\": \"1.0\""));
        assert!(json.contains("\"pre_tokenizer\": {\n        \"type\": \"Whitespace\"\n    }"));
        assert!(json.contains("\"ọ\": 2"));
        // vocab is written in id order
        let needles = ["\"[UNK]\": 0", "\"h\": 1", "\"ọ\": 2", "\"c\": 3", "\"họ\": 4"];
        let positions: Vec<usize> = needles
            .iter()
            .map(|needle| json.find(needle).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_loads_joined_merges() {
        let json = r#"{
            "version": "1.0",
            "added_tokens": [],
            "model": {
                "type": "BPE",
                "unk_token": "[UNK]",
                "vocab": {"[UNK]": 0, "a": 1, "b": 2, "ab": 3},
                "merges": ["a b"]
            }
        }"#;
        let artifact: TokenizerArtifact = serde_json::from_str(json).unwrap();
        let bpe = artifact.build_model().unwrap();
        assert_eq!(bpe.get_merges(), vec![("a".to_string(), "b".to_string())]);
        assert_eq!(artifact.model.language, None);
    }

    #[test]
    fn test_patch_language() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tokenizer.json");
        TokenizerArtifact::from_parts(&model(), vec![], None)
            .save(&path)
            .unwrap();

        patch_language(&path, "vi").unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let loaded: TokenizerArtifact = serde_json::from_str(&content).unwrap();
        assert_eq!(loaded.model.language.as_deref(), Some("vi"));
        assert!(content.contains("\n    \"model\": {"));
        // untouched key order: version still comes first
        assert!(content.starts_with("{\n    \"version\""));
    }

    #[test]
    fn test_patch_language_requires_model() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{\"version\": \"1.0\"}").unwrap();
        assert!(patch_language(&path, "vi").is_err());
    }
}
