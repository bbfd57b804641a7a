// src/text/vietnamese.rs

//! Canonicalisation of Vietnamese spelling.
//!
//! Transcripts scraped from different sources disagree on two things: whether
//! letters are precomposed or built from combining marks, and on which vowel of
//! a syllable the tone mark sits (`hoá` vs `hóa`, `baỏ` vs `bảo`). Both change
//! the characters a BPE vocabulary sees, so they are unified here before
//! anything else happens to the text.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// A string to string transform applied before casing and whitespace rules.
pub trait LinguisticNormalizer: Send + Sync {
    fn normalize(&self, text: &str) -> String;
}

/// Letters that look like Vietnamese ones but come from another block.
const CONFUSABLES: &[(char, char)] = &[('\u{00D0}', '\u{0110}'), ('\u{00F0}', '\u{0111}')];

static WORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\p{L}\p{M}]+").expect("static word pattern"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tone {
    Grave,
    Acute,
    Tilde,
    Hook,
    Dot,
}

impl Tone {
    fn from_mark(c: char) -> Option<Self> {
        match c {
            '\u{0300}' => Some(Tone::Grave),
            '\u{0301}' => Some(Tone::Acute),
            '\u{0303}' => Some(Tone::Tilde),
            '\u{0309}' => Some(Tone::Hook),
            '\u{0323}' => Some(Tone::Dot),
            _ => None,
        }
    }

    fn mark(self) -> char {
        match self {
            Tone::Grave => '\u{0300}',
            Tone::Acute => '\u{0301}',
            Tone::Tilde => '\u{0303}',
            Tone::Hook => '\u{0309}',
            Tone::Dot => '\u{0323}',
        }
    }
}

/// circumflex, breve, horn
fn is_shape_mark(c: char) -> bool {
    matches!(c, '\u{0302}' | '\u{0306}' | '\u{031B}')
}

#[derive(Debug, Clone)]
struct Letter {
    base: char,
    shape: Option<char>,
    tone: Option<Tone>,
}

impl Letter {
    fn is_vowel(&self) -> bool {
        matches!(
            self.base.to_ascii_lowercase(),
            'a' | 'e' | 'i' | 'o' | 'u' | 'y'
        )
    }

    fn lower(&self) -> char {
        self.base.to_ascii_lowercase()
    }
}

/// Default normalizer: NFC, confusable letters, traditional tone placement.
#[derive(Debug, Clone, Copy, Default)]
pub struct VietnameseNormalizer;

impl VietnameseNormalizer {
    pub fn new() -> Self {
        VietnameseNormalizer
    }
}

impl LinguisticNormalizer for VietnameseNormalizer {
    fn normalize(&self, text: &str) -> String {
        let composed: String = text
            .nfc()
            .map(|c| {
                CONFUSABLES
                    .iter()
                    .find(|(from, _)| *from == c)
                    .map_or(c, |(_, to)| *to)
            })
            .collect();

        WORD_RE
            .replace_all(&composed, |caps: &regex::Captures| {
                place_tone(&caps[0]).into_owned()
            })
            .into_owned()
    }
}

fn decompose(word: &str) -> Option<Vec<Letter>> {
    let mut letters: Vec<Letter> = Vec::with_capacity(word.len());
    for c in word.nfd() {
        if let Some(tone) = Tone::from_mark(c) {
            let last = letters.last_mut()?;
            if last.tone.is_some() {
                return None;
            }
            last.tone = Some(tone);
        } else if is_shape_mark(c) {
            let last = letters.last_mut()?;
            if last.shape.is_some() {
                return None;
            }
            last.shape = Some(c);
        } else if is_combining_mark(c) {
            return None;
        } else if c.is_ascii_alphabetic() || c == 'đ' || c == 'Đ' {
            letters.push(Letter {
                base: c,
                shape: None,
                tone: None,
            });
        } else {
            return None;
        }
    }
    Some(letters)
}

/// Index of the letter that should carry the tone mark, if the word parses
/// as a single syllable.
fn tone_position(letters: &[Letter]) -> Option<usize> {
    let mut start = letters.iter().position(Letter::is_vowel)?;
    let mut end = start;
    while end < letters.len() && letters[end].is_vowel() {
        end += 1;
    }
    if letters[end..].iter().any(Letter::is_vowel) {
        return None;
    }

    // The glide of `qu` and `gi` belongs to the onset.
    if start > 0 && end - start > 1 {
        let onset = letters[start - 1].lower();
        let glide = letters[start].lower();
        if (onset == 'q' && glide == 'u') || (onset == 'g' && glide == 'i') {
            start += 1;
        }
    }

    let nucleus = &letters[start..end];
    if let Some(offset) = nucleus.iter().rposition(|l| l.shape.is_some()) {
        return Some(start + offset);
    }
    let has_coda = end < letters.len();
    let offset = match nucleus.len() {
        1 => 0,
        n if has_coda => n - 1,
        3 => 1,
        _ => 0,
    };
    Some(start + offset)
}

fn place_tone(word: &str) -> Cow<'_, str> {
    let Some(mut letters) = decompose(word) else {
        return Cow::Borrowed(word);
    };
    let mut toned = letters.iter().enumerate().filter(|(_, l)| l.tone.is_some());
    let (current, tone) = match (toned.next(), toned.next()) {
        (Some((i, l)), None) => (i, l.tone),
        _ => return Cow::Borrowed(word),
    };
    let Some(target) = tone_position(&letters) else {
        return Cow::Borrowed(word);
    };
    if target == current {
        return Cow::Borrowed(word);
    }

    letters[current].tone = None;
    letters[target].tone = tone;

    let mut decomposed = String::with_capacity(word.len() + 4);
    for letter in &letters {
        decomposed.push(letter.base);
        if let Some(shape) = letter.shape {
            decomposed.push(shape);
        }
        if let Some(tone) = letter.tone {
            decomposed.push(tone.mark());
        }
    }
    Cow::Owned(decomposed.nfc().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn norm(s: &str) -> String {
        VietnameseNormalizer.normalize(s)
    }

    #[test]
    fn test_moves_misplaced_tones() {
        assert_eq!(
            norm("Ðảm baỏ chất lựơng phòng thí nghịêm hoá học"),
            "Đảm bảo chất lượng phòng thí nghiệm hóa học"
        );
    }

    #[test]
    fn test_onset_glides() {
        assert_eq!(norm("qúa"), "quá");
        assert_eq!(norm("gìa"), "già");
        assert_eq!(norm("gì"), "gì");
        assert_eq!(norm("thuỷ"), "thủy");
        assert_eq!(norm("khoảng"), "khoảng");
    }

    #[test]
    fn test_composes_combining_sequences() {
        let decomposed = "Vie\u{0302}\u{0323}t Nam";
        assert_eq!(norm(decomposed), "Việt Nam");
    }

    #[test]
    fn test_leaves_foreign_words_alone() {
        assert_eq!(norm("café naïve 123"), "café naïve 123");
        assert_eq!(norm("Tôi  đi HỌC."), "Tôi  đi HỌC.");
    }

    #[test]
    fn test_idempotent() {
        let once = norm("hoá học, thuỷ lợi, qúy giá");
        assert_eq!(norm(&once), once);
    }
}
