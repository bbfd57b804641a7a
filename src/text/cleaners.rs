// src/text/cleaners.rs

//! Named cleaner pipelines for acoustic-model transcripts.

use std::str::FromStr;
use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

use crate::result::{Error, Result};
use crate::text::normalizer::WHITESPACE_RE;
use crate::text::vietnamese::{LinguisticNormalizer, VietnameseNormalizer};

// Order matters: `tt` and `dt` appear twice and the first entry wins.
const ABBREVIATIONS: &[(&str, &str)] = &[
    ("tp", "thành phố"),
    ("hcm", "Hồ Chí Minh"),
    ("ubnd", "Ủy ban Nhân dân"),
    ("qd", "quyết định"),
    ("kt", "kiểm tra"),
    ("xh", "xã hội"),
    ("nv", "nhân viên"),
    ("bv", "bệnh viện"),
    ("hs", "học sinh"),
    ("gv", "giáo viên"),
    ("pgd", "phòng giáo dục"),
    ("cv", "công việc"),
    ("ld", "lao động"),
    ("dn", "doanh nghiệp"),
    ("tt", "trung tâm"),
    ("cn", "công nhân"),
    ("qg", "quốc gia"),
    ("dt", "dân tộc"),
    ("qdnd", "quân đội nhân dân"),
    ("cs", "công an"),
    ("khcn", "khoa học công nghệ"),
    ("ct", "chương trình"),
    ("ht", "hệ thống"),
    ("kd", "kinh doanh"),
    ("qt", "quốc tế"),
    ("dl", "du lịch"),
    ("tttm", "trung tâm thương mại"),
    ("tt", "thông tin"),
    ("dt", "điện thoại"),
    ("clb", "câu lạc bộ"),
    ("ktxh", "kinh tế xã hội"),
    ("qdkt", "quyết định kiểm tra"),
    ("ndtb", "nông dân tiêu biểu"),
    ("ubql", "Ủy ban quản lý"),
    ("bqlkcn", "Ban quản lý khu công nghiệp"),
    ("ldxh", "lao động xã hội"),
    ("khxh", "khoa học xã hội"),
    ("bvdl", "Bệnh viện đa khoa"),
    ("ttyt", "Trung tâm y tế"),
    ("svdh", "sinh viên đại học"),
    ("kts", "kiến trúc sư"),
    ("tgd", "Tổng giám đốc"),
    ("tmdt", "thương mại điện tử"),
    ("ttxvn", "Thông tấn xã Việt Nam"),
    ("tttt", "thông tin truyền thông"),
    ("qhqt", "quan hệ quốc tế"),
    ("tdtt", "thể dục thể thao"),
    ("httt", "hệ thống thông tin"),
    ("qhgq", "quy hoạch giao thông"),
];

const DIGIT_WORDS: [&str; 10] = [
    "không", "một", "hai", "ba", "bốn", "năm", "sáu", "bảy", "tám", "chín",
];

static ABBREVIATION_RES: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    ABBREVIATIONS
        .iter()
        .map(|(abbr, expansion)| {
            let re = RegexBuilder::new(&format!(r"\b{}\.", regex::escape(abbr)))
                .case_insensitive(true)
                .build()
                .expect("static abbreviation pattern");
            (re, *expansion)
        })
        .collect()
});

static DIGIT_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    (0..10)
        .map(|d| Regex::new(&format!(r"\b{d}\b")).expect("static digit pattern"))
        .collect()
});

pub fn expand_abbreviations(text: &str) -> String {
    ABBREVIATION_RES
        .iter()
        .fold(text.to_string(), |acc, (re, expansion)| {
            re.replace_all(&acc, regex::NoExpand(*expansion)).into_owned()
        })
}

/// Spell out standalone single digits. Longer numbers are left as they are.
pub fn normalize_numbers(text: &str) -> String {
    DIGIT_RES
        .iter()
        .zip(DIGIT_WORDS)
        .fold(text.to_string(), |acc, (re, word)| {
            re.replace_all(&acc, word).into_owned()
        })
}

pub fn lowercase(text: &str) -> String {
    text.to_lowercase()
}

pub fn collapse_whitespace(text: &str) -> String {
    WHITESPACE_RE.replace_all(text, " ").into_owned()
}

/// Strip diacritics so the text only uses ASCII letters.
pub fn convert_to_ascii(text: &str) -> String {
    text.nfd()
        .filter(|c| !is_combining_mark(*c))
        .map(|c| match c {
            'đ' => 'd',
            'Đ' => 'D',
            other => other,
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cleaner {
    Basic,
    Transliteration,
    /// Abbreviation and digit expansion on top of the basic steps.
    Vietnamese,
}

impl FromStr for Cleaner {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "basic_cleaners" | "basic" => Ok(Cleaner::Basic),
            "transliteration_cleaners" | "transliteration" => Ok(Cleaner::Transliteration),
            "vietnamese_cleaners" | "english_cleaners" | "vietnamese" => Ok(Cleaner::Vietnamese),
            other => Err(Error::UnknownCleaner(other.to_string())),
        }
    }
}

impl Cleaner {
    pub fn apply(&self, text: &str) -> String {
        let text = VietnameseNormalizer.normalize(text);
        let text = match self {
            Cleaner::Basic => text,
            Cleaner::Transliteration => convert_to_ascii(&text),
            Cleaner::Vietnamese => normalize_numbers(&expand_abbreviations(&text)),
        };
        collapse_whitespace(&lowercase(&text))
    }
}

/// Run a comma separated list of cleaner names in order.
pub fn clean_text(text: &str, cleaner_names: &str) -> Result<String> {
    let cleaners = cleaner_names
        .split(',')
        .map(|name| name.trim().parse::<Cleaner>())
        .collect::<Result<Vec<_>>>()?;
    Ok(cleaners.iter().fold(text.to_string(), |acc, c| c.apply(&acc)))
}
