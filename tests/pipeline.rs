use std::fs;

use rand::rngs::StdRng;
use rand::SeedableRng;

use vi_voice_tokenizer::dataset::{
    build_text_file_from_priors, split_transcriptions, CorpusFormat, Prior, SplitConfig,
};
use vi_voice_tokenizer::text::{preprocess_word, text_cleaners};
use vi_voice_tokenizer::{Error, TrainingOptions, VoiceBpeTokenizer};

const MANIFEST: &str = "\
wavs/audio_1_a.wav|Hôm nay trời đẹp quá!
wavs/audio_2_a.wav|Tôi đi học ở trường.
wavs/audio_3_a.wav|Chúng ta cùng hát một bài (thật vui).
wavs/audio_4_a.wav|Bạn có khỏe không?
wavs/audio_5_a.wav|Cảm ơn, tôi khỏe; còn bạn thì sao?
wavs/audio_6_a.wav|Mẹ nấu cơm, bố đọc báo.
wavs/audio_7_a.wav|Hoá học là môn học khó.
wavs/audio_8_a.wav|Những ngày mưa, tôi ở nhà đọc sách.
wavs/audio_9_a.wav|Email: naïve@example.com #không hợp lệ
wavs/audio_10_a.wav|Chào buổi sáng Việt Nam!
";

#[test]
fn corpus_to_tokenizer_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = dir.path().join("metadata.txt");
    fs::write(&manifest, MANIFEST).unwrap();

    let corpus = dir.path().join("all_texts.txt");
    let priors = vec![Prior {
        path: manifest.clone(),
        format: CorpusFormat::Lj,
    }];
    assert_eq!(build_text_file_from_priors(&priors, &corpus).unwrap(), 10);

    let lines = fs::read_to_string(&corpus).unwrap();
    let options = TrainingOptions {
        vocab_size: 200,
        batch_size: 3,
        ..Default::default()
    };
    let tokenizer = VoiceBpeTokenizer::train(lines.lines(), &options).unwrap();
    assert!(tokenizer.vocab_size() <= 200);

    let artifact = dir.path().join("custom_vietnamese_tokenizer.json");
    tokenizer.save(&artifact).unwrap();
    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&artifact).unwrap()).unwrap();
    assert_eq!(json["model"]["language"], "vi");
    assert_eq!(json["model"]["vocab"]["[STOP]"], 0);
    assert_eq!(json["added_tokens"][2]["content"], "[SPACE]");

    let loaded = VoiceBpeTokenizer::from_file(&artifact).unwrap();
    for line in [
        "Tôi đi học ở trường.",
        "hôm nay   bạn có khỏe không?",
        "Hoá học là môn học khó.",
    ] {
        let ids = loaded.encode(line).unwrap();
        assert_eq!(loaded.decode(&ids).unwrap(), loaded.preprocess_text(line));
    }

    // words rejected at training time never reach the alphabet
    assert_eq!(preprocess_word("naïve@example.com", false), "");
    assert!(loaded.token_to_id("ï").is_none());
    assert!(loaded.token_to_id("@").is_none());

    assert!(matches!(
        loaded.decode(&[u32::MAX]),
        Err(Error::UnknownTokenId { .. })
    ));
}

#[test]
fn normalizer_scenarios() {
    assert_eq!(text_cleaners("Tôi  đi HỌC."), "tôi đi học.");
    assert_eq!(preprocess_word("test@123", false), "test123");
}

#[test]
fn manifest_split() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = dir.path().join("wavs_transcriptions.txt");
    fs::write(&manifest, MANIFEST).unwrap();
    let config = SplitConfig {
        manifest,
        train_file: dir.path().join("train.txt"),
        valid_file: dir.path().join("valid.txt"),
        train_ratio: 0.8,
    };

    let summary = split_transcriptions(&config, &mut StdRng::seed_from_u64(2024)).unwrap();
    assert_eq!((summary.train, summary.valid), (8, 2));

    let mut all: Vec<String> = fs::read_to_string(&config.train_file)
        .unwrap()
        .lines()
        .chain(fs::read_to_string(&config.valid_file).unwrap().lines())
        .map(String::from)
        .collect();
    all.sort();
    let mut expected: Vec<String> = MANIFEST.lines().map(String::from).collect();
    expected.sort();
    assert_eq!(all, expected);
}
