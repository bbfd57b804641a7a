use vi_voice_tokenizer::tokenizer::parallelism::{get_parallelism, ENV_VARIABLE};
use vi_voice_tokenizer::{TrainingOptions, VoiceBpeTokenizer};

const CORPUS: [&str; 6] = [
    "Hôm nay trời đẹp quá!",
    "Tôi đi học ở trường.",
    "Chúng ta cùng hát một bài (thật vui).",
    "Bạn có khỏe không?",
    "Cảm ơn, tôi khỏe; còn bạn thì sao?",
    "Những ngày mưa, tôi ở nhà đọc sách.",
];

// Only test in this binary: nothing else reads the environment while it runs.
#[test]
fn serial_training_matches_parallel() {
    let options = TrainingOptions {
        vocab_size: 120,
        batch_size: 2,
        report_rejected: false,
        ..Default::default()
    };

    assert!(get_parallelism());
    let parallel = VoiceBpeTokenizer::train(CORPUS, &options).unwrap();

    unsafe { std::env::set_var(ENV_VARIABLE, "false") };
    assert!(!get_parallelism());
    let serial = VoiceBpeTokenizer::train(CORPUS, &options).unwrap();

    assert_eq!(serial.get_model(), parallel.get_model());
    let line = "tôi đi học, bạn ở nhà.";
    assert_eq!(serial.encode(line).unwrap(), parallel.encode(line).unwrap());
}
