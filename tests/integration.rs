#![cfg(test)]

use std::{collections::BTreeMap, fs, sync::Arc};

use cosmic_excuse::{
    base::{
        config::{Config, ConfigInner},
        types::{ExcuseError, ExcuseResult, Severity},
    },
    engine::composer::{ExcuseComposer, GenerateOptions},
    interaction::{Command, excuse::ExcuseCommand},
    runtime::Runtime,
    service::{
        data::{AuxiliaryBanks, DataLoader, GenericDataLoader},
        format::OutputStyle,
        leaderboard::{ExportFormat, Leaderboard},
    },
};
use mockall::mock;

// Mocks.

// Mock data loader for testing.

mock! {
    pub Data {}

    impl GenericDataLoader for Data {
        fn supported_languages(&self) -> Vec<String>;
        fn supported_categories(&self, language: &str) -> ExcuseResult<Vec<String>>;
        fn load(&self, language: &str, category: &str) -> ExcuseResult<Vec<String>>;
        fn auxiliary(&self, language: &str) -> ExcuseResult<AuxiliaryBanks>;
        fn validate(&self, language: &str) -> ExcuseResult<BTreeMap<String, bool>>;
    }
}

fn get_mock_data() -> MockData {
    let mut mock = MockData::new();

    mock.expect_supported_languages().returning(|| vec!["en".to_string()]);
    mock.expect_supported_categories().returning(|_| Ok(vec!["cosmic".to_string(), "quantum".to_string()]));
    mock.expect_load().returning(|_, category| match category {
        "quantum" => Ok(vec!["a qubit that refused to collapse".to_string()]),
        "cosmic" => Ok(vec!["a solar flare".to_string()]),
        other => Err(ExcuseError::DataLoad(format!("no bank {other}"))),
    });
    mock.expect_auxiliary().returning(|_| Ok(AuxiliaryBanks::default()));
    mock.expect_validate().returning(|_| Ok(BTreeMap::new()));

    mock
}

fn seeded_config(seed: u64) -> Config {
    Config {
        inner: Arc::new(ConfigInner { seed: Some(seed), ..Default::default() }),
    }
}

/// Helper function to setup the test environment.
fn setup_test_environment() -> Runtime {
    let data = DataLoader::new(Arc::new(get_mock_data()));

    Runtime::with_data(seeded_config(7), data).unwrap()
}

// Tests.

#[test]
fn test_mock_banks_flow_through_the_composer() {
    let mut runtime = setup_test_environment();

    let excuse = runtime.generate(&GenerateOptions::new().error_message("NullPointerException").category("quantum"), true).unwrap();

    assert_eq!(excuse.category(), "quantum");
    assert_eq!(excuse.severity(), Severity::Medium);
    assert_eq!(excuse.recommendation(), "Try again later");
    assert!(excuse.text().starts_with("The error was definitely caused by a qubit that refused to collapse."));
    assert!(excuse.text().contains("Which caused a solar flare.") || excuse.text().contains("Resulting in a solar flare."));
    assert!(excuse.text().ends_with("instability."));
    assert_eq!(excuse.metadata_str("secondary_category"), Some("cosmic"));
    assert!(excuse.quality_score() <= 100);
    assert_eq!(runtime.history.len(), 1);
}

#[test]
fn test_mock_rejects_unknown_language_before_loading() {
    let mut mock = MockData::new();
    mock.expect_supported_languages().returning(|| vec!["en".to_string()]);
    mock.expect_load().never();

    let mut composer = ExcuseComposer::with_seed(Config::default(), DataLoader::new(Arc::new(mock)), 1).unwrap();

    let result = composer.generate(&GenerateOptions::new().language("fr"));
    assert!(matches!(result, Err(ExcuseError::LanguageNotSupported { .. })));
}

#[test]
fn test_data_load_errors_propagate() {
    let mut mock = MockData::new();
    mock.expect_supported_languages().returning(|| vec!["en".to_string()]);
    mock.expect_supported_categories().returning(|_| Ok(vec!["cosmic".to_string()]));
    mock.expect_load().returning(|_, _| Err(ExcuseError::DataLoad("disk on fire".to_string())));

    let mut composer = ExcuseComposer::with_seed(Config::default(), DataLoader::new(Arc::new(mock)), 1).unwrap();

    let result = composer.generate(&GenerateOptions::new().category("cosmic"));
    assert!(matches!(result, Err(ExcuseError::DataLoad(_))));
}

#[test]
fn test_batch_over_mock_banks() {
    let mut runtime = setup_test_environment();

    let excuses = runtime.generate_batch(4, &GenerateOptions::new().category("quantum"), false).unwrap();

    assert_eq!(excuses.len(), 4);
    assert!(excuses.iter().all(|e| e.category() == "quantum"));
    assert!(excuses.iter().all(|e| !e.metadata_str("error_message").unwrap_or_default().is_empty()));
    assert!(runtime.history.is_empty());
}

#[test]
fn test_run_renders_json() {
    let command = Command::Excuse(ExcuseCommand {
        options: GenerateOptions::new().error_message("FATAL: disk corrupted"),
        count: 2,
        style: OutputStyle::Json,
        ..Default::default()
    });

    let output = cosmic_excuse::run(seeded_config(11), command).unwrap();
    let value: serde_json::Value = serde_json::from_str(&output).unwrap();

    let items = value.as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert!(items.iter().all(|item| item["severity"] == "severe"));
}

#[test]
fn test_one_shot_generate() {
    let excuse = cosmic_excuse::generate("Warning: deprecated API", "bn").unwrap();

    assert_eq!(excuse.severity(), Severity::Mild);
    assert_eq!(excuse.language(), "bn");

    assert!(cosmic_excuse::generate("oops", "xx").is_err());
}

#[test]
fn test_directory_banks_and_persistent_leaderboard() {
    let dir = tempfile::tempdir().unwrap();
    let banks = dir.path().join("banks").join("en");
    fs::create_dir_all(&banks).unwrap();
    fs::write(banks.join("quantum.json"), r#"{"category": "quantum", "language": "en", "version": "1.0.0", "excuses": ["a decohered cache", "an entangled mutex"]}"#).unwrap();
    fs::write(banks.join("blame.json"), r#"["the intern", "the previous sprint"]"#).unwrap();

    let board_path = dir.path().join("leaderboard.json");
    let config = Config {
        inner: Arc::new(ConfigInner {
            seed: Some(5),
            data_path: Some(dir.path().join("banks")),
            leaderboard_path: Some(board_path.clone()),
            ..Default::default()
        }),
    };

    let mut runtime = Runtime::new(config.clone()).unwrap();
    let first = runtime.generate(&GenerateOptions::new(), false).unwrap();
    runtime.generate(&GenerateOptions::new().category("blame"), false).unwrap();

    assert!(["quantum", "blame"].contains(&first.category()));

    // A fresh runtime sees the persisted entries.
    let runtime = Runtime::new(config).unwrap();
    let leaderboard = runtime.leaderboard.as_ref().unwrap();
    assert_eq!(leaderboard.len(), 2);

    let reopened = Leaderboard::open(&board_path, 10);
    assert!(reopened.export(ExportFormat::Csv).unwrap().lines().count() >= 3);
}
