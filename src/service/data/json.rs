//! JSON excuse banks, embedded or read from a directory.

use std::{
    borrow::Cow,
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, de::DeserializeOwned};
use serde_json::Value;
use tracing::{debug, instrument};

use super::{AuxiliaryBanks, Frames, GenericDataLoader, fallback_intensifiers};
use crate::base::{
    banks::{AUXILIARY_BANKS, EMBEDDED_LANGUAGES, EXCUSE_CATEGORIES, embedded_bank},
    types::{ExcuseError, ExcuseResult, Severity},
};

/// Raw contents of one bank file.
#[derive(Debug, Clone)]
struct Bank {
    origin: String,
    raw: Cow<'static, str>,
}

#[derive(Debug, Deserialize)]
struct RawFrames {
    primary: Option<String>,
    secondary: Option<String>,
    jargon: Option<String>,
    terminator: Option<String>,
}

/// Loader over JSON bank files.
///
/// Files are read once up front and parsed on demand, so a malformed bank
/// only fails the calls that touch it.
#[derive(Debug, Clone, Default)]
pub struct JsonDataLoader {
    banks: BTreeMap<String, BTreeMap<String, Bank>>,
}

impl JsonDataLoader {
    /// The `en` and `bn` banks compiled into the binary.
    pub fn embedded() -> Self {
        let mut banks: BTreeMap<String, BTreeMap<String, Bank>> = BTreeMap::new();

        for &language in EMBEDDED_LANGUAGES {
            for &name in EXCUSE_CATEGORIES.iter().chain(AUXILIARY_BANKS) {
                if let Some(raw) = embedded_bank(language, name) {
                    let bank = Bank {
                        origin: format!("embedded {language}/{name}.json"),
                        raw: Cow::Borrowed(raw),
                    };

                    banks.entry(language.to_string()).or_default().insert(name.to_string(), bank);
                }
            }
        }

        Self { banks }
    }

    /// Banks under `path`: one sub-directory per language, one `*.json` per bank.
    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn from_dir(path: &Path) -> ExcuseResult<Self> {
        let mut banks: BTreeMap<String, BTreeMap<String, Bank>> = BTreeMap::new();

        for language_dir in read_dir(path)? {
            if !language_dir.is_dir() {
                continue;
            }

            let Some(language) = file_name(&language_dir) else {
                continue;
            };

            for file in read_dir(&language_dir)? {
                if file.extension().and_then(|e| e.to_str()) != Some("json") {
                    continue;
                }

                let Some(name) = file.file_stem().and_then(|s| s.to_str()).map(str::to_string) else {
                    continue;
                };

                let raw = fs::read_to_string(&file).map_err(|e| ExcuseError::DataLoad(format!("Cannot read {}: {e}", file.display())))?;

                let bank = Bank {
                    origin: file.display().to_string(),
                    raw: Cow::Owned(raw),
                };

                banks.entry(language.clone()).or_default().insert(name, bank);
            }
        }

        if banks.is_empty() {
            return Err(ExcuseError::DataLoad(format!("No language directories with banks under {}", path.display())));
        }

        debug!(languages = banks.len(), "Loaded excuse banks from directory.");

        Ok(Self { banks })
    }

    fn language(&self, language: &str) -> ExcuseResult<&BTreeMap<String, Bank>> {
        self.banks.get(language).ok_or_else(|| ExcuseError::LanguageNotSupported {
            language: language.to_string(),
            supported: self.supported_languages().join(", "),
        })
    }

    fn auxiliary_list(bank: Option<&Bank>, fallback: Vec<String>) -> ExcuseResult<Vec<String>> {
        let Some(bank) = bank else {
            return Ok(fallback);
        };

        let words: Vec<String> = parse_auxiliary(bank)?;
        check_entries(bank, &words)?;

        Ok(if words.is_empty() { fallback } else { words })
    }
}

impl GenericDataLoader for JsonDataLoader {
    fn supported_languages(&self) -> Vec<String> {
        self.banks.keys().cloned().collect()
    }

    fn supported_categories(&self, language: &str) -> ExcuseResult<Vec<String>> {
        Ok(self.language(language)?.keys().filter(|name| !is_auxiliary(name)).cloned().collect())
    }

    fn load(&self, language: &str, category: &str) -> ExcuseResult<Vec<String>> {
        let banks = self.language(language)?;

        let bank = banks.get(category).filter(|_| !is_auxiliary(category)).ok_or_else(|| ExcuseError::InvalidCategory {
            category: category.to_string(),
            language: language.to_string(),
            available: banks.keys().filter(|name| !is_auxiliary(name)).cloned().collect::<Vec<_>>().join(", "),
        })?;

        let phrases: Vec<String> = serde_json::from_value(payload(bank)?).map_err(|e| ExcuseError::DataLoad(format!("{} is not a list of phrases: {e}", bank.origin)))?;

        let phrases: Vec<String> = phrases.into_iter().map(|p| p.trim().to_string()).filter(|p| !p.is_empty()).collect();

        if phrases.is_empty() {
            return Err(ExcuseError::DataLoad(format!("Bank '{category}' for language '{language}' is empty")));
        }

        Ok(phrases)
    }

    fn auxiliary(&self, language: &str) -> ExcuseResult<AuxiliaryBanks> {
        let banks = self.language(language)?;
        let defaults = AuxiliaryBanks::default();

        let recommendations = Self::auxiliary_list(banks.get("recommendations"), defaults.recommendations)?;
        let connectors = Self::auxiliary_list(banks.get("connectors"), defaults.connectors)?;

        let mut intensifiers = defaults.intensifiers;
        if let Some(bank) = banks.get("intensifiers") {
            let table: BTreeMap<String, Vec<String>> = parse_auxiliary(bank)?;

            for (key, words) in table {
                let severity: Severity = key
                    .parse()
                    .map_err(|_| ExcuseError::Configuration(format!("{} has unknown severity key '{key}'", bank.origin)))?;

                check_entries(bank, &words)?;

                let words = if words.is_empty() { fallback_intensifiers(severity) } else { words };
                intensifiers.insert(severity, words);
            }
        }

        let mut frames = Frames::default();
        if let Some(bank) = banks.get("frames") {
            let raw: RawFrames = parse_auxiliary(bank)?;

            if let Some(primary) = raw.primary {
                if !primary.contains("{excuse}") {
                    return Err(ExcuseError::Configuration(format!("{}: primary frame lacks an {{excuse}} placeholder", bank.origin)));
                }
                frames.primary = primary;
            }
            if let Some(secondary) = raw.secondary {
                frames.secondary = secondary;
            }
            if let Some(jargon) = raw.jargon {
                frames.jargon = jargon;
            }
            if let Some(terminator) = raw.terminator {
                frames.terminator = terminator;
            }
        }

        Ok(AuxiliaryBanks {
            recommendations,
            connectors,
            intensifiers,
            frames,
        })
    }

    fn validate(&self, language: &str) -> ExcuseResult<BTreeMap<String, bool>> {
        let banks = self.language(language)?;
        let mut report = BTreeMap::new();

        let categories = EXCUSE_CATEGORIES.iter().map(|c| c.to_string()).chain(self.supported_categories(language)?);

        for category in categories {
            let usable = self.load(language, &category).is_ok();
            report.insert(category, usable);
        }

        for &name in AUXILIARY_BANKS {
            let usable = match banks.get(name) {
                Some(bank) => payload(bank).is_ok_and(|value| match value {
                    Value::Array(items) => !items.is_empty(),
                    Value::Object(fields) => !fields.is_empty(),
                    _ => false,
                }),
                None => false,
            };

            report.insert(name.to_string(), usable);
        }

        Ok(report)
    }
}

// Helpers.

fn is_auxiliary(name: &str) -> bool {
    AUXILIARY_BANKS.contains(&name)
}

fn file_name(path: &Path) -> Option<String> {
    path.file_name().and_then(|n| n.to_str()).map(str::to_string)
}

fn read_dir(path: &Path) -> ExcuseResult<Vec<PathBuf>> {
    let entries = fs::read_dir(path).map_err(|e| ExcuseError::DataLoad(format!("Cannot read directory {}: {e}", path.display())))?;

    let mut paths = entries
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| ExcuseError::DataLoad(format!("Cannot list {}: {e}", path.display())))?;

    paths.sort();
    Ok(paths)
}

/// The bank payload: the `excuses` field of an envelope, or the bare document.
fn payload(bank: &Bank) -> ExcuseResult<Value> {
    let value: Value = serde_json::from_str(&bank.raw).map_err(|e| ExcuseError::DataLoad(format!("{} is not valid JSON: {e}", bank.origin)))?;

    match value {
        Value::Object(mut fields) if fields.contains_key("excuses") => Ok(fields.remove("excuses").unwrap_or(Value::Null)),
        other => Ok(other),
    }
}

fn parse_auxiliary<T: DeserializeOwned>(bank: &Bank) -> ExcuseResult<T> {
    serde_json::from_value(payload(bank)?).map_err(|e| ExcuseError::Configuration(format!("{} has an unexpected shape: {e}", bank.origin)))
}

fn check_entries(bank: &Bank, words: &[String]) -> ExcuseResult<()> {
    if words.iter().any(|w| w.trim().is_empty()) {
        return Err(ExcuseError::Configuration(format!("{} contains a blank entry", bank.origin)));
    }

    Ok(())
}

// Tests.

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, language: &str, bank: &str, contents: &str) {
        let language_dir = dir.join(language);
        fs::create_dir_all(&language_dir).unwrap();
        fs::write(language_dir.join(format!("{bank}.json")), contents).unwrap();
    }

    #[test]
    fn test_embedded_languages_and_categories() {
        let loader = JsonDataLoader::embedded();

        assert_eq!(loader.supported_languages(), vec!["bn", "en"]);
        assert_eq!(loader.supported_categories("en").unwrap(), vec!["ai", "blame", "cosmic", "quantum", "technical"]);
        assert_eq!(loader.load("en", "quantum").unwrap().len(), 12);
        assert_eq!(loader.load("bn", "blame").unwrap().len(), 10);
    }

    #[test]
    fn test_embedded_auxiliary_banks() {
        let loader = JsonDataLoader::embedded();

        let en = loader.auxiliary("en").unwrap();
        assert!(en.connectors.contains(&"which caused".to_string()));
        assert!(en.intensifiers(Severity::Severe).contains(&"catastrophically".to_string()));
        assert_eq!(en.frames.terminator, ".");

        let bn = loader.auxiliary("bn").unwrap();
        assert_eq!(bn.frames.terminator, "।");
        assert!(!bn.recommendations.is_empty());
    }

    #[test]
    fn test_unknown_language_and_category() {
        let loader = JsonDataLoader::embedded();

        assert!(matches!(loader.load("fr", "quantum"), Err(ExcuseError::LanguageNotSupported { .. })));
        assert!(matches!(loader.load("en", "weather"), Err(ExcuseError::InvalidCategory { .. })));
        assert!(matches!(loader.load("en", "connectors"), Err(ExcuseError::InvalidCategory { .. })));
        assert!(matches!(loader.auxiliary("fr"), Err(ExcuseError::LanguageNotSupported { .. })));
    }

    #[test]
    fn test_from_dir_with_bare_banks_and_fallbacks() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "en", "quantum", r#"["a qubit flipped", "  ", "entanglement"]"#);
        write(dir.path(), "en", "pirates", r#"{"category": "pirates", "language": "en", "version": "1.0.0", "excuses": ["the kraken"]}"#);

        let loader = JsonDataLoader::from_dir(dir.path()).unwrap();

        assert_eq!(loader.supported_languages(), vec!["en"]);
        assert_eq!(loader.supported_categories("en").unwrap(), vec!["pirates", "quantum"]);
        assert_eq!(loader.load("en", "quantum").unwrap(), vec!["a qubit flipped", "entanglement"]);
        assert_eq!(loader.load("en", "pirates").unwrap(), vec!["the kraken"]);
        assert_eq!(loader.auxiliary("en").unwrap(), AuxiliaryBanks::default());
    }

    #[test]
    fn test_empty_bank_is_supported_but_fails_to_load() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "en", "cosmic", r#"{"excuses": []}"#);

        let loader = JsonDataLoader::from_dir(dir.path()).unwrap();

        assert_eq!(loader.supported_categories("en").unwrap(), vec!["cosmic"]);
        assert!(matches!(loader.load("en", "cosmic"), Err(ExcuseError::DataLoad(_))));
    }

    #[test]
    fn test_unparseable_bank_is_a_data_load_error() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "en", "cosmic", "{ not json");

        let loader = JsonDataLoader::from_dir(dir.path()).unwrap();

        assert!(matches!(loader.load("en", "cosmic"), Err(ExcuseError::DataLoad(_))));
    }

    #[test]
    fn test_malformed_auxiliary_banks_are_configuration_errors() {
        let cases = [
            ("connectors", r#"{"excuses": "which caused"}"#),
            ("recommendations", r#"["Reboot", ""]"#),
            ("intensifiers", r#"{"excuses": {"apocalyptic": ["very"]}}"#),
            ("frames", r#"{"excuses": {"primary": "no placeholder here"}}"#),
        ];

        for (bank, contents) in cases {
            let dir = tempfile::tempdir().unwrap();
            write(dir.path(), "en", "quantum", r#"["a qubit flipped"]"#);
            write(dir.path(), "en", bank, contents);

            let loader = JsonDataLoader::from_dir(dir.path()).unwrap();
            assert!(matches!(loader.auxiliary("en"), Err(ExcuseError::Configuration(_))), "{bank}");
        }
    }

    #[test]
    fn test_missing_directory_is_a_data_load_error() {
        let dir = tempfile::tempdir().unwrap();

        assert!(matches!(JsonDataLoader::from_dir(&dir.path().join("missing")), Err(ExcuseError::DataLoad(_))));
        assert!(matches!(JsonDataLoader::from_dir(dir.path()), Err(ExcuseError::DataLoad(_))));
    }

    #[test]
    fn test_validate_reports_every_known_bank() {
        let loader = JsonDataLoader::embedded();
        let report = loader.validate("en").unwrap();

        assert!(report.values().all(|ok| *ok), "{report:?}");
        assert_eq!(report.len(), EXCUSE_CATEGORIES.len() + AUXILIARY_BANKS.len());

        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "en", "quantum", r#"["a qubit flipped"]"#);

        let report = JsonDataLoader::from_dir(dir.path()).unwrap().validate("en").unwrap();
        assert_eq!(report.get("quantum"), Some(&true));
        assert_eq!(report.get("cosmic"), Some(&false));
        assert_eq!(report.get("frames"), Some(&false));
    }
}
