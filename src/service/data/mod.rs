pub mod json;

use std::{collections::BTreeMap, ops::Deref, path::Path, sync::Arc};

use crate::base::{
    banks::{
        FALLBACK_CONNECTORS, FALLBACK_JARGON_FRAME, FALLBACK_MEDIUM_INTENSIFIERS, FALLBACK_MILD_INTENSIFIERS, FALLBACK_PRIMARY_FRAME, FALLBACK_RECOMMENDATIONS, FALLBACK_SECONDARY_FRAME,
        FALLBACK_SEVERE_INTENSIFIERS, FALLBACK_TERMINATOR,
    },
    config::Config,
    types::{ExcuseError, ExcuseResult, Severity},
};

use json::JsonDataLoader;

// Types.

/// Sentence templates the composer fills in.
///
/// `primary` uses `{intensifier}` and `{excuse}`, `secondary` uses
/// `{connector}` and `{excuse}`, and `jargon` uses `{jargon}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frames {
    pub primary: String,
    pub secondary: String,
    pub jargon: String,
    /// Sentence terminator, e.g. `.` or `।`.
    pub terminator: String,
}

impl Default for Frames {
    fn default() -> Self {
        Self {
            primary: FALLBACK_PRIMARY_FRAME.to_string(),
            secondary: FALLBACK_SECONDARY_FRAME.to_string(),
            jargon: FALLBACK_JARGON_FRAME.to_string(),
            terminator: FALLBACK_TERMINATOR.to_string(),
        }
    }
}

/// The non-category banks of one language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuxiliaryBanks {
    pub recommendations: Vec<String>,
    pub connectors: Vec<String>,
    pub intensifiers: BTreeMap<Severity, Vec<String>>,
    pub frames: Frames,
}

impl Default for AuxiliaryBanks {
    fn default() -> Self {
        Self {
            recommendations: owned_words(FALLBACK_RECOMMENDATIONS),
            connectors: owned_words(FALLBACK_CONNECTORS),
            intensifiers: Severity::ALL.into_iter().map(|severity| (severity, fallback_intensifiers(severity))).collect(),
            frames: Frames::default(),
        }
    }
}

impl AuxiliaryBanks {
    /// Intensifiers for a tier.
    pub fn intensifiers(&self, severity: Severity) -> &[String] {
        self.intensifiers.get(&severity).map(Vec::as_slice).unwrap_or_default()
    }
}

pub(crate) fn fallback_intensifiers(severity: Severity) -> Vec<String> {
    match severity {
        Severity::Mild => owned_words(FALLBACK_MILD_INTENSIFIERS),
        Severity::Medium => owned_words(FALLBACK_MEDIUM_INTENSIFIERS),
        Severity::Severe => owned_words(FALLBACK_SEVERE_INTENSIFIERS),
    }
}

pub(crate) fn owned_words(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}

// Traits.

/// Generic source of excuse banks.
///
/// Implementations own the phrase data for every language they serve. The
/// engine only ever reads through this trait, so banks can come from the
/// binary, a directory of JSON files, or a test double.
pub trait GenericDataLoader: Send + Sync + 'static {
    /// Languages with at least one bank, sorted.
    fn supported_languages(&self) -> Vec<String>;

    /// Excuse categories available for a language, sorted.
    fn supported_categories(&self, language: &str) -> ExcuseResult<Vec<String>>;

    /// Phrases of one category bank.
    ///
    /// Fails with `DataLoad` when the bank is missing, unreadable or empty.
    fn load(&self, language: &str, category: &str) -> ExcuseResult<Vec<String>>;

    /// Recommendations, connectors, intensifiers and frames of a language.
    ///
    /// Missing banks fall back to built-in defaults; malformed ones fail with
    /// `Configuration`.
    fn auxiliary(&self, language: &str) -> ExcuseResult<AuxiliaryBanks>;

    /// Whether each known bank of a language is present and usable.
    fn validate(&self, language: &str) -> ExcuseResult<BTreeMap<String, bool>>;
}

// Structs.

/// Data loader for the application.
///
/// It is designed to be trivially cloneable, allowing it to be passed around
/// without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct DataLoader {
    inner: Arc<dyn GenericDataLoader>,
}

impl Deref for DataLoader {
    type Target = dyn GenericDataLoader;

    fn deref(&self) -> &Self::Target {
        &*self.inner
    }
}

impl DataLoader {
    pub fn new(inner: Arc<dyn GenericDataLoader>) -> Self {
        Self { inner }
    }

    /// Banks compiled into the binary.
    pub fn embedded() -> Self {
        Self::new(Arc::new(JsonDataLoader::embedded()))
    }

    /// Banks read from `<path>/<language>/<bank>.json`.
    pub fn from_dir(path: &Path) -> ExcuseResult<Self> {
        Ok(Self::new(Arc::new(JsonDataLoader::from_dir(path)?)))
    }

    /// The directory named by the config, else the embedded banks.
    pub fn from_config(config: &Config) -> ExcuseResult<Self> {
        match &config.data_path {
            Some(path) => Self::from_dir(path),
            None => Ok(Self::embedded()),
        }
    }

    /// Fail with `LanguageNotSupported` unless the language is served.
    pub fn ensure_language(&self, language: &str) -> ExcuseResult<()> {
        let supported = self.supported_languages();

        if supported.iter().any(|l| l == language) {
            return Ok(());
        }

        Err(ExcuseError::LanguageNotSupported {
            language: language.to_string(),
            supported: supported.join(", "),
        })
    }

    /// Fail with `InvalidCategory` unless the language has the category.
    pub fn ensure_category(&self, language: &str, category: &str) -> ExcuseResult<()> {
        let available = self.supported_categories(language)?;

        if available.iter().any(|c| c == category) {
            return Ok(());
        }

        Err(ExcuseError::InvalidCategory {
            category: category.to_string(),
            language: language.to_string(),
            available: available.join(", "),
        })
    }
}

// Tests.
