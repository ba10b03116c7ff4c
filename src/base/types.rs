//! Shared types, result aliases and the error taxonomy.

use std::{collections::BTreeMap, fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub type Err = anyhow::Error;
pub type Res<T> = Result<T, Err>;
pub type Void = Res<()>;

/// Open-ended extension map carried by every [`Excuse`].
pub type Metadata = BTreeMap<String, Value>;

// Errors.

/// Errors surfaced by the excuse engine and its collaborators.
#[derive(Error, Debug)]
pub enum ExcuseError {
    #[error("Language '{language}' not supported. Supported languages: {supported}")]
    LanguageNotSupported { language: String, supported: String },

    #[error("Category '{category}' is not available for language '{language}'. Available categories: {available}")]
    InvalidCategory { category: String, language: String, available: String },

    #[error("Failed to load excuse data: {0}")]
    DataLoad(String),

    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("Failed to format excuse: {0}")]
    Format(String),
}

pub type ExcuseResult<T> = Result<T, ExcuseError>;

// Severity.

/// Coarse classification of how bad an error looks.
///
/// Ordered from least to most serious, so `Severity::Severe > Severity::Mild`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Mild,
    #[default]
    Medium,
    Severe,
}

impl Severity {
    /// Every tier, mildest first.
    pub const ALL: [Severity; 3] = [Severity::Mild, Severity::Medium, Severity::Severe];

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Mild => "mild",
            Severity::Medium => "medium",
            Severity::Severe => "severe",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = ExcuseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mild" => Ok(Severity::Mild),
            "medium" => Ok(Severity::Medium),
            "severe" => Ok(Severity::Severe),
            other => Err(ExcuseError::Configuration(format!("Unknown severity `{other}`. Must be one of: mild, medium, severe"))),
        }
    }
}

// Excuse.

/// The immutable result of one generation call.
///
/// Fields are private; an excuse is built once from an [`ExcuseDraft`] and
/// only read afterwards. Deserialized excuses go through the same clamping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "ExcuseRecord")]
pub struct Excuse {
    text: String,
    recommendation: String,
    severity: Severity,
    category: String,
    quality_score: u8,
    quantum_probability: f64,
    language: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    timestamp: DateTime<Utc>,
    #[serde(default)]
    metadata: Metadata,
}

/// Wire shape of an [`Excuse`].
#[derive(Deserialize)]
struct ExcuseRecord {
    text: String,
    recommendation: String,
    severity: Severity,
    category: String,
    quality_score: u8,
    quantum_probability: f64,
    language: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    timestamp: DateTime<Utc>,
    #[serde(default)]
    metadata: Metadata,
}

impl From<ExcuseRecord> for Excuse {
    fn from(record: ExcuseRecord) -> Self {
        ExcuseDraft {
            text: record.text,
            recommendation: record.recommendation,
            severity: record.severity,
            category: record.category,
            quality_score: record.quality_score,
            quantum_probability: record.quantum_probability,
            language: record.language,
            metadata: record.metadata,
        }
        .finish_at(record.timestamp)
    }
}

/// Mutable staging area for an [`Excuse`].
#[derive(Debug, Clone, Default)]
pub struct ExcuseDraft {
    pub text: String,
    pub recommendation: String,
    pub severity: Severity,
    pub category: String,
    pub quality_score: u8,
    pub quantum_probability: f64,
    pub language: String,
    pub metadata: Metadata,
}

impl ExcuseDraft {
    /// Freeze the draft with an explicit timestamp.
    pub fn finish_at(self, timestamp: DateTime<Utc>) -> Excuse {
        Excuse {
            text: self.text,
            recommendation: self.recommendation,
            severity: self.severity,
            category: self.category,
            quality_score: self.quality_score.min(100),
            quantum_probability: self.quantum_probability.clamp(0.0, 1.0),
            language: self.language,
            timestamp,
            metadata: self.metadata,
        }
    }
}

impl From<ExcuseDraft> for Excuse {
    fn from(draft: ExcuseDraft) -> Self {
        draft.finish_at(Utc::now())
    }
}

impl Excuse {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn recommendation(&self) -> &str {
        &self.recommendation
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    /// Quality score in `0..=100`.
    pub fn quality_score(&self) -> u8 {
        self.quality_score
    }

    /// Decorative random value in `[0, 1]`.
    pub fn quantum_probability(&self) -> f64 {
        self.quantum_probability
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Seconds since the Unix epoch, with millisecond precision.
    pub fn unix_timestamp(&self) -> f64 {
        self.timestamp.timestamp_millis() as f64 / 1000.0
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Convenience lookup for string-valued metadata.
    pub fn metadata_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(Value::as_str)
    }
}

// Tests.

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> ExcuseDraft {
        ExcuseDraft {
            text: "Test excuse".to_string(),
            recommendation: "Test recommendation".to_string(),
            severity: Severity::Medium,
            category: "test".to_string(),
            quality_score: 75,
            quantum_probability: 0.5,
            language: "en".to_string(),
            metadata: Metadata::from([("test".to_string(), Value::from("data"))]),
        }
    }

    #[test]
    fn test_excuse_from_draft() {
        let excuse = Excuse::from(draft());

        assert_eq!(excuse.text(), "Test excuse");
        assert_eq!(excuse.recommendation(), "Test recommendation");
        assert_eq!(excuse.severity(), Severity::Medium);
        assert_eq!(excuse.category(), "test");
        assert_eq!(excuse.quality_score(), 75);
        assert_eq!(excuse.quantum_probability(), 0.5);
        assert_eq!(excuse.language(), "en");
        assert_eq!(excuse.metadata_str("test"), Some("data"));
        assert!(excuse.unix_timestamp() > 0.0);
    }

    #[test]
    fn test_draft_clamps_out_of_range_values() {
        let mut draft = draft();
        draft.quality_score = 250;
        draft.quantum_probability = 1.7;

        let excuse = Excuse::from(draft);

        assert_eq!(excuse.quality_score(), 100);
        assert_eq!(excuse.quantum_probability(), 1.0);
    }

    #[test]
    fn test_excuse_serializes_timestamp_as_millis() {
        let timestamp = DateTime::from_timestamp_millis(1_700_000_000_123).unwrap();
        let excuse = draft().finish_at(timestamp);

        let json = serde_json::to_value(&excuse).unwrap();
        assert_eq!(json["timestamp"], 1_700_000_000_123i64);
        assert_eq!(json["severity"], "medium");

        let back: Excuse = serde_json::from_value(json).unwrap();
        assert_eq!(back, excuse);
    }

    #[test]
    fn test_deserialized_excuse_is_clamped() {
        let mut json = serde_json::to_value(draft().finish_at(DateTime::from_timestamp_millis(1_700_000_000_000).unwrap())).unwrap();
        json["quality_score"] = Value::from(250);
        json["quantum_probability"] = Value::from(3.0);

        let excuse: Excuse = serde_json::from_value(json).unwrap();

        assert_eq!(excuse.quality_score(), 100);
        assert_eq!(excuse.quantum_probability(), 1.0);
        assert_eq!(excuse.text(), "Test excuse");
    }

    #[test]
    fn test_severity_parse_and_order() {
        assert_eq!(" Severe ".parse::<Severity>().unwrap(), Severity::Severe);
        assert!("catastrophic".parse::<Severity>().is_err());
        assert!(Severity::Severe > Severity::Medium);
        assert!(Severity::Medium > Severity::Mild);
        assert_eq!(Severity::default(), Severity::Medium);
    }
}
