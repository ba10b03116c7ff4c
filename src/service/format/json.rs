use serde_json::{Value, json};

use super::GenericFormatter;
use crate::base::types::{Excuse, ExcuseError, ExcuseResult};

/// Pretty-printed JSON objects; several excuses render as an array.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFormatter;

impl JsonFormatter {
    /// The public JSON shape of an excuse.
    pub fn to_value(excuse: &Excuse) -> Value {
        json!({
            "excuse": excuse.text(),
            "recommendation": excuse.recommendation(),
            "severity": excuse.severity(),
            "category": excuse.category(),
            "quality_score": excuse.quality_score(),
            "quantum_probability": excuse.quantum_probability(),
            "timestamp": excuse.unix_timestamp(),
            "language": excuse.language(),
            "technical_details": excuse.metadata_str("markov_component").unwrap_or_default(),
            "error_message": excuse.metadata_str("error_message").unwrap_or_default(),
        })
    }
}

fn pretty(value: &Value) -> ExcuseResult<String> {
    serde_json::to_string_pretty(value).map_err(|e| ExcuseError::Format(e.to_string()))
}

impl GenericFormatter for JsonFormatter {
    fn format(&self, excuse: &Excuse) -> ExcuseResult<String> {
        pretty(&Self::to_value(excuse))
    }

    fn format_many(&self, excuses: &[Excuse]) -> ExcuseResult<String> {
        pretty(&Value::Array(excuses.iter().map(Self::to_value).collect()))
    }
}

// Tests.
