//! Rule-based severity classification of error messages.
//!
//! Every keyword and pattern belongs to one severity tier. A message scores
//! the weights of everything it matches, per tier. Any severe hit makes the
//! message severe; otherwise the tier with the highest total wins and ties go
//! to the more serious tier.

use regex::{Regex, RegexBuilder};
use serde::Serialize;
use tracing::trace;

use crate::base::types::{ExcuseError, ExcuseResult, Severity};

const SEVERE_KEYWORDS: &[&str] = &[
    "fatal",
    "critical",
    "crash",
    "panic",
    "doom",
    "catastrophic",
    "emergency",
    "disaster",
    "meltdown",
    "apocalypse",
    "dead",
    "explosion",
    "burning",
    "destroyed",
    "corrupt",
    "segmentation",
    "core dump",
    "kernel panic",
];

const MEDIUM_KEYWORDS: &[&str] = &[
    "error",
    "fail",
    "exception",
    "problem",
    "issue",
    "broken",
    "invalid",
    "denied",
    "refused",
    "timeout",
    "overflow",
    "leak",
    "violation",
    "conflict",
    "missing",
    "undefined",
    "null pointer",
    "not found",
];

const MILD_KEYWORDS: &[&str] = &[
    "warning",
    "deprecated",
    "notice",
    "info",
    "debug",
    "trace",
    "minor",
    "slight",
    "temporary",
    "recoverable",
    "retry",
    "pending",
    "delayed",
    "obsolete",
    "legacy",
];

const SEVERE_PATTERNS: &[&str] = &[r"FATAL", r"CRITICAL", r"PANIC", r"EMERGENCY", r"!!!+", r"SYSTEM.*DOWN", r"KERNEL.*PANIC", r"SEGMENTATION.*FAULT", r"CORE.*DUMP"];

const MEDIUM_PATTERNS: &[&str] = &[r"\bERROR\b", r"EXCEPTION", r"FAILED", r"!!", r"\bFAIL\b", r"NULL.*POINTER", r"STACK.*OVERFLOW", r"MEMORY.*LEAK"];

const MILD_PATTERNS: &[&str] = &[r"\bWARN(ING)?\b", r"\bINFO\b", r"DEBUG", r"NOTICE", r"DEPRECATED", r"TRACE", r"\bRETRY", r"PENDING"];

/// Weight of one keyword hit.
fn keyword_weight(severity: Severity) -> u32 {
    match severity {
        Severity::Severe => 3,
        Severity::Medium => 2,
        Severity::Mild => 1,
    }
}

/// Weight of one pattern hit.
fn pattern_weight(severity: Severity) -> u32 {
    match severity {
        Severity::Severe => 5,
        Severity::Medium => 3,
        Severity::Mild => 1,
    }
}

/// A compiled keyword or pattern tagged with its tier.
#[derive(Debug, Clone)]
struct Rule {
    severity: Severity,
    label: &'static str,
    regex: Regex,
}

/// Accumulated weighted score of each tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TierScores {
    pub mild: u32,
    pub medium: u32,
    pub severe: u32,
}

impl TierScores {
    pub fn get(&self, severity: Severity) -> u32 {
        match severity {
            Severity::Mild => self.mild,
            Severity::Medium => self.medium,
            Severity::Severe => self.severe,
        }
    }

    fn add(&mut self, severity: Severity, weight: u32) {
        match severity {
            Severity::Mild => self.mild += weight,
            Severity::Medium => self.medium += weight,
            Severity::Severe => self.severe += weight,
        }
    }

    fn total(&self) -> u32 {
        self.mild + self.medium + self.severe
    }
}

/// Everything the analyzer found in one message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeverityDetails {
    pub level: Severity,
    /// Score of the winning tier.
    pub score: u32,
    pub tier_scores: TierScores,
    pub matched_keywords: Vec<String>,
    pub matched_patterns: Vec<String>,
    pub exclamation_count: usize,
    pub uppercase_ratio: f64,
    pub message_length: usize,
}

/// Deterministic keyword/pattern severity classifier.
#[derive(Debug, Clone)]
pub struct SeverityAnalyzer {
    keywords: Vec<Rule>,
    patterns: Vec<Rule>,
    empty_default: Severity,
    unmatched_default: Severity,
}

impl SeverityAnalyzer {
    /// Build the analyzer with its built-in keyword and pattern tables.
    pub fn new() -> ExcuseResult<Self> {
        let tiers = [(Severity::Severe, SEVERE_KEYWORDS, SEVERE_PATTERNS), (Severity::Medium, MEDIUM_KEYWORDS, MEDIUM_PATTERNS), (Severity::Mild, MILD_KEYWORDS, MILD_PATTERNS)];

        let mut keywords = Vec::new();
        let mut patterns = Vec::new();

        for (severity, tier_keywords, tier_patterns) in tiers {
            for &keyword in tier_keywords {
                // Keywords match at the start of a word, so "corrupt" also catches "corrupted".
                keywords.push(compile(severity, keyword, &format!(r"\b{}", regex::escape(keyword)))?);
            }

            for &pattern in tier_patterns {
                patterns.push(compile(severity, pattern, pattern)?);
            }
        }

        Ok(Self {
            keywords,
            patterns,
            empty_default: Severity::Mild,
            unmatched_default: Severity::Medium,
        })
    }

    /// Tier reported for empty or whitespace-only input.
    pub fn with_empty_default(mut self, severity: Severity) -> Self {
        self.empty_default = severity;
        self
    }

    /// Classify an error message.
    pub fn analyze(&self, error_message: &str) -> Severity {
        self.details(error_message).level
    }

    /// Classify an error message and report what matched.
    pub fn details(&self, error_message: &str) -> SeverityDetails {
        let mut tier_scores = TierScores::default();
        let mut matched_keywords = Vec::new();
        let mut matched_patterns = Vec::new();

        let is_blank = error_message.trim().is_empty();

        if !is_blank {
            for rule in self.keywords.iter().filter(|rule| rule.regex.is_match(error_message)) {
                tier_scores.add(rule.severity, keyword_weight(rule.severity));
                matched_keywords.push(rule.label.to_string());
            }

            for rule in self.patterns.iter().filter(|rule| rule.regex.is_match(error_message)) {
                tier_scores.add(rule.severity, pattern_weight(rule.severity));
                matched_patterns.push(rule.label.to_string());
            }
        }

        let level = if is_blank {
            self.empty_default
        } else if tier_scores.total() == 0 {
            self.unmatched_default
        } else {
            pick_tier(&tier_scores)
        };

        trace!(%level, ?tier_scores, "Analyzed error message.");

        let char_count = error_message.chars().count();
        let uppercase = error_message.chars().filter(|c| c.is_uppercase()).count();

        SeverityDetails {
            level,
            score: tier_scores.get(level),
            tier_scores,
            matched_keywords,
            matched_patterns,
            exclamation_count: error_message.matches('!').count(),
            uppercase_ratio: uppercase as f64 / char_count.max(1) as f64,
            message_length: char_count,
        }
    }
}

fn compile(severity: Severity, label: &'static str, source: &str) -> ExcuseResult<Rule> {
    let regex = RegexBuilder::new(source)
        .case_insensitive(true)
        .build()
        .map_err(|e| ExcuseError::Configuration(format!("Invalid severity pattern `{label}`: {e}")))?;

    Ok(Rule { severity, label, regex })
}

/// Severe on any severe evidence, else the highest-scoring tier, most serious first on ties.
fn pick_tier(scores: &TierScores) -> Severity {
    if scores.severe > 0 {
        return Severity::Severe;
    }

    let best = Severity::ALL.iter().map(|s| scores.get(*s)).max().unwrap_or(0);

    Severity::ALL.iter().rev().copied().find(|s| scores.get(*s) == best).unwrap_or(Severity::Medium)
}

// Tests.
