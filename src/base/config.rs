//! Load configuration via `config` crate with env-override support.

use std::{
    collections::BTreeMap,
    ops::Deref,
    path::{Path, PathBuf},
    sync::Arc,
};

use serde::Deserialize;

use super::types::{Res, Severity, Void};

/// Config file picked up from the working directory when no explicit path is given.
pub const DEFAULT_CONFIG_FILE: &str = ".cosmic-excuse.toml";

/// Largest random contribution the quality score may receive.
pub const MAX_RANDOM_SCORE: u32 = 10;

/// Default language for generated excuses.
fn default_language() -> String {
    "en".to_string()
}

/// Default Markov chain order.
fn default_markov_order() -> usize {
    1
}

/// Default minimum number of jargon tokens.
fn default_jargon_min_tokens() -> usize {
    3
}

/// Default maximum number of jargon tokens.
fn default_jargon_max_tokens() -> usize {
    8
}

/// Severity assumed when no error message was supplied.
fn default_empty_message_severity() -> Severity {
    Severity::Medium
}

fn default_batch_max_attempts_factor() -> usize {
    10
}

fn default_min_score_max_attempts() -> usize {
    50
}

fn default_tweet_max_chars() -> usize {
    280
}

fn default_plain_width() -> usize {
    80
}

fn default_save_history() -> bool {
    true
}

fn default_leaderboard_max_size() -> usize {
    100
}

fn weights(pairs: &[(&str, u32)]) -> BTreeMap<String, u32> {
    pairs.iter().map(|(name, weight)| (name.to_string(), *weight)).collect()
}

/// Category weights used when the caller does not pick a category.
///
/// Severe errors lean towards blaming people and infrastructure, mild ones
/// towards the cosmos. Categories missing from a table weigh 1.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct CategoryBias {
    pub mild: BTreeMap<String, u32>,
    pub medium: BTreeMap<String, u32>,
    pub severe: BTreeMap<String, u32>,
}

impl Default for CategoryBias {
    fn default() -> Self {
        Self {
            mild: weights(&[("quantum", 3), ("cosmic", 3), ("ai", 1), ("technical", 1), ("blame", 1)]),
            medium: weights(&[("quantum", 1), ("cosmic", 1), ("ai", 1), ("technical", 1), ("blame", 1)]),
            severe: weights(&[("quantum", 1), ("cosmic", 1), ("ai", 2), ("technical", 3), ("blame", 3)]),
        }
    }
}

impl CategoryBias {
    /// Weight table for a severity tier.
    pub fn table(&self, severity: Severity) -> &BTreeMap<String, u32> {
        match severity {
            Severity::Mild => &self.mild,
            Severity::Medium => &self.medium,
            Severity::Severe => &self.severe,
        }
    }

    /// Weight of `category` for `severity`, defaulting to 1.
    pub fn weight(&self, severity: Severity, category: &str) -> u32 {
        self.table(severity).get(category).copied().unwrap_or(1)
    }
}

/// Weights of the quality-score bands.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct QualityWeights {
    /// One point per this many characters of excuse text.
    pub length_divisor: usize,
    /// Cap on the length band.
    pub length_cap: u32,
    /// Points per distinct technical keyword found in the text.
    pub keyword_bonus: u32,
    /// Cap on the keyword band.
    pub keyword_cap: u32,
    /// Keywords that earn the bonus (case-insensitive, whole word).
    pub keywords: Vec<String>,
    /// Per-category bonus.
    pub category_bonus: BTreeMap<String, u32>,
    /// Bonus for categories missing from `category_bonus`.
    pub default_category_bonus: u32,
    /// Cap on the random contribution; at most [`MAX_RANDOM_SCORE`].
    pub random_cap: u32,
}

impl Default for QualityWeights {
    fn default() -> Self {
        Self {
            length_divisor: 5,
            length_cap: 40,
            keyword_bonus: 5,
            keyword_cap: 20,
            keywords: ["quantum", "cosmic", "ai", "blockchain", "neural", "kubernetes", "algorithm"].iter().map(|k| k.to_string()).collect(),
            category_bonus: weights(&[("quantum", 20), ("cosmic", 18), ("ai", 15), ("technical", 12), ("blame", 10)]),
            default_category_bonus: 8,
            random_cap: MAX_RANDOM_SCORE,
        }
    }
}

/// Configuration for the excuse generator.
#[derive(Debug, Clone)]
pub struct Config {
    pub inner: Arc<ConfigInner>,
}

impl Deref for Config {
    type Target = ConfigInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl Default for Config {
    fn default() -> Self {
        Self { inner: Arc::new(ConfigInner::default()) }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ConfigInner {
    /// Language used when a request names none (`COSMIC_EXCUSE_DEFAULT_LANGUAGE`).
    #[serde(default = "default_language")]
    pub default_language: String,
    /// Directory of JSON excuse banks, one sub-directory per language (`COSMIC_EXCUSE_DATA_PATH`).
    /// The banks compiled into the binary are used when unset.
    #[serde(default)]
    pub data_path: Option<PathBuf>,
    /// Markov chain order, 1 or 2 (`COSMIC_EXCUSE_MARKOV_ORDER`).
    #[serde(default = "default_markov_order")]
    pub markov_order: usize,
    /// Shortest jargon fragment spliced into an excuse (`COSMIC_EXCUSE_JARGON_MIN_TOKENS`).
    #[serde(default = "default_jargon_min_tokens")]
    pub jargon_min_tokens: usize,
    /// Longest jargon fragment spliced into an excuse (`COSMIC_EXCUSE_JARGON_MAX_TOKENS`).
    #[serde(default = "default_jargon_max_tokens")]
    pub jargon_max_tokens: usize,
    /// Severity assumed for an empty error message (`COSMIC_EXCUSE_EMPTY_MESSAGE_SEVERITY`).
    #[serde(default = "default_empty_message_severity")]
    pub empty_message_severity: Severity,
    /// Category weights per severity tier.
    #[serde(default)]
    pub category_bias: CategoryBias,
    /// Quality-score weights.
    #[serde(default)]
    pub quality: QualityWeights,
    /// Batch generation gives up after `count` times this many attempts.
    #[serde(default = "default_batch_max_attempts_factor")]
    pub batch_max_attempts_factor: usize,
    /// Attempts spent chasing a minimum quality score (`COSMIC_EXCUSE_MIN_SCORE_MAX_ATTEMPTS`).
    #[serde(default = "default_min_score_max_attempts")]
    pub min_score_max_attempts: usize,
    /// Character budget of the tweet formatter (`COSMIC_EXCUSE_TWEET_MAX_CHARS`).
    #[serde(default = "default_tweet_max_chars")]
    pub tweet_max_chars: usize,
    /// Line width of the plain formatter (`COSMIC_EXCUSE_PLAIN_WIDTH`).
    #[serde(default = "default_plain_width")]
    pub plain_width: usize,
    /// Whether generated excuses are appended to the history (`COSMIC_EXCUSE_SAVE_HISTORY`).
    #[serde(default = "default_save_history")]
    pub save_history: bool,
    /// JSON file backing the leaderboard (`COSMIC_EXCUSE_LEADERBOARD_PATH`).
    #[serde(default)]
    pub leaderboard_path: Option<PathBuf>,
    /// Entries kept on the leaderboard (`COSMIC_EXCUSE_LEADERBOARD_MAX_SIZE`).
    #[serde(default = "default_leaderboard_max_size")]
    pub leaderboard_max_size: usize,
    /// Seed for reproducible output (`COSMIC_EXCUSE_SEED`).
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for ConfigInner {
    fn default() -> Self {
        Self {
            default_language: default_language(),
            data_path: None,
            markov_order: default_markov_order(),
            jargon_min_tokens: default_jargon_min_tokens(),
            jargon_max_tokens: default_jargon_max_tokens(),
            empty_message_severity: default_empty_message_severity(),
            category_bias: CategoryBias::default(),
            quality: QualityWeights::default(),
            batch_max_attempts_factor: default_batch_max_attempts_factor(),
            min_score_max_attempts: default_min_score_max_attempts(),
            tweet_max_chars: default_tweet_max_chars(),
            plain_width: default_plain_width(),
            save_history: default_save_history(),
            leaderboard_path: None,
            leaderboard_max_size: default_leaderboard_max_size(),
            seed: None,
        }
    }
}

impl Config {
    pub fn load(explicit_path: Option<&Path>) -> Res<Self> {
        let mut cfg = config::Config::builder().add_source(config::Environment::default().prefix("COSMIC_EXCUSE"));

        if let Some(p) = explicit_path {
            cfg = cfg.add_source(config::File::from(p.to_path_buf()));
        } else if Path::new(DEFAULT_CONFIG_FILE).exists() {
            cfg = cfg.add_source(config::File::from(PathBuf::from(DEFAULT_CONFIG_FILE)).format(config::FileFormat::Toml));
        }

        let result = Config {
            inner: Arc::new(cfg.build()?.try_deserialize()?),
        };

        result.validate()?;

        Ok(result)
    }

    /// Check the invariants the engine relies on.
    pub fn validate(&self) -> Void {
        if self.markov_order != 1 && self.markov_order != 2 {
            return Err(anyhow::anyhow!("Markov order must be 1 or 2."));
        }

        if self.jargon_min_tokens < 1 || self.jargon_min_tokens > self.jargon_max_tokens || self.jargon_max_tokens > 32 {
            return Err(anyhow::anyhow!("Jargon token bounds must satisfy 1 <= min <= max <= 32."));
        }

        if self.tweet_max_chars < 40 {
            return Err(anyhow::anyhow!("Tweet budget must be at least 40 characters."));
        }

        if self.plain_width < 20 {
            return Err(anyhow::anyhow!("Plain text width must be at least 20 columns."));
        }

        if self.leaderboard_max_size < 1 {
            return Err(anyhow::anyhow!("Leaderboard must keep at least one entry."));
        }

        if self.batch_max_attempts_factor < 1 || self.min_score_max_attempts < 1 {
            return Err(anyhow::anyhow!("Attempt limits must be at least 1."));
        }

        if self.quality.random_cap > MAX_RANDOM_SCORE {
            return Err(anyhow::anyhow!("Random quality contribution must not exceed {MAX_RANDOM_SCORE} points."));
        }

        if self.quality.length_divisor < 1 {
            return Err(anyhow::anyhow!("Quality length divisor must be at least 1."));
        }

        for severity in Severity::ALL {
            let table = self.category_bias.table(severity);

            if table.is_empty() || table.values().all(|w| *w == 0) {
                return Err(anyhow::anyhow!("Category bias for `{severity}` needs at least one positive weight."));
            }
        }

        Ok(())
    }
}

// Tests.
