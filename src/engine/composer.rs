//! Assembly of [`Excuse`] records from banks, jargon and severity.

use std::collections::{BTreeMap, BTreeSet};

use rand::{
    Rng, SeedableRng,
    seq::{IndexedRandom, SliceRandom},
};
use rand_chacha::ChaCha8Rng;
use serde_json::Value;
use tracing::{debug, instrument, trace, warn};

use super::{analyzer::SeverityAnalyzer, markov::MarkovChain};
use crate::{
    base::{
        banks::{JARGON_CATEGORIES, SAMPLE_ERRORS},
        config::{Config, QualityWeights},
        types::{Excuse, ExcuseDraft, ExcuseError, ExcuseResult, Metadata, Severity},
    },
    service::data::{AuxiliaryBanks, DataLoader},
};

const SENTENCE_ENDINGS: &[char] = &['.', '!', '?', '।'];

// Options.

/// Inputs of one generation call. Everything is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerateOptions {
    /// Error text to classify; blank means "no error given".
    pub error_message: String,
    /// Free-form context recorded in the metadata.
    pub context: Option<String>,
    /// Forced category; picked by severity bias when absent.
    pub category: Option<String>,
    /// Language code; the configured default when absent.
    pub language: Option<String>,
}

impl GenerateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn error_message(mut self, error_message: impl Into<String>) -> Self {
        self.error_message = error_message.into();
        self
    }

    pub fn context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }
}

// Composer.

/// Per-language state built on first use.
struct LanguageState {
    chain: MarkovChain,
    auxiliary: AuxiliaryBanks,
}

/// Builds excuses.
///
/// The composer owns its random generator, so two composers built with the
/// same seed over the same banks produce the same texts.
pub struct ExcuseComposer {
    config: Config,
    data: DataLoader,
    analyzer: SeverityAnalyzer,
    languages: BTreeMap<String, LanguageState>,
    rng: ChaCha8Rng,
}

impl ExcuseComposer {
    /// Build a composer, seeded from the config when it names a seed.
    pub fn new(config: Config, data: DataLoader) -> ExcuseResult<Self> {
        let rng = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_rng(&mut rand::rng()),
        };

        Self::with_rng(config, data, rng)
    }

    /// Build a composer with an explicit seed.
    pub fn with_seed(config: Config, data: DataLoader, seed: u64) -> ExcuseResult<Self> {
        Self::with_rng(config, data, ChaCha8Rng::seed_from_u64(seed))
    }

    fn with_rng(config: Config, data: DataLoader, rng: ChaCha8Rng) -> ExcuseResult<Self> {
        let analyzer = SeverityAnalyzer::new()?.with_empty_default(config.empty_message_severity);

        Ok(Self {
            config,
            data,
            analyzer,
            languages: BTreeMap::new(),
            rng,
        })
    }

    /// Restart the random sequence.
    pub fn reseed(&mut self, seed: u64) {
        self.rng = ChaCha8Rng::seed_from_u64(seed);
    }

    pub fn analyzer(&self) -> &SeverityAnalyzer {
        &self.analyzer
    }

    /// The jargon chain of a language, trained on first use.
    pub fn chain(&mut self, language: &str) -> ExcuseResult<&MarkovChain> {
        Ok(&self.prepare(language)?.chain)
    }

    /// Train an extra corpus into the jargon chain of a language.
    pub fn add_corpus(&mut self, language: &str, text: &str) -> ExcuseResult<()> {
        self.prepare(language)?;

        if let Some(state) = self.languages.get_mut(language) {
            state.chain.add_corpus(text);
        }

        Ok(())
    }

    /// Generate one excuse.
    #[instrument(skip_all, fields(language = ?options.language, category = ?options.category))]
    pub fn generate(&mut self, options: &GenerateOptions) -> ExcuseResult<Excuse> {
        let language = options.language.clone().unwrap_or_else(|| self.config.default_language.clone());

        // Fail fast on capabilities before any random work.
        self.data.ensure_language(&language)?;
        if let Some(category) = &options.category {
            self.data.ensure_category(&language, category)?;
        }

        let details = self.analyzer.details(&options.error_message);
        let severity = details.level;

        let category = match &options.category {
            Some(category) => category.clone(),
            None => self.pick_category(&language, severity)?,
        };

        let primary_phrases = self.data.load(&language, &category)?;
        let primary = pick(&primary_phrases, &mut self.rng, &category)?.clone();

        let (secondary_category, secondary_phrases) = self.pick_secondary(&language, &category, &primary_phrases)?;
        let secondary = pick_other(&secondary_phrases, &primary, &mut self.rng, &secondary_category)?.clone();

        self.prepare(&language)?;
        let Some(state) = self.languages.get(&language) else {
            return Err(ExcuseError::DataLoad(format!("No jargon model for language '{language}'")));
        };

        let intensifier = state.auxiliary.intensifiers(severity).choose(&mut self.rng).cloned().unwrap_or_default();
        let connector = state.auxiliary.connectors.choose(&mut self.rng).cloned().unwrap_or_default();
        let recommendation = state.auxiliary.recommendations.choose(&mut self.rng).cloned().unwrap_or_default();

        let jargon_length = self.rng.random_range(self.config.jargon_min_tokens..=self.config.jargon_max_tokens);
        let jargon = state.chain.generate_phrase(jargon_length, &mut self.rng);

        let frames = &state.auxiliary.frames;
        let sentences = [
            frames.primary.replace("{intensifier}", &intensifier).replace("{excuse}", &primary),
            capitalize(&frames.secondary.replace("{connector}", &connector).replace("{excuse}", &secondary)),
            frames.jargon.replace("{jargon}", &jargon),
        ];

        let text = sentences
            .iter()
            .map(|sentence| format!("{}{}", sentence.trim().trim_end_matches(SENTENCE_ENDINGS), frames.terminator))
            .collect::<Vec<_>>()
            .join(" ");

        let quantum_probability: f64 = self.rng.random();
        let quality_score = quality_score(&text, &category, quantum_probability, &self.config.quality);

        let mut metadata = Metadata::new();
        metadata.insert("secondary_category".to_string(), Value::from(secondary_category));
        metadata.insert("markov_component".to_string(), Value::from(jargon));
        metadata.insert("error_message".to_string(), Value::from(options.error_message.clone()));
        if let Some(context) = &options.context {
            metadata.insert("context".to_string(), Value::from(context.clone()));
        }
        metadata.insert("matched_keywords".to_string(), Value::from(details.matched_keywords));

        debug!(%severity, %category, quality_score, "Generated excuse.");

        Ok(Excuse::from(ExcuseDraft {
            text,
            recommendation,
            severity,
            category,
            quality_score,
            quantum_probability,
            language,
            metadata,
        }))
    }

    /// Generate up to `count` excuses with pairwise distinct texts.
    ///
    /// Gives up after `count × batch_max_attempts_factor` attempts. When the
    /// options carry no error message, every attempt samples a canned one.
    #[instrument(skip(self, options))]
    pub fn generate_batch(&mut self, count: usize, options: &GenerateOptions) -> ExcuseResult<Vec<Excuse>> {
        let max_attempts = count.saturating_mul(self.config.batch_max_attempts_factor);
        let sample_errors = options.error_message.trim().is_empty();

        let mut seen = BTreeSet::new();
        let mut excuses = Vec::with_capacity(count);
        let mut attempts = 0;

        while excuses.len() < count && attempts < max_attempts {
            attempts += 1;

            let mut attempt = options.clone();
            if sample_errors {
                attempt.error_message = SAMPLE_ERRORS.choose(&mut self.rng).map(|e| e.to_string()).unwrap_or_default();
            }

            let excuse = self.generate(&attempt)?;

            if seen.insert(excuse.text().to_string()) {
                excuses.push(excuse);
            } else {
                trace!(attempts, "Discarded duplicate excuse.");
            }
        }

        if excuses.len() < count {
            warn!(requested = count, produced = excuses.len(), attempts, "Ran out of attempts before producing enough distinct excuses.");
        }

        Ok(excuses)
    }

    /// Regenerate until the quality score reaches `min_score`.
    ///
    /// Returns the last attempt if none qualifies within `max_attempts`.
    #[instrument(skip(self, options))]
    pub fn generate_with_min_score(&mut self, options: &GenerateOptions, min_score: u8, max_attempts: usize) -> ExcuseResult<Excuse> {
        let max_attempts = max_attempts.max(1);
        let mut attempt = 1;

        loop {
            let excuse = self.generate(options)?;

            if excuse.quality_score() >= min_score || attempt >= max_attempts {
                if excuse.quality_score() < min_score {
                    debug!(score = excuse.quality_score(), "No excuse reached the minimum score.");
                }

                return Ok(excuse);
            }

            attempt += 1;
        }
    }

    /// Severity-biased weighted choice among the categories of a language.
    fn pick_category(&mut self, language: &str, severity: Severity) -> ExcuseResult<String> {
        let available = self.data.supported_categories(language)?;
        let bias = &self.config.category_bias;

        let chosen = match available.choose_weighted(&mut self.rng, |category| bias.weight(severity, category)) {
            Ok(category) => Some(category),
            // Every weight is zero; ignore the bias.
            Err(_) => available.choose(&mut self.rng),
        };

        chosen.cloned().ok_or_else(|| ExcuseError::DataLoad(format!("Language '{language}' has no excuse categories")))
    }

    /// A loadable category other than `primary`, or `primary` itself when there is none.
    fn pick_secondary(&mut self, language: &str, primary: &str, primary_phrases: &[String]) -> ExcuseResult<(String, Vec<String>)> {
        let mut others: Vec<String> = self.data.supported_categories(language)?.into_iter().filter(|c| c != primary).collect();
        others.shuffle(&mut self.rng);

        for category in others {
            match self.data.load(language, &category) {
                Ok(phrases) if !phrases.is_empty() => return Ok((category, phrases)),
                Ok(_) => debug!(%category, "Skipping empty secondary bank."),
                Err(e) => debug!(%category, error = %e, "Skipping unloadable secondary bank."),
            }
        }

        Ok((primary.to_string(), primary_phrases.to_vec()))
    }

    /// Build the chain and auxiliary banks of a language if needed.
    fn prepare(&mut self, language: &str) -> ExcuseResult<&LanguageState> {
        if !self.languages.contains_key(language) {
            let state = build_language_state(&self.config, &self.data, language)?;
            self.languages.insert(language.to_string(), state);
        }

        self.languages
            .get(language)
            .ok_or_else(|| ExcuseError::DataLoad(format!("No jargon model for language '{language}'")))
    }
}

#[instrument(skip(config, data))]
fn build_language_state(config: &Config, data: &DataLoader, language: &str) -> ExcuseResult<LanguageState> {
    data.ensure_language(language)?;

    let mut chain = MarkovChain::new(config.markov_order)?;
    let categories = data.supported_categories(language)?;

    for &category in JARGON_CATEGORIES {
        if !categories.iter().any(|c| c == category) {
            continue;
        }

        match data.load(language, category) {
            Ok(phrases) => chain.train(&phrases),
            Err(e) => debug!(category, error = %e, "Skipping jargon bank."),
        }
    }

    Ok(LanguageState {
        chain,
        auxiliary: data.auxiliary(language)?,
    })
}

/// Deterministic quality score in `0..=100`.
///
/// Sums a capped length band, a capped technical-keyword band, a category
/// bonus, and the quantum probability scaled to at most `random_cap` points.
pub fn quality_score(text: &str, category: &str, quantum_probability: f64, weights: &QualityWeights) -> u8 {
    let length = (text.chars().count() / weights.length_divisor.max(1)) as u32;
    let length = length.min(weights.length_cap);

    let lowered = text.to_lowercase();
    let words: BTreeSet<&str> = lowered.split(|c: char| !c.is_alphanumeric()).filter(|w| !w.is_empty()).collect();

    let keyword_hits = weights
        .keywords
        .iter()
        .filter(|keyword| {
            let keyword = keyword.to_lowercase();
            words.contains(keyword.as_str()) || words.contains(format!("{keyword}s").as_str())
        })
        .count() as u32;
    let keywords = keyword_hits.saturating_mul(weights.keyword_bonus).min(weights.keyword_cap);

    let category = weights.category_bonus.get(category).copied().unwrap_or(weights.default_category_bonus);

    let random = (quantum_probability.clamp(0.0, 1.0) * weights.random_cap as f64).round() as u32;
    let random = random.min(weights.random_cap);

    length.saturating_add(keywords).saturating_add(category).saturating_add(random).min(100) as u8
}

fn pick<'a, R: Rng + ?Sized>(phrases: &'a [String], rng: &mut R, category: &str) -> ExcuseResult<&'a String> {
    phrases.choose(rng).ok_or_else(|| ExcuseError::DataLoad(format!("Bank '{category}' is empty")))
}

/// A phrase different from `avoid` when the bank has one.
fn pick_other<'a, R: Rng + ?Sized>(phrases: &'a [String], avoid: &str, rng: &mut R, category: &str) -> ExcuseResult<&'a String> {
    let others: Vec<&String> = phrases.iter().filter(|p| p.as_str() != avoid).collect();

    match others.choose(rng) {
        Some(phrase) => Ok(*phrase),
        None => pick(phrases, rng, category),
    }
}

fn capitalize(sentence: &str) -> String {
    let mut chars = sentence.chars();

    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

// Tests.
