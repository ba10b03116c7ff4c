//! Markov-chain synthesis of technical jargon.
//!
//! The chain maps every observed prefix of `order` words to the words that
//! followed it, with their frequencies. Tables are ordered maps so that a
//! seeded generator always walks the same path over the same corpus.

use std::collections::BTreeMap;

use rand::{Rng, seq::IndexedRandom};
use tracing::{debug, trace};

use crate::base::{
    banks::TECHNICAL_CORPUS,
    types::{ExcuseError, ExcuseResult},
};

/// The words a transition is keyed on.
pub type Prefix = Vec<String>;

/// Returned when there is nothing to generate from.
const FALLBACK_PHRASE: &str = "technical difficulties";

/// Trailing characters stripped before the final period is added.
const TRAILING_PUNCTUATION: &[char] = &['.', '!', '?', ',', ';', ':', '।'];

/// Whether a token ends a sentence.
fn is_terminal(token: &str) -> bool {
    token.ends_with(['.', '!', '?', '।'])
}

/// Order-1 or order-2 word-level Markov chain.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkovChain {
    order: usize,
    transitions: BTreeMap<Prefix, BTreeMap<String, u32>>,
    starts: BTreeMap<Prefix, u32>,
}

impl MarkovChain {
    /// Build a chain trained on the built-in technical corpus.
    pub fn new(order: usize) -> ExcuseResult<Self> {
        let mut chain = Self::empty(order)?;
        chain.reset();
        Ok(chain)
    }

    /// Build an untrained chain.
    pub fn empty(order: usize) -> ExcuseResult<Self> {
        if !(1..=2).contains(&order) {
            return Err(ExcuseError::Configuration(format!("Markov order must be 1 or 2, got {order}")));
        }

        Ok(Self {
            order,
            transitions: BTreeMap::new(),
            starts: BTreeMap::new(),
        })
    }

    pub fn order(&self) -> usize {
        self.order
    }

    /// Number of distinct prefixes with at least one continuation.
    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.starts.is_empty()
    }

    /// Continuations observed after `prefix`, with their counts.
    pub fn candidates(&self, prefix: &[String]) -> Option<&BTreeMap<String, u32>> {
        self.transitions.get(prefix)
    }

    /// Extend the tables with a corpus, one phrase per item.
    pub fn train<I, S>(&mut self, corpus: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut lines = 0usize;

        for line in corpus {
            let tokens: Vec<&str> = line.as_ref().split_whitespace().collect();

            if tokens.len() < self.order {
                continue;
            }

            let start: Prefix = tokens[..self.order].iter().map(|t| t.to_string()).collect();
            *self.starts.entry(start).or_insert(0) += 1;

            for window in tokens.windows(self.order + 1) {
                let prefix: Prefix = window[..self.order].iter().map(|t| t.to_string()).collect();
                let next = window[self.order].to_string();

                *self.transitions.entry(prefix).or_default().entry(next).or_insert(0) += 1;
            }

            lines += 1;
        }

        debug!(lines, prefixes = self.transitions.len(), "Trained Markov chain.");
    }

    /// Train on a block of text, one phrase per line.
    pub fn add_corpus(&mut self, text: &str) {
        self.train(text.lines());
    }

    /// Replace the tables with ones built from `corpus`.
    pub fn retrain<I, S>(&mut self, corpus: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.clear();
        self.train(corpus);
    }

    /// Restore the built-in technical corpus.
    pub fn reset(&mut self) {
        self.clear();
        self.add_corpus(TECHNICAL_CORPUS);
    }

    /// Forget everything.
    pub fn clear(&mut self) {
        self.transitions.clear();
        self.starts.clear();
    }

    /// Generate a sentence of at most `length` words: capitalised, ending in a single period.
    pub fn generate<R: Rng + ?Sized>(&self, length: usize, rng: &mut R) -> String {
        let start = self.pick_start(rng);
        normalize(self.walk(start, length, rng), length)
    }

    /// Generate raw lowercase-preserving jargon for splicing into other text.
    pub fn generate_phrase<R: Rng + ?Sized>(&self, length: usize, rng: &mut R) -> String {
        let start = self.pick_start(rng);
        let tokens = self.walk(start, length, rng);

        let phrase = tokens.join(" ");
        let phrase = phrase.trim_end_matches(TRAILING_PUNCTUATION).trim_end();

        if phrase.is_empty() { fallback(length).to_string() } else { phrase.to_string() }
    }

    /// Generate a sentence whose first prefix contains `word`, when the corpus has one.
    pub fn generate_starting_with<R: Rng + ?Sized>(&self, word: &str, length: usize, rng: &mut R) -> String {
        let matching: Vec<&Prefix> = self.starts.keys().filter(|p| p.iter().any(|w| w == word)).collect();

        let matching = if matching.is_empty() {
            self.transitions.keys().filter(|p| p.iter().any(|w| w == word)).collect()
        } else {
            matching
        };

        let start = match matching.choose(rng) {
            Some(prefix) => Some((*prefix).clone()),
            None => self.pick_start(rng),
        };

        normalize(self.walk(start, length, rng), length)
    }

    /// Generate a sentence with a length picked uniformly from `min..=max`.
    pub fn generate_sentence<R: Rng + ?Sized>(&self, min: usize, max: usize, rng: &mut R) -> String {
        let min = min.max(1);
        let length = rng.random_range(min..=max.max(min));
        self.generate(length, rng)
    }

    /// Weighted choice among the line-initial prefixes.
    fn pick_start<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Prefix> {
        let starts: Vec<(&Prefix, &u32)> = self.starts.iter().collect();
        starts.choose_weighted(rng, |(_, count)| **count).ok().map(|(prefix, _)| (*prefix).clone())
    }

    /// A fresh window after a dead end, preferring starts that can continue.
    fn restart<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Prefix> {
        let live: Vec<(&Prefix, &u32)> = self.starts.iter().filter(|(prefix, _)| self.transitions.contains_key(*prefix)).collect();

        if let Ok((prefix, _)) = live.choose_weighted(rng, |(_, count)| **count) {
            return Some((*prefix).clone());
        }

        let keys: Vec<&Prefix> = self.transitions.keys().collect();
        keys.choose(rng).map(|prefix| (*prefix).clone())
    }

    /// Walk the chain for at most `length` tokens.
    ///
    /// Each step either emits a token or restarts after a dead end; restarts
    /// are capped at `length`, so the walk always terminates.
    fn walk<R: Rng + ?Sized>(&self, start: Option<Prefix>, length: usize, rng: &mut R) -> Vec<String> {
        let length = length.max(1);

        let Some(mut window) = start else {
            return Vec::new();
        };

        let mut tokens: Vec<String> = Vec::with_capacity(length);

        for token in window.iter().take(length) {
            tokens.push(token.clone());

            if is_terminal(token) {
                return tokens;
            }
        }

        let mut restarts = 0usize;

        while tokens.len() < length {
            let next = self
                .transitions
                .get(&window)
                .and_then(|candidates| {
                    let candidates: Vec<(&String, &u32)> = candidates.iter().collect();
                    candidates.choose_weighted(rng, |(_, count)| **count).ok().map(|(word, _)| (*word).clone())
                });

            match next {
                Some(word) => {
                    let terminal = is_terminal(&word);
                    tokens.push(word.clone());

                    if terminal {
                        break;
                    }

                    window.remove(0);
                    window.push(word);
                }
                None => {
                    restarts += 1;

                    if restarts > length {
                        break;
                    }

                    trace!(restarts, "Dead end; restarting the walk.");

                    match self.restart(rng) {
                        Some(fresh) => window = fresh,
                        None => break,
                    }
                }
            }
        }

        tokens
    }
}

fn fallback(length: usize) -> &'static str {
    if length <= 1 { "difficulties" } else { FALLBACK_PHRASE }
}

/// Capitalise the first letter and end with exactly one period.
fn normalize(tokens: Vec<String>, length: usize) -> String {
    let joined = tokens.join(" ");
    let body = joined.trim_end_matches(TRAILING_PUNCTUATION).trim_end();
    let body = if body.is_empty() { fallback(length) } else { body };

    let mut chars = body.chars();
    let mut sentence = match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
        None => String::new(),
    };

    sentence.push('.');
    sentence
}

// Tests.
