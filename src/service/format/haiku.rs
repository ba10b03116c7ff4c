use std::iter::Peekable;

use super::GenericFormatter;
use crate::base::{
    banks::{HAIKU_FIVE_SYLLABLE_LINES, HAIKU_SEVEN_SYLLABLE_LINES},
    types::{Excuse, ExcuseResult},
};

const SYLLABLE_PATTERN: [usize; 3] = [5, 7, 5];

/// Three lines of roughly 5-7-5 syllables cut from the excuse text.
#[derive(Debug, Clone, Copy, Default)]
pub struct HaikuFormatter;

/// Vowel-group estimate of a word's syllables, at least one.
pub fn syllables(word: &str) -> usize {
    let word = word.to_lowercase();
    let letters: Vec<char> = word.chars().filter(|c| c.is_alphabetic()).collect();

    let mut count = 0;
    let mut previous_vowel = false;

    for &c in &letters {
        let vowel = matches!(c, 'a' | 'e' | 'i' | 'o' | 'u' | 'y');
        if vowel && !previous_vowel {
            count += 1;
        }
        previous_vowel = vowel;
    }

    // Silent trailing "e", as in "cache".
    if count > 1 && letters.last() == Some(&'e') && letters.iter().rev().nth(1).is_some_and(|c| !matches!(c, 'a' | 'e' | 'i' | 'o' | 'u' | 'y' | 'l')) {
        count -= 1;
    }

    count.max(1)
}

/// Take words until the line reaches `target` syllables.
///
/// Words that would overshoot end the line; `None` means the words ran out
/// too early to make a usable line.
fn take_line<'a, I>(words: &mut Peekable<I>, target: usize) -> Option<String>
where
    I: Iterator<Item = &'a str>,
{
    let mut line: Vec<&str> = Vec::new();
    let mut count = 0;

    while let Some(&word) = words.peek() {
        let weight = syllables(word);

        if count + weight > target {
            if line.is_empty() {
                words.next();
                continue;
            }
            break;
        }

        count += weight;
        line.push(word);
        words.next();

        if count == target {
            break;
        }
    }

    (!line.is_empty() && count + 1 >= target).then(|| capitalize(&line.join(" ")))
}

fn capitalize(line: &str) -> String {
    let mut chars = line.chars();

    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

impl GenericFormatter for HaikuFormatter {
    fn format(&self, excuse: &Excuse) -> ExcuseResult<String> {
        let mut words = excuse
            .text()
            .split_whitespace()
            .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()))
            .filter(|w| !w.is_empty())
            .peekable();

        // Fallbacks are picked by score so the same excuse renders the same haiku.
        let seed = excuse.quality_score() as usize;

        let lines: Vec<String> = SYLLABLE_PATTERN
            .iter()
            .enumerate()
            .map(|(index, &target)| {
                take_line(&mut words, target).unwrap_or_else(|| {
                    let pool = if target == 7 { HAIKU_SEVEN_SYLLABLE_LINES } else { HAIKU_FIVE_SYLLABLE_LINES };
                    pool[(seed + index) % pool.len()].to_string()
                })
            })
            .collect();

        Ok(lines.join("\n"))
    }
}

// Tests.

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::format::fixtures;

    #[test]
    fn test_syllable_estimate() {
        assert_eq!(syllables("bits"), 1);
        assert_eq!(syllables("cache"), 1);
        assert_eq!(syllables("quantum"), 2);
        assert_eq!(syllables("memory"), 3);
        assert_eq!(syllables("void"), 1);
        assert_eq!(syllables("table"), 2);
        assert_eq!(syllables("42"), 1);
    }

    #[test]
    fn test_haiku_from_long_text() {
        let excuse = fixtures::excuse("Bits flip in the void. The servers are weeping now. Cosmic rays strike hard.");
        let rendered = HaikuFormatter.format(&excuse).unwrap();

        assert_eq!(rendered, "Bits flip in the void\nThe servers are weeping now\nCosmic rays strike hard");
    }

    #[test]
    fn test_short_text_is_padded() {
        let excuse = fixtures::excuse("Oops.");
        let rendered = HaikuFormatter.format(&excuse).unwrap();
        let lines: Vec<&str> = rendered.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(HAIKU_FIVE_SYLLABLE_LINES.contains(&lines[0]));
        assert!(HAIKU_SEVEN_SYLLABLE_LINES.contains(&lines[1]));
        assert!(HAIKU_FIVE_SYLLABLE_LINES.contains(&lines[2]));
        assert_ne!(lines[0], lines[2]);
    }

    #[test]
    fn test_haiku_is_stable() {
        let excuse = fixtures::excuse("The error was definitely caused by quantum entanglement between servers.");

        assert_eq!(HaikuFormatter.format(&excuse).unwrap(), HaikuFormatter.format(&excuse).unwrap());
    }
}
