use super::GenericFormatter;
use crate::base::types::{Excuse, ExcuseResult};

const HASHTAGS: &str = " #debugging #programming #excuses #quantum";
const ELLIPSIS: &str = "...";

/// Excuse plus hashtags, cut to fit a post.
#[derive(Debug, Clone)]
pub struct TweetFormatter {
    max_chars: usize,
}

impl TweetFormatter {
    pub fn new(max_chars: usize) -> Self {
        Self { max_chars }
    }
}

impl GenericFormatter for TweetFormatter {
    fn format(&self, excuse: &Excuse) -> ExcuseResult<String> {
        let text = excuse.text();
        let budget = self.max_chars.saturating_sub(HASHTAGS.chars().count());

        if text.chars().count() <= budget {
            return Ok(format!("{}{}", text, HASHTAGS));
        }

        let kept: String = text.chars().take(budget.saturating_sub(ELLIPSIS.len())).collect();

        Ok(format!("{}{}{}", kept.trim_end(), ELLIPSIS, HASHTAGS))
    }
}

// Tests.

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::format::fixtures;

    #[test]
    fn test_short_text_is_kept() {
        let rendered = TweetFormatter::new(280).format(&fixtures::excuse("A qubit flipped.")).unwrap();

        assert_eq!(rendered, "A qubit flipped. #debugging #programming #excuses #quantum");
    }

    #[test]
    fn test_long_text_is_truncated_to_budget() {
        let text = "quantum decoherence ".repeat(30);
        let rendered = TweetFormatter::new(280).format(&fixtures::excuse(&text)).unwrap();

        assert!(rendered.chars().count() <= 280);
        assert!(rendered.ends_with("... #debugging #programming #excuses #quantum"));
    }

    #[test]
    fn test_truncation_respects_char_boundaries() {
        let text = "কোয়ান্টাম ".repeat(60);
        let rendered = TweetFormatter::new(100).format(&fixtures::excuse(&text)).unwrap();

        assert!(rendered.chars().count() <= 100);
        assert!(rendered.contains(ELLIPSIS));
    }
}
