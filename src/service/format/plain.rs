use super::GenericFormatter;
use crate::base::types::{Excuse, ExcuseResult};

const TITLE: &str = "SYSTEM EXCUSE REPORT";

/// Boxed plain-text report wrapped to a fixed width.
#[derive(Debug, Clone)]
pub struct PlainFormatter {
    width: usize,
}

impl PlainFormatter {
    pub fn new(width: usize) -> Self {
        Self { width }
    }
}

impl GenericFormatter for PlainFormatter {
    fn format(&self, excuse: &Excuse) -> ExcuseResult<String> {
        let rule = "=".repeat(self.width);

        let lines = [
            rule.clone(),
            format!("{:^width$}", TITLE, width = self.width).trim_end().to_string(),
            rule.clone(),
            String::new(),
            wrap(&format!("EXCUSE: {}", excuse.text()), self.width, "  "),
            String::new(),
            wrap(&format!("RECOMMENDATION: {}", excuse.recommendation()), self.width, "  "),
            String::new(),
            format!("SEVERITY: {}", excuse.severity().as_str().to_uppercase()),
            format!("CATEGORY: {}", excuse.category().to_uppercase()),
            format!("QUALITY: {}/100", excuse.quality_score()),
            String::new(),
            rule,
        ];

        Ok(lines.join("\n"))
    }
}

/// Greedy word wrap; continuation lines start with `indent`.
///
/// Words longer than the width get a line of their own.
pub(crate) fn wrap(text: &str, width: usize, indent: &str) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut line = String::new();

    for word in text.split_whitespace() {
        let prefix = if lines.is_empty() { "" } else { indent };

        if line.is_empty() {
            line = format!("{prefix}{word}");
        } else if line.chars().count() + 1 + word.chars().count() <= width {
            line.push(' ');
            line.push_str(word);
        } else {
            lines.push(std::mem::take(&mut line));
            line = format!("{indent}{word}");
        }
    }

    if !line.is_empty() {
        lines.push(line);
    }

    lines.join("\n")
}

// Tests.

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::format::fixtures;

    #[test]
    fn test_plain_report_layout() {
        let excuse = fixtures::excuse("A qubit flipped.");
        let rendered = PlainFormatter::new(40).format(&excuse).unwrap();
        let lines: Vec<&str> = rendered.lines().collect();

        assert_eq!(lines[0], "=".repeat(40));
        assert_eq!(lines[1].trim(), "SYSTEM EXCUSE REPORT");
        assert_eq!(lines[4], "EXCUSE: A qubit flipped.");
        assert!(rendered.contains("SEVERITY: MEDIUM"));
        assert!(rendered.contains("CATEGORY: QUANTUM"));
        assert!(rendered.contains("QUALITY: 67/100"));
        assert_eq!(*lines.last().unwrap(), "=".repeat(40));
    }

    #[test]
    fn test_wrap_respects_width() {
        let text = "EXCUSE: the distributed cache layer decohered while the load balancer observed it";
        let wrapped = wrap(text, 30, "  ");

        for line in wrapped.lines() {
            assert!(line.chars().count() <= 30, "{line}");
        }
        assert!(wrapped.lines().skip(1).all(|line| line.starts_with("  ")));
        assert_eq!(wrapped.split_whitespace().collect::<Vec<_>>(), text.split_whitespace().collect::<Vec<_>>());
    }

    #[test]
    fn test_wrap_keeps_long_words_whole() {
        assert_eq!(wrap("supercalifragilistic ok", 5, " "), "supercalifragilistic\n ok");
    }
}
