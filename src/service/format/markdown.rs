use super::GenericFormatter;
use crate::base::types::{Excuse, ExcuseResult, Severity};

/// Markdown incident report.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownFormatter;

fn severity_emoji(severity: Severity) -> &'static str {
    match severity {
        Severity::Mild => "🟢",
        Severity::Medium => "🟡",
        Severity::Severe => "🔴",
    }
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();

    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

impl GenericFormatter for MarkdownFormatter {
    fn format(&self, excuse: &Excuse) -> ExcuseResult<String> {
        let mut output = vec![
            "## 🚨 System Excuse Report\n".to_string(),
            format!("**Primary Analysis:** {}\n", excuse.text()),
            "### 📊 Metadata\n".to_string(),
            format!("- **Severity:** {} {}", severity_emoji(excuse.severity()), title_case(excuse.severity().as_str())),
            format!("- **Category:** {}", title_case(excuse.category())),
            format!("- **Quality Score:** {}/100", excuse.quality_score()),
            format!("- **Quantum Probability:** {:.4}", excuse.quantum_probability()),
            "\n### 💡 Recommended Action\n".to_string(),
            format!("> {}", excuse.recommendation()),
        ];

        if let Some(jargon) = excuse.metadata_str("markov_component") {
            output.push("\n### 🔬 Technical Analysis\n".to_string());
            output.push(format!("```\n{jargon}\n```"));
        }

        Ok(output.join("\n"))
    }

    fn format_many(&self, excuses: &[Excuse]) -> ExcuseResult<String> {
        let rendered = excuses.iter().map(|excuse| self.format(excuse)).collect::<ExcuseResult<Vec<_>>>()?;

        Ok(rendered.join("\n\n---\n\n"))
    }
}

// Tests.

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::format::fixtures;

    #[test]
    fn test_markdown_sections() {
        let rendered = MarkdownFormatter.format(&fixtures::excuse("A qubit flipped.")).unwrap();

        assert!(rendered.starts_with("## 🚨 System Excuse Report"));
        assert!(rendered.contains("**Primary Analysis:** A qubit flipped."));
        assert!(rendered.contains("- **Severity:** 🟡 Medium"));
        assert!(rendered.contains("- **Category:** Quantum"));
        assert!(rendered.contains("- **Quality Score:** 67/100"));
        assert!(rendered.contains("- **Quantum Probability:** 0.2500"));
        assert!(rendered.contains("> Realign the quantum flux capacitor"));
        assert!(rendered.ends_with("```\ncache miss branch prediction\n```"));
    }

    #[test]
    fn test_markdown_many_uses_rules() {
        let excuses = [fixtures::excuse("One."), fixtures::excuse("Two.")];
        let rendered = MarkdownFormatter.format_many(&excuses).unwrap();

        assert_eq!(rendered.matches("\n---\n").count(), 1);
    }
}
