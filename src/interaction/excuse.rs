use tracing::{info, instrument};

use crate::{
    base::types::{Excuse, Res},
    engine::composer::GenerateOptions,
    runtime::Runtime,
    service::format::{Formatter, OutputStyle},
};

/// A request to generate and render excuses.
#[derive(Debug, Clone, PartialEq)]
pub struct ExcuseCommand {
    pub options: GenerateOptions,
    pub count: usize,
    pub style: OutputStyle,
    /// Append a score line to each rendered excuse.
    pub show_score: bool,
    /// Regenerate each excuse until it reaches this score.
    pub min_score: Option<u8>,
}

impl Default for ExcuseCommand {
    fn default() -> Self {
        Self {
            options: GenerateOptions::default(),
            count: 1,
            style: OutputStyle::default(),
            show_score: false,
            min_score: None,
        }
    }
}

/// Generate the requested excuses and render them in the requested style.
#[instrument(skip_all, fields(count = command.count, style = %command.style))]
pub fn handle_excuse(runtime: &mut Runtime, command: &ExcuseCommand) -> Res<String> {
    let excuses = generate(runtime, command)?;

    info!(generated = excuses.len(), "Generated excuses.");

    render(runtime, command, &excuses)
}

fn generate(runtime: &mut Runtime, command: &ExcuseCommand) -> Res<Vec<Excuse>> {
    let save_history = runtime.config.save_history;
    let count = command.count.max(1);

    match command.min_score {
        Some(min_score) => (0..count).map(|_| runtime.generate_with_min_score(&command.options, min_score, save_history)).collect(),
        None if count == 1 => Ok(vec![runtime.generate(&command.options, save_history)?]),
        None => runtime.generate_batch(count, &command.options, save_history),
    }
}

fn render(runtime: &Runtime, command: &ExcuseCommand, excuses: &[Excuse]) -> Res<String> {
    let formatter = Formatter::for_style(command.style, &runtime.config);

    if command.style == OutputStyle::Json {
        return Ok(formatter.format_many(excuses)?);
    }

    let mut rendered = Vec::with_capacity(excuses.len());

    for (index, excuse) in excuses.iter().enumerate() {
        let mut block = String::new();

        if excuses.len() > 1 {
            block.push_str(&format!("Excuse #{}\n\n", index + 1));
        }

        block.push_str(&formatter.format(excuse)?);

        if command.show_score {
            block.push_str(&format!("\n\n📊 Quality Score: {}/100 | Severity: {} | Category: {}", excuse.quality_score(), excuse.severity(), excuse.category()));
        }

        rendered.push(block);
    }

    Ok(rendered.join("\n\n"))
}

// Tests.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::base::{
        config::{Config, ConfigInner},
        types::ExcuseError,
    };

    fn runtime() -> Runtime {
        Runtime::new(Config {
            inner: Arc::new(ConfigInner { seed: Some(9), ..Default::default() }),
        })
        .unwrap()
    }

    #[test]
    fn test_single_plain_excuse() {
        let mut runtime = runtime();

        let output = handle_excuse(&mut runtime, &ExcuseCommand::default()).unwrap();

        assert!(output.contains("SYSTEM EXCUSE REPORT"));
        assert!(!output.contains("Excuse #1"));
        assert_eq!(runtime.history.len(), 1);
    }

    #[test]
    fn test_many_json_excuses_form_an_array() {
        let mut runtime = runtime();
        let command = ExcuseCommand {
            count: 3,
            style: OutputStyle::Json,
            ..Default::default()
        };

        let output = handle_excuse(&mut runtime, &command).unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();

        assert_eq!(value.as_array().unwrap().len(), 3);
    }

    #[test]
    fn test_numbered_blocks_and_scores() {
        let mut runtime = runtime();
        let command = ExcuseCommand {
            count: 2,
            style: OutputStyle::Tweet,
            show_score: true,
            min_score: Some(10),
            ..Default::default()
        };

        let output = handle_excuse(&mut runtime, &command).unwrap();

        assert!(output.starts_with("Excuse #1"));
        assert!(output.contains("Excuse #2"));
        assert_eq!(output.matches("📊 Quality Score:").count(), 2);
    }

    #[test]
    fn test_invalid_category_surfaces_typed_error() {
        let mut runtime = runtime();
        let command = ExcuseCommand {
            options: GenerateOptions::new().category("weather"),
            ..Default::default()
        };

        let err = handle_excuse(&mut runtime, &command).unwrap_err();
        assert!(matches!(err.downcast_ref::<ExcuseError>(), Some(ExcuseError::InvalidCategory { .. })));
    }
}
