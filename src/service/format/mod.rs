pub mod haiku;
pub mod json;
pub mod markdown;
pub mod plain;
pub mod tweet;

use std::{fmt, ops::Deref, sync::Arc};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::base::{
    config::Config,
    types::{Excuse, ExcuseResult},
};

// Types.

/// Output styles offered by the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputStyle {
    #[default]
    Plain,
    Markdown,
    Json,
    Tweet,
    Haiku,
}

impl OutputStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputStyle::Plain => "plain",
            OutputStyle::Markdown => "markdown",
            OutputStyle::Json => "json",
            OutputStyle::Tweet => "tweet",
            OutputStyle::Haiku => "haiku",
        }
    }
}

impl fmt::Display for OutputStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// Traits.

/// Generic formatter trait that output styles must implement.
///
/// Formatters are pure: the same excuse always renders to the same string.
pub trait GenericFormatter: Send + Sync + 'static {
    /// Render one excuse.
    fn format(&self, excuse: &Excuse) -> ExcuseResult<String>;

    /// Render several excuses, separated by a blank line unless the style says otherwise.
    fn format_many(&self, excuses: &[Excuse]) -> ExcuseResult<String> {
        let rendered = excuses.iter().map(|excuse| self.format(excuse)).collect::<ExcuseResult<Vec<_>>>()?;

        Ok(rendered.join("\n\n"))
    }
}

// Structs.

/// Formatter for the application.
///
/// It is designed to be trivially cloneable, allowing it to be passed around
/// without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct Formatter {
    inner: Arc<dyn GenericFormatter>,
}

impl Deref for Formatter {
    type Target = dyn GenericFormatter;

    fn deref(&self) -> &Self::Target {
        &*self.inner
    }
}

impl Formatter {
    pub fn new(inner: Arc<dyn GenericFormatter>) -> Self {
        Self { inner }
    }

    /// The formatter for a style, sized by the config.
    pub fn for_style(style: OutputStyle, config: &Config) -> Self {
        match style {
            OutputStyle::Plain => Self::new(Arc::new(plain::PlainFormatter::new(config.plain_width))),
            OutputStyle::Markdown => Self::new(Arc::new(markdown::MarkdownFormatter)),
            OutputStyle::Json => Self::new(Arc::new(json::JsonFormatter)),
            OutputStyle::Tweet => Self::new(Arc::new(tweet::TweetFormatter::new(config.tweet_max_chars))),
            OutputStyle::Haiku => Self::new(Arc::new(haiku::HaikuFormatter)),
        }
    }
}


// Tests.
