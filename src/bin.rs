//! Binary entry point for `cosmic-excuse`.
//!
//! This module provides the command-line interface with options for the
//! error to excuse, language, category, output style and logging verbosity.
//! It loads the configuration, applies flag overrides, and prints the result.

use std::{path::PathBuf, sync::Arc};

use clap::Parser;
use cosmic_excuse::{
    base::{banks::BANNER, config::Config, types::Void},
    engine::composer::GenerateOptions,
    interaction::{Command, excuse::ExcuseCommand},
    service::format::OutputStyle,
};
use tracing_subscriber::{fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt};

/// Cosmic-excuse – elaborate excuses for software failures.
///
/// Configuration can come from `.cosmic-excuse.toml` or `COSMIC_EXCUSE_*`
/// environment variables; flags override both.
#[derive(Parser, Debug)]
#[command(version, author, about, long_about = None)]
struct Args {
    /// Override the config file path (optional).
    ///
    /// By default, the generator looks for `.cosmic-excuse.toml` in the
    /// current directory.
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Increase log verbosity (-v, -vv, etc.).
    ///
    /// Use multiple times to increase verbosity:
    /// - No flag: WARN level
    /// - -v: INFO level
    /// - -vv: DEBUG level
    /// - -vvv or more: TRACE level
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
    /// The error message to explain away.
    #[arg(short, long, default_value = "")]
    error: String,
    /// Language of the excuse.
    #[arg(short, long)]
    language: Option<String>,
    /// Number of excuses to generate.
    #[arg(short = 'n', long, default_value_t = 1)]
    count: usize,
    /// Force an excuse category.
    #[arg(long)]
    category: Option<String>,
    /// Output style.
    #[arg(long, value_enum, default_value_t = OutputStyle::Plain)]
    style: OutputStyle,
    /// Shorthand for `--style json`.
    #[arg(long, conflicts_with_all = ["style", "haiku"])]
    json: bool,
    /// Shorthand for `--style haiku`.
    #[arg(long, conflicts_with = "style")]
    haiku: bool,
    /// Print the quality score under each excuse.
    #[arg(long)]
    show_score: bool,
    /// Regenerate until each excuse reaches this quality score.
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=100))]
    min_score: Option<u8>,
    /// Seed the generator for reproducible output.
    #[arg(long)]
    seed: Option<u64>,
    /// Skip the banner.
    #[arg(long)]
    no_banner: bool,
    /// Record generated excuses on the leaderboard stored at this path.
    #[arg(long)]
    leaderboard: Option<PathBuf>,
    /// Print the leaderboard as Markdown and exit.
    #[arg(long)]
    show_leaderboard: bool,
}

impl Args {
    fn style(&self) -> OutputStyle {
        if self.json {
            OutputStyle::Json
        } else if self.haiku {
            OutputStyle::Haiku
        } else {
            self.style
        }
    }
}

/// Main entry point for the cosmic-excuse binary.
///
/// Sets up logging based on verbosity, loads configuration, and prints the excuses.
fn main() -> Void {
    let args = Args::parse();

    // Construct the level filter.

    let level = match args.verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    let level_filter = tracing_subscriber::filter::LevelFilter::from_level(level);

    // Prepare the log layer; stdout carries the excuses.

    let stderr = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .without_time()
        .with_ansi(true)
        .with_level(true)
        .with_file(false)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_span_events(FmtSpan::NEW | FmtSpan::CLOSE);

    tracing_subscriber::registry().with(level_filter).with(stderr).init();

    // Load the config and apply flag overrides.

    let config = Config::load(args.config.as_deref())?;

    let mut inner = (*config.inner).clone();
    if let Some(seed) = args.seed {
        inner.seed = Some(seed);
    }
    if let Some(path) = &args.leaderboard {
        inner.leaderboard_path = Some(path.clone());
    }
    let config = Config { inner: Arc::new(inner) };

    let style = args.style();

    if !args.no_banner && style != OutputStyle::Json {
        println!("{BANNER}");
    }

    let command = if args.show_leaderboard {
        Command::ShowLeaderboard
    } else {
        let mut options = GenerateOptions::new().error_message(args.error.clone());
        options.language = args.language.clone();
        options.category = args.category.clone();

        Command::Excuse(ExcuseCommand {
            options,
            count: args.count,
            style,
            show_score: args.show_score,
            min_score: args.min_score,
        })
    };

    let output = cosmic_excuse::run(config, command)?;
    println!("{output}");

    Ok(())
}
