//! Library root for `cosmic-excuse`.
//!
//! Cosmic-excuse turns error messages into elaborate, pseudo-technical excuses:
//! - Classifies how bad an error looks (mild, medium, severe)
//! - Picks themed excuse phrases, biased by that severity
//! - Splices in Markov-chain technical jargon
//! - Scores, renders and optionally ranks the result
//!
//! The core lives in [`engine`]; banks, formatters, history and the leaderboard
//! sit behind the traits in [`service`], so each can be swapped or mocked.

pub mod base;
pub mod engine;
pub mod interaction;
pub mod prelude;
pub mod runtime;
pub mod service;

use base::{
    config::Config,
    types::{Excuse, Res},
};
use engine::composer::GenerateOptions;
use interaction::{Command, excuse::handle_excuse, leaderboard::handle_show_leaderboard};
use service::leaderboard::ExportFormat;
use tracing::info;

/// Public entry for the binary crate.
///
/// Builds the runtime from the config and executes one command, returning
/// the text to print.
pub fn run(config: Config, command: Command) -> Res<String> {
    info!("Starting cosmic-excuse ...");

    // Initialize the runtime.
    let mut runtime = runtime::Runtime::new(config)?;

    match command {
        Command::Excuse(command) => handle_excuse(&mut runtime, &command),
        Command::ShowLeaderboard => handle_show_leaderboard(&runtime, ExportFormat::Markdown),
    }
}

/// Generate a single excuse with the default configuration.
pub fn generate(error_message: &str, language: &str) -> Res<Excuse> {
    let mut runtime = runtime::Runtime::new(Config::default())?;

    runtime.generate(&GenerateOptions::new().error_message(error_message).language(language), false)
}
