//! Request handling for the excuse generator.
//!
//! This module maps user requests onto the runtime:
//! - Generating and rendering excuses
//! - Showing the leaderboard

pub mod excuse;
pub mod leaderboard;

use excuse::ExcuseCommand;

/// What the caller asked for.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Generate and render excuses.
    Excuse(ExcuseCommand),
    /// Render the leaderboard as Markdown.
    ShowLeaderboard,
}
