use crate::{prelude::*, runtime::Runtime, service::leaderboard::ExportFormat};

/// Render the configured leaderboard.
#[instrument(skip(runtime))]
pub fn handle_show_leaderboard(runtime: &Runtime, format: ExportFormat) -> Res<String> {
    let leaderboard = runtime
        .leaderboard
        .as_ref()
        .ok_or_else(|| anyhow!("No leaderboard configured. Pass `--leaderboard <path>` or set `leaderboard_path`."))?;

    leaderboard.export(format)
}

// Tests.
