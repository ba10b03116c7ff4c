//! Runtime services and shared state for the excuse generator.

use tracing::{debug, instrument};

use crate::{
    base::{
        config::Config,
        types::{Excuse, Res, Void},
    },
    engine::composer::{ExcuseComposer, GenerateOptions},
    service::{data::DataLoader, history::HistoryStore, leaderboard::Leaderboard},
};

/// Runtime service context.
///
/// This struct holds the configuration, the data loader, the composer and the
/// stores generated excuses end up in.
pub struct Runtime {
    /// The configuration for the application.
    pub config: Config,
    /// The excuse banks.
    pub data: DataLoader,
    /// The generator.
    pub composer: ExcuseComposer,
    /// Excuses generated during this run.
    pub history: HistoryStore,
    /// The persistent leaderboard, when a path is configured.
    pub leaderboard: Option<Leaderboard>,
}

impl Runtime {
    /// Create a new runtime instance.
    #[instrument(skip_all)]
    pub fn new(config: Config) -> Res<Self> {
        // Initialize the data loader.
        let data = DataLoader::from_config(&config)?;

        Self::with_data(config, data)
    }

    /// Create a runtime over an existing data loader.
    pub fn with_data(config: Config, data: DataLoader) -> Res<Self> {
        let composer = ExcuseComposer::new(config.clone(), data.clone())?;

        // Open the leaderboard, if any.
        let leaderboard = config.leaderboard_path.as_ref().map(|path| Leaderboard::open(path, config.leaderboard_max_size));

        Ok(Self {
            config,
            data,
            composer,
            history: HistoryStore::memory(),
            leaderboard,
        })
    }

    /// Generate one excuse, recording it in the history when `save_history` is set.
    pub fn generate(&mut self, options: &GenerateOptions, save_history: bool) -> Res<Excuse> {
        let excuse = self.composer.generate(options)?;
        self.record(&excuse, save_history)?;

        Ok(excuse)
    }

    /// Generate up to `count` distinct excuses.
    pub fn generate_batch(&mut self, count: usize, options: &GenerateOptions, save_history: bool) -> Res<Vec<Excuse>> {
        let excuses = self.composer.generate_batch(count, options)?;

        for excuse in &excuses {
            self.record(excuse, save_history)?;
        }

        Ok(excuses)
    }

    /// Generate an excuse scoring at least `min_score`, within the configured attempt limit.
    pub fn generate_with_min_score(&mut self, options: &GenerateOptions, min_score: u8, save_history: bool) -> Res<Excuse> {
        let excuse = self.composer.generate_with_min_score(options, min_score, self.config.min_score_max_attempts)?;
        self.record(&excuse, save_history)?;

        Ok(excuse)
    }

    fn record(&mut self, excuse: &Excuse, save_history: bool) -> Void {
        if save_history {
            self.history.append(excuse.clone());
        }

        if let Some(leaderboard) = &mut self.leaderboard {
            leaderboard.add(excuse)?;
            debug!(entries = leaderboard.len(), "Recorded excuse on the leaderboard.");
        }

        Ok(())
    }
}

// Tests.
