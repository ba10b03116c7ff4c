use std::{
    ops::Deref,
    sync::{Arc, Mutex, PoisonError},
};

use serde_json::json;

use crate::base::types::{Excuse, ExcuseError, ExcuseResult};

// Traits.

/// Generic append-only store of generated excuses.
pub trait GenericHistoryStore: Send + Sync + 'static {
    /// Record an excuse at the end of the history.
    fn append(&self, excuse: Excuse);

    /// Every recorded excuse, oldest first.
    fn entries(&self) -> Vec<Excuse>;

    /// Forget everything.
    fn clear(&self);
}

// Structs.

/// In-process history guarded by a mutex.
#[derive(Debug, Default)]
pub struct MemoryHistoryStore {
    entries: Mutex<Vec<Excuse>>,
}

impl GenericHistoryStore for MemoryHistoryStore {
    fn append(&self, excuse: Excuse) {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).push(excuse);
    }

    fn entries(&self) -> Vec<Excuse> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn clear(&self) {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }
}

/// History store for the application.
///
/// It is designed to be trivially cloneable, allowing it to be passed around
/// without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct HistoryStore {
    inner: Arc<dyn GenericHistoryStore>,
}

impl Deref for HistoryStore {
    type Target = dyn GenericHistoryStore;

    fn deref(&self) -> &Self::Target {
        &*self.inner
    }
}

impl Default for HistoryStore {
    fn default() -> Self {
        Self::memory()
    }
}

impl HistoryStore {
    pub fn new(inner: Arc<dyn GenericHistoryStore>) -> Self {
        Self { inner }
    }

    pub fn memory() -> Self {
        Self::new(Arc::new(MemoryHistoryStore::default()))
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The highest-scoring excuse; the earliest wins ties.
    pub fn best(&self) -> Option<Excuse> {
        self.entries().into_iter().reduce(|best, next| if next.quality_score() > best.quality_score() { next } else { best })
    }

    /// The history as a pretty JSON array.
    pub fn export_json(&self) -> ExcuseResult<String> {
        let items: Vec<_> = self
            .entries()
            .iter()
            .map(|excuse| {
                json!({
                    "text": excuse.text(),
                    "recommendation": excuse.recommendation(),
                    "severity": excuse.severity(),
                    "category": excuse.category(),
                    "quality_score": excuse.quality_score(),
                    "timestamp": excuse.unix_timestamp(),
                    "language": excuse.language(),
                })
            })
            .collect();

        serde_json::to_string_pretty(&items).map_err(|e| ExcuseError::Format(e.to_string()))
    }

    /// The history as numbered text blocks.
    pub fn export_text(&self) -> String {
        self.entries()
            .iter()
            .enumerate()
            .map(|(index, excuse)| format!("Excuse #{} (Score: {}/100):\n{}\nRecommendation: {}", index + 1, excuse.quality_score(), excuse.text(), excuse.recommendation()))
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

// Tests.
