//! Ranked, optionally persistent collection of excuses.
//!
//! Entries carry vote counters on top of the excuse fields. When a path is
//! set, every mutation is written back to a JSON file.

use std::{
    cmp::Ordering,
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::{base::types::Metadata, prelude::*};

// Types.

/// One ranked excuse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub excuse_text: String,
    pub quality_score: u8,
    pub severity: Severity,
    pub category: String,
    pub language: String,
    /// Seconds since the Unix epoch.
    pub timestamp: f64,
    #[serde(default)]
    pub upvotes: u32,
    #[serde(default)]
    pub downvotes: u32,
    #[serde(default)]
    pub metadata: Metadata,
}

impl LeaderboardEntry {
    pub fn from_excuse(excuse: &Excuse) -> Self {
        Self {
            excuse_text: excuse.text().to_string(),
            quality_score: excuse.quality_score(),
            severity: excuse.severity(),
            category: excuse.category().to_string(),
            language: excuse.language().to_string(),
            timestamp: excuse.unix_timestamp(),
            upvotes: 0,
            downvotes: 0,
            metadata: excuse.metadata().clone(),
        }
    }

    pub fn net_votes(&self) -> i64 {
        i64::from(self.upvotes) - i64::from(self.downvotes)
    }

    /// High when votes are split evenly and plentiful.
    pub fn controversy_score(&self) -> f64 {
        let total = self.upvotes + self.downvotes;
        if total == 0 {
            return 0.0;
        }

        let ratio = f64::from(self.upvotes.min(self.downvotes)) / f64::from(self.upvotes.max(self.downvotes).max(1));
        ratio * f64::from(total)
    }
}

/// Export formats of [`Leaderboard::export`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
    Markdown,
}

impl FromStr for ExportFormat {
    type Err = ExcuseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            "markdown" | "md" => Ok(ExportFormat::Markdown),
            other => Err(ExcuseError::Format(format!("Unsupported export format: {other}"))),
        }
    }
}

/// Aggregate view of the leaderboard.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LeaderboardStats {
    pub total_excuses: usize,
    pub average_quality: f64,
    pub categories: BTreeMap<String, usize>,
    pub severities: BTreeMap<String, usize>,
    pub languages: BTreeMap<String, usize>,
    pub best_excuse: Option<String>,
    pub best_score: Option<u8>,
    pub worst_excuse: Option<String>,
    pub worst_score: Option<u8>,
    pub total_upvotes: u64,
    pub total_downvotes: u64,
}

/// On-disk layout.
#[derive(Debug, Serialize, Deserialize)]
struct LeaderboardFile {
    entries: Vec<LeaderboardEntry>,
    #[serde(default)]
    max_size: Option<usize>,
    #[serde(default)]
    timestamp: f64,
}

// Leaderboard.

#[derive(Debug, Clone)]
pub struct Leaderboard {
    entries: Vec<LeaderboardEntry>,
    max_size: usize,
    path: Option<PathBuf>,
}

impl Leaderboard {
    /// An in-memory leaderboard.
    pub fn new(max_size: usize) -> Self {
        Self {
            entries: Vec::new(),
            max_size: max_size.max(1),
            path: None,
        }
    }

    /// A leaderboard persisted at `path`, loaded if the file exists.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>, max_size: usize) -> Self {
        let mut leaderboard = Self::new(max_size);
        leaderboard.path = Some(path.as_ref().to_path_buf());
        leaderboard.load();
        leaderboard
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn entries(&self) -> &[LeaderboardEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Record an excuse, keeping only the best `max_size` entries.
    pub fn add(&mut self, excuse: &Excuse) -> Res<LeaderboardEntry> {
        let entry = LeaderboardEntry::from_excuse(excuse);
        self.add_entry(entry.clone())?;
        Ok(entry)
    }

    pub fn add_entry(&mut self, entry: LeaderboardEntry) -> Void {
        self.entries.push(entry);

        if self.entries.len() > self.max_size {
            self.entries.sort_by(|a, b| b.quality_score.cmp(&a.quality_score));
            self.entries.truncate(self.max_size);
        }

        self.save()
    }

    /// Vote on the first entry with this text. Returns whether one was found.
    pub fn vote(&mut self, excuse_text: &str, upvote: bool) -> Res<bool> {
        let Some(entry) = self.entries.iter_mut().find(|e| e.excuse_text == excuse_text) else {
            return Ok(false);
        };

        if upvote {
            entry.upvotes += 1;
        } else {
            entry.downvotes += 1;
        }

        self.save()?;
        Ok(true)
    }

    pub fn top_by_quality(&self, n: usize) -> Vec<&LeaderboardEntry> {
        self.ranked(n, |a, b| b.quality_score.cmp(&a.quality_score))
    }

    pub fn top_by_votes(&self, n: usize) -> Vec<&LeaderboardEntry> {
        self.ranked(n, |a, b| b.net_votes().cmp(&a.net_votes()))
    }

    pub fn most_controversial(&self, n: usize) -> Vec<&LeaderboardEntry> {
        self.ranked(n, |a, b| b.controversy_score().total_cmp(&a.controversy_score()))
    }

    pub fn recent(&self, n: usize) -> Vec<&LeaderboardEntry> {
        self.ranked(n, |a, b| b.timestamp.total_cmp(&a.timestamp))
    }

    pub fn by_category(&self, category: &str, n: usize) -> Vec<&LeaderboardEntry> {
        let mut matching: Vec<_> = self.entries.iter().filter(|e| e.category == category).collect();
        matching.sort_by(|a, b| b.quality_score.cmp(&a.quality_score));
        matching.truncate(n);
        matching
    }

    pub fn by_severity(&self, severity: Severity, n: usize) -> Vec<&LeaderboardEntry> {
        let mut matching: Vec<_> = self.entries.iter().filter(|e| e.severity == severity).collect();
        matching.sort_by(|a, b| b.quality_score.cmp(&a.quality_score));
        matching.truncate(n);
        matching
    }

    /// Stable sort by `compare`, then the first `n`.
    fn ranked(&self, n: usize, compare: impl Fn(&LeaderboardEntry, &LeaderboardEntry) -> Ordering) -> Vec<&LeaderboardEntry> {
        let mut sorted: Vec<_> = self.entries.iter().collect();
        sorted.sort_by(|a, b| compare(a, b));
        sorted.truncate(n);
        sorted
    }

    pub fn stats(&self) -> LeaderboardStats {
        if self.entries.is_empty() {
            return LeaderboardStats::default();
        }

        let mut stats = LeaderboardStats {
            total_excuses: self.entries.len(),
            ..Default::default()
        };

        let mut quality_sum = 0u64;
        let mut best: Option<&LeaderboardEntry> = None;
        let mut worst: Option<&LeaderboardEntry> = None;

        for entry in &self.entries {
            quality_sum += u64::from(entry.quality_score);
            stats.total_upvotes += u64::from(entry.upvotes);
            stats.total_downvotes += u64::from(entry.downvotes);

            *stats.categories.entry(entry.category.clone()).or_insert(0) += 1;
            *stats.severities.entry(entry.severity.to_string()).or_insert(0) += 1;
            *stats.languages.entry(entry.language.clone()).or_insert(0) += 1;

            if best.is_none_or(|b| entry.quality_score > b.quality_score) {
                best = Some(entry);
            }
            if worst.is_none_or(|w| entry.quality_score < w.quality_score) {
                worst = Some(entry);
            }
        }

        stats.average_quality = quality_sum as f64 / self.entries.len() as f64;
        stats.best_excuse = best.map(|e| e.excuse_text.clone());
        stats.best_score = best.map(|e| e.quality_score);
        stats.worst_excuse = worst.map(|e| e.excuse_text.clone());
        stats.worst_score = worst.map(|e| e.quality_score);

        stats
    }

    pub fn clear(&mut self) -> Void {
        self.entries.clear();
        self.save()
    }

    /// Write the entries to the backing file, if any.
    #[instrument(skip(self))]
    pub fn save(&self) -> Void {
        let Some(path) = &self.path else {
            return Ok(());
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| anyhow!("Cannot create {}: {e}", parent.display()))?;
        }

        let file = LeaderboardFile {
            entries: self.entries.clone(),
            max_size: Some(self.max_size),
            timestamp: Utc::now().timestamp_millis() as f64 / 1000.0,
        };

        let json = serde_json::to_string_pretty(&file)?;
        fs::write(path, json).map_err(|e| anyhow!("Cannot write leaderboard {}: {e}", path.display()))?;

        debug!(entries = self.entries.len(), "Saved leaderboard.");

        Ok(())
    }

    /// Replace the entries with the backing file's; a corrupt file starts fresh.
    pub fn load(&mut self) {
        let Some(path) = &self.path else {
            return;
        };

        if !path.exists() {
            return;
        }

        let loaded = fs::read_to_string(path)
            .map_err(|e| anyhow!("{e}"))
            .and_then(|raw| serde_json::from_str::<LeaderboardFile>(&raw).map_err(|e| anyhow!("{e}")));

        match loaded {
            Ok(file) => {
                self.entries = file.entries;
                self.entries.truncate(self.max_size);
                debug!(entries = self.entries.len(), "Loaded leaderboard.");
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Leaderboard file is unreadable; starting fresh.");
                self.entries.clear();
            }
        }
    }

    /// Render the leaderboard as JSON, CSV or Markdown.
    pub fn export(&self, format: ExportFormat) -> Res<String> {
        match format {
            ExportFormat::Json => Ok(serde_json::to_string_pretty(&self.entries)?),
            ExportFormat::Csv => self.export_csv(),
            ExportFormat::Markdown => Ok(self.export_markdown()),
        }
    }

    fn export_csv(&self) -> Res<String> {
        let mut writer = csv::Writer::from_writer(Vec::new());

        writer.write_record(["Excuse", "Score", "Severity", "Category", "Language", "Upvotes", "Downvotes", "Timestamp"])?;

        for entry in &self.entries {
            writer.write_record([
                entry.excuse_text.clone(),
                entry.quality_score.to_string(),
                entry.severity.to_string(),
                entry.category.clone(),
                entry.language.clone(),
                entry.upvotes.to_string(),
                entry.downvotes.to_string(),
                entry.timestamp.to_string(),
            ])?;
        }

        let bytes = writer.into_inner().map_err(|e| anyhow!("Cannot finish CSV export: {e}"))?;
        Ok(String::from_utf8(bytes)?)
    }

    fn export_markdown(&self) -> String {
        let mut lines = vec!["# Excuse Leaderboard\n".to_string(), "## Top by Quality Score\n".to_string()];

        for (rank, entry) in self.top_by_quality(5).into_iter().enumerate() {
            lines.push(format!("{}. **Score {}**: {}", rank + 1, entry.quality_score, entry.excuse_text));
        }

        lines.push("\n## Top by Votes\n".to_string());
        for (rank, entry) in self.top_by_votes(5).into_iter().enumerate() {
            lines.push(format!("{}. **{:+}**: {}", rank + 1, entry.net_votes(), entry.excuse_text));
        }

        let stats = self.stats();
        lines.push("\n## Statistics\n".to_string());
        lines.push(format!("- Total Excuses: {}", stats.total_excuses));
        lines.push(format!("- Average Quality: {:.1}", stats.average_quality));

        lines.join("\n")
    }
}

// Tests.

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(text: &str, score: u8, category: &str, timestamp: f64) -> LeaderboardEntry {
        LeaderboardEntry {
            excuse_text: text.to_string(),
            quality_score: score,
            severity: Severity::Medium,
            category: category.to_string(),
            language: "en".to_string(),
            timestamp,
            upvotes: 0,
            downvotes: 0,
            metadata: Metadata::new(),
        }
    }

    fn board() -> Leaderboard {
        let mut board = Leaderboard::new(10);
        board.add_entry(entry("solar flare", 60, "cosmic", 1.0)).unwrap();
        board.add_entry(entry("qubit flip", 90, "quantum", 2.0)).unwrap();
        board.add_entry(entry("blame intern", 40, "blame", 3.0)).unwrap();
        board
    }

    #[test]
    fn test_rankings() {
        let board = board();

        let quality: Vec<_> = board.top_by_quality(2).iter().map(|e| e.excuse_text.as_str()).collect();
        assert_eq!(quality, vec!["qubit flip", "solar flare"]);

        let recent: Vec<_> = board.recent(1).iter().map(|e| e.excuse_text.as_str()).collect();
        assert_eq!(recent, vec!["blame intern"]);

        assert_eq!(board.by_category("quantum", 10).len(), 1);
        assert_eq!(board.by_severity(Severity::Medium, 10).len(), 3);
        assert!(board.by_severity(Severity::Severe, 10).is_empty());
    }

    #[test]
    fn test_votes_and_controversy() {
        let mut board = board();

        assert!(board.vote("solar flare", true).unwrap());
        assert!(board.vote("solar flare", true).unwrap());
        assert!(board.vote("blame intern", true).unwrap());
        assert!(board.vote("blame intern", false).unwrap());
        assert!(!board.vote("nothing here", true).unwrap());

        assert_eq!(board.top_by_votes(1)[0].excuse_text, "solar flare");
        assert_eq!(board.top_by_votes(1)[0].net_votes(), 2);

        let controversial = board.most_controversial(1)[0];
        assert_eq!(controversial.excuse_text, "blame intern");
        assert_eq!(controversial.controversy_score(), 2.0);
    }

    #[test]
    fn test_overflow_keeps_best_scores() {
        let mut board = Leaderboard::new(2);
        board.add_entry(entry("low", 10, "cosmic", 1.0)).unwrap();
        board.add_entry(entry("high", 90, "cosmic", 2.0)).unwrap();
        board.add_entry(entry("mid", 50, "cosmic", 3.0)).unwrap();

        let texts: Vec<_> = board.entries().iter().map(|e| e.excuse_text.as_str()).collect();
        assert_eq!(texts, vec!["high", "mid"]);
    }

    #[test]
    fn test_stats() {
        let stats = board().stats();

        assert_eq!(stats.total_excuses, 3);
        assert!((stats.average_quality - 63.333).abs() < 0.01);
        assert_eq!(stats.best_excuse.as_deref(), Some("qubit flip"));
        assert_eq!(stats.worst_score, Some(40));
        assert_eq!(stats.categories.get("cosmic"), Some(&1));
        assert_eq!(stats.severities.get("medium"), Some(&3));

        assert_eq!(Leaderboard::new(5).stats(), LeaderboardStats::default());
    }

    #[test]
    fn test_exports() {
        let board = board();

        let csv = board.export(ExportFormat::Csv).unwrap();
        assert!(csv.starts_with("Excuse,Score,Severity,Category,Language,Upvotes,Downvotes,Timestamp\n"));
        assert!(csv.contains("qubit flip,90,medium,quantum,en,0,0,2"));

        let markdown = board.export(ExportFormat::Markdown).unwrap();
        assert!(markdown.starts_with("# Excuse Leaderboard"));
        assert!(markdown.contains("1. **Score 90**: qubit flip"));
        assert!(markdown.contains("- Average Quality: 63.3"));

        let json: serde_json::Value = serde_json::from_str(&board.export(ExportFormat::Json).unwrap()).unwrap();
        assert_eq!(json.as_array().unwrap().len(), 3);

        assert!("yaml".parse::<ExportFormat>().is_err());
        assert_eq!("MD".parse::<ExportFormat>().unwrap(), ExportFormat::Markdown);
    }

    #[test]
    fn test_persistence_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("leaderboard.json");

        let mut board = Leaderboard::open(&path, 10);
        board.add_entry(entry("persisted", 77, "ai", 5.0)).unwrap();
        board.vote("persisted", true).unwrap();

        let reopened = Leaderboard::open(&path, 10);
        assert_eq!(reopened.entries(), board.entries());
        assert_eq!(reopened.entries()[0].upvotes, 1);
    }

    #[test]
    fn test_corrupt_file_starts_fresh() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("leaderboard.json");
        fs::write(&path, "{ definitely not json").unwrap();

        let board = Leaderboard::open(&path, 10);
        assert!(board.is_empty());
    }
}
