//! Collaborators of the excuse engine.
//!
//! This module contains the seams around the core generator:
//! - Data loading (embedded or on-disk JSON banks)
//! - Output formatting (plain, markdown, JSON, tweet, haiku)
//! - History and leaderboard storage
//!
//! Each service module defines both generic traits and concrete implementations,
//! allowing for extensibility and easy testing.

pub mod data;
pub mod format;
pub mod history;
pub mod leaderboard;
