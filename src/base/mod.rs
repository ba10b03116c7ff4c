//! Core components, types, and utilities for the excuse generator.
//!
//! This module contains fundamental building blocks used throughout the application:
//! - Configuration handling and environment variables.
//! - Static excuse banks and jargon corpus.
//! - Common types, errors and result handling.

pub mod banks;
pub mod config;
pub mod types;
