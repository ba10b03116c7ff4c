//! The algorithmic core: severity analysis, jargon synthesis and excuse composition.

pub mod analyzer;
pub mod composer;
pub mod markov;
