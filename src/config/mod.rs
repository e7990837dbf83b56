//! Configuration for scrape runs
//!
//! This module provides the `ScrapeConfig` struct and its type-safe builder
//! for configuring browser sessions, resolver timing, pacing and lookups.

pub mod builder;
pub mod getters;
pub mod methods;
pub mod types;

pub use builder::{ScrapeConfigBuilder, WithArtifactDir, WithStartUrl};
pub use types::ScrapeConfig;
