//! Core utilities shared across the application
//!
//! - `cache`: read-through LRU cache for loaded tables
//! - `config`: pipeline configuration and its resolution order

pub mod cache;
pub mod config;

// Re-export commonly used items for convenience
pub use cache::{CacheKey, TableCache, TableKey};
pub use config::{ConfigOverrides, PipelineConfig, ResidualScope};
