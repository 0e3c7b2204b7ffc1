//! Storage layer for pipeline inputs and outputs
//!
//! This module wraps the SQLite database the pipeline reads from and
//! writes to, organized into logical components:
//! - `models`: SQL conversions and row mappers
//! - `schema`: Database connection, schema and table caches
//! - `queries`: Loaders, seed upserts and transactional writers

pub mod models;
pub mod queries;
pub mod schema;


pub use schema::{ProjectionDatabase, TableCaches};
