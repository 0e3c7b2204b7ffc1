//! Command implementations for the ffl-proj CLI

pub mod common;
pub mod project;
pub mod rankings;
pub mod train;
pub mod validate_ease;

#[cfg(test)]
mod tests;

pub use common::CommandContext;
