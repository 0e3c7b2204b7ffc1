//! Error types for the fantasy projection pipeline

use thiserror::Error;

use crate::cli::types::{PlayerId, Position};


pub type Result<T> = std::result::Result<T, ProjError>;

#[derive(Error, Debug)]
pub enum ProjError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse number: {0}")]
    InvalidNumber(#[from] std::num::ParseIntError),

    #[error("Table {table} is missing required column {column}")]
    MissingColumn { table: String, column: String },

    #[error("Missing feature {feature} for {position} player {player_id}")]
    MissingFeature {
        position: Position,
        player_id: PlayerId,
        feature: String,
    },

    #[error("Not enough training rows for {position}: {rows} available, {required} required")]
    InsufficientTrainingData {
        position: Position,
        rows: usize,
        required: usize,
    },

    #[error("Regression failed for {position}: {message}")]
    Regression { position: Position, message: String },

    #[error("Invalid position: {position}")]
    InvalidPosition { position: String },

    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error("Could not determine {kind} directory")]
    NoHomeDirectory { kind: String },
}
