//! Type-safe wrappers and enums shared by the CLI and the pipeline.

pub mod ids;
pub mod position;
pub mod time;

pub use ids::PlayerId;
pub use position::Position;
pub use time::Week;
