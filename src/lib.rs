//! # Garrison
//!
//! Procedural tactical maps and a garrison raid campaign loop.
//!
//! ## Architecture Overview
//!
//! - **Generation**: noise primitives and seven map generators behind a
//!   name-keyed registry, plus the garrison floor graph builder
//! - **Map**: the tile grid, field of view, A* pathfinding and the tile renderer
//! - **Squads**: unit templates and the squad service the raid core talks to
//! - **Combat**: the shared combat start/resolution pipeline and rewards
//! - **Raid**: floor graphs, garrison squads, alert escalation, recovery,
//!   deployment and the `RaidRunner` state machine
//! - **Difficulty**: difficulty presets and their derived multipliers
//!
//! All game state lives in an `EntityManager` owned by the caller. Services
//! are handed their configuration at construction time; there are no globals.

pub mod combat;
pub mod difficulty;
pub mod game;
pub mod generation;
pub mod map;
pub mod raid;
pub mod rendering;
pub mod squads;

pub use combat::*;
pub use difficulty::*;
pub use game::*;
pub use generation::*;
pub use map::*;
pub use raid::*;
pub use squads::*;

pub use rendering::{MacroquadTarget, MapViewer, ViewerCommand};

/// Core error type for the garrison engine.
#[derive(thiserror::Error, Debug)]
pub enum GarrisonError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Configuration file is malformed or inconsistent
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Game state is invalid
    #[error("{0}")]
    InvalidState(String),

    /// Action cannot be performed
    #[error("{0}")]
    InvalidAction(String),

    /// Entity, room or template lookup failed
    #[error("{0}")]
    NotFound(String),

    /// Generation failed
    #[error("Generation failed: {0}")]
    GenerationFailed(String),
}

/// Result type used throughout the garrison codebase.
pub type GarrisonResult<T> = Result<T, GarrisonError>;

/// Version information for the crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine-wide constants.
pub mod config {
    /// Default map width in tiles
    pub const DEFAULT_MAP_WIDTH: i32 = 100;

    /// Default map height in tiles
    pub const DEFAULT_MAP_HEIGHT: i32 = 80;

    /// Default field of view radius in tiles
    pub const DEFAULT_FOV_RADIUS: i32 = 8;

    /// Default viewport edge length in tiles when rendering around a point
    pub const DEFAULT_VIEWPORT_SIZE: i32 = 30;
}
