//! # Rendering Module
//!
//! Macroquad presentation of generated maps: a `RenderTarget` that draws
//! tile sprites as colored squares, and the interactive map viewer used by
//! the binary.

pub mod target;
pub mod viewer;

pub use target::*;
pub use viewer::*;
