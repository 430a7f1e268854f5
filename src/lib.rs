//! Simulation core for a side-scrolling room shooter.
//!
//! Everything in the library is pure game state plus the logic that advances
//! it.  Terminal I/O, the frame loop and the audio thread live in the binary
//! and talk to the core through `Intent`, `SampleMixer` and `Drawable`.

pub mod animat;
pub mod audio;
pub mod camera;
pub mod compute;
pub mod config;
pub mod entities;
pub mod error;
pub mod math;
pub mod projectiles;
pub mod render;
pub mod room;

pub use error::{GameError, Result};
