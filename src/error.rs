use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Everything that can go wrong in the simulation core.
///
/// `OutOfBounds` is the only variant raised during normal play; the
/// others are precondition failures the frame driver treats as fatal.
#[derive(Debug, Error)]
pub enum GameError {
    #[error("tile ({x}, {y}) is outside of the room")]
    OutOfBounds { x: i32, y: i32 },

    #[error("corrupt room file: expected {expected} tiles, read {actual}")]
    CorruptRoomFile { expected: usize, actual: usize },

    #[error("corrupt room file: unknown tile value {0}")]
    InvalidTile(u8),

    #[error("could not {action} `{}`: {source}", .path.display())]
    FatalIo {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("room stream: {0}")]
    Io(#[from] io::Error),

    #[error("required resource unavailable: {0}")]
    FatalResource(String),

    #[error("invalid config: {0}")]
    Config(#[from] ron::error::SpannedError),
}

pub type Result<T> = std::result::Result<T, GameError>;
