use crate::Position;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("Position {0:?} is out of bounds")]
    OutOfBounds(Position),
    #[error("Malformed cell id {0:?}")]
    InvalidCellId(String),
    #[error("Board dimensions must be positive, got {rows}x{cols}")]
    InvalidDimensions { rows: u32, cols: u32 },
    #[error("Too many mines ({mines}) for board size {rows}x{cols}")]
    TooManyMines { rows: u32, cols: u32, mines: u32 },
    #[error("Unknown level {0:?}")]
    UnknownLevel(String),
    #[error("Cannot place {requested} mines, only {available} candidate cells")]
    NotEnoughCandidates { requested: u32, available: u32 },
}

pub type Result<T> = std::result::Result<T, GameError>;

/// Failure while handing a finished game to a score collaborator.
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("failed to write report: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),
}
