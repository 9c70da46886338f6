//! Error types for the engine.

use thiserror::Error;

use crate::board::Outcome;

/// Why a move could not be applied to a board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MoveError {
    #[error("point not empty")]
    Occupied,
    #[error("point off the board")]
    OffBoard,
}

/// Main error type for the engine.
///
/// Every variant is a caller-contract violation; none of them is retried.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("illegal move {index}: {reason}")]
    IllegalMove { index: usize, reason: MoveError },

    #[error("game already over: {result}")]
    GameEnded { result: Outcome },

    #[error("no legal moves available")]
    EmptyMoveSet,

    #[error("a node is already stored for this board")]
    DuplicateNode,

    #[error("unsupported player count {0}: only two-player games are supported")]
    UnsupportedPlayers(usize),

    #[error("invalid board dimension {0}")]
    InvalidDimension(usize),

    #[error("row {row} has {found} points, expected {expected}")]
    RowLength {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("unknown mark {mark:?} in row {row}")]
    UnknownMark { row: usize, mark: char },
}
