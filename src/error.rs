//! Error types for the game model, the engine link and the command layer.

use thiserror::Error;

use crate::board::Point;
use crate::tree::NodeId;

/// Reasons a stone cannot be placed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MoveError {
    #[error("illegal move: point not empty")]
    Occupied,

    #[error("illegal move: retakes ko")]
    Ko,

    #[error("illegal move: suicide")]
    Suicide,

    #[error("illegal move: point is off the board")]
    OffBoard,
}

/// Failures talking to the engine.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("engine rejected '{command}': {reason}")]
    Rejected { command: String, reason: String },

    #[error("malformed engine response: {0}")]
    Malformed(String),

    #[error("engine returned vertex '{vertex}' that is not on the board")]
    UnparseableVertex { vertex: String },

    #[error("engine is not connected")]
    Disconnected,

    #[error("failed to {operation}: {source}")]
    Io {
        operation: String,
        #[source]
        source: std::io::Error,
    },
}

impl EngineError {
    pub fn io(operation: impl Into<String>, source: std::io::Error) -> Self {
        EngineError::Io {
            operation: operation.into(),
            source,
        }
    }
}

/// Model-level failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("board position {requested} is out of range (0..{count})")]
    InvalidBoardPosition { requested: usize, count: usize },

    #[error("game has ended")]
    GameEnded,

    #[error("cannot play after a resignation")]
    ResignedPosition,

    #[error("{mv} at {point:?}: {source}")]
    IllegalMove {
        mv: String,
        point: Point,
        #[source]
        source: MoveError,
    },

    #[error("setup can only be changed at board position 0")]
    SetupNotAtStart,

    #[error("{0:?} is no longer part of the game tree")]
    DiscardedNode(NodeId),

    #[error("no move to undo")]
    NothingToUndo,

    #[error("handicap {0} is not supported on this board")]
    InvalidHandicap(usize),

    #[error("board size {0} is not supported")]
    InvalidBoardSize(usize),
}

/// Errors returned by commands.
#[derive(Error, Debug)]
pub enum CommandError {
    #[error("another command is still in progress")]
    Busy,

    #[error(transparent)]
    Game(#[from] GameError),

    #[error(transparent)]
    Engine(#[from] EngineError),
}

pub type Result<T, E = CommandError> = std::result::Result<T, E>;
