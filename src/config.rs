//! User preferences and new-game parameters.

use crate::board::Color;
use crate::constants::{DEFAULT_BOARD_SIZE, DEFAULT_KOMI, MAX_PROGRESS_STEPS, SYNCHRONOUS_THRESHOLD};

/// What happens to the positions after the cursor when a move is played
/// somewhere other than the last board position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NewMoveInsertPolicy {
    /// Drop every node after the cursor, then append.
    #[default]
    ReplaceFutureBoardPositions,
    /// Keep the existing continuation as a sibling branch and switch the
    /// current variation to the new move.
    CreateNewVariation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerKind {
    Human,
    Computer,
}

#[derive(Debug, Clone)]
pub struct Preferences {
    /// Undoing a computer reply also removes the human move it answered.
    pub discard_my_last_move: bool,
    pub new_move_insert_policy: NewMoveInsertPolicy,
    /// Largest jump executed inline.
    pub synchronous_threshold: usize,
    /// Upper bound on progress steps for a chunked jump.
    pub max_progress_steps: usize,
    /// Automatically ask the engine for a move when it is a computer's turn.
    pub auto_continue_computer: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            discard_my_last_move: true,
            new_move_insert_policy: NewMoveInsertPolicy::default(),
            synchronous_threshold: SYNCHRONOUS_THRESHOLD,
            max_progress_steps: MAX_PROGRESS_STEPS,
            auto_continue_computer: true,
        }
    }
}

/// Parameters for a new game.
#[derive(Debug, Clone)]
pub struct GameSetup {
    pub board_size: usize,
    pub komi: f32,
    /// Number of fixed handicap stones (0 or 2..=9).
    pub handicap: usize,
    pub black: PlayerKind,
    pub white: PlayerKind,
}

impl Default for GameSetup {
    fn default() -> Self {
        Self {
            board_size: DEFAULT_BOARD_SIZE,
            komi: DEFAULT_KOMI,
            handicap: 0,
            black: PlayerKind::Human,
            white: PlayerKind::Computer,
        }
    }
}

impl GameSetup {
    pub fn player(&self, color: Color) -> PlayerKind {
        match color {
            Color::Black => self.black,
            Color::White => self.white,
        }
    }

    pub fn human_vs_human(board_size: usize) -> Self {
        Self {
            board_size,
            black: PlayerKind::Human,
            white: PlayerKind::Human,
            ..Self::default()
        }
    }
}
