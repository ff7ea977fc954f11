//! Constants for board geometry, game defaults and cursor execution.
//!
//! Board size is chosen at runtime; everything here is a default or a bound.

// =============================================================================
// Board Geometry
// =============================================================================

/// Default board size (NxN).
pub const DEFAULT_BOARD_SIZE: usize = 19;

/// Smallest supported board.
pub const MIN_BOARD_SIZE: usize = 2;

/// Largest supported board (A..Z without I gives 25 columns).
pub const MAX_BOARD_SIZE: usize = 25;

/// Column letters used in GTP vertices. `I` is skipped by convention.
pub const COLUMN_LETTERS: &[u8; 25] = b"ABCDEFGHJKLMNOPQRSTUVWXYZ";

// =============================================================================
// Game Defaults
// =============================================================================

/// Default komi (compensation points for White).
pub const DEFAULT_KOMI: f32 = 7.5;

/// Largest handicap that has standard star points.
pub const MAX_HANDICAP: usize = 9;

/// Consecutive passes that end the game.
pub const PASSES_TO_END_GAME: usize = 2;

// =============================================================================
// Board Position Cursor
// =============================================================================

/// Largest jump that is executed inline. Bigger jumps are chunked.
pub const SYNCHRONOUS_THRESHOLD: usize = 10;

/// Upper bound on the number of progress steps for a chunked jump.
pub const MAX_PROGRESS_STEPS: usize = 5;

// =============================================================================
// Engine Protocol
// =============================================================================

/// Literal used for a pass inside `gogui-play_sequence`.
pub const PASS_VERTEX: &str = "PASS";

/// Token returned by `genmove` when the engine gives up.
pub const RESIGN_TOKEN: &str = "resign";

/// Name reported by the built-in engine.
pub const ENGINE_NAME: &str = "goban-sync";
