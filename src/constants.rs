//! Constants for board geometry, search parameters and host defaults.
//!
//! These are the defaults; a running game reads its values from
//! [`EngineConfig`](crate::config::EngineConfig), which starts from here.

// =============================================================================
// Board Geometry
// =============================================================================

/// Default board size (NxN).
pub const DEFAULT_DIMENSION: usize = 13;

/// Largest supported board size: columns are labelled `A` to `Z`.
pub const MAX_DIMENSION: usize = 26;

/// Number of stones in a row needed to win.
pub const WIN_LENGTH: usize = 5;

/// Number of players. The win check and the minimax bubbling assume two.
pub const NUM_PLAYERS: usize = 2;

/// Line orientations checked through the last move: horizontal, vertical and
/// both diagonals, as (row step, column step).
pub const LINE_DIRECTIONS: [(isize, isize); 4] = [(0, 1), (1, 0), (1, 1), (1, -1)];

// =============================================================================
// MCTS Parameters
// =============================================================================

/// UCT exploration constant.
pub const EXPLORATION: f64 = std::f64::consts::SQRT_2;

/// Chebyshev distance from existing stones within which moves are searched.
pub const CLOSEBY_DISTANCE: usize = 1;

/// Closeby distance used once the game passes `closeby_move_limit` moves.
pub const RAISED_CLOSEBY_DISTANCE: usize = 2;

// =============================================================================
// Host Defaults
// =============================================================================

/// Base number of iterations for an engine move.
pub const N_ITERATIONS: usize = 3000;

/// Number of chunks a move's iteration budget is split into for progress
/// reporting.
pub const PROGRESS_CHUNKS: usize = 100;

/// Number of iterations per move in the demo game.
pub const DEMO_ITERATIONS: usize = 400;

/// Board size used by the demo game.
pub const DEMO_DIMENSION: usize = 9;

// =============================================================================
// Stone Marks
// =============================================================================

/// Mark of the first player.
pub const MARK_BLACK: char = 'X';

/// Mark of the second player.
pub const MARK_WHITE: char = 'O';

/// Empty point.
pub const MARK_EMPTY: char = '.';
