//! Constants for board dimensions, search parameters, and record layout.
//!
//! The board is a flat array of `SIDE_LENGTH * SIDE_LENGTH` cells. Unlike a
//! padded layout there are no sentinel cells around the edge: edge clipping is
//! handled by the precomputed neighbor table in [`crate::board`].
//!
//! # Board Size Configuration
//!
//! The board size is controlled by Cargo features:
//! - `board5x5` (default): 5x5 board
//! - `board7x7`: 7x7 board
//! - `board9x9`: 9x9 board
//!
//! To compile for a specific board size:
//! ```sh
//! cargo build                                             # 5x5 (default)
//! cargo build --no-default-features --features board7x7   # 7x7
//! ```

// =============================================================================
// Board Geometry
// =============================================================================

/// Board side length.
#[cfg(feature = "board5x5")]
pub const SIDE_LENGTH: usize = 5;

#[cfg(feature = "board7x7")]
pub const SIDE_LENGTH: usize = 7;

#[cfg(feature = "board9x9")]
pub const SIDE_LENGTH: usize = 9;

#[cfg(any(
    all(feature = "board5x5", feature = "board7x7"),
    all(feature = "board5x5", feature = "board9x9"),
    all(feature = "board7x7", feature = "board9x9"),
))]
compile_error!("Enable exactly one board size feature: 'board5x5', 'board7x7' or 'board9x9'");

#[cfg(not(any(feature = "board5x5", feature = "board7x7", feature = "board9x9")))]
compile_error!("Must enable one board size feature: 'board5x5', 'board7x7' or 'board9x9'");

/// Number of cells on the board.
pub const AREA: usize = SIDE_LENGTH * SIDE_LENGTH;

/// Number of distinct moves: every cell plus pass.
pub const NUM_MOVES: usize = AREA + 1;

// =============================================================================
// Search Parameters
// =============================================================================

/// Multiplies the exploration term of both selection formulas.
pub const EXPLORATION_PARAMETER: f32 = 1.4;

/// Shape of the Gamma distribution used to build root Dirichlet noise.
pub const DIRICHLET_ALPHA: f64 = 1.0;

/// Weight of the Dirichlet noise when blended into the root prior.
pub const DIRICHLET_EPSILON: f32 = 0.25;

/// Default number of simulations per search.
pub const DEFAULT_SIMULATIONS: u32 = 1000;

/// Simulations used per request by the HTTP service.
pub const SERVICE_SIMULATIONS: u32 = 5000;

// =============================================================================
// Random Board Generation
// =============================================================================

/// Chance that a generated cell holds a black stone.
pub const RANDOM_BLACK_CHANCE: f64 = 0.001;

/// Cumulative chance (black + white) for a generated stone.
pub const RANDOM_WHITE_CHANCE: f64 = 0.003;

/// Cumulative chance (stones + wall) for a generated cell.
pub const RANDOM_WALL_CHANCE: f64 = 0.15;

// =============================================================================
// Training Record Layout
// =============================================================================

/// Number of history boards encoded in a record, besides the current one.
pub const HISTORY_PLANES: usize = 7;

/// Planes per record: side to move, walls, then a (white, black) pair for the
/// current board and each encoded history board.
pub const PLANES: usize = 2 + 2 * (HISTORY_PLANES + 1);

/// Length of an encoded position.
pub const RECORD_LENGTH: usize = PLANES * AREA;

/// Plane value used for history boards that do not exist.
pub const MISSING_PLANE: u8 = 2;
