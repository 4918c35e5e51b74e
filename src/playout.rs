//! Random playouts and random board generation.
//!
//! A playout plays uniformly random legal moves (pass included) until two
//! consecutive passes end the match, then returns the final score. The first
//! step builds a new child next to any existing subtree, and every later
//! position is dropped as soon as the next one exists, so a playout never
//! touches the search tree.

use rand::Rng;

use crate::board::{Board, Cell, Color};
use crate::constants::{AREA, RANDOM_BLACK_CHANCE, RANDOM_WALL_CHANCE, RANDOM_WHITE_CHANCE};
use crate::position::Position;

/// Play random moves from `pos` to the end of the match and return the score.
///
/// Positive scores favor White. Superko guarantees the playout terminates.
pub fn playout<R: Rng + ?Sized>(pos: &mut Position, rng: &mut R) -> f32 {
    if let Some(score) = pos.end_state() {
        return score;
    }

    let slot = rng.gen_range(0..pos.move_count());
    let mut current = pos.fresh_child(slot);
    loop {
        if let Some(score) = current.end_state() {
            return score;
        }
        let slot = rng.gen_range(0..current.move_count());
        current = current.take_child(slot);
    }
}

/// Generate a board with a sprinkling of walls and the odd stone.
///
/// Roughly 0.1% of cells get a black stone, 0.2% a white stone, 14.7% a wall,
/// and the rest stay empty.
pub fn random_board<R: Rng + ?Sized>(rng: &mut R) -> Board {
    let mut board = Board::empty();
    for pt in 0..AREA {
        let roll: f64 = rng.gen_range(0.0..1.0);
        board[pt] = if roll <= RANDOM_BLACK_CHANCE {
            Cell::Stone(Color::Black)
        } else if roll <= RANDOM_WHITE_CHANCE {
            Cell::Stone(Color::White)
        } else if roll <= RANDOM_WALL_CHANCE {
            Cell::Wall
        } else {
            Cell::Empty
        };
    }
    board
}
