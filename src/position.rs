//! Game positions and the rules engine.
//!
//! This module provides the core game logic, including:
//! - Move legality (occupied cells, suicide, positional superko)
//! - Stone placement and capture resolution
//! - Area scoring once both players pass in a row
//! - The game tree: every [`Position`] owns the children it has materialized
//!
//! Positions are never cloned. Search statistics are keyed on
//! [`PositionId`], so two positions holding the same board are still
//! distinct nodes.

use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

use rand::Rng;
use rand::seq::SliceRandom;
use thiserror::Error;

use crate::board::{Board, Cell, Color, Point, neighbors};
use crate::constants::AREA;

/// A move: pass or a stone placed on a cell.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Move {
    Pass,
    Place(Point),
}

impl Move {
    /// Index of this move in a move distribution (pass is 0, cell `i` is `i + 1`).
    #[inline]
    pub fn index(self) -> usize {
        match self {
            Move::Pass => 0,
            Move::Place(pt) => pt + 1,
        }
    }

    /// Inverse of [`Move::index`].
    pub fn from_index(index: usize) -> Move {
        match index {
            0 => Move::Pass,
            i => Move::Place(i - 1),
        }
    }
}

/// Text form: `-1` for pass, the cell index otherwise.
impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Move::Pass => write!(f, "-1"),
            Move::Place(pt) => write!(f, "{pt}"),
        }
    }
}

/// Errors from parsing a [`Move`].
#[derive(Debug, Error)]
pub enum MoveError {
    #[error("invalid move number: {0}")]
    Number(#[from] ParseIntError),
    #[error("negative move {0} (only -1 passes)")]
    Negative(i64),
}

impl FromStr for Move {
    type Err = MoveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().parse::<i64>()? {
            -1 => Ok(Move::Pass),
            value if value < 0 => Err(MoveError::Negative(value)),
            value => Ok(Move::Place(value as usize)),
        }
    }
}

/// Process-unique identity of a [`Position`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct PositionId(u64);

static NEXT_ID: AtomicU64 = AtomicU64::new(0);

impl PositionId {
    fn next() -> Self {
        PositionId(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// A legal move and the child position it leads to, if materialized.
struct Branch {
    mv: Move,
    child: Option<Box<Position>>,
}

/// A game position.
///
/// The board never changes after construction. The list of legal moves is
/// built on first use and is fixed from then on.
pub struct Position {
    id: PositionId,
    board: Board,
    /// Color of the player making the next move
    color: Color,
    /// Whether the move leading here was a pass
    passed: bool,
    /// Every board seen earlier in the match, oldest first
    history: Vec<Board>,
    /// Final score in [-1, 1] once two passes in a row have ended the match
    end_state: Option<f32>,
    branches: Option<Vec<Branch>>,
}

impl Position {
    /// Start a match (or resume one when `history` is non-empty).
    pub fn new_match(color: Color, board: Board, history: Vec<Board>) -> Self {
        let passed = history.contains(&board);
        Self {
            id: PositionId::next(),
            board,
            color,
            passed,
            history,
            end_state: None,
            branches: None,
        }
    }

    pub fn id(&self) -> PositionId {
        self.id
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Color of the player to move.
    pub fn color(&self) -> Color {
        self.color
    }

    pub fn history(&self) -> &[Board] {
        &self.history
    }

    /// Whether the move that produced this position was a pass.
    pub fn just_passed(&self) -> bool {
        self.passed
    }

    /// Final score, or `None` while the match is still going.
    ///
    /// Positive scores favor White, negative scores favor Black.
    pub fn end_state(&self) -> Option<f32> {
        self.end_state
    }

    pub fn is_over(&self) -> bool {
        self.end_state.is_some()
    }

    // =========================================================================
    // Move list and children
    // =========================================================================

    fn setup(&mut self) -> &mut Vec<Branch> {
        if self.branches.is_none() {
            let branches = std::iter::once(Move::Pass)
                .chain((0..AREA).map(Move::Place))
                .filter(|&mv| self.is_legal(mv))
                .map(|mv| Branch { mv, child: None })
                .collect();
            self.branches = Some(branches);
        }
        self.branches.get_or_insert_with(Vec::new)
    }

    /// All legal moves, pass first. Builds the move list on first call.
    pub fn valid_moves(&mut self) -> Vec<Move> {
        self.setup().iter().map(|b| b.mv).collect()
    }

    /// Number of legal moves (including pass).
    pub fn move_count(&mut self) -> usize {
        self.setup().len()
    }

    /// The move stored at a slot of the move list.
    pub fn move_at(&mut self, slot: usize) -> Move {
        self.setup()[slot].mv
    }

    /// Slot of a move in the move list, if it is legal here.
    pub fn slot_of(&mut self, mv: Move) -> Option<usize> {
        self.setup().iter().position(|b| b.mv == mv)
    }

    /// Whether `mv` is in the already-built move list.
    ///
    /// # Panics
    /// Panics if the move list has not been built yet.
    pub fn is_listed_move(&self, mv: Move) -> bool {
        match &self.branches {
            Some(branches) => branches.iter().any(|b| b.mv == mv),
            None => panic!("move list queried before it was built"),
        }
    }

    /// The child at `slot`, materialized if needed. This position keeps ownership.
    pub fn child(&mut self, slot: usize) -> &mut Position {
        let mv = self.move_at(slot);
        let existing = self.setup()[slot].child.take();
        let child = match existing {
            Some(child) => child,
            None => Box::new(self.apply_move(mv)),
        };
        self.setup()[slot].child.insert(child)
    }

    /// Hand the child at `slot` over to the caller.
    ///
    /// An already materialized child is detached together with its subtree;
    /// otherwise a fresh, unattached child is built.
    pub fn take_child(&mut self, slot: usize) -> Box<Position> {
        let mv = self.move_at(slot);
        let existing = self.setup()[slot].child.take();
        existing.unwrap_or_else(|| Box::new(self.apply_move(mv)))
    }

    /// A new, unattached child for `slot`. Any materialized child stays in place.
    pub fn fresh_child(&mut self, slot: usize) -> Box<Position> {
        let mv = self.move_at(slot);
        Box::new(self.apply_move(mv))
    }

    /// Randomly reorder the move list, keeping every move paired with its child.
    pub fn shuffle_moves<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.setup().shuffle(rng);
    }

    // =========================================================================
    // Rules
    // =========================================================================

    /// Whether `mv` is legal for the player to move.
    pub fn is_legal(&self, mv: Move) -> bool {
        let pt = match mv {
            Move::Pass => return true,
            Move::Place(pt) => pt,
        };
        if pt >= AREA || self.board[pt] != Cell::Empty {
            return false;
        }

        let stone = Cell::Stone(self.color);
        // Cheap filter: a repeat needs our stone on this cell in some earlier board
        let possible_repeat = self.history.iter().any(|b| b[pt] == stone);

        let breathes = neighbors(pt).iter().any(|&n| match self.board[n] {
            Cell::Empty => true,
            Cell::Stone(c) if c == self.color => !chain_is_surrounded(&self.board, n, pt),
            Cell::Stone(_) => chain_is_surrounded(&self.board, n, pt),
            Cell::Wall => false,
        });
        if !breathes {
            return false;
        }
        if !possible_repeat {
            return true;
        }

        let next = place_stone(&self.board, pt, self.color);
        !self.history.contains(&next)
    }

    /// Build the position reached by `mv`. Legality must already be established.
    fn apply_move(&self, mv: Move) -> Position {
        let mut history = Vec::with_capacity(self.history.len() + 1);
        history.extend_from_slice(&self.history);
        history.push(self.board);

        let mut child = Position {
            id: PositionId::next(),
            board: self.board,
            color: self.color.opponent(),
            passed: false,
            history,
            end_state: None,
            branches: None,
        };

        match mv {
            Move::Place(pt) => child.board = place_stone(&self.board, pt, self.color),
            Move::Pass => {
                child.passed = true;
                if self.passed {
                    child.end_state = Some(finalize_score(&child.board));
                }
            }
        }
        child
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.board)
    }
}

/// Place a stone of `color` at `pt` and remove enemy chains left without liberties.
fn place_stone(board: &Board, pt: Point, color: Color) -> Board {
    let mut next = *board;
    next[pt] = Cell::Stone(color);

    let enemy = Cell::Stone(color.opponent());
    for &n in neighbors(pt) {
        if next[n] == enemy {
            destroy_chain_if_surrounded(&mut next, n);
        }
    }
    next
}

/// Whether the chain at `start` has no liberty, treating `ignore` as already visited.
///
/// Passing the cell about to be played as `ignore` answers "does this chain
/// keep a liberty once that cell is filled?".
pub fn chain_is_surrounded(board: &Board, start: Point, ignore: Point) -> bool {
    let color = board[start];
    let mut visited = [false; AREA];
    visited[ignore] = true;
    let mut stack = vec![start];

    while let Some(pt) = stack.pop() {
        if visited[pt] {
            continue;
        }
        visited[pt] = true;

        if board[pt] == Cell::Empty {
            return false;
        }
        if board[pt] == color {
            stack.extend(neighbors(pt).iter().filter(|&&n| !visited[n]));
        }
    }
    true
}

/// Clear the chain at `pt` if it has no liberty.
pub fn destroy_chain_if_surrounded(board: &mut Board, pt: Point) {
    let color = board[pt];
    let mut visited = [false; AREA];
    let mut stack = vec![pt];
    let mut chain = Vec::new();

    while let Some(cur) = stack.pop() {
        if visited[cur] {
            continue;
        }
        visited[cur] = true;

        if board[cur] == Cell::Empty {
            return;
        }
        if board[cur] == color {
            chain.push(cur);
            stack.extend(neighbors(cur).iter().filter(|&&n| !visited[n]));
        }
    }

    for cur in chain {
        board[cur] = Cell::Empty;
    }
}

/// Area score of a finished board, in [-1, 1].
///
/// Stones count for their owner. An empty region counts for a color only when
/// every stone bordering it is of that color. The result is
/// `(white - black) / (white + black)`, or 0 when the board holds no stones.
pub fn finalize_score(board: &Board) -> f32 {
    let mut white = board.count(Color::White) as f32;
    let mut black = board.count(Color::Black) as f32;
    if white <= 0.0 && black <= 0.0 {
        return 0.0;
    }

    let mut visited = [false; AREA];
    for pt in 0..AREA {
        visited[pt] = board[pt] != Cell::Empty;
    }

    while let Some(start) = visited.iter().position(|&v| !v) {
        let mut stack = vec![start];
        let mut size = 0.0f32;
        let mut touches_white = false;
        let mut touches_black = false;

        while let Some(pt) = stack.pop() {
            match board[pt] {
                Cell::Stone(Color::White) => {
                    touches_white = true;
                    continue;
                }
                Cell::Stone(Color::Black) => {
                    touches_black = true;
                    continue;
                }
                Cell::Wall => continue,
                Cell::Empty => {}
            }
            if visited[pt] {
                continue;
            }
            visited[pt] = true;
            size += 1.0;
            stack.extend_from_slice(neighbors(pt));
        }

        match (touches_white, touches_black) {
            (true, false) => white += size,
            (false, true) => black += size,
            _ => {}
        }
    }

    (white - black) / (white + black)
}
