//! Board cells, stone colors, and the shared neighbor table.
//!
//! A board is a flat row-major array of [`AREA`] cells. Its text form uses one
//! character per cell: `X` black, `O` white, `.` empty and `#` wall.

use std::fmt;
use std::ops::{Index, IndexMut};
use std::str::FromStr;
use std::sync::OnceLock;

use thiserror::Error;

use crate::constants::{AREA, SIDE_LENGTH};

/// A cell index on the board.
pub type Point = usize;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Color {
    Black,
    White,
}

impl Color {
    /// The other color.
    pub fn opponent(self) -> Color {
        match self {
            Color::Black => Color::White,
            Color::White => Color::Black,
        }
    }

    /// Text form of the color's stones.
    pub fn symbol(self) -> char {
        match self {
            Color::Black => 'X',
            Color::White => 'O',
        }
    }

    /// Parse a stone symbol (`X` or `O`).
    pub fn from_symbol(c: char) -> Option<Color> {
        match c {
            'X' => Some(Color::Black),
            'O' => Some(Color::White),
            _ => None,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// Content of a single board cell.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Cell {
    Empty,
    Stone(Color),
    /// Permanently blocked cell.
    Wall,
}

impl Cell {
    pub fn symbol(self) -> char {
        match self {
            Cell::Empty => '.',
            Cell::Stone(color) => color.symbol(),
            Cell::Wall => '#',
        }
    }

    pub fn from_symbol(c: char) -> Option<Cell> {
        match c {
            '.' => Some(Cell::Empty),
            '#' => Some(Cell::Wall),
            _ => Color::from_symbol(c).map(Cell::Stone),
        }
    }
}

/// Errors raised while parsing a board from text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BoardError {
    #[error("board must have {expected} cells, got {found}")]
    Length { expected: usize, found: usize },
    #[error("invalid cell character {0:?}")]
    Cell(char),
}

/// A board snapshot.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Board {
    cells: [Cell; AREA],
}

impl Default for Board {
    fn default() -> Self {
        Self::empty()
    }
}

impl Board {
    /// A board with every cell empty.
    pub fn empty() -> Self {
        Self {
            cells: [Cell::Empty; AREA],
        }
    }

    /// Build a board from an empty one with the given cells overwritten.
    pub fn with_cells(cells: &[(Point, Cell)]) -> Self {
        let mut board = Self::empty();
        for &(pt, cell) in cells {
            board[pt] = cell;
        }
        board
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Number of stones of the given color.
    pub fn count(&self, color: Color) -> usize {
        self.cells
            .iter()
            .filter(|&&c| c == Cell::Stone(color))
            .count()
    }
}

impl Index<Point> for Board {
    type Output = Cell;

    fn index(&self, pt: Point) -> &Cell {
        &self.cells[pt]
    }
}

impl IndexMut<Point> for Board {
    fn index_mut(&mut self, pt: Point) -> &mut Cell {
        &mut self.cells[pt]
    }
}

impl FromStr for Board {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let found = s.chars().count();
        if found != AREA {
            return Err(BoardError::Length {
                expected: AREA,
                found,
            });
        }
        let mut board = Board::empty();
        for (pt, c) in s.chars().enumerate() {
            board[pt] = Cell::from_symbol(c).ok_or(BoardError::Cell(c))?;
        }
        Ok(board)
    }
}

impl Board {
    /// The board as a single line of cell characters.
    pub fn to_line(&self) -> String {
        self.cells.iter().map(|c| c.symbol()).collect()
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.cells.chunks(SIDE_LENGTH) {
            for cell in row {
                write!(f, "{}", cell.symbol())?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

// =============================================================================
// Neighbor Table
// =============================================================================

static NEIGHBORS: OnceLock<Vec<Vec<Point>>> = OnceLock::new();

/// Orthogonal neighbors (up, down, left, right) of a cell, clipped at the edges.
///
/// The table is built on first use and shared read-only afterwards.
#[inline]
pub fn neighbors(pt: Point) -> &'static [Point] {
    &NEIGHBORS.get_or_init(build_neighbors)[pt]
}

fn build_neighbors() -> Vec<Vec<Point>> {
    (0..AREA)
        .map(|pt| {
            let mut v = Vec::with_capacity(4);
            if pt >= SIDE_LENGTH {
                v.push(pt - SIDE_LENGTH);
            }
            if pt + SIDE_LENGTH < AREA {
                v.push(pt + SIDE_LENGTH);
            }
            if pt % SIDE_LENGTH > 0 {
                v.push(pt - 1);
            }
            if pt % SIDE_LENGTH < SIDE_LENGTH - 1 {
                v.push(pt + 1);
            }
            v
        })
        .collect()
}
