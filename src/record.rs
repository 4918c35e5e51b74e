//! Training records produced by self-play.
//!
//! A position is encoded as [`PLANES`] planes of [`AREA`] values each:
//! - plane 0: side to move (1 everywhere if White, 0 if Black)
//! - plane 1: walls
//! - planes 2..: a (white, black) pair for the current board, then one pair
//!   per earlier board, newest first, up to [`HISTORY_PLANES`] boards.
//!   Pairs without a board are filled with [`MISSING_PLANE`].
//!
//! A [`TrainingExample`] is stored as one text line: the encoding as a run of
//! digits, then the [`NUM_MOVES`] move probabilities, then the value target.

use std::fmt;
use std::io::{self, BufRead, Write};
use std::num::ParseFloatError;
use std::str::FromStr;

use thiserror::Error;
use tracing::warn;

use crate::board::{Board, Cell, Color};
use crate::constants::{AREA, HISTORY_PLANES, MISSING_PLANE, NUM_MOVES, PLANES, RECORD_LENGTH};
use crate::position::{Move, Position};

/// Errors raised while parsing a record line.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RecordError {
    #[error("empty record line")]
    Empty,
    #[error("state must have {expected} digits, got {found}")]
    StateLength { expected: usize, found: usize },
    #[error("invalid state digit {0:?}")]
    StateDigit(char),
    #[error("expected {expected} numbers after the state, got {found}")]
    FieldCount { expected: usize, found: usize },
    #[error("invalid number: {0}")]
    Number(#[from] ParseFloatError),
}

// =============================================================================
// Position encoding
// =============================================================================

fn plane(data: &[u8], index: usize) -> &[u8] {
    &data[index * AREA..(index + 1) * AREA]
}

fn push_stones(data: &mut Vec<u8>, board: &Board) {
    for color in [Color::White, Color::Black] {
        data.extend(board.cells().iter().map(|&c| u8::from(c == Cell::Stone(color))));
    }
}

/// Encode a position as [`RECORD_LENGTH`] plane values.
pub fn encode_position(position: &Position) -> Vec<u8> {
    let mut data = Vec::with_capacity(RECORD_LENGTH);
    let white = u8::from(position.color() == Color::White);
    data.extend(std::iter::repeat_n(white, AREA));

    let board = position.board();
    data.extend(board.cells().iter().map(|&c| u8::from(c == Cell::Wall)));
    push_stones(&mut data, board);

    let mut earlier = position.history().iter().rev();
    for _ in 0..HISTORY_PLANES {
        match earlier.next() {
            Some(board) => push_stones(&mut data, board),
            None => data.extend(std::iter::repeat_n(MISSING_PLANE, 2 * AREA)),
        }
    }

    debug_assert_eq!(data.len(), RECORD_LENGTH);
    data
}

fn decode_board(walls: &[u8], white: &[u8], black: &[u8]) -> Board {
    let mut board = Board::empty();
    for pt in 0..AREA {
        board[pt] = if walls[pt] == 1 {
            Cell::Wall
        } else if white[pt] == 1 {
            Cell::Stone(Color::White)
        } else if black[pt] == 1 {
            Cell::Stone(Color::Black)
        } else {
            Cell::Empty
        };
    }
    board
}

/// Rebuild a match root from an encoding.
///
/// Only the history boards stored in the planes come back, so a match longer
/// than [`HISTORY_PLANES`] turns loses its older boards.
///
/// # Panics
/// Panics if `data` is shorter than [`RECORD_LENGTH`].
pub fn decode_position(data: &[u8]) -> Position {
    let color = if data[0] == 1 {
        Color::White
    } else {
        Color::Black
    };
    let walls = plane(data, 1);
    let board = decode_board(walls, plane(data, 2), plane(data, 3));

    let mut history = Vec::new();
    for k in 1..=HISTORY_PLANES {
        let white = plane(data, 2 + 2 * k);
        if white[0] == MISSING_PLANE {
            break;
        }
        history.push(decode_board(walls, white, plane(data, 3 + 2 * k)));
    }
    history.reverse();

    Position::new_match(color, board, history)
}

// =============================================================================
// Examples
// =============================================================================

/// One training example: an encoded position with its search targets.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingExample {
    /// Position encoding, [`RECORD_LENGTH`] values
    pub state: Vec<u8>,
    /// Share of root visits per move, indexed by [`Move::index`]
    pub probabilities: Vec<f32>,
    /// Value target in [-1, 1], positive favors White
    pub value: f32,
}

/// Search output of one turn of a match.
#[derive(Debug, Clone)]
pub struct TurnRecord {
    pub state: Vec<u8>,
    pub probabilities: Vec<f32>,
    /// Searched value of the position, if it was visited
    pub value: Option<f32>,
}

impl TrainingExample {
    /// Turn a finished match into examples.
    ///
    /// Each target value is `v * (1 - result_weight) + result * result_weight`,
    /// where `v` is the searched value of the turn (0 if it was never visited).
    pub fn from_turns(turns: Vec<TurnRecord>, result: f32, result_weight: f32) -> Vec<Self> {
        turns
            .into_iter()
            .map(|turn| {
                let searched = turn.value.unwrap_or(0.0);
                TrainingExample {
                    state: turn.state,
                    probabilities: turn.probabilities,
                    value: searched * (1.0 - result_weight) + result * result_weight,
                }
            })
            .collect()
    }

    /// The encoded position as a match root.
    pub fn position(&self) -> Position {
        decode_position(&self.state)
    }

    /// Human-readable dump: the board, each legal move with its probability,
    /// then the value.
    pub fn display<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let mut position = self.position();
        write!(out, "{position}")?;
        for mv in position.valid_moves() {
            let probability = self.probabilities.get(mv.index()).copied().unwrap_or(0.0);
            writeln!(out, "{mv} {probability}")?;
        }
        writeln!(out, "{}", self.value)
    }

    /// Probability stored for `mv`.
    pub fn probability(&self, mv: Move) -> f32 {
        self.probabilities[mv.index()]
    }
}

impl fmt::Display for TrainingExample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for digit in &self.state {
            write!(f, "{digit}")?;
        }
        for p in &self.probabilities {
            write!(f, " {p}")?;
        }
        write!(f, " {}", self.value)
    }
}

impl FromStr for TrainingExample {
    type Err = RecordError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut fields = line.split_whitespace();
        let digits = fields.next().ok_or(RecordError::Empty)?;

        let found = digits.chars().count();
        if found != RECORD_LENGTH {
            return Err(RecordError::StateLength {
                expected: RECORD_LENGTH,
                found,
            });
        }
        let state = digits
            .chars()
            .map(|c| match c.to_digit(10) {
                Some(d) if d <= u32::from(MISSING_PLANE) => Ok(d as u8),
                _ => Err(RecordError::StateDigit(c)),
            })
            .collect::<Result<Vec<u8>, _>>()?;

        let numbers = fields
            .map(str::parse::<f32>)
            .collect::<Result<Vec<f32>, _>>()?;
        if numbers.len() != NUM_MOVES + 1 {
            return Err(RecordError::FieldCount {
                expected: NUM_MOVES + 1,
                found: numbers.len(),
            });
        }

        let (probabilities, value) = numbers.split_at(NUM_MOVES);
        Ok(TrainingExample {
            state,
            probabilities: probabilities.to_vec(),
            value: value[0],
        })
    }
}

// =============================================================================
// Files
// =============================================================================

/// Write examples, one line each, and flush.
pub fn save<W: Write>(out: &mut W, examples: &[TrainingExample]) -> io::Result<()> {
    for example in examples {
        writeln!(out, "{example}")?;
    }
    out.flush()
}

/// Read the next example, skipping blank lines.
///
/// `Ok(None)` means the stream ended or held a line that is not a complete
/// example (a truncated tail, typically); the bad line is logged.
fn next_example<R: BufRead>(
    input: &mut R,
    line: &mut String,
) -> io::Result<Option<TrainingExample>> {
    loop {
        line.clear();
        if input.read_line(line)? == 0 {
            return Ok(None);
        }
        if line.trim().is_empty() {
            continue;
        }
        return match line.parse() {
            Ok(example) => Ok(Some(example)),
            Err(e) => {
                warn!(error = %e, "stopping at malformed record line");
                Ok(None)
            }
        };
    }
}

/// Read every example up to the end of the stream or the first bad line.
pub fn load<R: BufRead>(mut input: R) -> io::Result<Vec<TrainingExample>> {
    let mut examples = Vec::new();
    let mut line = String::new();
    while let Some(example) = next_example(&mut input, &mut line)? {
        examples.push(example);
    }
    Ok(examples)
}

/// Append up to `limit` examples to `out`.
///
/// Returns `true` once the stream is exhausted (or stopped at a bad line) and
/// `false` if it stopped because `limit` was reached.
pub fn load_chunk<R: BufRead>(
    input: &mut R,
    limit: usize,
    out: &mut Vec<TrainingExample>,
) -> io::Result<bool> {
    let mut line = String::new();
    let mut read = 0;
    while read < limit {
        match next_example(input, &mut line)? {
            Some(example) => {
                out.push(example);
                read += 1;
            }
            None => return Ok(true),
        }
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn example(value: f32) -> TrainingExample {
        let board = Board::with_cells(&[(0, Cell::Wall)]);
        let pos = Position::new_match(Color::Black, board, Vec::new());
        let mut probabilities = vec![0.0; NUM_MOVES];
        probabilities[0] = 0.25;
        probabilities[2] = 0.75;
        TrainingExample {
            state: encode_position(&pos),
            probabilities,
            value,
        }
    }

    #[test]
    fn test_encoding_layout() {
        let board = Board::with_cells(&[
            (0, Cell::Wall),
            (1, Cell::Stone(Color::White)),
            (2, Cell::Stone(Color::Black)),
        ]);
        let pos = Position::new_match(Color::White, board, vec![Board::empty()]);
        let data = encode_position(&pos);
        assert_eq!(data.len(), RECORD_LENGTH);
        assert!(plane(&data, 0).iter().all(|&v| v == 1));
        assert_eq!(plane(&data, 1)[0], 1);
        assert_eq!(plane(&data, 2)[1], 1);
        assert_eq!(plane(&data, 3)[2], 1);
        // One earlier board, all empty
        assert!(plane(&data, 4).iter().all(|&v| v == 0));
        assert!(plane(&data, 5).iter().all(|&v| v == 0));
        for p in 6..PLANES {
            assert!(plane(&data, p).iter().all(|&v| v == MISSING_PLANE));
        }
    }

    #[test]
    fn test_decode_restores_history() {
        let first = Board::with_cells(&[(3, Cell::Stone(Color::Black))]);
        let second = Board::with_cells(&[
            (3, Cell::Stone(Color::Black)),
            (4, Cell::Stone(Color::White)),
        ]);
        let current = Board::with_cells(&[
            (3, Cell::Stone(Color::Black)),
            (4, Cell::Stone(Color::White)),
            (5, Cell::Stone(Color::Black)),
        ]);
        let pos = Position::new_match(Color::White, current, vec![first, second]);
        let decoded = decode_position(&encode_position(&pos));
        assert_eq!(decoded.color(), Color::White);
        assert_eq!(decoded.board(), &current);
        assert_eq!(decoded.history(), &[first, second]);
    }

    #[test]
    fn test_line_roundtrip() {
        let original = example(-0.5);
        let line = original.to_string();
        assert!(line.ends_with(" -0.5"));
        assert!(line.contains(" 0.25 "));
        let parsed: TrainingExample = line.parse().unwrap();
        assert_eq!(parsed, original);
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!("".parse::<TrainingExample>(), Err(RecordError::Empty));
        assert!(matches!(
            "0101 0.5".parse::<TrainingExample>(),
            Err(RecordError::StateLength { found: 4, .. })
        ));
        let mut line = example(0.0).to_string();
        line.truncate(line.rfind(' ').unwrap());
        assert!(matches!(
            line.parse::<TrainingExample>(),
            Err(RecordError::FieldCount { .. })
        ));
    }

    #[test]
    fn test_load_stops_at_truncated_line() {
        let mut buf = Vec::new();
        save(&mut buf, &[example(1.0), example(0.0)]).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let truncated = &text[..text.len() - 10];
        let examples = load(Cursor::new(truncated)).unwrap();
        assert_eq!(examples, vec![example(1.0)]);
    }

    #[test]
    fn test_load_chunk() {
        let mut buf = Vec::new();
        save(&mut buf, &[example(1.0), example(0.5), example(0.0)]).unwrap();
        let mut input = Cursor::new(buf);

        let mut out = Vec::new();
        assert!(!load_chunk(&mut input, 2, &mut out).unwrap());
        assert_eq!(out.len(), 2);
        out.clear();
        assert!(load_chunk(&mut input, 2, &mut out).unwrap());
        assert_eq!(out, vec![example(0.0)]);
    }

    #[test]
    fn test_from_turns_blends_result() {
        let turns = vec![
            TurnRecord {
                state: vec![0; RECORD_LENGTH],
                probabilities: vec![0.0; NUM_MOVES],
                value: Some(0.5),
            },
            TurnRecord {
                state: vec![0; RECORD_LENGTH],
                probabilities: vec![0.0; NUM_MOVES],
                value: None,
            },
        ];
        let examples = TrainingExample::from_turns(turns, -1.0, 0.25);
        assert!((examples[0].value - (0.5 * 0.75 - 0.25)).abs() < 1e-6);
        assert!((examples[1].value + 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_display_lists_moves() {
        let mut out = Vec::new();
        example(0.5).display(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("-1 0.25\n"));
        assert!(text.contains("1 0.75\n"));
        assert!(text.ends_with("0.5\n"));
    }
}
