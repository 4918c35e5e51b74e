//! Line-oriented console for playing and analyzing matches.
//!
//! Commands are read one per line and answered in the GTP style: `= <answer>`
//! on success and `? <error>` on failure, each followed by a blank line.
//! Two engines are loaded; `genmove` uses the one assigned to the side to
//! move and `analyze` compares both.
//!
//! ## Supported Commands
//!
//! - `name` - Return engine name
//! - `version` - Return engine version
//! - `list_commands` - List all supported commands
//! - `known_command <cmd>` - Check if a command is supported
//! - `quit` - Exit the program
//! - `show` - Print the board and the side to move
//! - `moves` - List the legal moves
//! - `analyze` - Search with both engines and tabulate every legal move
//! - `play <move>` - Play a move (`-1` passes, otherwise a cell index)
//! - `genmove` - Search and play a move for the side to move
//! - `score` - Final score once the match is over
//! - `new <color> <board>` - Start a new match

use std::fmt::Write as _;
use std::io::{self, BufRead, Write};

use anyhow::Result;
use clap::ValueEnum;
use tracing::info;

use crate::board::{Board, Cell, Color};
use crate::constants::AREA;
use crate::evaluator::UniformEvaluator;
use crate::mcts::{MoveSearch, SearchConfig, SearchEngine};
use crate::position::{Move, Position};

/// The list of known console commands.
const KNOWN_COMMANDS: &[&str] = &[
    "analyze",
    "genmove",
    "known_command",
    "list_commands",
    "moves",
    "name",
    "new",
    "play",
    "quit",
    "score",
    "show",
    "version",
];

/// Search flavor of a console engine.
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum EngineKind {
    /// UCT with random playouts
    Rollout,
    /// PUCT guided by a flat prior
    Uniform,
}

/// Build a boxed engine of the given kind.
pub fn build_engine(kind: EngineKind, config: &SearchConfig) -> Result<Box<dyn MoveSearch>> {
    Ok(match kind {
        EngineKind::Rollout => Box::new(SearchEngine::rollout(config)),
        EngineKind::Uniform => Box::new(SearchEngine::guided(UniformEvaluator::new(), config)?),
    })
}

/// The opening layout, `#...#.....#.O...........#` on a 5x5 board. Larger
/// boards get the same walls and stone at the same cell indices, with the
/// last wall moved to their last cell.
pub fn wall_layout() -> Board {
    Board::with_cells(&[
        (0, Cell::Wall),
        (4, Cell::Wall),
        (10, Cell::Wall),
        (12, Cell::Stone(Color::White)),
        (AREA - 1, Cell::Wall),
    ])
}

/// Console state.
pub struct Console {
    position: Box<Position>,
    /// Engine playing Black
    black: Box<dyn MoveSearch>,
    /// Engine playing White
    white: Box<dyn MoveSearch>,
}

impl Console {
    /// Create a console on the opening layout with Black to move.
    pub fn new(black: Box<dyn MoveSearch>, white: Box<dyn MoveSearch>) -> Self {
        Self {
            position: Box::new(Position::new_match(Color::Black, wall_layout(), Vec::new())),
            black,
            white,
        }
    }

    pub fn position(&self) -> &Position {
        &self.position
    }

    /// Run the command loop until `quit` or end of input.
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, output: &mut W) -> io::Result<()> {
        for line in input.lines() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() || line.starts_with("//") {
                continue;
            }

            let parts: Vec<&str> = line.split_whitespace().collect();
            let command = parts[0].to_lowercase();
            let args = &parts[1..];

            let (success, message) = self.execute(&command, args);
            let prefix = if success { '=' } else { '?' };
            writeln!(output, "{prefix} {message}\n")?;
            output.flush()?;

            if command == "quit" {
                break;
            }
        }
        Ok(())
    }

    /// Execute a command and return (success, response).
    pub fn execute(&mut self, command: &str, args: &[&str]) -> (bool, String) {
        match command {
            "name" => (true, env!("CARGO_PKG_NAME").to_string()),

            "version" => (true, env!("CARGO_PKG_VERSION").to_string()),

            "list_commands" => (true, KNOWN_COMMANDS.join("\n")),

            "known_command" => {
                if args.is_empty() {
                    return (false, "missing argument".to_string());
                }
                let known = KNOWN_COMMANDS.contains(&args[0].to_lowercase().as_str());
                (true, if known { "true" } else { "false" }.to_string())
            }

            "quit" => (true, String::new()),

            "show" => (
                true,
                format!("{} to move\n{}", self.position.color(), self.position),
            ),

            "moves" => {
                let moves: Vec<String> = self
                    .position
                    .valid_moves()
                    .iter()
                    .map(|mv| mv.to_string())
                    .collect();
                (true, moves.join(" "))
            }

            "analyze" => {
                if self.position.is_over() {
                    return (false, "match is over".to_string());
                }
                (true, self.analyze())
            }

            "play" => {
                if args.is_empty() {
                    return (false, "missing argument".to_string());
                }
                let Ok(mv) = args[0].parse::<Move>() else {
                    return (false, "invalid move".to_string());
                };
                if self.position.is_over() {
                    return (false, "match is over".to_string());
                }
                match self.position.slot_of(mv) {
                    Some(slot) => {
                        self.advance(slot);
                        (true, String::new())
                    }
                    None => (false, "illegal move".to_string()),
                }
            }

            "genmove" => {
                if self.position.is_over() {
                    return (false, "match is over".to_string());
                }
                let engine = match self.position.color() {
                    Color::Black => &mut self.black,
                    Color::White => &mut self.white,
                };
                let slot = engine.best_move(&mut self.position);
                let mv = self.position.move_at(slot);
                self.advance(slot);
                (true, mv.to_string())
            }

            "score" => match self.position.end_state() {
                Some(score) => (true, score.to_string()),
                None => (false, "match is not over".to_string()),
            },

            "new" => {
                if args.len() < 2 {
                    return (false, "missing arguments".to_string());
                }
                let color = args[0].chars().next().and_then(Color::from_symbol);
                let Some(color) = color.filter(|_| args[0].len() == 1) else {
                    return (false, "invalid color".to_string());
                };
                match args[1].parse::<Board>() {
                    Ok(board) => {
                        self.position = Box::new(Position::new_match(color, board, Vec::new()));
                        self.reset_engines();
                        (true, String::new())
                    }
                    Err(e) => (false, e.to_string()),
                }
            }

            _ => (false, format!("unknown command: {command}")),
        }
    }

    /// Move to the child at `slot`, dropping the rest of the tree.
    fn advance(&mut self, slot: usize) {
        let child = self.position.take_child(slot);
        self.position = child;
        self.reset_engines();
        info!(color = %self.position.color(), over = self.position.is_over(), "applied move");
    }

    fn reset_engines(&mut self) {
        self.black.reset();
        self.white.reset();
    }

    /// Search with both engines and tabulate probabilities and child values.
    fn analyze(&mut self) -> String {
        let black = self.black.move_probabilities(&mut self.position);
        let white = self.white.move_probabilities(&mut self.position);

        let mut table = format!(
            "{:<3}{:<5}{:<12}{:<12}{:<12}{:<12}",
            "i", "Move", "Prob B", "Prob W", "Value B", "Value W"
        );
        let value = |v: Option<f32>| v.map_or_else(|| "-".to_string(), |v| format!("{v:.4}"));
        for slot in 0..self.position.move_count() {
            let mv = self.position.move_at(slot);
            let child = self.position.child(slot);
            let _ = write!(
                table,
                "\n{:<3}{:<5}{:<12.4}{:<12.4}{:<12}{:<12}",
                slot,
                mv.to_string(),
                black[mv.index()],
                white[mv.index()],
                value(self.black.move_value(child)),
                value(self.white.move_value(child)),
            );
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn console() -> Console {
        let config = SearchConfig::default().with_simulations(10).with_seed(1);
        Console::new(
            build_engine(EngineKind::Rollout, &config).unwrap(),
            build_engine(EngineKind::Uniform, &config).unwrap(),
        )
    }

    fn tiny_board() -> String {
        "..".chars().chain(std::iter::repeat('#').take(AREA - 2)).collect()
    }

    #[test]
    fn test_name_and_known_command() {
        let mut console = console();
        assert_eq!(console.execute("name", &[]), (true, "wallgo".to_string()));
        assert_eq!(console.execute("known_command", &["analyze"]).1, "true");
        assert_eq!(console.execute("known_command", &["komi"]).1, "false");
        assert!(!console.execute("komi", &["7.5"]).0);
    }

    #[test]
    fn test_play_and_illegal_move() {
        let mut console = console();
        // Cell 0 is a wall in the opening layout
        assert_eq!(console.execute("play", &["0"]), (false, "illegal move".to_string()));
        assert!(console.execute("play", &["6"]).0);
        assert_eq!(console.position().color(), Color::White);
        assert_eq!(console.position().board()[6], Cell::Stone(Color::Black));
        assert!(!console.execute("play", &["x"]).0);
    }

    #[test]
    fn test_new_and_score() {
        let mut console = console();
        let board = tiny_board();
        assert!(!console.execute("new", &["Q", &board]).0);
        assert!(console.execute("new", &["O", &board]).0);
        assert_eq!(console.execute("moves", &[]).1, "-1 0 1");
        assert!(!console.execute("score", &[]).0);
        assert!(console.execute("play", &["-1"]).0);
        assert!(console.execute("play", &["-1"]).0);
        assert_eq!(console.execute("score", &[]), (true, "0".to_string()));
        assert!(!console.execute("genmove", &[]).0);
    }

    #[test]
    fn test_genmove_and_analyze() {
        let mut console = console();
        let board = tiny_board();
        console.execute("new", &["X", &board]);
        let (success, table) = console.execute("analyze", &[]);
        assert!(success);
        assert_eq!(table.lines().count(), 4);
        let (success, mv) = console.execute("genmove", &[]);
        assert!(success);
        assert!(["-1", "0", "1"].contains(&mv.as_str()));
        assert_eq!(console.position().color(), Color::White);
    }

    #[test]
    fn test_analyze_values_every_visited_move() {
        let config = SearchConfig::default().with_simulations(40).with_seed(2);
        let black = build_engine(EngineKind::Rollout, &config).unwrap();
        let config = config.with_seed(3);
        let white = build_engine(EngineKind::Rollout, &config).unwrap();
        let mut console = Console::new(black, white);
        let (success, table) = console.execute("analyze", &[]);
        assert!(success);
        for row in table.lines().skip(1) {
            let columns: Vec<&str> = row.split_whitespace().collect();
            assert_eq!(columns.len(), 6, "row {row}");
            for (prob, value) in [(columns[2], columns[4]), (columns[3], columns[5])] {
                let prob: f32 = prob.parse().unwrap();
                if prob > 0.0 {
                    assert_ne!(value, "-", "row {row}");
                }
            }
        }
    }

    #[test]
    fn test_play_rejects_negative_moves_other_than_pass() {
        let mut console = console();
        assert_eq!(console.execute("play", &["-7"]), (false, "invalid move".to_string()));
        assert_eq!(console.position().color(), Color::Black);
        assert!(console.execute("play", &["-1"]).0);
        assert_eq!(console.position().color(), Color::White);
    }

    #[test]
    fn test_run_loop() {
        let mut console = console();
        let input = "name\n\nbogus\nquit\nname\n";
        let mut output = Vec::new();
        console.run(input.as_bytes(), &mut output).unwrap();
        let text = String::from_utf8(output).unwrap();
        assert_eq!(text, "= wallgo\n\n? unknown command: bogus\n\n= \n\n");
    }
}
