//! Wallgo: Monte Carlo Tree Search for Go on small boards with walls.
//!
//! The game is Go on a tiny grid where some cells are permanently blocked.
//! Suicide is illegal, positional superko forbids repeating any earlier
//! board, and a match ends after two consecutive passes with area scoring.
//!
//! ## Modules
//!
//! - [`constants`] - Board dimensions and engine parameters
//! - [`board`] - Cells, colors and the neighbor table
//! - [`position`] - Game rules and the position tree
//! - [`playout`] - Random playouts and random boards
//! - [`evaluator`] - Prior/value oracles for the guided search
//! - [`mcts`] - The search engine and its two policies
//! - [`record`] - Training example encoding and files
//! - [`config`] - Self-play configuration
//! - [`selfplay`] - Example generation by self-play
//! - [`service`] - HTTP best-move service
//! - [`console`] - Interactive command loop
//!
//! ## Example
//!
//! ```
//! use wallgo::board::{Board, Color};
//! use wallgo::mcts::{MoveSearch, SearchConfig, SearchEngine};
//! use wallgo::position::Position;
//!
//! let mut root = Position::new_match(Color::Black, Board::empty(), Vec::new());
//! let mut engine = SearchEngine::rollout(&SearchConfig::default().with_simulations(20));
//! let slot = engine.best_move(&mut root);
//! println!("Best move: {}", root.move_at(slot));
//! ```

pub mod board;
pub mod config;
pub mod console;
pub mod constants;
pub mod evaluator;
pub mod mcts;
pub mod playout;
pub mod position;
pub mod record;
pub mod selfplay;
pub mod service;
