//! Self-play example generation.
//!
//! The engine plays both sides of a match. Each turn records the encoded
//! position, the search's move distribution and its value estimate. Once the
//! match ends, value targets are blended with the result.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use tracing::{debug, info};

use crate::board::Color;
use crate::config::SelfPlayConfig;
use crate::evaluator::UniformEvaluator;
use crate::mcts::{MoveSearch, SearchConfig, SearchEngine};
use crate::playout::random_board;
use crate::position::Position;
use crate::record::{self, TrainingExample, TurnRecord, encode_position};

/// Outcome of one self-play match.
#[derive(Debug, Clone)]
pub struct Episode {
    pub examples: Vec<TrainingExample>,
    /// Final score, positive favors White
    pub result: f32,
    pub turns: usize,
}

/// Pick a slot of `root` from a move distribution.
///
/// When `explore` is set the slot is sampled; otherwise it is the most likely
/// move (first on ties).
fn choose_slot<R: Rng + ?Sized>(
    root: &mut Position,
    probabilities: &[f32],
    explore: bool,
    rng: &mut R,
) -> usize {
    let moves = root.valid_moves();
    if explore {
        let target: f32 = rng.gen_range(0.0..1.0);
        let mut total = 0.0;
        for (slot, mv) in moves.iter().enumerate() {
            total += probabilities[mv.index()];
            if target < total {
                return slot;
            }
        }
        return 0;
    }

    let mut best = 0;
    let mut highest = f32::NEG_INFINITY;
    for (slot, mv) in moves.iter().enumerate() {
        if probabilities[mv.index()] > highest {
            highest = probabilities[mv.index()];
            best = slot;
        }
    }
    best
}

/// Play `root` out to the end with `engine` choosing every move.
pub fn play_episode<R: Rng + ?Sized>(
    engine: &mut dyn MoveSearch,
    root: Position,
    config: &SelfPlayConfig,
    rng: &mut R,
) -> Episode {
    let mut current = Box::new(root);
    let mut turns = Vec::new();

    let result = loop {
        if let Some(score) = current.end_state() {
            break score;
        }

        let probabilities = engine.move_probabilities(&mut current);
        let value = engine.move_value(&current);
        turns.push(TurnRecord {
            state: encode_position(&current),
            probabilities: probabilities.clone(),
            value,
        });

        let explore = turns.len() <= config.exploration_turns as usize;
        let slot = choose_slot(&mut current, &probabilities, explore, rng);
        debug!(turn = turns.len(), mv = %current.move_at(slot), explore, "self-play move");
        current = current.take_child(slot);
        engine.reset();
    };

    let count = turns.len();
    Episode {
        examples: TrainingExample::from_turns(turns, result, config.result_weight),
        result,
        turns: count,
    }
}

fn open_append(path: &Path) -> Result<BufWriter<File>> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening {}", path.display()))?;
    Ok(BufWriter::new(file))
}

/// Play `config.episodes` matches on random boards with the guided engine and
/// append the examples and results to the configured files.
pub fn run(config: &SelfPlayConfig) -> Result<Vec<f32>> {
    let mut rng = match config.seed {
        Some(seed) => ChaCha20Rng::seed_from_u64(seed),
        None => ChaCha20Rng::from_entropy(),
    };
    let mut search = SearchConfig::default().with_simulations(config.simulations);
    if let Some(seed) = config.seed {
        search = search.with_seed(seed.wrapping_add(1));
    }
    let mut engine = SearchEngine::guided(UniformEvaluator::new(), &search)?;

    let mut examples_out = open_append(&config.examples_path)?;
    let mut results_out = open_append(&config.results_path)?;

    let mut results = Vec::with_capacity(config.episodes as usize);
    for episode in 0..config.episodes {
        let root = Position::new_match(Color::White, random_board(&mut rng), Vec::new());
        let outcome = play_episode(&mut engine, root, config, &mut rng);

        record::save(&mut examples_out, &outcome.examples)
            .with_context(|| format!("writing {}", config.examples_path.display()))?;
        writeln!(results_out, "{}", outcome.result)
            .and_then(|_| results_out.flush())
            .with_context(|| format!("writing {}", config.results_path.display()))?;

        info!(
            episode = episode + 1,
            turns = outcome.turns,
            result = outcome.result,
            "finished self-play episode"
        );
        results.push(outcome.result);
    }
    Ok(results)
}
