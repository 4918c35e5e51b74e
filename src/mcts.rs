//! Monte Carlo Tree Search over the position tree.
//!
//! The search walks the tree owned by the root [`Position`] and keeps its own
//! statistics in a table keyed by [`PositionId`]. Two policies share the same
//! mechanics:
//! - [`RolloutUct`]: leaves are valued by a random playout, children are
//!   chosen with UCT, and the best move is the one with the best mean value
//! - [`OraclePuct`]: leaves are valued by an [`Evaluator`], children are chosen
//!   with PUCT using its priors, and the best move is the most visited one
//!
//! Each simulation is a recursive descent: new nodes are evaluated, finished
//! nodes return their score, and every node on the way back up records the
//! value. Values are always from White's point of view.

use std::collections::HashMap;

use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use rand_distr::{Distribution, Gamma};
use thiserror::Error;
use tracing::{debug, trace};

use crate::board::Color;
use crate::constants::{
    DEFAULT_SIMULATIONS, DIRICHLET_ALPHA, DIRICHLET_EPSILON, EXPLORATION_PARAMETER, NUM_MOVES,
};
use crate::evaluator::Evaluator;
use crate::playout::playout;
use crate::position::{Move, Position, PositionId};

/// Errors raised while building a search engine.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("invalid Dirichlet parameters: {0}")]
    InvalidNoise(String),
}

// =============================================================================
// Configuration
// =============================================================================

/// Configuration for a search engine.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Simulations per search (at least 1)
    pub simulations: u32,
    /// Exploration constant of the selection formula
    pub exploration: f32,
    /// Gamma shape for root noise (guided policy only)
    pub dirichlet_alpha: f64,
    /// Weight of the root noise in the blended prior
    pub dirichlet_epsilon: f32,
    /// Seed for the engine's random source; `None` seeds from the OS
    pub seed: Option<u64>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            simulations: DEFAULT_SIMULATIONS,
            exploration: EXPLORATION_PARAMETER,
            dirichlet_alpha: DIRICHLET_ALPHA,
            dirichlet_epsilon: DIRICHLET_EPSILON,
            seed: None,
        }
    }
}

impl SearchConfig {
    pub fn with_simulations(mut self, n: u32) -> Self {
        self.simulations = n;
        self
    }

    pub fn with_exploration(mut self, c: f32) -> Self {
        self.exploration = c;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_dirichlet(mut self, alpha: f64, epsilon: f32) -> Self {
        self.dirichlet_alpha = alpha;
        self.dirichlet_epsilon = epsilon;
        self
    }
}

// =============================================================================
// Node statistics
// =============================================================================

/// Search statistics of one position.
#[derive(Debug, Clone, Default)]
pub struct NodeStats {
    /// Number of simulations that passed through the node
    pub visits: u32,
    /// Sum of the values of those simulations
    pub total_value: f32,
    /// Prior per move, indexed by [`Move::index`] (guided policy only)
    pub priors: Vec<f32>,
}

impl NodeStats {
    fn new(priors: Vec<f32>) -> Self {
        Self {
            visits: 0,
            total_value: 0.0,
            priors,
        }
    }

    /// Average value, from White's point of view.
    pub fn mean_value(&self) -> f32 {
        self.total_value / self.visits as f32
    }

    fn record(&mut self, value: f32) {
        self.visits += 1;
        self.total_value += value;
    }
}

/// Mean value of a child mapped into [0, 1] for the player choosing it.
#[inline]
fn exploitation(mover: Color, child: &NodeStats) -> f32 {
    match mover {
        Color::White => (1.0 + child.mean_value()) / 2.0,
        Color::Black => (1.0 - child.mean_value()) / 2.0,
    }
}

// =============================================================================
// Policies
// =============================================================================

/// Value (and priors, for guided policies) of a freshly reached node.
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub value: f32,
    /// Prior per move, indexed by [`Move::index`]; empty when unused
    pub priors: Vec<f32>,
}

/// Noise to blend into the root prior before a search.
#[derive(Debug, Clone)]
pub struct RootNoise {
    /// Weight of `samples` in the blended prior
    pub weight: f32,
    /// One normalized sample per legal root move, in move-list order
    pub samples: Vec<f32>,
}

/// The parts of MCTS that differ between search flavors.
pub trait SearchPolicy {
    /// Evaluate a node reached for the first time.
    fn evaluate(&mut self, position: &mut Position, rng: &mut ChaCha20Rng) -> Evaluation;

    /// Score of the child reached by `mv` during selection. The highest score
    /// wins; ties keep the earliest slot.
    fn selection_score(
        &self,
        mover: Color,
        parent: &NodeStats,
        child: Option<&NodeStats>,
        mv: Move,
    ) -> f32;

    /// Pick the move to play from the children's statistics.
    fn best_slot(&self, mover: Color, children: &[Option<&NodeStats>]) -> usize;

    /// Noise for the root prior, if this policy uses any.
    fn root_noise(&mut self, _moves: usize, _rng: &mut ChaCha20Rng) -> Option<RootNoise> {
        None
    }
}

/// Plain UCT with random playouts.
#[derive(Debug, Clone)]
pub struct RolloutUct {
    exploration: f32,
}

impl RolloutUct {
    pub fn new(exploration: f32) -> Self {
        Self { exploration }
    }
}

impl Default for RolloutUct {
    fn default() -> Self {
        Self::new(EXPLORATION_PARAMETER)
    }
}

impl SearchPolicy for RolloutUct {
    fn evaluate(&mut self, position: &mut Position, rng: &mut ChaCha20Rng) -> Evaluation {
        let value = playout(position, rng);
        // Unexplored children are tried in move-list order
        position.shuffle_moves(rng);
        Evaluation {
            value,
            priors: Vec::new(),
        }
    }

    fn selection_score(
        &self,
        mover: Color,
        parent: &NodeStats,
        child: Option<&NodeStats>,
        _mv: Move,
    ) -> f32 {
        let Some(child) = child else {
            return f32::INFINITY;
        };
        let explore = self.exploration
            * ((parent.visits as f32).ln() / (child.visits as f32 + 1.0)).sqrt();
        exploitation(mover, child) + explore
    }

    fn best_slot(&self, mover: Color, children: &[Option<&NodeStats>]) -> usize {
        let mut best = 0;
        let mut best_value = f32::NEG_INFINITY;
        for (slot, child) in children.iter().enumerate() {
            let Some(child) = child else { continue };
            let value = match mover {
                Color::White => child.mean_value(),
                Color::Black => -child.mean_value(),
            };
            if value > best_value {
                best_value = value;
                best = slot;
            }
        }
        best
    }
}

/// PUCT guided by an [`Evaluator`].
pub struct OraclePuct<E> {
    evaluator: E,
    exploration: f32,
    gamma: Gamma<f64>,
    noise_weight: f32,
}

impl<E: Evaluator> OraclePuct<E> {
    pub fn new(evaluator: E, config: &SearchConfig) -> Result<Self, SearchError> {
        let gamma = Gamma::new(config.dirichlet_alpha, 1.0)
            .map_err(|e| SearchError::InvalidNoise(e.to_string()))?;
        if !(0.0..=1.0).contains(&config.dirichlet_epsilon) {
            return Err(SearchError::InvalidNoise(format!(
                "epsilon {} outside [0, 1]",
                config.dirichlet_epsilon
            )));
        }
        Ok(Self {
            evaluator,
            exploration: config.exploration,
            gamma,
            noise_weight: config.dirichlet_epsilon,
        })
    }
}

impl<E: Evaluator> SearchPolicy for OraclePuct<E> {
    fn evaluate(&mut self, position: &mut Position, _rng: &mut ChaCha20Rng) -> Evaluation {
        let prediction = self.evaluator.predict(position);
        let moves = position.valid_moves();
        let mut priors = vec![0.0; NUM_MOVES];
        for mv in &moves {
            let p = prediction.priors.get(mv.index()).copied().unwrap_or(0.0);
            priors[mv.index()] = p.max(0.0);
        }

        // Illegal entries stay at zero
        let sum: f32 = priors.iter().sum();
        if sum > 0.0 {
            priors.iter_mut().for_each(|p| *p /= sum);
        } else {
            let uniform = 1.0 / moves.len() as f32;
            for mv in &moves {
                priors[mv.index()] = uniform;
            }
        }

        Evaluation {
            value: prediction.value,
            priors,
        }
    }

    fn selection_score(
        &self,
        mover: Color,
        parent: &NodeStats,
        child: Option<&NodeStats>,
        mv: Move,
    ) -> f32 {
        let prior = parent.priors.get(mv.index()).copied().unwrap_or(0.0);
        let explore = self.exploration * prior * (parent.visits as f32 + 1.0).sqrt();
        match child {
            Some(child) => exploitation(mover, child) + explore / (child.visits as f32 + 1.0),
            None => 0.5 + explore,
        }
    }

    fn best_slot(&self, _mover: Color, children: &[Option<&NodeStats>]) -> usize {
        let mut best = 0;
        let mut most_visits = None;
        for (slot, child) in children.iter().enumerate() {
            let visits = child.map_or(0, |c| c.visits);
            if most_visits.is_none_or(|m| visits > m) {
                most_visits = Some(visits);
                best = slot;
            }
        }
        best
    }

    fn root_noise(&mut self, moves: usize, rng: &mut ChaCha20Rng) -> Option<RootNoise> {
        let mut samples: Vec<f32> = (0..moves).map(|_| self.gamma.sample(rng) as f32).collect();
        let sum: f32 = samples.iter().sum();
        if sum > 0.0 {
            samples.iter_mut().for_each(|s| *s /= sum);
        }
        Some(RootNoise {
            weight: self.noise_weight,
            samples,
        })
    }
}

// =============================================================================
// Engine
// =============================================================================

/// Operations a game driver needs from a search engine.
pub trait MoveSearch {
    /// Run a search from `root` and return each move's share of the root's
    /// visits, indexed by [`crate::position::Move::index`].
    fn move_probabilities(&mut self, root: &mut Position) -> Vec<f32>;

    /// Run a search from `root` and return the slot of the chosen move.
    fn best_move(&mut self, root: &mut Position) -> usize;

    /// Mean value of a searched position, `None` if it was never visited.
    fn move_value(&self, position: &Position) -> Option<f32>;

    /// Forget all statistics.
    fn reset(&mut self);
}

/// MCTS engine parameterized by its policy.
pub struct SearchEngine<P> {
    policy: P,
    simulations: u32,
    stats: HashMap<PositionId, NodeStats>,
    rng: ChaCha20Rng,
}

impl SearchEngine<RolloutUct> {
    /// Engine with random playouts.
    pub fn rollout(config: &SearchConfig) -> Self {
        Self::new(RolloutUct::new(config.exploration), config)
    }
}

impl<E: Evaluator> SearchEngine<OraclePuct<E>> {
    /// Engine guided by `evaluator`.
    pub fn guided(evaluator: E, config: &SearchConfig) -> Result<Self, SearchError> {
        Ok(Self::new(OraclePuct::new(evaluator, config)?, config))
    }
}

impl<P: SearchPolicy> SearchEngine<P> {
    pub fn new(policy: P, config: &SearchConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => ChaCha20Rng::seed_from_u64(seed),
            None => ChaCha20Rng::from_entropy(),
        };
        Self {
            policy,
            simulations: config.simulations.max(1),
            stats: HashMap::new(),
            rng,
        }
    }

    pub fn simulations(&self) -> u32 {
        self.simulations
    }

    /// Set the number of simulations per search (at least 1).
    pub fn set_simulations(&mut self, simulations: u32) {
        self.simulations = simulations.max(1);
    }

    pub fn stats(&self, position: &Position) -> Option<&NodeStats> {
        self.stats.get(&position.id())
    }

    pub fn visits(&self, position: &Position) -> Option<u32> {
        self.stats(position).map(|s| s.visits)
    }

    fn run_simulations(&mut self, root: &mut Position) {
        for _ in 0..self.simulations {
            self.simulate(root);
        }
        debug!(
            simulations = self.simulations,
            nodes = self.stats.len(),
            root_visits = self.visits(root).unwrap_or(0),
            "search batch complete"
        );
    }

    /// One selection/evaluation/backpropagation pass below `node`.
    fn simulate(&mut self, node: &mut Position) -> f32 {
        let id = node.id();
        let value = if !self.stats.contains_key(&id) {
            let evaluation = self.policy.evaluate(node, &mut self.rng);
            self.stats.insert(id, NodeStats::new(evaluation.priors));
            trace!(value = evaluation.value, "evaluated new leaf");
            evaluation.value
        } else if let Some(score) = node.end_state() {
            score
        } else {
            let slot = self.select(node);
            self.simulate(node.child(slot))
        };

        if let Some(stats) = self.stats.get_mut(&id) {
            stats.record(value);
        }
        value
    }

    /// Slot of the child with the highest selection score.
    fn select(&self, node: &mut Position) -> usize {
        let mover = node.color();
        let parent = &self.stats[&node.id()];
        let mut best = 0;
        let mut best_score = f32::NEG_INFINITY;
        for slot in 0..node.move_count() {
            let mv = node.move_at(slot);
            let child = self.stats.get(&node.child(slot).id());
            let score = self.policy.selection_score(mover, parent, child, mv);
            if score > best_score {
                best_score = score;
                best = slot;
            }
        }
        best
    }

    fn children_stats<'a>(&'a self, root: &mut Position) -> Vec<Option<&'a NodeStats>> {
        (0..root.move_count())
            .map(|slot| self.stats.get(&root.child(slot).id()))
            .collect()
    }

    /// Blend root noise into the root prior, evaluating the root first if needed.
    fn add_root_noise(&mut self, root: &mut Position) {
        let moves = root.valid_moves();
        let Some(noise) = self.policy.root_noise(moves.len(), &mut self.rng) else {
            return;
        };

        let id = root.id();
        if !self.stats.contains_key(&id) {
            let evaluation = self.policy.evaluate(root, &mut self.rng);
            let mut stats = NodeStats::new(evaluation.priors);
            stats.record(evaluation.value);
            self.stats.insert(id, stats);
        }
        if let Some(stats) = self.stats.get_mut(&id) {
            for (mv, sample) in moves.iter().zip(&noise.samples) {
                if let Some(prior) = stats.priors.get_mut(mv.index()) {
                    *prior = (1.0 - noise.weight) * *prior + noise.weight * sample;
                }
            }
        }
    }
}

impl<P: SearchPolicy> MoveSearch for SearchEngine<P> {
    fn move_probabilities(&mut self, root: &mut Position) -> Vec<f32> {
        self.add_root_noise(root);
        self.run_simulations(root);

        let total = self.visits(root).map_or(1.0, |v| v as f32);
        let mut probabilities = vec![0.0; NUM_MOVES];
        for slot in 0..root.move_count() {
            let mv = root.move_at(slot);
            if let Some(child) = self.stats.get(&root.child(slot).id()) {
                probabilities[mv.index()] = child.visits as f32 / total;
            }
        }
        probabilities
    }

    fn best_move(&mut self, root: &mut Position) -> usize {
        self.run_simulations(root);
        let mover = root.color();
        let children = self.children_stats(root);
        self.policy.best_slot(mover, &children)
    }

    fn move_value(&self, position: &Position) -> Option<f32> {
        self.stats(position).map(NodeStats::mean_value)
    }

    fn reset(&mut self) {
        self.stats.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Board, Cell};
    use crate::constants::AREA;
    use crate::evaluator::{Prediction, UniformEvaluator};

    /// A board where only the first `open` cells are playable.
    fn small_board(open: usize) -> Board {
        let mut board = Board::empty();
        for pt in open..AREA {
            board[pt] = Cell::Wall;
        }
        board
    }

    fn stats(visits: u32, total_value: f32) -> NodeStats {
        NodeStats {
            visits,
            total_value,
            priors: Vec::new(),
        }
    }

    #[test]
    fn test_exploitation_perspective() {
        let child = stats(4, 4.0);
        assert_eq!(exploitation(Color::White, &child), 1.0);
        assert_eq!(exploitation(Color::Black, &child), 0.0);
    }

    #[test]
    fn test_uct_prefers_unvisited() {
        let policy = RolloutUct::default();
        let parent = stats(10, 0.0);
        let visited = stats(5, 5.0);
        assert!(
            policy.selection_score(Color::White, &parent, None, Move::Pass)
                > policy.selection_score(Color::White, &parent, Some(&visited), Move::Place(0))
        );
    }

    #[test]
    fn test_uct_best_slot_by_mover() {
        let policy = RolloutUct::default();
        let good_for_white = stats(2, 2.0);
        let good_for_black = stats(2, -2.0);
        let children = [None, Some(&good_for_white), Some(&good_for_black)];
        assert_eq!(policy.best_slot(Color::White, &children), 1);
        assert_eq!(policy.best_slot(Color::Black, &children), 2);
        assert_eq!(policy.best_slot(Color::Black, &[None, None]), 0);
    }

    #[test]
    fn test_puct_unvisited_substitute() {
        let config = SearchConfig::default();
        let policy = OraclePuct::new(UniformEvaluator::new(), &config).unwrap();
        let mut parent = stats(3, 0.0);
        parent.priors = vec![0.0; NUM_MOVES];
        parent.priors[Move::Pass.index()] = 0.5;
        parent.priors[Move::Place(3).index()] = 0.5;
        let score = policy.selection_score(Color::Black, &parent, None, Move::Place(3));
        let expected = 0.5 + EXPLORATION_PARAMETER * 0.5 * 2.0;
        assert!((score - expected).abs() < 1e-5);
        let score = policy.selection_score(Color::Black, &parent, None, Move::Place(1));
        assert!((score - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_puct_without_exploration() {
        let config = SearchConfig::default().with_exploration(0.0);
        let policy = OraclePuct::new(UniformEvaluator::new(), &config).unwrap();
        let mut parent = stats(8, 0.0);
        parent.priors = vec![1.0 / NUM_MOVES as f32; NUM_MOVES];
        let child = stats(2, 2.0);
        let unvisited = policy.selection_score(Color::White, &parent, None, Move::Pass);
        let visited = policy.selection_score(Color::White, &parent, Some(&child), Move::Pass);
        assert_eq!(unvisited, 0.5);
        assert_eq!(visited, 1.0);
    }

    #[test]
    fn test_puct_best_slot_most_visited() {
        let config = SearchConfig::default();
        let policy = OraclePuct::new(UniformEvaluator::new(), &config).unwrap();
        let a = stats(3, 3.0);
        let b = stats(7, -7.0);
        assert_eq!(policy.best_slot(Color::White, &[Some(&a), None, Some(&b)]), 2);
    }

    #[test]
    fn test_invalid_noise_rejected() {
        let config = SearchConfig::default().with_dirichlet(-1.0, 0.25);
        assert!(OraclePuct::new(UniformEvaluator::new(), &config).is_err());
        let config = SearchConfig::default().with_dirichlet(1.0, 2.0);
        assert!(OraclePuct::new(UniformEvaluator::new(), &config).is_err());
    }

    #[test]
    fn test_root_visits_match_simulations() {
        let config = SearchConfig::default().with_simulations(30).with_seed(11);
        let mut engine = SearchEngine::rollout(&config);
        let mut root = Position::new_match(Color::Black, small_board(4), Vec::new());
        let slot = engine.best_move(&mut root);
        assert!(slot < root.move_count());
        assert_eq!(engine.visits(&root), Some(30));
    }

    #[test]
    fn test_minimum_one_simulation() {
        let config = SearchConfig::default().with_simulations(0);
        let mut engine = SearchEngine::rollout(&config);
        assert_eq!(engine.simulations(), 1);
        engine.set_simulations(40);
        assert_eq!(engine.simulations(), 40);
        engine.set_simulations(0);
        assert_eq!(engine.simulations(), 1);
    }

    #[test]
    fn test_finished_root_returns_score() {
        let config = SearchConfig::default().with_simulations(5).with_seed(2);
        let mut engine = SearchEngine::rollout(&config);
        let board = Board::with_cells(&[(0, Cell::Stone(Color::White))]);
        let mut pos = Position::new_match(Color::Black, board, Vec::new());
        let finished = pos.child(0).child(0);
        engine.best_move(finished);
        assert_eq!(engine.visits(finished), Some(5));
        assert_eq!(engine.move_value(finished), Some(1.0));
    }

    #[test]
    fn test_probabilities_are_visit_shares() {
        let config = SearchConfig::default().with_simulations(40).with_seed(5);
        let mut engine = SearchEngine::rollout(&config);
        let mut root = Position::new_match(Color::White, small_board(5), Vec::new());
        let probabilities = engine.move_probabilities(&mut root);
        assert_eq!(probabilities.len(), NUM_MOVES);
        let sum: f32 = probabilities.iter().sum();
        // The first simulation only evaluates the root itself
        assert!((sum - 39.0 / 40.0).abs() < 1e-4, "sum {sum}");
        for mv in (5..AREA).map(Move::Place) {
            assert_eq!(probabilities[mv.index()], 0.0);
        }
    }

    #[test]
    fn test_oracle_prior_concentrates_visits() {
        let target = Move::Place(2);
        let oracle = move |_: &Position| {
            let mut priors = vec![0.0; NUM_MOVES];
            priors[target.index()] = 1.0;
            Prediction { priors, value: 0.0 }
        };
        let config = SearchConfig::default().with_simulations(25).with_seed(3);
        let mut engine = SearchEngine::guided(oracle, &config).unwrap();
        let mut root = Position::new_match(Color::Black, small_board(6), Vec::new());
        let slot = engine.best_move(&mut root);
        assert_eq!(root.move_at(slot), target);
        let child = root.child(slot);
        assert_eq!(engine.visits(child), Some(24));
    }

    #[test]
    fn test_priors_follow_moves_when_another_engine_shuffles() {
        let target = Move::Place(4);
        let oracle = move |_: &Position| {
            let mut priors = vec![0.0; NUM_MOVES];
            priors[target.index()] = 1.0;
            Prediction { priors, value: 0.0 }
        };
        let config = SearchConfig::default().with_simulations(10).with_seed(6);
        let mut guided = SearchEngine::guided(oracle, &config).unwrap();
        let mut rollout = SearchEngine::rollout(&config);
        let mut root = Position::new_match(Color::Black, small_board(6), Vec::new());

        guided.best_move(&mut root);
        // The rollout engine reorders the shared root's move list
        rollout.best_move(&mut root);
        let slot = guided.best_move(&mut root);
        assert_eq!(root.move_at(slot), target);
        let child = root.child(slot);
        assert_eq!(guided.visits(child), Some(19));
    }

    #[test]
    fn test_dirichlet_noise_seeds_root() {
        let config = SearchConfig::default().with_simulations(10).with_seed(9);
        let mut engine = SearchEngine::guided(UniformEvaluator::new(), &config).unwrap();
        let mut root = Position::new_match(Color::Black, small_board(6), Vec::new());
        let probabilities = engine.move_probabilities(&mut root);

        let stats = engine.stats(&root).unwrap();
        // One visit from the noise evaluation plus one per simulation
        assert_eq!(stats.visits, 11);
        assert_eq!(stats.priors.len(), NUM_MOVES);
        let prior_sum: f32 = stats.priors.iter().sum();
        assert!((prior_sum - 1.0).abs() < 1e-4);
        let moves = root.valid_moves();
        let uniform = 1.0 / moves.len() as f32;
        assert!(moves.iter().any(|mv| (stats.priors[mv.index()] - uniform).abs() > 1e-6));
        for mv in (6..AREA).map(Move::Place) {
            assert_eq!(stats.priors[mv.index()], 0.0);
        }

        let sum: f32 = probabilities.iter().sum();
        assert!((sum - 10.0 / 11.0).abs() < 1e-4, "sum {sum}");
    }

    #[test]
    fn test_reset_forgets_stats() {
        let config = SearchConfig::default().with_simulations(10).with_seed(4);
        let mut engine = SearchEngine::rollout(&config);
        let mut root = Position::new_match(Color::Black, small_board(4), Vec::new());
        engine.best_move(&mut root);
        assert!(engine.move_value(&root).is_some());
        engine.reset();
        assert_eq!(engine.move_value(&root), None);
    }

    #[test]
    fn test_tree_reuse_accumulates() {
        let config = SearchConfig::default().with_simulations(15).with_seed(8);
        let mut engine = SearchEngine::rollout(&config);
        let mut root = Position::new_match(Color::Black, small_board(4), Vec::new());
        engine.best_move(&mut root);
        engine.best_move(&mut root);
        assert_eq!(engine.visits(&root), Some(30));

        // A detached child keeps its identity, so its statistics stay valid
        let slot = engine.best_move(&mut root);
        let before = engine.visits(root.child(slot));
        let child = root.take_child(slot);
        assert_eq!(engine.visits(&child), before);
    }
}
