//! Position evaluators used by the guided search.
//!
//! An evaluator returns move priors and a value estimate for a position. In
//! self-play this is a neural network living outside this crate; here we only
//! define the boundary plus a uniform evaluator for testing and bootstrapping.

use crate::constants::NUM_MOVES;
use crate::position::Position;

/// Output of an evaluator.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    /// Probability per move, indexed by [`crate::position::Move::index`].
    /// Length is [`NUM_MOVES`]; entries for illegal moves are ignored.
    pub priors: Vec<f32>,

    /// Value estimate in [-1, 1]; positive favors White.
    pub value: f32,
}

/// Trait for position evaluators.
///
/// Must be callable any number of times. Results need not be deterministic.
pub trait Evaluator {
    fn predict(&self, position: &Position) -> Prediction;
}

impl<F> Evaluator for F
where
    F: Fn(&Position) -> Prediction,
{
    fn predict(&self, position: &Position) -> Prediction {
        self(position)
    }
}

/// Evaluator returning a flat prior and a neutral value.
#[derive(Debug, Clone, Copy, Default)]
pub struct UniformEvaluator;

impl UniformEvaluator {
    pub fn new() -> Self {
        Self
    }
}

impl Evaluator for UniformEvaluator {
    fn predict(&self, _position: &Position) -> Prediction {
        Prediction {
            priors: vec![1.0 / NUM_MOVES as f32; NUM_MOVES],
            value: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Board, Color};

    #[test]
    fn test_uniform_evaluator() {
        let pos = Position::new_match(Color::Black, Board::empty(), Vec::new());
        let prediction = UniformEvaluator::new().predict(&pos);
        assert_eq!(prediction.priors.len(), NUM_MOVES);
        let sum: f32 = prediction.priors.iter().sum();
        assert!((sum - 1.0).abs() < 1e-4);
        assert_eq!(prediction.value, 0.0);
    }

    #[test]
    fn test_closure_evaluator() {
        let pos = Position::new_match(Color::White, Board::empty(), Vec::new());
        let eval = |p: &Position| Prediction {
            priors: vec![0.0; NUM_MOVES],
            value: if p.color() == Color::White { 0.5 } else { -0.5 },
        };
        assert_eq!(eval.predict(&pos).value, 0.5);
    }
}
