//! Self-play configuration loaded from TOML.
//!
//! Every field has a default, so a partial file only overrides what it names.
//! A missing or malformed file falls back to the defaults with a warning.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{info, warn};

use crate::constants::DEFAULT_SIMULATIONS;

/// Settings of a self-play run.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SelfPlayConfig {
    /// Matches to play
    pub episodes: u32,
    /// Simulations per searched turn
    pub simulations: u32,
    /// Turns at the start of a match whose move is sampled from the search
    /// distribution instead of taking the most visited move
    pub exploration_turns: u32,
    /// Weight of the match result in the value target, in [0, 1]
    pub result_weight: f32,
    /// Seed for boards, move sampling and the engine; `None` seeds from the OS
    pub seed: Option<u64>,
    /// File the examples are appended to
    pub examples_path: PathBuf,
    /// File the match results are appended to
    pub results_path: PathBuf,
}

impl Default for SelfPlayConfig {
    fn default() -> Self {
        Self {
            episodes: 10,
            simulations: DEFAULT_SIMULATIONS,
            exploration_turns: 10,
            result_weight: 0.5,
            seed: None,
            examples_path: PathBuf::from("selfplay.ex"),
            results_path: PathBuf::from("selfplay.gm"),
        }
    }
}

impl SelfPlayConfig {
    /// Load from `path`, falling back to defaults if it cannot be read or parsed.
    pub fn load_from_path(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => {
                    info!("Loaded self-play config from {}", path.display());
                    config
                }
                Err(e) => {
                    warn!("Failed to parse {}: {}, using defaults", path.display(), e);
                    Self::default()
                }
            },
            Err(e) => {
                warn!("Failed to read {}: {}, using defaults", path.display(), e);
                Self::default()
            }
        }
    }
}
