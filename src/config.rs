//! Engine configuration parameters.

use crate::constants::{
    CLOSEBY_DISTANCE, DEFAULT_DIMENSION, EXPLORATION, MAX_DIMENSION, NUM_PLAYERS,
    RAISED_CLOSEBY_DISTANCE,
};
use crate::error::EngineError;

/// Configuration for one game.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Board size (NxN).
    pub dimension: usize,

    /// Number of players. Only two are supported.
    pub players: usize,

    /// UCT exploration constant.
    pub exploration: f64,

    /// Closeby distance at the start of the game.
    pub closeby_distance: usize,

    /// Closeby distance once more than `closeby_move_limit` moves were made.
    pub raised_closeby_distance: usize,

    /// Move count after which the closeby distance is raised.
    /// `None` keeps the initial distance for the whole game.
    pub closeby_move_limit: Option<usize>,

    /// Prune the node store after every committed move.
    /// Disabling it keeps every node for inspection in tests.
    pub prune_on_move: bool,

    /// Seed for the playout RNG. `None` seeds from entropy.
    pub seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            dimension: DEFAULT_DIMENSION,
            players: NUM_PLAYERS,
            exploration: EXPLORATION,
            closeby_distance: CLOSEBY_DISTANCE,
            raised_closeby_distance: RAISED_CLOSEBY_DISTANCE,
            closeby_move_limit: None,
            prune_on_move: true,
            seed: None,
        }
    }
}

impl EngineConfig {
    /// Create a deterministic config for testing.
    pub fn for_testing(dimension: usize) -> Self {
        Self::default().with_dimension(dimension).with_seed(7)
    }

    /// Builder pattern: set board dimension.
    pub fn with_dimension(mut self, dimension: usize) -> Self {
        self.dimension = dimension;
        self
    }

    /// Builder pattern: set number of players.
    pub fn with_players(mut self, players: usize) -> Self {
        self.players = players;
        self
    }

    /// Builder pattern: set RNG seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Builder pattern: raise the closeby distance after `limit` moves.
    pub fn with_closeby_move_limit(mut self, limit: usize) -> Self {
        self.closeby_move_limit = Some(limit);
        self
    }

    /// Builder pattern: enable or disable node store pruning.
    pub fn with_pruning(mut self, prune_on_move: bool) -> Self {
        self.prune_on_move = prune_on_move;
        self
    }

    /// Check that the configuration describes a playable game.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.players != NUM_PLAYERS {
            return Err(EngineError::UnsupportedPlayers(self.players));
        }
        if self.dimension == 0 || self.dimension > MAX_DIMENSION {
            return Err(EngineError::InvalidDimension(self.dimension));
        }
        Ok(())
    }
}
