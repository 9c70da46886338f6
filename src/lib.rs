//! Gomoku-MCTS: a Monte Carlo Tree Search Gomoku engine.
//!
//! Five in a row on an NxN board, searched with UCT over a transposition
//! table keyed by board contents. Positions whose every move is proven are
//! solved by minimax during the search, so the engine plays forced wins and
//! avoids forced losses once it has seen them.
//!
//! ## Modules
//!
//! - [`constants`] - Board geometry and engine defaults
//! - [`config`] - Runtime engine configuration
//! - [`error`] - Error types
//! - [`board`] - Board state, players, outcomes and win detection
//! - [`transposition`] - Node statistics and the node store
//! - [`playout`] - Random game simulation for position evaluation
//! - [`search`] - MCTS iterations with minimax solving
//! - [`policy`] - Final move selection
//! - [`session`] - One game against the engine
//! - [`protocol`] - Gomocup protocol front end
//!
//! ## Example
//!
//! ```
//! use gomoku_mcts::session::GameSession;
//!
//! // A 9x9 game with the human opening in the center
//! let mut game = GameSession::new_game(9, 2)?;
//! game.commit_move(40)?;
//!
//! // Search, then let the engine reply
//! game.run_iterations(200)?;
//! let reply = game.pick_and_commit_engine_move()?;
//! assert_ne!(reply, 40);
//! # Ok::<(), gomoku_mcts::error::EngineError>(())
//! ```

pub mod board;
pub mod config;
pub mod constants;
pub mod error;
pub mod playout;
pub mod policy;
pub mod protocol;
pub mod search;
pub mod session;
pub mod transposition;
