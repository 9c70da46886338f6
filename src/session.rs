//! One game against the engine.
//!
//! A [`GameSession`] owns everything that changes during a game: the board,
//! the player to move, the node store and the move-order hint. Human moves go
//! through [`GameSession::commit_move`]; an engine turn runs search iterations
//! in whatever batches the host likes and then calls
//! [`GameSession::pick_and_commit_engine_move`].

use fastrand::Rng;
use tracing::debug;

use crate::board::{Board, Outcome, Player, format_point};
use crate::config::EngineConfig;
use crate::constants::PROGRESS_CHUNKS;
use crate::error::EngineError;
use crate::policy::{MoveChoice, choose_move};
use crate::search::{Iteration, SearchParams, Searcher, scan_order};
use crate::transposition::{Node, NodeStore};

/// Displayable state of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub board: Board,
    pub turn: Player,
    pub result: Outcome,
}

/// Game state plus the search state shared across the whole game.
pub struct GameSession {
    config: EngineConfig,
    board: Board,
    turn: Player,
    moves_made: usize,
    result: Outcome,
    store: NodeStore,
    move_order: Vec<usize>,
    scan_order: Vec<usize>,
    closeby_distance: usize,
    rng: Rng,
}

impl GameSession {
    /// Start a game on a `dimension x dimension` board with default settings.
    ///
    /// # Errors
    /// [`EngineError::UnsupportedPlayers`] unless `players` is 2, and
    /// [`EngineError::InvalidDimension`] for a zero-sized board or one wider
    /// than [`MAX_DIMENSION`](crate::constants::MAX_DIMENSION).
    pub fn new_game(dimension: usize, players: usize) -> Result<Self, EngineError> {
        Self::with_config(
            EngineConfig::default()
                .with_dimension(dimension)
                .with_players(players),
        )
    }

    /// Start a game with explicit settings.
    pub fn with_config(config: EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;
        let rng = config.seed.map_or_else(Rng::new, Rng::with_seed);
        let num_cells = config.dimension * config.dimension;
        Ok(Self {
            board: Board::new(config.dimension),
            turn: Player::Black,
            moves_made: 0,
            result: Outcome::Undetermined,
            store: NodeStore::seeded(config.dimension),
            move_order: Vec::new(),
            scan_order: scan_order(&[], num_cells),
            closeby_distance: config.closeby_distance,
            rng,
            config,
        })
    }

    /// Clear the board and the node store, keeping settings and RNG state.
    pub fn restart(&mut self) {
        self.board = Board::new(self.config.dimension);
        self.turn = Player::Black;
        self.moves_made = 0;
        self.result = Outcome::Undetermined;
        self.store = NodeStore::seeded(self.config.dimension);
        self.set_move_order(Vec::new());
        self.closeby_distance = self.config.closeby_distance;
    }

    /// Play `index` for the player to move.
    ///
    /// Returns the result of the game after the move, `Undetermined` while
    /// it goes on. The result is what the board shows, not what the search
    /// may have proven about the position.
    ///
    /// # Errors
    /// - [`EngineError::GameEnded`] if the game already has a result
    /// - [`EngineError::IllegalMove`] if the point is occupied or off-board
    pub fn commit_move(&mut self, index: usize) -> Result<Outcome, EngineError> {
        if self.result.is_solved() {
            return Err(EngineError::GameEnded {
                result: self.result,
            });
        }
        let mover = self.turn;
        let board = self.board.apply(index, mover)?;
        self.turn = mover.next();
        self.moves_made += 1;

        let outcome = board.evaluate(index, mover, self.moves_made == board.num_cells());
        if !self.store.contains(&board) {
            self.store.insert(board.clone(), Node::new(outcome))?;
        }
        self.result = outcome;
        self.board = board;

        if self.config.prune_on_move {
            let removed = self
                .store
                .prune(self.board.num_cells() - self.moves_made, &self.board);
            debug!(
                nodes = self.store.len(),
                removed,
                pruned_total = self.store.pruned_total(),
                "node store pruned"
            );
        }
        if self
            .config
            .closeby_move_limit
            .is_some_and(|limit| self.moves_made > limit)
        {
            self.closeby_distance = self.config.raised_closeby_distance;
        }

        debug!(
            mv = %format_point(index, self.board.dimension()),
            player = %mover,
            %outcome,
            "move committed"
        );
        Ok(outcome)
    }

    /// Run one search iteration from the current position.
    pub fn iterate(&mut self) -> Result<Iteration, EngineError> {
        let params = SearchParams {
            closeby_distance: self.closeby_distance,
            exploration: self.config.exploration,
        };
        Searcher::new(&mut self.store, &mut self.rng, &self.scan_order, params)
            .iterate(&self.board, self.turn)
    }

    /// Run up to `n` search iterations.
    ///
    /// Returns `false` as soon as an iteration finds the current position
    /// solved, since further search cannot change the engine's move.
    pub fn run_iterations(&mut self, n: usize) -> Result<bool, EngineError> {
        for _ in 0..n {
            if self.iterate()? == Iteration::Solved {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Run `total` iterations in chunks, logging progress in between.
    ///
    /// Same contract as [`GameSession::run_iterations`]; a host that needs to
    /// stay responsive can do its own chunking instead.
    pub fn think(&mut self, total: usize) -> Result<bool, EngineError> {
        let chunk = total.div_ceil(PROGRESS_CHUNKS).max(1);
        let mut done = 0;
        while done < total {
            let n = chunk.min(total - done);
            if !self.run_iterations(n)? {
                debug!(done, total, "position solved, search stopped");
                return Ok(false);
            }
            done += n;
            debug!(progress = done * 100 / total, "thinking");
        }
        Ok(true)
    }

    /// Choose the engine's move from the search statistics and play it.
    pub fn engine_move(&mut self) -> Result<MoveChoice, EngineError> {
        if self.result.is_solved() {
            return Err(EngineError::GameEnded {
                result: self.result,
            });
        }
        let choice = choose_move(&self.board, self.turn, &self.store, &mut self.rng)?;
        if let Some(order) = &choice.move_order {
            self.set_move_order(order.clone());
        }
        self.commit_move(choice.index)?;
        Ok(choice)
    }

    /// Choose the engine's move, play it and return its index.
    pub fn pick_and_commit_engine_move(&mut self) -> Result<usize, EngineError> {
        self.engine_move().map(|choice| choice.index)
    }

    fn set_move_order(&mut self, order: Vec<usize>) {
        self.scan_order = scan_order(&order, self.board.num_cells());
        self.move_order = order;
    }

    #[inline]
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Player to move.
    #[inline]
    pub fn turn(&self) -> Player {
        self.turn
    }

    #[inline]
    pub fn moves_made(&self) -> usize {
        self.moves_made
    }

    /// Game result, `Undetermined` while the game goes on.
    #[inline]
    pub fn result(&self) -> Outcome {
        self.result
    }

    #[inline]
    pub fn is_over(&self) -> bool {
        self.result.is_solved()
    }

    #[inline]
    pub fn store(&self) -> &NodeStore {
        &self.store
    }

    /// Move-order hint used to scan candidates in the next search.
    #[inline]
    pub fn move_order(&self) -> &[usize] {
        &self.move_order
    }

    /// Node of the current position.
    pub fn root_node(&self) -> Option<&Node> {
        self.store.get(&self.board)
    }

    /// Current closeby search distance.
    #[inline]
    pub fn closeby_distance(&self) -> usize {
        self.closeby_distance
    }

    #[inline]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            board: self.board.clone(),
            turn: self.turn,
            result: self.result,
        }
    }
}

/// Number of iterations to spend on a move: the budget grows with the number
/// of moves already made, and the opening move gets a tenth of it.
pub fn iteration_budget(base: usize, moves_made: usize) -> usize {
    let budget = base + base * moves_made / 10;
    if moves_made == 0 { budget / 10 } else { budget }
}
