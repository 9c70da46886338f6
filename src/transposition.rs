//! Transposition table holding search statistics for every explored board.
//!
//! Nodes are keyed by the board itself, so a position reached through
//! different move orders shares one node for the whole game. The table is
//! pruned after every committed move with a cheap threshold rule on the number
//! of empty points rather than a reachability trace; some unreachable deeper
//! nodes survive a prune and are collected once their own ply goes stale.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use crate::board::{Board, Outcome, Player};
use crate::error::EngineError;

/// Search record for one board.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// Number of iterations that passed through this node
    pub visits: u32,
    /// Accumulated reward for the player to move here; `None` once solved
    pub score: Option<f64>,
    /// Proven result, `Undetermined` until solved
    pub evaluation: Outcome,
}

impl Node {
    /// Create a node for a freshly evaluated board.
    ///
    /// A node that is already decided carries no score.
    pub fn new(evaluation: Outcome) -> Self {
        Self {
            visits: 0,
            score: (!evaluation.is_solved()).then_some(0.0),
            evaluation,
        }
    }

    #[inline]
    pub fn is_solved(&self) -> bool {
        self.evaluation.is_solved()
    }

    /// Win rate for the player who moved *into* this node, as seen from the
    /// parent during selection.
    ///
    /// `None` for unvisited or solved nodes.
    pub fn parent_win_rate(&self) -> Option<f64> {
        match self.score {
            Some(score) if self.visits > 0 => Some(1.0 - score / self.visits as f64),
            _ => None,
        }
    }

    /// Mark the node as proven. A proof never changes once set, and a solved
    /// node stops accumulating statistics.
    pub fn solve(&mut self, evaluation: Outcome) {
        if self.is_solved() || !evaluation.is_solved() {
            return;
        }
        self.evaluation = evaluation;
        self.score = None;
    }

    /// Record one iteration through this node whose playout ended in
    /// `result`, `mover` being the player to move at this node.
    #[inline]
    pub fn record(&mut self, result: Outcome, mover: Player) {
        self.visits += 1;
        if let Some(score) = self.score.as_mut() {
            *score += result.reward(mover);
        }
    }
}

/// All nodes of the current game.
#[derive(Debug, Default)]
pub struct NodeStore {
    nodes: HashMap<Board, Node>,
    pruned: usize,
}

impl NodeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding only the empty-board root node.
    pub fn seeded(dimension: usize) -> Self {
        let mut store = Self::new();
        store.nodes.insert(Board::new(dimension), Node::new(Outcome::Undetermined));
        store
    }

    #[inline]
    pub fn get(&self, board: &Board) -> Option<&Node> {
        self.nodes.get(board)
    }

    #[inline]
    pub fn get_mut(&mut self, board: &Board) -> Option<&mut Node> {
        self.nodes.get_mut(board)
    }

    #[inline]
    pub fn contains(&self, board: &Board) -> bool {
        self.nodes.contains_key(board)
    }

    /// Store a node for a board that has none yet.
    ///
    /// # Errors
    /// [`EngineError::DuplicateNode`] if the board already has a node.
    pub fn insert(&mut self, board: Board, node: Node) -> Result<(), EngineError> {
        match self.nodes.entry(board) {
            Entry::Occupied(_) => Err(EngineError::DuplicateNode),
            Entry::Vacant(slot) => {
                slot.insert(node);
                Ok(())
            }
        }
    }

    /// Mark the node of `board` as proven, if it exists.
    pub fn solve(&mut self, board: &Board, evaluation: Outcome) {
        if let Some(node) = self.nodes.get_mut(board) {
            node.solve(evaluation);
        }
    }

    /// Drop stale nodes after a move was committed.
    ///
    /// Removes every board with more than `remaining_limit` empty points and
    /// every board with exactly `remaining_limit` empty points other than
    /// `keep`. Boards with fewer empty points are all kept. Returns the number
    /// of nodes removed.
    pub fn prune(&mut self, remaining_limit: usize, keep: &Board) -> usize {
        let before = self.nodes.len();
        self.nodes.retain(|board, _| {
            let remaining = board.empty_count();
            remaining < remaining_limit || (remaining == remaining_limit && board == keep)
        });
        let removed = before - self.nodes.len();
        self.pruned += removed;
        removed
    }

    /// Number of stored nodes.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Total number of nodes removed by [`NodeStore::prune`] so far.
    #[inline]
    pub fn pruned_total(&self) -> usize {
        self.pruned
    }

    /// Iterate over all stored boards and their nodes, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&Board, &Node)> {
        self.nodes.iter()
    }

    /// Print up to `limit` nodes, shallowest first, with their boards and
    /// statistics.
    pub fn dump_nodes(&self, limit: usize) {
        let mut entries: Vec<_> = self.nodes.iter().collect();
        entries.sort_by(|(a, _), (b, _)| b.empty_count().cmp(&a.empty_count()));
        for (board, node) in entries.iter().take(limit) {
            eprint!("{board}");
            eprintln!(
                "visits={} score={:?} evaluation={} expected={:.3}",
                node.visits,
                node.score,
                node.evaluation,
                node.score.map_or(f64::NAN, |s| s / node.visits.max(1) as f64)
            );
        }
        eprintln!("nodes={}", self.nodes.len());
    }
}
