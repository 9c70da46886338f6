//! Monte Carlo Tree Search over the shared transposition table.
//!
//! One call to [`Searcher::iterate`] runs a single iteration:
//! - Selection with UCT, restricted to empty points close to existing stones
//! - Expansion of the first unexplored candidate
//! - A random playout from the new leaf
//! - Back-propagation of the playout result along the path
//!
//! Whenever every candidate of a node turns out to be solved, the node itself
//! is solved by minimax, and a candidate that wins on the spot solves its
//! parent immediately. Solved nodes are never descended into again, so proofs
//! bubble up towards the root over successive iterations.

use fastrand::Rng;
use tracing::trace;

use crate::board::{Board, Outcome, Player};
use crate::error::EngineError;
use crate::playout::playout;
use crate::transposition::{Node, NodeStore};

/// Result of one search iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Iteration {
    /// The root is already solved; there is nothing left to search.
    Solved,
    /// An iteration ran and back-propagated `result` along `depth` nodes.
    Completed { result: Outcome, depth: usize },
}

/// Where a selection step ended up.
enum Step {
    /// Move on to (or stop at) this child.
    Child {
        board: Board,
        evaluation: Outcome,
        visits: u32,
    },
    /// The current node was solved by minimax.
    Resolved(Outcome),
}

/// Search parameters that stay fixed during one iteration.
#[derive(Debug, Clone, Copy)]
pub struct SearchParams {
    /// Chebyshev distance from existing stones within which moves are tried
    pub closeby_distance: usize,
    /// UCT exploration constant
    pub exploration: f64,
}

/// Runs search iterations against a node store.
pub struct Searcher<'a> {
    store: &'a mut NodeStore,
    rng: &'a mut Rng,
    scan_order: &'a [usize],
    params: SearchParams,
}

impl<'a> Searcher<'a> {
    /// Create a searcher. `scan_order` must list every board index once;
    /// build it with [`scan_order`].
    pub fn new(
        store: &'a mut NodeStore,
        rng: &'a mut Rng,
        scan_order: &'a [usize],
        params: SearchParams,
    ) -> Self {
        Self {
            store,
            rng,
            scan_order,
            params,
        }
    }

    /// Run one iteration from `root` with `to_move` to play.
    pub fn iterate(&mut self, root: &Board, to_move: Player) -> Result<Iteration, EngineError> {
        match self.store.get(root) {
            Some(node) if node.is_solved() => return Ok(Iteration::Solved),
            Some(_) => {}
            None => self.store.insert(root.clone(), Node::new(Outcome::Undetermined))?,
        }

        let mut path = vec![root.clone()];
        let mut board = root.clone();
        let mut mover = to_move;

        // The root always takes at least one step, even when unvisited.
        let result = loop {
            match self.step(&board, mover)? {
                Step::Resolved(outcome) => break outcome,
                Step::Child {
                    board: child,
                    evaluation,
                    visits,
                } => {
                    mover = mover.next();
                    path.push(child.clone());
                    if evaluation.is_solved() {
                        break evaluation;
                    }
                    if visits == 0 {
                        break playout(&child, mover, self.rng)?;
                    }
                    board = child;
                }
            }
        };

        self.backpropagate(&path, to_move, result);
        Ok(Iteration::Completed {
            result,
            depth: path.len(),
        })
    }

    /// Pick the next node from `board`, expanding or solving as needed.
    fn step(&mut self, board: &Board, to_move: Player) -> Result<Step, EngineError> {
        let parent_visits = self.store.get(board).map_or(0, |node| node.visits);
        let order = self.scan_order;
        let mut scratch = board.clone();

        let mut best: Option<(f64, usize, u32)> = None;
        let mut solved_range: Option<(f64, f64)> = None;
        let mut all_solved = true;

        for &mv in order {
            if !is_candidate(board, mv, self.params.closeby_distance) {
                continue;
            }
            scratch.place(mv, to_move);

            let child = self
                .store
                .get(&scratch)
                .map(|node| (node.evaluation, node.visits, node.parent_win_rate()));

            match child {
                None => {
                    let evaluation = scratch.evaluate(mv, to_move, scratch.is_full());
                    self.store.insert(scratch.clone(), Node::new(evaluation))?;
                    if evaluation == Outcome::Win(to_move) {
                        trace!(mv, %evaluation, "winning reply found on expansion");
                        self.store.solve(board, evaluation);
                    }
                    return Ok(Step::Child {
                        board: scratch,
                        evaluation,
                        visits: 0,
                    });
                }
                Some((evaluation, visits, _)) if evaluation == Outcome::Win(to_move) => {
                    trace!(mv, %evaluation, "winning reply found");
                    self.store.solve(board, evaluation);
                    return Ok(Step::Child {
                        board: scratch,
                        evaluation,
                        visits,
                    });
                }
                Some((evaluation, _, _)) if evaluation.is_solved() => {
                    if let Some(value) = evaluation.value() {
                        solved_range = Some(match solved_range {
                            None => (value, value),
                            Some((lo, hi)) => (lo.min(value), hi.max(value)),
                        });
                    }
                }
                Some((_, visits, win_rate)) => {
                    all_solved = false;
                    let value = uct_value(win_rate, parent_visits, visits, self.params.exploration);
                    if best.is_none_or(|(best_value, _, _)| value > best_value) {
                        best = Some((value, mv, visits));
                    }
                }
            }
            scratch.clear(mv);
        }

        if all_solved {
            let (lo, hi) = solved_range.ok_or(EngineError::EmptyMoveSet)?;
            // Black wins at value 0, White at 1: each side picks its extreme.
            let proven = Outcome::from_value(if to_move == Player::Black { lo } else { hi });
            trace!(%proven, "position solved by minimax");
            self.store.solve(board, proven);
            return Ok(Step::Resolved(proven));
        }

        let (_, mv, visits) = best.ok_or(EngineError::EmptyMoveSet)?;
        scratch.place(mv, to_move);
        Ok(Step::Child {
            board: scratch,
            evaluation: Outcome::Undetermined,
            visits,
        })
    }

    /// Update statistics for every node on `path` after a playout.
    ///
    /// Players alternate along the path starting with `root_mover`, and each
    /// node is credited from the point of view of its own player to move.
    fn backpropagate(&mut self, path: &[Board], root_mover: Player, result: Outcome) {
        let mut mover = root_mover;
        for board in path {
            if let Some(node) = self.store.get_mut(board) {
                node.record(result, mover);
            }
            mover = mover.next();
        }
    }
}

/// True if `mv` is an empty point worth searching: close to a stone, or the
/// center of the board.
#[inline]
pub fn is_candidate(board: &Board, mv: usize, closeby_distance: usize) -> bool {
    board.is_empty_at(mv) && (mv == board.center() || board.has_stone_within(mv, closeby_distance))
}

/// UCT value of a child from its parent's point of view.
///
/// Unvisited children are always preferred. The parent visit count is
/// clamped to one, which only matters for a transposed child under a parent
/// that has never been visited itself.
#[inline]
pub fn uct_value(win_rate: Option<f64>, parent_visits: u32, visits: u32, exploration: f64) -> f64 {
    match win_rate {
        Some(rate) if visits > 0 => {
            let parent = f64::from(parent_visits.max(1));
            rate + exploration * (parent.ln() / f64::from(visits)).sqrt()
        }
        _ => f64::INFINITY,
    }
}

/// Order in which candidate moves are scanned: the hinted moves first, then
/// every other point in board order. Out-of-range and repeated hints are
/// skipped.
pub fn scan_order(move_order: &[usize], num_cells: usize) -> Vec<usize> {
    let mut seen = vec![false; num_cells];
    let mut order = Vec::with_capacity(num_cells);
    for mv in move_order.iter().copied().chain(0..num_cells) {
        if mv < num_cells && !seen[mv] {
            seen[mv] = true;
            order.push(mv);
        }
    }
    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::EXPLORATION;

    fn params() -> SearchParams {
        SearchParams {
            closeby_distance: 1,
            exploration: EXPLORATION,
        }
    }

    fn store_with_root(root: &Board) -> NodeStore {
        let mut store = NodeStore::new();
        store
            .insert(root.clone(), Node::new(Outcome::Undetermined))
            .unwrap();
        store
    }

    #[test]
    fn test_scan_order() {
        assert_eq!(scan_order(&[], 4), vec![0, 1, 2, 3]);
        assert_eq!(scan_order(&[2, 0], 4), vec![2, 0, 1, 3]);
        assert_eq!(scan_order(&[3, 3, 9, 1], 4), vec![3, 1, 0, 2]);
    }

    #[test]
    fn test_uct_value() {
        assert_eq!(uct_value(None, 10, 0, EXPLORATION), f64::INFINITY);
        assert_eq!(uct_value(Some(0.5), 10, 0, EXPLORATION), f64::INFINITY);

        let value = uct_value(Some(0.25), 10, 2, EXPLORATION);
        let expected = 0.25 + EXPLORATION * (10f64.ln() / 2.0).sqrt();
        assert!((value - expected).abs() < 1e-12);

        let unvisited_parent = uct_value(Some(0.75), 0, 3, EXPLORATION);
        assert!((unvisited_parent - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_candidates_are_close_to_stones() {
        let board = Board::new(9);
        assert!(is_candidate(&board, 40, 1));
        assert!(!is_candidate(&board, 39, 1));

        let board = board.apply(0, Player::Black).unwrap();
        assert!(is_candidate(&board, 1, 1));
        assert!(is_candidate(&board, 10, 1));
        assert!(!is_candidate(&board, 2, 1));
        assert!(is_candidate(&board, 2, 2));
        assert!(!is_candidate(&board, 0, 1));
    }

    #[test]
    fn test_first_iteration_expands_center() {
        let root = Board::new(9);
        let mut store = store_with_root(&root);
        let mut rng = Rng::with_seed(1);
        let order = scan_order(&[], root.num_cells());
        let mut searcher = Searcher::new(&mut store, &mut rng, &order, params());

        let iteration = searcher.iterate(&root, Player::Black).unwrap();
        assert!(matches!(iteration, Iteration::Completed { depth: 2, .. }));

        let child = root.apply(40, Player::Black).unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.get(&root).unwrap().visits, 1);
        assert_eq!(store.get(&child).unwrap().visits, 1);
    }

    #[test]
    fn test_each_iteration_visits_root_once() {
        let root = Board::new(7);
        let mut store = store_with_root(&root);
        let mut rng = Rng::with_seed(2);
        let order = scan_order(&[], root.num_cells());
        let mut searcher = Searcher::new(&mut store, &mut rng, &order, params());

        for _ in 0..300 {
            searcher.iterate(&root, Player::Black).unwrap();
        }
        assert_eq!(store.get(&root).unwrap().visits, 300);

        for (_, node) in store.iter() {
            assert!(node.visits > 0);
            if let Some(rate) = node.parent_win_rate() {
                assert!((0.0..=1.0).contains(&rate), "win rate {rate} out of range");
            }
        }
    }

    #[test]
    fn test_immediate_win_solves_root() {
        let root = Board::from_rows(&[
            ". . . . . . . . .",
            ". . . . . . . . .",
            ". . . . . . . . .",
            ". . . . . . . . .",
            "X X X X . . . . .",
            ". . . . . . . . .",
            "O O O . . . . O .",
            ". . . . . . . . .",
            ". . . . . . . . .",
        ])
        .unwrap();
        let mut store = store_with_root(&root);
        let mut rng = Rng::with_seed(3);
        let order = scan_order(&[], root.num_cells());
        let mut searcher = Searcher::new(&mut store, &mut rng, &order, params());

        let mut completed = 0;
        while searcher.iterate(&root, Player::Black).unwrap() != Iteration::Solved {
            completed += 1;
            assert!(completed < 20, "winning move not found");
        }

        // Row 3 holds five candidates ahead of the winning point in board order.
        assert_eq!(completed, 6);
        let root_node = store.get(&root).unwrap();
        assert_eq!(root_node.evaluation, Outcome::Win(Player::Black));
        assert_eq!(root_node.score, None);
        assert_eq!(root_node.visits, 6);

        let winning = root.apply(40, Player::Black).unwrap();
        assert_eq!(store.get(&winning).unwrap().evaluation, Outcome::Win(Player::Black));
    }

    #[test]
    fn test_move_order_hint_is_scanned_first() {
        let root = Board::new(9).apply(40, Player::Black).unwrap();
        let mut store = store_with_root(&root);
        let mut rng = Rng::with_seed(4);
        let order = scan_order(&[50, 30], root.num_cells());
        let mut searcher = Searcher::new(&mut store, &mut rng, &order, params());

        searcher.iterate(&root, Player::White).unwrap();
        searcher.iterate(&root, Player::White).unwrap();

        assert!(store.contains(&root.apply(50, Player::White).unwrap()));
        assert!(store.contains(&root.apply(30, Player::White).unwrap()));
        assert!(!store.contains(&root.apply(31, Player::White).unwrap()));
    }

    /// Iterate until the root is solved and return its proven value.
    fn solve_root(root: &Board, to_move: Player, seed: u64) -> Outcome {
        let mut store = store_with_root(root);
        let mut rng = Rng::with_seed(seed);
        let order = scan_order(&[], root.num_cells());
        let mut searcher = Searcher::new(&mut store, &mut rng, &order, params());

        let mut completed = 0;
        while searcher.iterate(root, to_move).unwrap() != Iteration::Solved {
            completed += 1;
            assert!(completed < 50, "root not solved");
        }
        store.get(root).unwrap().evaluation
    }

    #[test]
    fn test_white_takes_the_draw_over_a_loss() {
        // Blocking at 4 fills the board for a draw; 19 lets Black finish row 0.
        let root = Board::from_rows(&[
            "X X X X .",
            "O O X O O",
            "X O O X X",
            "O X X O .",
            "X O O X O",
        ])
        .unwrap();
        assert_eq!(solve_root(&root, Player::White, 6), Outcome::Draw);
    }

    #[test]
    fn test_black_takes_the_draw_over_a_loss() {
        // Same position with colours swapped.
        let root = Board::from_rows(&[
            "O O O O .",
            "X X O X X",
            "O X X O O",
            "X O O X .",
            "O X X O X",
        ])
        .unwrap();
        assert_eq!(solve_root(&root, Player::Black, 7), Outcome::Draw);
    }

    #[test]
    fn test_every_move_losing_solves_as_loss() {
        // White has four on rows 0 and 4; Black cannot cover both ends.
        let root = Board::from_rows(&[
            "O O O O .",
            "X X X O X",
            "X O . X X",
            "X X O X X",
            "O O O O .",
        ])
        .unwrap();
        assert_eq!(solve_root(&root, Player::Black, 8), Outcome::Win(Player::White));
    }

    #[test]
    fn test_last_move_draw_is_solved() {
        let root = Board::from_rows(&["X O X", "X O O", "O X ."]).unwrap();
        let mut store = store_with_root(&root);
        let mut rng = Rng::with_seed(5);
        let order = scan_order(&[], root.num_cells());
        let mut searcher = Searcher::new(&mut store, &mut rng, &order, params());

        assert_eq!(
            searcher.iterate(&root, Player::Black).unwrap(),
            Iteration::Completed {
                result: Outcome::Draw,
                depth: 2
            }
        );
        // Every candidate is now solved: the root is solved by minimax.
        assert_eq!(
            searcher.iterate(&root, Player::Black).unwrap(),
            Iteration::Completed {
                result: Outcome::Draw,
                depth: 1
            }
        );
        assert_eq!(searcher.iterate(&root, Player::Black).unwrap(), Iteration::Solved);
        assert_eq!(store.get(&root).unwrap().evaluation, Outcome::Draw);
        assert_eq!(store.get(&root).unwrap().visits, 2);
    }
}
