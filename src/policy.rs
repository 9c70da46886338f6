//! Final move selection once the search budget is spent.

use fastrand::Rng;
use tracing::debug;

use crate::board::{Board, Outcome, Player};
use crate::error::EngineError;
use crate::playout::random_move;
use crate::transposition::NodeStore;

/// Why a move was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChoiceKind {
    /// The move wins on the spot or leads to a proven win.
    ProvenWin,
    /// The position is solved and the move keeps its proven value.
    PreservesProof,
    /// Most visited child of an unsolved position.
    MostVisited,
    /// Nothing was explored; a random legal move.
    Random,
}

/// A move picked by [`choose_move`].
#[derive(Debug, Clone, PartialEq)]
pub struct MoveChoice {
    /// Board index of the move
    pub index: usize,
    pub kind: ChoiceKind,
    /// Estimated win probability for the mover, when the child has statistics
    pub win_probability: Option<f64>,
    /// Explored moves by descending visits, to bias the next search.
    /// `None` leaves the current order untouched.
    pub move_order: Option<Vec<usize>>,
}

/// Pick the move to play from `board` with `to_move` to play.
///
/// In order of preference: a child proven to win for the mover; if the
/// position itself is solved, the most visited child that keeps its value;
/// otherwise the most visited explored child. Ties go to the first move in
/// board order. With no explored child at all a random legal move is played.
pub fn choose_move(
    board: &Board,
    to_move: Player,
    store: &NodeStore,
    rng: &mut Rng,
) -> Result<MoveChoice, EngineError> {
    let proven = store
        .get(board)
        .map_or(Outcome::Undetermined, |node| node.evaluation);
    let win = Outcome::Win(to_move);

    let mut scratch = board.clone();
    let mut most_visited: Option<(u32, usize)> = None;
    let mut preserving: Option<(u32, usize)> = None;
    let mut visited: Vec<(usize, u32)> = Vec::new();

    for mv in board.legal_moves() {
        scratch.place(mv, to_move);
        if let Some(child) = store.get(&scratch) {
            if child.evaluation == win {
                debug!(mv, "playing proven win");
                return Ok(MoveChoice {
                    index: mv,
                    kind: ChoiceKind::ProvenWin,
                    win_probability: Some(1.0),
                    move_order: None,
                });
            }
            if proven.is_solved()
                && child.evaluation == proven
                && preserving.is_none_or(|(v, _)| child.visits > v)
            {
                preserving = Some((child.visits, mv));
            }
            if most_visited.is_none_or(|(v, _)| child.visits > v) {
                most_visited = Some((child.visits, mv));
            }
            if child.visits > 0 {
                visited.push((mv, child.visits));
            }
        }
        scratch.clear(mv);
    }

    let (index, kind, move_order) = match (preserving, most_visited) {
        (Some((_, mv)), _) => (mv, ChoiceKind::PreservesProof, None),
        (None, best) => {
            // Stable sort: equally visited moves stay in board order.
            visited.sort_by(|a, b| b.1.cmp(&a.1));
            let order = visited.into_iter().map(|(mv, _)| mv).collect();
            match best {
                Some((_, mv)) => (mv, ChoiceKind::MostVisited, Some(order)),
                None => (random_move(board, rng)?, ChoiceKind::Random, Some(order)),
            }
        }
    };

    scratch.place(index, to_move);
    let win_probability = store
        .get(&scratch)
        .and_then(|child| child.parent_win_rate());
    debug!(
        mv = index,
        ?kind,
        win_probability = win_probability.unwrap_or(f64::NAN),
        "move chosen"
    );

    Ok(MoveChoice {
        index,
        kind,
        win_probability,
        move_order,
    })
}
