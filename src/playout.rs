//! Monte Carlo playouts (random game simulation).
//!
//! A playout plays uniformly random legal moves, alternating players, until
//! the evaluator reports a win or a draw. Only the last move is evaluated each
//! turn, so a playout costs O(moves) regardless of board size.

use fastrand::Rng;

use crate::board::{Board, Outcome, Player};
use crate::error::EngineError;

/// Perform a Monte Carlo playout from `board` with `to_move` to play.
///
/// Returns the terminal outcome of the simulated game.
///
/// # Errors
/// [`EngineError::EmptyMoveSet`] if the board has no empty point left
/// although the position is still undetermined.
pub fn playout(board: &Board, to_move: Player, rng: &mut Rng) -> Result<Outcome, EngineError> {
    let mut board = board.clone();
    let mut candidates = board.legal_moves();
    let mut player = to_move;

    loop {
        if candidates.is_empty() {
            return Err(EngineError::EmptyMoveSet);
        }
        // Removing a random slot keeps the remaining candidates uniform.
        let mv = candidates.swap_remove(rng.usize(..candidates.len()));
        board.place(mv, player);

        let outcome = board.evaluate(mv, player, board.is_full());
        if outcome.is_solved() {
            return Ok(outcome);
        }
        player = player.next();
    }
}

/// Choose a uniformly random legal move.
///
/// # Errors
/// [`EngineError::EmptyMoveSet`] if the board is full.
pub fn random_move(board: &Board, rng: &mut Rng) -> Result<usize, EngineError> {
    let moves = board.legal_moves();
    if moves.is_empty() {
        return Err(EngineError::EmptyMoveSet);
    }
    Ok(moves[rng.usize(..moves.len())])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_playout_ends_with_result() {
        let mut rng = Rng::with_seed(1);
        let board = Board::new(9);
        for _ in 0..50 {
            let outcome = playout(&board, Player::Black, &mut rng).unwrap();
            assert!(outcome.is_solved());
        }
    }

    #[test]
    fn test_playout_on_small_board_is_always_draw() {
        let mut rng = Rng::with_seed(2);
        let board = Board::new(4);
        for _ in 0..50 {
            assert_eq!(playout(&board, Player::Black, &mut rng).unwrap(), Outcome::Draw);
        }
    }

    #[test]
    fn test_playout_forced_win() {
        // The only empty point completes White's five.
        let board = Board::from_rows(&[
            "O O O O .",
            "X X O X X",
            "O X X O X",
            "X O X O O",
            "X X O X X",
        ])
        .unwrap();
        let mut rng = Rng::with_seed(3);
        assert_eq!(
            playout(&board, Player::White, &mut rng).unwrap(),
            Outcome::Win(Player::White)
        );
        assert_eq!(
            playout(&board, Player::Black, &mut rng).unwrap(),
            Outcome::Draw
        );
    }

    #[test]
    fn test_playout_on_full_board_fails() {
        let board = Board::from_rows(&["X O X", "X O O", "O X X"]).unwrap();
        let mut rng = Rng::with_seed(4);
        assert_eq!(
            playout(&board, Player::Black, &mut rng),
            Err(EngineError::EmptyMoveSet)
        );
        assert_eq!(random_move(&board, &mut rng), Err(EngineError::EmptyMoveSet));
    }

    #[test]
    fn test_random_move_is_legal() {
        let board = Board::from_rows(&["X O X", "X . O", "O X X"]).unwrap();
        let mut rng = Rng::with_seed(5);
        assert_eq!(random_move(&board, &mut rng), Ok(4));
    }
}
