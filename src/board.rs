//! Five-in-a-row board representation.
//!
//! The board is a flat array of `N * N` cells addressed by `row * N + col`.
//! Boards are values: [`Board::apply`] returns a new board, which is what the
//! node store keys on. Equal boards hash equally regardless of how they were
//! reached, so transpositions share one node.

use std::fmt;

use crate::constants::{LINE_DIRECTIONS, MARK_BLACK, MARK_EMPTY, MARK_WHITE, NUM_PLAYERS, WIN_LENGTH};
use crate::error::{EngineError, MoveError};

/// One of the two players. Black moves first.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Player {
    Black,
    White,
}

impl Player {
    /// Player index: 0 for Black, 1 for White.
    #[inline]
    pub const fn index(self) -> usize {
        match self {
            Player::Black => 0,
            Player::White => 1,
        }
    }

    /// Player for an index, wrapping around the number of players.
    #[inline]
    pub const fn from_index(index: usize) -> Self {
        if index % NUM_PLAYERS == 0 {
            Player::Black
        } else {
            Player::White
        }
    }

    /// The player who moves after this one.
    #[inline]
    pub const fn next(self) -> Self {
        match self {
            Player::Black => Player::White,
            Player::White => Player::Black,
        }
    }

    /// Character used to draw this player's stones.
    pub const fn mark(self) -> char {
        match self {
            Player::Black => MARK_BLACK,
            Player::White => MARK_WHITE,
        }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.mark())
    }
}

/// Contents of a single point: empty or a player's stone.
pub type Cell = Option<Player>;

/// Result of a position.
///
/// Only [`Outcome::value`] exposes the numeric convention used by
/// back-propagation and minimax: a win for player `k` is `k`, a draw is the
/// midpoint between the two player indices.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Outcome {
    #[default]
    Undetermined,
    Win(Player),
    Draw,
}

impl Outcome {
    /// Numeric value of a decided outcome.
    const DRAW_VALUE: f64 = 0.5;

    /// True for wins and draws.
    #[inline]
    pub const fn is_solved(self) -> bool {
        !matches!(self, Outcome::Undetermined)
    }

    /// Numeric value of the outcome, `None` while undetermined.
    #[inline]
    pub fn value(self) -> Option<f64> {
        match self {
            Outcome::Undetermined => None,
            Outcome::Win(player) => Some(player.index() as f64),
            Outcome::Draw => Some(Self::DRAW_VALUE),
        }
    }

    /// Inverse of [`Outcome::value`] for values produced by it.
    pub fn from_value(value: f64) -> Self {
        if value < Self::DRAW_VALUE {
            Outcome::Win(Player::Black)
        } else if value > Self::DRAW_VALUE {
            Outcome::Win(Player::White)
        } else {
            Outcome::Draw
        }
    }

    /// Reward of this outcome for `player`: 1 for a win, 0 for a loss and
    /// 0.5 for a draw, computed as `1 - |value - index|`.
    ///
    /// An undetermined outcome is worth half a point.
    #[inline]
    pub fn reward(self, player: Player) -> f64 {
        match self.value() {
            Some(value) => 1.0 - (value - player.index() as f64).abs(),
            None => Self::DRAW_VALUE,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Undetermined => write!(f, "undetermined"),
            Outcome::Win(player) => write!(f, "{player} wins"),
            Outcome::Draw => write!(f, "draw"),
        }
    }
}

/// An `N x N` five-in-a-row board.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Board {
    dimension: usize,
    cells: Box<[Cell]>,
    empty: usize,
}

impl Board {
    /// Create an empty board of the given dimension.
    pub fn new(dimension: usize) -> Self {
        let len = dimension * dimension;
        Self {
            dimension,
            cells: vec![None; len].into_boxed_slice(),
            empty: len,
        }
    }

    /// Build a board from rows of `X`, `O` and `.` characters.
    ///
    /// Whitespace inside a row is ignored, so rows may be written spaced out
    /// the same way [`Board`] displays them.
    ///
    /// # Errors
    /// - [`EngineError::RowLength`] if a row is not as long as there are rows
    /// - [`EngineError::UnknownMark`] for any other character
    pub fn from_rows(rows: &[&str]) -> Result<Self, EngineError> {
        let dimension = rows.len();
        let mut board = Self::new(dimension);
        for (row, line) in rows.iter().enumerate() {
            let marks: Vec<char> = line.chars().filter(|c| !c.is_whitespace()).collect();
            if marks.len() != dimension {
                return Err(EngineError::RowLength {
                    row,
                    expected: dimension,
                    found: marks.len(),
                });
            }
            for (col, mark) in marks.into_iter().enumerate() {
                let index = row * dimension + col;
                match mark {
                    MARK_BLACK => board.place(index, Player::Black),
                    MARK_WHITE => board.place(index, Player::White),
                    MARK_EMPTY => {}
                    _ => return Err(EngineError::UnknownMark { row, mark }),
                }
            }
        }
        Ok(board)
    }

    /// Board size (number of rows and of columns).
    #[inline]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Total number of points.
    #[inline]
    pub fn num_cells(&self) -> usize {
        self.cells.len()
    }

    /// All points in board order.
    #[inline]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Contents of a point; off-board indices read as empty.
    #[inline]
    pub fn get(&self, index: usize) -> Cell {
        self.cells.get(index).copied().flatten()
    }

    /// Contents of the point at `(row, col)`.
    #[inline]
    pub fn at(&self, row: usize, col: usize) -> Cell {
        self.index(row, col).and_then(|index| self.get(index))
    }

    /// Linear index of `(row, col)`, `None` if off the board.
    #[inline]
    pub fn index(&self, row: usize, col: usize) -> Option<usize> {
        (row < self.dimension && col < self.dimension).then(|| row * self.dimension + col)
    }

    /// `(row, col)` of a linear index.
    #[inline]
    pub fn coords(&self, index: usize) -> (usize, usize) {
        (index / self.dimension, index % self.dimension)
    }

    /// Index of the geometric center point.
    pub fn center(&self) -> usize {
        let mid = self.dimension / 2;
        mid * self.dimension + mid
    }

    /// Number of empty points.
    #[inline]
    pub fn empty_count(&self) -> usize {
        self.empty
    }

    /// True when no empty point is left.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.empty == 0
    }

    /// True if `index` is on the board and empty.
    #[inline]
    pub fn is_empty_at(&self, index: usize) -> bool {
        matches!(self.cells.get(index), Some(None))
    }

    /// Return the board with `player`'s stone added at `index`.
    ///
    /// # Errors
    /// - [`MoveError::OffBoard`] if the index is out of range
    /// - [`MoveError::Occupied`] if the point already holds a stone
    pub fn apply(&self, index: usize, player: Player) -> Result<Self, EngineError> {
        match self.cells.get(index) {
            None => Err(EngineError::IllegalMove {
                index,
                reason: MoveError::OffBoard,
            }),
            Some(Some(_)) => Err(EngineError::IllegalMove {
                index,
                reason: MoveError::Occupied,
            }),
            Some(None) => {
                let mut next = self.clone();
                next.place(index, player);
                Ok(next)
            }
        }
    }

    /// Put a stone on an empty point in place.
    #[inline]
    pub(crate) fn place(&mut self, index: usize, player: Player) {
        debug_assert!(self.is_empty_at(index), "placing on non-empty point {index}");
        self.cells[index] = Some(player);
        self.empty -= 1;
    }

    /// Remove the stone at `index`, undoing [`Board::place`].
    #[inline]
    pub(crate) fn clear(&mut self, index: usize) {
        debug_assert!(self.cells[index].is_some(), "clearing empty point {index}");
        self.cells[index] = None;
        self.empty += 1;
    }

    /// All empty points in board order.
    pub fn legal_moves(&self) -> Vec<usize> {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, cell)| cell.is_none())
            .map(|(index, _)| index)
            .collect()
    }

    /// True if any other point within Chebyshev distance `distance` of
    /// `index` holds a stone.
    pub fn has_stone_within(&self, index: usize, distance: usize) -> bool {
        if self.dimension == 0 {
            return false;
        }
        let (row, col) = self.coords(index);
        let last = self.dimension - 1;
        let cols = col.saturating_sub(distance)..=(col + distance).min(last);
        for r in row.saturating_sub(distance)..=(row + distance).min(last) {
            for c in cols.clone() {
                if (r, c) != (row, col) && self.at(r, c).is_some() {
                    return true;
                }
            }
        }
        false
    }

    /// Evaluate the position right after `mover` played `last_move`.
    ///
    /// Only the four lines through `last_move` are inspected, so the cost does
    /// not depend on the board size. Any window of five stones of `mover`
    /// containing `last_move` is a win (longer lines included); otherwise the
    /// position is a draw when `no_moves_left`, and undetermined otherwise.
    pub fn evaluate(&self, last_move: usize, mover: Player, no_moves_left: bool) -> Outcome {
        let won = self.get(last_move) == Some(mover)
            && LINE_DIRECTIONS.iter().any(|&(dr, dc)| {
                1 + self.run_length(last_move, dr, dc, mover)
                    + self.run_length(last_move, -dr, -dc, mover)
                    >= WIN_LENGTH
            });

        if won {
            Outcome::Win(mover)
        } else if no_moves_left {
            Outcome::Draw
        } else {
            Outcome::Undetermined
        }
    }

    /// Count consecutive `player` stones from `start` (exclusive) in one
    /// direction, stopping after `WIN_LENGTH - 1`.
    fn run_length(&self, start: usize, dr: isize, dc: isize, player: Player) -> usize {
        let mut count = 0;
        let mut at = start;
        while count < WIN_LENGTH - 1 {
            match self.step(at, dr, dc) {
                Some(next) if self.get(next) == Some(player) => {
                    count += 1;
                    at = next;
                }
                _ => break,
            }
        }
        count
    }

    /// Index one step from `index` in direction `(dr, dc)`, `None` off-board.
    #[inline]
    fn step(&self, index: usize, dr: isize, dc: isize) -> Option<usize> {
        let (row, col) = self.coords(index);
        let row = row.checked_add_signed(dr)?;
        let col = col.checked_add_signed(dc)?;
        self.index(row, col)
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.cells.chunks(self.dimension.max(1)) {
            for cell in row {
                let ch = cell.map_or(MARK_EMPTY, Player::mark);
                write!(f, "{ch} ")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Parse a coordinate like `"h8"` into a linear index.
///
/// Columns are letters starting at `A`, rows are numbered from 1 at the top.
/// Returns `None` for malformed or off-board input.
pub fn parse_point(s: &str, dimension: usize) -> Option<usize> {
    let s = s.trim();
    let mut chars = s.chars();
    let col_char = chars.next()?.to_ascii_uppercase();
    if !col_char.is_ascii_uppercase() {
        return None;
    }
    let col = (col_char as u8 - b'A') as usize;
    let row: usize = chars.as_str().parse().ok()?;
    if row == 0 || row > dimension || col >= dimension {
        return None;
    }
    Some((row - 1) * dimension + col)
}

/// Convert a linear index to a coordinate string like `"H8"`.
pub fn format_point(index: usize, dimension: usize) -> String {
    let row = index / dimension;
    let col = index % dimension;
    format!("{}{}", (b'A' + col as u8) as char, row + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn play(board: &Board, moves: &[(usize, Player)]) -> Board {
        moves
            .iter()
            .fold(board.clone(), |b, &(mv, p)| b.apply(mv, p).unwrap())
    }

    #[test]
    fn test_new_board_is_empty() {
        let board = Board::new(13);
        assert_eq!(board.num_cells(), 169);
        assert_eq!(board.empty_count(), 169);
        assert_eq!(board.legal_moves().len(), 169);
        assert_eq!(board.center(), 84);
        assert!(!board.is_full());
    }

    #[test]
    fn test_index_coords_roundtrip() {
        let board = Board::new(13);
        for index in 0..board.num_cells() {
            let (row, col) = board.coords(index);
            assert_eq!(board.index(row, col), Some(index));
        }
        assert_eq!(board.index(13, 0), None);
        assert_eq!(board.index(0, 13), None);
    }

    #[test]
    fn test_apply_returns_new_board() {
        let board = Board::new(9);
        let next = board.apply(40, Player::Black).unwrap();
        assert_eq!(board.get(40), None);
        assert_eq!(next.get(40), Some(Player::Black));
        assert_eq!(next.empty_count(), 80);
        assert!(!next.legal_moves().contains(&40));
    }

    #[test]
    fn test_apply_occupied() {
        let board = Board::new(9).apply(3, Player::Black).unwrap();
        let err = board.apply(3, Player::White).unwrap_err();
        assert_eq!(
            err,
            EngineError::IllegalMove {
                index: 3,
                reason: MoveError::Occupied
            }
        );
    }

    #[test]
    fn test_from_rows_rejects_bad_input() {
        assert_eq!(
            Board::from_rows(&["X O .", "X O", ". . ."]),
            Err(EngineError::RowLength {
                row: 1,
                expected: 3,
                found: 2
            })
        );
        assert_eq!(
            Board::from_rows(&["X O .", ". . .", ". * ."]),
            Err(EngineError::UnknownMark { row: 2, mark: '*' })
        );
    }

    #[test]
    fn test_apply_off_board() {
        let board = Board::new(9);
        let err = board.apply(81, Player::Black).unwrap_err();
        assert_eq!(
            err,
            EngineError::IllegalMove {
                index: 81,
                reason: MoveError::OffBoard
            }
        );
    }

    #[test]
    fn test_horizontal_five_wins() {
        let board = Board::from_rows(&[
            "X X X X . . .",
            ". . . . . . .",
            ". . . . . . .",
            ". . . . . . .",
            ". . . . . . .",
            ". . . . . . .",
            ". . . . . . .",
        ])
        .unwrap();
        let board = board.apply(4, Player::Black).unwrap();
        assert_eq!(board.evaluate(4, Player::Black, false), Outcome::Win(Player::Black));
    }

    #[test]
    fn test_win_from_middle_of_line() {
        let board = Board::from_rows(&[
            ". . . . . . .",
            ". . . . . . .",
            ". O O . O O .",
            ". . . . . . .",
            ". . . . . . .",
            ". . . . . . .",
            ". . . . . . .",
        ])
        .unwrap();
        let mv = board.index(2, 3).unwrap();
        let board = board.apply(mv, Player::White).unwrap();
        assert_eq!(board.evaluate(mv, Player::White, false), Outcome::Win(Player::White));
    }

    #[test]
    fn test_vertical_and_diagonal_wins() {
        let vertical = Board::from_rows(&[
            ". . X . . . .",
            ". . X . . . .",
            ". . X . . . .",
            ". . X . . . .",
            ". . X . . . .",
            ". . . . . . .",
            ". . . . . . .",
        ])
        .unwrap();
        assert_eq!(
            vertical.evaluate(vertical.index(4, 2).unwrap(), Player::Black, false),
            Outcome::Win(Player::Black)
        );

        let diagonal = Board::from_rows(&[
            "X . . . . . .",
            ". X . . . . .",
            ". . X . . . .",
            ". . . X . . .",
            ". . . . X . .",
            ". . . . . . .",
            ". . . . . . .",
        ])
        .unwrap();
        assert_eq!(
            diagonal.evaluate(diagonal.index(2, 2).unwrap(), Player::Black, false),
            Outcome::Win(Player::Black)
        );

        let anti = Board::from_rows(&[
            ". . . . . . .",
            ". . . . . . O",
            ". . . . . O .",
            ". . . . O . .",
            ". . . O . . .",
            ". . O . . . .",
            ". . . . . . .",
        ])
        .unwrap();
        assert_eq!(
            anti.evaluate(anti.index(5, 2).unwrap(), Player::White, false),
            Outcome::Win(Player::White)
        );
    }

    #[test]
    fn test_four_is_not_a_win() {
        let board = Board::from_rows(&[
            "X X X X . . .",
            ". . . . . . .",
            ". . . . . . .",
            ". . . . . . .",
            ". . . . . . .",
            ". . . . . . .",
            ". . . . . . .",
        ])
        .unwrap();
        assert_eq!(board.evaluate(3, Player::Black, false), Outcome::Undetermined);
    }

    #[test]
    fn test_line_does_not_wrap_across_rows() {
        // Three stones at the end of row 0 and two at the start of row 1 are
        // consecutive in linear order but not on the board.
        let board = Board::from_rows(&[
            ". . . . X X X",
            "X X . . . . .",
            ". . . . . . .",
            ". . . . . . .",
            ". . . . . . .",
            ". . . . . . .",
            ". . . . . . .",
        ])
        .unwrap();
        assert_eq!(board.evaluate(6, Player::Black, false), Outcome::Undetermined);
        assert_eq!(board.evaluate(7, Player::Black, false), Outcome::Undetermined);
    }

    #[test]
    fn test_overline_wins() {
        let board = Board::from_rows(&[
            "X X X . X X .",
            ". . . . . . .",
            ". . . . . . .",
            ". . . . . . .",
            ". . . . . . .",
            ". . . . . . .",
            ". . . . . . .",
        ])
        .unwrap();
        let board = board.apply(3, Player::Black).unwrap();
        assert_eq!(board.evaluate(3, Player::Black, false), Outcome::Win(Player::Black));
    }

    #[test]
    fn test_opponent_stones_do_not_count() {
        let board = Board::from_rows(&[
            "X X O X X . .",
            ". . . . . . .",
            ". . . . . . .",
            ". . . . . . .",
            ". . . . . . .",
            ". . . . . . .",
            ". . . . . . .",
        ])
        .unwrap();
        assert_eq!(board.evaluate(2, Player::White, false), Outcome::Undetermined);
        assert_eq!(board.evaluate(1, Player::Black, false), Outcome::Undetermined);
    }

    #[test]
    fn test_full_board_without_five_is_draw() {
        let board = Board::from_rows(&["X O X", "X O O", "O X X"]).unwrap();
        assert!(board.is_full());
        let outcome = board.evaluate(8, Player::Black, board.is_full());
        assert_eq!(outcome, Outcome::Draw);
        assert_eq!(outcome.value(), Some(0.5));
    }

    #[test]
    fn test_evaluate_independent_of_move_order() {
        let board = Board::new(9);
        let first = play(
            &board,
            &[
                (10, Player::Black),
                (0, Player::White),
                (11, Player::Black),
                (1, Player::White),
                (12, Player::Black),
                (2, Player::White),
                (13, Player::Black),
                (30, Player::White),
                (14, Player::Black),
            ],
        );
        let second = play(
            &board,
            &[
                (13, Player::Black),
                (30, Player::White),
                (11, Player::Black),
                (2, Player::White),
                (12, Player::Black),
                (0, Player::White),
                (10, Player::Black),
                (1, Player::White),
                (14, Player::Black),
            ],
        );
        assert_eq!(first, second);
        assert_eq!(
            first.evaluate(14, Player::Black, false),
            second.evaluate(14, Player::Black, false)
        );
        assert_eq!(first.evaluate(14, Player::Black, false), Outcome::Win(Player::Black));
    }

    #[test]
    fn test_has_stone_within() {
        let board = Board::new(9).apply(40, Player::Black).unwrap();
        assert!(board.has_stone_within(30, 1));
        assert!(board.has_stone_within(50, 1));
        assert!(!board.has_stone_within(40, 1));
        assert!(!board.has_stone_within(20, 1));
        assert!(board.has_stone_within(20, 2));
        assert!(!board.has_stone_within(0, 2));
    }

    #[test]
    fn test_outcome_values_and_rewards() {
        assert_eq!(Outcome::Win(Player::Black).value(), Some(0.0));
        assert_eq!(Outcome::Win(Player::White).value(), Some(1.0));
        assert_eq!(Outcome::Undetermined.value(), None);

        assert_eq!(Outcome::Win(Player::Black).reward(Player::Black), 1.0);
        assert_eq!(Outcome::Win(Player::Black).reward(Player::White), 0.0);
        assert_eq!(Outcome::Draw.reward(Player::White), 0.5);

        for outcome in [Outcome::Win(Player::Black), Outcome::Win(Player::White), Outcome::Draw] {
            assert_eq!(Outcome::from_value(outcome.value().unwrap()), outcome);
        }
    }

    #[test]
    fn test_parse_format_point_roundtrip() {
        for index in 0..169 {
            let s = format_point(index, 13);
            assert_eq!(parse_point(&s, 13), Some(index), "roundtrip failed for {s}");
        }
        assert_eq!(parse_point("a1", 13), Some(0));
        assert_eq!(parse_point("G7", 13), Some(84));
        assert_eq!(parse_point("N1", 13), None);
        assert_eq!(parse_point("A14", 13), None);
        assert_eq!(parse_point("A0", 13), None);
        assert_eq!(parse_point("7G", 13), None);
    }

    #[test]
    fn test_display() {
        let board = Board::from_rows(&["X . .", ". O .", ". . ."]).unwrap();
        assert_eq!(board.to_string(), "X . . \n. O . \n. . . \n");
    }
}
