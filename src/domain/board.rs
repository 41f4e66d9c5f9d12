//! The piece grid.
//!
//! A `Board` is never changed in place once it is handed out. Every transition
//! copies the grid into a private working copy, writes there, and returns the
//! copy as a new value.

use crate::domain::chess::{Color, Piece, PieceKind};
use crate::domain::position::Position;
use crate::error::BoardError;

/// 8x8 grid of optional pieces, indexed `[file - 1][rank - 1]`
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct Board {
    squares: [[Option<Piece>; 8]; 8],
}

const BACK_RANK: [PieceKind; 8] = [
    PieceKind::Rook,
    PieceKind::Knight,
    PieceKind::Bishop,
    PieceKind::Queen,
    PieceKind::King,
    PieceKind::Bishop,
    PieceKind::Knight,
    PieceKind::Rook,
];

impl Board {
    /// An empty board
    pub fn blank() -> Self {
        Self {
            squares: [[None; 8]; 8],
        }
    }

    /// The standard initial position
    pub fn start() -> Self {
        let mut squares = [[None; 8]; 8];
        for (file, kind) in BACK_RANK.iter().enumerate() {
            squares[file][0] = Some(Piece::new(*kind, Color::White));
            squares[file][1] = Some(Piece::new(PieceKind::Pawn, Color::White));
            squares[file][6] = Some(Piece::new(PieceKind::Pawn, Color::Black));
            squares[file][7] = Some(Piece::new(*kind, Color::Black));
        }
        Self { squares }
    }

    /// The piece on a square, if any
    pub fn read(&self, position: Position) -> Option<Piece> {
        self.squares[position.x() as usize - 1][position.y() as usize - 1]
    }

    pub fn is_empty(&self, position: Position) -> bool {
        self.read(position).is_none()
    }

    /// New board with `piece` placed on an empty square
    pub fn put(&self, piece: Piece, position: Position) -> Result<Board, BoardError> {
        if !self.is_empty(position) {
            return Err(BoardError::Occupied(position));
        }
        Ok(self.edit(|b| b.write(position, Some(piece))))
    }

    /// Copy the grid, let `f` write into the copy, return the copy
    pub(crate) fn edit(&self, f: impl FnOnce(&mut BoardWriter)) -> Board {
        let mut writer = BoardWriter {
            board: self.clone(),
        };
        f(&mut writer);
        writer.board
    }

    /// Every occupied square with its piece, file-major
    pub fn pieces(&self) -> impl Iterator<Item = (Position, Piece)> + '_ {
        Position::all().filter_map(|p| self.read(p).map(|piece| (p, piece)))
    }

    /// Square of the given side's king, if it has one
    pub fn king_position(&self, color: Color) -> Option<Position> {
        self.pieces()
            .find(|(_, piece)| piece.kind == PieceKind::King && piece.color == color)
            .map(|(p, _)| p)
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::start()
    }
}

/// Write access to a private working copy of a board
pub(crate) struct BoardWriter {
    board: Board,
}

impl BoardWriter {
    pub fn write(&mut self, position: Position, piece: Option<Piece>) {
        self.board.squares[position.x() as usize - 1][position.y() as usize - 1] = piece;
    }

    pub fn read(&self, position: Position) -> Option<Piece> {
        self.board.read(position)
    }

    /// Move whatever stands on `from` to `to`, overwriting `to`
    pub fn shift(&mut self, from: Position, to: Position) {
        let piece = self.read(from);
        self.write(from, None);
        self.write(to, piece);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    fn sq(s: &str) -> Position {
        Position::from_algebraic(s).unwrap()
    }

    fn hash_of(board: &Board) -> u64 {
        let mut h = DefaultHasher::new();
        board.hash(&mut h);
        h.finish()
    }

    #[test]
    fn test_start_layout() {
        let board = Board::start();
        assert_eq!(
            board.read(sq("e1")),
            Some(Piece::new(PieceKind::King, Color::White))
        );
        assert_eq!(
            board.read(sq("d8")),
            Some(Piece::new(PieceKind::Queen, Color::Black))
        );
        assert!(board.is_empty(sq("e4")));
        assert_eq!(board.pieces().count(), 32);
        assert_eq!(board.king_position(Color::Black), Some(sq("e8")));
    }

    #[test]
    fn test_edit_leaves_original_untouched() {
        let board = Board::start();
        let moved = board.edit(|w| w.shift(sq("e2"), sq("e4")));
        assert!(board.is_empty(sq("e4")));
        assert!(moved.is_empty(sq("e2")));
        assert_ne!(board, moved);
        assert_ne!(hash_of(&board), hash_of(&moved));
    }

    #[test]
    fn test_put_rejects_occupied() {
        let pawn = Piece::new(PieceKind::Pawn, Color::White);
        let board = Board::blank().put(pawn, sq("a2")).unwrap();
        assert_eq!(board.read(sq("a2")), Some(pawn));
        assert!(board.put(pawn, sq("a2")).is_err());
    }

    #[test]
    fn test_equal_content_equal_hash() {
        let a = Board::start().edit(|w| w.shift(sq("g1"), sq("f3")));
        let b = Board::start().edit(|w| w.shift(sq("g1"), sq("f3")));
        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));
    }
}
