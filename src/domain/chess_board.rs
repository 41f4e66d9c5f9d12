//! A position: the grid plus side to move, castling rights and move history
//! needed to judge legality.

use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

use crate::domain::board::Board;
use crate::domain::castling::{CastleSide, CastlingRights};
use crate::domain::chess::{Color, Piece, PieceKind};
use crate::domain::moves::{RawMove, ValidMove};
use crate::domain::pieces::{attackers, is_attacked};
use crate::domain::position::Position;
use crate::domain::validator::MoveValidator;
use crate::error::{BoardError, IllegalMoveReason, MoveError};

/// Immutable position. Two chess boards are equal when grid and side to move
/// match; counters, castling rights and the last move do not take part.
#[derive(Clone, Debug)]
pub struct ChessBoard {
    board: Board,
    color: Color,
    castling: CastlingRights,
    last_move: Option<ValidMove>,
    en_passant: Option<Position>,
    halfmove_clock: u32,
    fullmove_number: u32,
}

impl ChessBoard {
    /// The standard initial position, White to move
    pub fn new() -> Self {
        Self {
            board: Board::start(),
            color: Color::White,
            castling: CastlingRights::all(),
            last_move: None,
            en_passant: None,
            halfmove_clock: 0,
            fullmove_number: 1,
        }
    }

    /// An empty board with `color` to move and no castling rights
    pub fn blank(color: Color) -> Self {
        Self {
            board: Board::blank(),
            color,
            castling: CastlingRights::none(),
            ..Self::new()
        }
    }

    /// Assemble a position from snapshot parts
    pub fn from_parts(
        board: Board,
        color: Color,
        castling: CastlingRights,
        en_passant: Option<Position>,
        halfmove_clock: u32,
        fullmove_number: u32,
    ) -> Self {
        Self {
            board,
            color,
            castling,
            last_move: None,
            en_passant,
            halfmove_clock,
            fullmove_number,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Side to move
    pub fn color(&self) -> Color {
        self.color
    }

    pub fn castling(&self) -> CastlingRights {
        self.castling
    }

    pub fn last_move(&self) -> Option<&ValidMove> {
        self.last_move.as_ref()
    }

    /// Square a pawn may capture onto en passant, if any
    pub fn en_passant(&self) -> Option<Position> {
        self.en_passant
    }

    pub fn halfmove_clock(&self) -> u32 {
        self.halfmove_clock
    }

    pub fn fullmove_number(&self) -> u32 {
        self.fullmove_number
    }

    pub fn field(&self, position: Position) -> Option<Piece> {
        self.board.read(position)
    }

    /// New position with `piece` placed on an empty square
    pub fn put(&self, piece: Piece, position: Position) -> Result<ChessBoard, BoardError> {
        Ok(Self {
            board: self.board.put(piece, position)?,
            ..self.clone()
        })
    }

    pub fn validator(&self) -> MoveValidator<'_> {
        MoveValidator::new(self)
    }

    pub fn validate(&self, mv: RawMove) -> Result<ValidMove, MoveError> {
        self.validator().validate(mv)
    }

    /// Validate and play a raw move
    pub fn make_move(&self, mv: RawMove) -> Result<ChessBoard, MoveError> {
        let valid = self.validate(mv)?;
        Ok(self.apply(valid))
    }

    /// Play a move already validated, re-checking that it belongs to this position
    pub fn play(&self, mv: &ValidMove) -> Result<ChessBoard, MoveError> {
        let revalidated = self.validate(mv.raw())?;
        if &revalidated != mv {
            return Err(MoveError::illegal(mv.raw(), IllegalMoveReason::ForeignMove));
        }
        Ok(self.apply(revalidated))
    }

    fn apply(&self, mv: ValidMove) -> ChessBoard {
        let en_passant = match &mv {
            ValidMove::Simple { from, to, piece, .. }
                if piece.kind == PieceKind::Pawn && from.y().abs_diff(to.y()) == 2 =>
            {
                from.offset(0, piece.color.forward())
            }
            _ => None,
        };
        let resets_clock = mv.moved_kind() == PieceKind::Pawn || mv.is_capture();
        ChessBoard {
            board: mv.apply(&self.board),
            color: self.color.swap(),
            castling: self.castling.after(&mv),
            en_passant,
            halfmove_clock: if resets_clock {
                0
            } else {
                self.halfmove_clock.saturating_add(1)
            },
            fullmove_number: match self.color {
                Color::White => self.fullmove_number,
                Color::Black => self.fullmove_number.saturating_add(1),
            },
            last_move: Some(mv),
        }
    }

    /// Pieces of one side with their squares, file-major
    pub fn pieces_of(&self, color: Color) -> Vec<(Position, Piece)> {
        self.board
            .pieces()
            .filter(|(_, piece)| piece.color == color)
            .collect()
    }

    /// For every square attacked by `color`, how many of its pieces attack it
    pub fn attack_counts(&self, color: Color) -> BTreeMap<Position, usize> {
        Position::all()
            .map(|p| (p, attackers(&self.board, p, color).len()))
            .filter(|&(_, n)| n > 0)
            .collect()
    }

    pub fn is_attacked_by(&self, position: Position, color: Color) -> bool {
        is_attacked(&self.board, position, color)
    }

    /// Whether the side to move is in check
    pub fn is_check(&self) -> bool {
        self.board
            .king_position(self.color)
            .is_some_and(|king| self.is_attacked_by(king, self.color.swap()))
    }

    pub fn is_checkmate(&self) -> bool {
        self.is_check() && self.all_possible_valid_moves().is_empty()
    }

    pub fn is_stalemate(&self) -> bool {
        !self.is_check() && self.all_possible_valid_moves().is_empty()
    }

    /// Every legal move for the side to move.
    ///
    /// Pseudo-legal candidates of each own piece (plus castles and en passant)
    /// go through the full validator; failures are dropped and promotions are
    /// expanded into one move per piece kind.
    pub fn all_possible_valid_moves(&self) -> Vec<ValidMove> {
        let mut result = Vec::new();
        for (from, piece) in self.pieces_of(self.color) {
            let mut targets = piece.possible_end_positions(from, &self.board);
            match piece.kind {
                PieceKind::Pawn => {
                    if let Some(ep) = self.en_passant {
                        targets.push(ep);
                    }
                }
                PieceKind::King => {
                    for side in CastleSide::BOTH {
                        targets.push(CastleSide::square(side.king_target_file(), self.color));
                    }
                }
                _ => {}
            }
            targets.dedup();
            for to in targets {
                if to == from {
                    continue;
                }
                match self.validate(RawMove::new(from, to)) {
                    Ok(mv) => {
                        if !result.contains(&mv) {
                            result.push(mv);
                        }
                    }
                    Err(MoveError::PromotionPending(pending)) => {
                        result.extend(
                            PieceKind::PROMOTIONS
                                .iter()
                                .filter_map(|&kind| pending.with_piece_kind(kind).ok()),
                        );
                    }
                    Err(MoveError::Illegal { .. }) => {}
                }
            }
        }
        result
    }
}

impl Default for ChessBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for ChessBoard {
    fn eq(&self, other: &Self) -> bool {
        self.board == other.board && self.color == other.color
    }
}

impl Eq for ChessBoard {}

impl Hash for ChessBoard {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.board.hash(state);
        self.color.hash(state);
    }
}
