//! The legality pipeline: classify a raw move into a [`ValidMove`] or reject it.
//!
//! Decision order is fixed:
//! 1. the moving square must hold a piece of the side to move, and `from != to`
//! 2. a king moving two files along its back rank is a castle
//! 3. a pawn stepping diagonally onto the en passant target is an en passant capture
//! 4. a pseudo-legal end position gives a simple move, or a promotion on the last rank
//! 5. anything else is illegal
//!
//! Every candidate is then played on a scratch board and discarded if it
//! leaves the mover's king attacked.

use crate::domain::board::Board;
use crate::domain::castling::CastleSide;
use crate::domain::chess::{Color, Piece, PieceKind};
use crate::domain::chess_board::ChessBoard;
use crate::domain::moves::{PendingPromotion, RawMove, ValidMove};
use crate::domain::pieces::is_attacked;
use crate::domain::position::Position;
use crate::error::{IllegalMoveReason, MoveError};

/// Result of classification before the king-safety filter
enum Candidate {
    Complete(ValidMove),
    Pending(PendingPromotion),
}

/// Validates raw moves against one position
pub struct MoveValidator<'a> {
    chess_board: &'a ChessBoard,
}

impl<'a> MoveValidator<'a> {
    pub fn new(chess_board: &'a ChessBoard) -> Self {
        Self { chess_board }
    }

    fn board(&self) -> &Board {
        self.chess_board.board()
    }

    fn color(&self) -> Color {
        self.chess_board.color()
    }

    /// Run the full pipeline. A pawn reaching the last rank without a
    /// promotion piece yields [`MoveError::PromotionPending`].
    pub fn validate(&self, mv: RawMove) -> Result<ValidMove, MoveError> {
        let candidate = self.classify(mv)?;
        let scratch = match &candidate {
            Candidate::Complete(valid) => valid.apply(self.board()),
            // the promoted piece's kind cannot change whether our king is attacked
            Candidate::Pending(pending) => pending
                .with_piece_kind(PieceKind::Queen)?
                .apply(self.board()),
        };
        if self.king_attacked_on(&scratch) {
            return Err(MoveError::illegal(mv, IllegalMoveReason::LeavesKingInCheck));
        }
        match candidate {
            Candidate::Complete(valid) => Ok(valid),
            Candidate::Pending(pending) => Err(MoveError::PromotionPending(pending)),
        }
    }

    /// Whether the move passes the pipeline (a pending promotion counts as legal)
    pub fn is_legal(&self, mv: RawMove) -> bool {
        matches!(
            self.validate(mv),
            Ok(_) | Err(MoveError::PromotionPending(_))
        )
    }

    fn classify(&self, mv: RawMove) -> Result<Candidate, MoveError> {
        let reject = |reason| Err(MoveError::illegal(mv, reason));
        if mv.from == mv.to {
            return reject(IllegalMoveReason::NullMove);
        }
        let Some(piece) = self.board().read(mv.from) else {
            return reject(IllegalMoveReason::EmptySquare);
        };
        if piece.color != self.color() {
            return reject(IllegalMoveReason::WrongColor);
        }

        if let Some(side) = self.castle_pattern(mv, piece) {
            if mv.promotion.is_some() {
                return reject(IllegalMoveReason::UnexpectedPromotion);
            }
            return self.castle(mv, side).map(Candidate::Complete);
        }

        if self.is_en_passant_pattern(mv, piece) {
            if mv.promotion.is_some() {
                return reject(IllegalMoveReason::UnexpectedPromotion);
            }
            return Ok(Candidate::Complete(ValidMove::EnPassantCapture {
                from: mv.from,
                to: mv.to,
                color: piece.color,
                captured_at: Position::at(mv.to.x(), mv.from.y()),
            }));
        }

        if !piece.possible_end_positions(mv.from, self.board()).contains(&mv.to) {
            return reject(IllegalMoveReason::Unreachable);
        }
        let captured = self.board().read(mv.to);

        if piece.kind == PieceKind::Pawn && mv.to.y() == piece.color.promotion_rank() {
            let pending = PendingPromotion::new(mv.from, mv.to, piece.color, captured);
            return match mv.promotion {
                None => Ok(Candidate::Pending(pending)),
                Some(kind) => pending.with_piece_kind(kind).map(Candidate::Complete),
            };
        }
        if mv.promotion.is_some() {
            return reject(IllegalMoveReason::UnexpectedPromotion);
        }
        Ok(Candidate::Complete(ValidMove::Simple {
            from: mv.from,
            to: mv.to,
            piece,
            captured,
        }))
    }

    /// The wing a king move castles to, if it has the castle shape
    pub fn castle_pattern(&self, mv: RawMove, piece: Piece) -> Option<CastleSide> {
        let back = piece.color.back_rank();
        if piece.kind != PieceKind::King || mv.from != Position::at(5, back) || mv.to.y() != back {
            return None;
        }
        CastleSide::BOTH
            .into_iter()
            .find(|side| mv.to.x() == side.king_target_file())
    }

    fn castle(&self, mv: RawMove, side: CastleSide) -> Result<ValidMove, MoveError> {
        let color = self.color();
        let reject = |reason| Err(MoveError::illegal(mv, reason));
        let rook_from = CastleSide::square(side.rook_file(), color);
        let rook_in_place =
            self.board().read(rook_from) == Some(Piece::new(PieceKind::Rook, color));
        if !self.chess_board.castling().can_castle(color, side) || !rook_in_place {
            return reject(IllegalMoveReason::CastleRightsLost);
        }
        if side
            .empty_files()
            .iter()
            .any(|&file| !self.board().is_empty(CastleSide::square(file, color)))
        {
            return reject(IllegalMoveReason::CastlePathBlocked);
        }
        if is_attacked(self.board(), mv.from, color.swap()) {
            return reject(IllegalMoveReason::CastleFromCheck);
        }
        if side
            .king_path_files()
            .iter()
            .any(|&file| is_attacked(self.board(), CastleSide::square(file, color), color.swap()))
        {
            return reject(IllegalMoveReason::CastleThroughCheck);
        }
        Ok(ValidMove::Castle {
            color,
            side,
            king: RawMove::new(mv.from, mv.to),
            rook: RawMove::new(rook_from, CastleSide::square(side.rook_target_file(), color)),
        })
    }

    /// A pawn stepping diagonally onto the empty en passant target square
    pub fn is_en_passant_pattern(&self, mv: RawMove, piece: Piece) -> bool {
        piece.kind == PieceKind::Pawn
            && self.chess_board.en_passant() == Some(mv.to)
            && self.board().is_empty(mv.to)
            && mv.to.y() as i8 - mv.from.y() as i8 == piece.color.forward()
            && (mv.to.x() as i8 - mv.from.x() as i8).abs() == 1
            && self.board().read(Position::at(mv.to.x(), mv.from.y()))
                == Some(Piece::new(PieceKind::Pawn, piece.color.swap()))
    }

    fn king_attacked_on(&self, board: &Board) -> bool {
        match board.king_position(self.color()) {
            Some(king) => is_attacked(board, king, self.color().swap()),
            // positions without a king (diagram setups) have nothing to protect
            None => false,
        }
    }
}
