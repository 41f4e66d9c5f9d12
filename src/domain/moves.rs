//! Raw and validated moves.
//!
//! A [`RawMove`] is just two squares and an optional promotion piece; it says
//! nothing about legality. A [`ValidMove`] can only be obtained from the
//! validator and is the sole evidence that a move is legal on some position.

use std::fmt;
use std::str::FromStr;

use crate::domain::board::Board;
use crate::domain::castling::CastleSide;
use crate::domain::chess::{Color, Piece, PieceKind};
use crate::domain::position::Position;
use crate::error::{CoordinateError, IllegalMoveReason, MoveError};

/// An untyped (from, to) pair, optionally tagged with a promotion piece
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct RawMove {
    pub from: Position,
    pub to: Position,
    pub promotion: Option<PieceKind>,
}

impl RawMove {
    pub fn new(from: Position, to: Position) -> Self {
        Self {
            from,
            to,
            promotion: None,
        }
    }

    pub fn with_promotion(from: Position, to: Position, kind: PieceKind) -> Self {
        Self {
            from,
            to,
            promotion: Some(kind),
        }
    }

    /// The raw representation of a validated move
    pub fn of(mv: &ValidMove) -> Self {
        mv.raw()
    }

    /// Parse coordinate notation: `e2e4`, `e7e8q`
    pub fn from_coordinates(s: &str) -> Result<Self, CoordinateError> {
        let invalid = || CoordinateError::Move(s.to_string());
        if !s.is_ascii() || !(4..=5).contains(&s.len()) {
            return Err(invalid());
        }
        let from = Position::from_algebraic(&s[0..2]).ok_or_else(invalid)?;
        let to = Position::from_algebraic(&s[2..4]).ok_or_else(invalid)?;
        let promotion = match s[4..].chars().next() {
            None => None,
            Some(c) => Some(
                PieceKind::from_letter(c)
                    .filter(|k| k.is_promotion_target())
                    .ok_or_else(invalid)?,
            ),
        };
        Ok(Self {
            from,
            to,
            promotion,
        })
    }
}

impl fmt::Display for RawMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.from, self.to)?;
        if let Some(kind) = self.promotion {
            write!(f, "{}", kind.letter().to_ascii_lowercase())?;
        }
        Ok(())
    }
}

impl FromStr for RawMove {
    type Err = CoordinateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_coordinates(s)
    }
}

/// A move proven legal on the position it was validated against
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum ValidMove {
    /// Ordinary move or capture
    Simple {
        from: Position,
        to: Position,
        piece: Piece,
        captured: Option<Piece>,
    },
    /// King move plus the companion rook move
    Castle {
        color: Color,
        side: CastleSide,
        king: RawMove,
        rook: RawMove,
    },
    EnPassantCapture {
        from: Position,
        to: Position,
        color: Color,
        /// Square of the captured pawn, beside `from`
        captured_at: Position,
    },
    Promotion {
        from: Position,
        to: Position,
        color: Color,
        kind: PieceKind,
        captured: Option<Piece>,
    },
}

impl ValidMove {
    pub fn from(&self) -> Position {
        match self {
            ValidMove::Simple { from, .. }
            | ValidMove::EnPassantCapture { from, .. }
            | ValidMove::Promotion { from, .. } => *from,
            ValidMove::Castle { king, .. } => king.from,
        }
    }

    pub fn to(&self) -> Position {
        match self {
            ValidMove::Simple { to, .. }
            | ValidMove::EnPassantCapture { to, .. }
            | ValidMove::Promotion { to, .. } => *to,
            ValidMove::Castle { king, .. } => king.to,
        }
    }

    /// Side that made the move
    pub fn color(&self) -> Color {
        match self {
            ValidMove::Simple { piece, .. } => piece.color,
            ValidMove::Castle { color, .. }
            | ValidMove::EnPassantCapture { color, .. }
            | ValidMove::Promotion { color, .. } => *color,
        }
    }

    /// Kind of the piece that left `from`
    pub fn moved_kind(&self) -> PieceKind {
        match self {
            ValidMove::Simple { piece, .. } => piece.kind,
            ValidMove::Castle { .. } => PieceKind::King,
            ValidMove::EnPassantCapture { .. } | ValidMove::Promotion { .. } => PieceKind::Pawn,
        }
    }

    pub fn captured(&self) -> Option<Piece> {
        match self {
            ValidMove::Simple { captured, .. } | ValidMove::Promotion { captured, .. } => *captured,
            ValidMove::EnPassantCapture { color, .. } => {
                Some(Piece::new(PieceKind::Pawn, color.swap()))
            }
            ValidMove::Castle { .. } => None,
        }
    }

    pub fn is_capture(&self) -> bool {
        self.captured().is_some()
    }

    /// Representation as a raw move; castles are written as the king's move
    pub fn raw(&self) -> RawMove {
        match self {
            ValidMove::Promotion { from, to, kind, .. } => {
                RawMove::with_promotion(*from, *to, *kind)
            }
            ValidMove::Castle { king, .. } => *king,
            _ => RawMove::new(self.from(), self.to()),
        }
    }

    /// The grid after this move, built on a private copy of `board`
    pub(crate) fn apply(&self, board: &Board) -> Board {
        board.edit(|w| match self {
            ValidMove::Simple { from, to, .. } => w.shift(*from, *to),
            ValidMove::Castle { king, rook, .. } => {
                w.shift(king.from, king.to);
                w.shift(rook.from, rook.to);
            }
            ValidMove::EnPassantCapture {
                from,
                to,
                captured_at,
                ..
            } => {
                w.shift(*from, *to);
                w.write(*captured_at, None);
            }
            ValidMove::Promotion {
                from,
                to,
                color,
                kind,
                ..
            } => {
                w.write(*from, None);
                w.write(*to, Some(Piece::new(*kind, *color)));
            }
        })
    }
}

impl fmt::Display for ValidMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw())
    }
}

/// A legal pawn move onto the last rank that still lacks its piece kind.
///
/// Nothing is applied until [`PendingPromotion::with_piece_kind`] turns it into
/// a [`ValidMove`] and that move is played.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct PendingPromotion {
    from: Position,
    to: Position,
    color: Color,
    captured: Option<Piece>,
}

impl PendingPromotion {
    pub(crate) fn new(from: Position, to: Position, color: Color, captured: Option<Piece>) -> Self {
        Self {
            from,
            to,
            color,
            captured,
        }
    }

    pub fn raw(&self) -> RawMove {
        RawMove::new(self.from, self.to)
    }

    pub fn color(&self) -> Color {
        self.color
    }

    /// Finish the promotion with the chosen piece
    pub fn with_piece_kind(&self, kind: PieceKind) -> Result<ValidMove, MoveError> {
        if !kind.is_promotion_target() {
            return Err(MoveError::illegal(
                RawMove::with_promotion(self.from, self.to, kind),
                IllegalMoveReason::BadPromotionPiece,
            ));
        }
        Ok(ValidMove::Promotion {
            from: self.from,
            to: self.to,
            color: self.color,
            kind,
            captured: self.captured,
        })
    }
}
