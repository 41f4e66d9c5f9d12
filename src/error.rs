//! Errors of the rules engine and of the diagram tree built on it.

use thiserror::Error;

use crate::domain::moves::{PendingPromotion, RawMove};
use crate::domain::position::Position;

/// Why the move pipeline refused a raw move
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum IllegalMoveReason {
    #[error("no piece on the starting square")]
    EmptySquare,
    #[error("the piece belongs to the side not on move")]
    WrongColor,
    #[error("start and end square are the same")]
    NullMove,
    #[error("the piece cannot reach that square")]
    Unreachable,
    #[error("the move leaves the king in check")]
    LeavesKingInCheck,
    #[error("the king or rook has already moved")]
    CastleRightsLost,
    #[error("squares between king and rook are occupied")]
    CastlePathBlocked,
    #[error("cannot castle out of check")]
    CastleFromCheck,
    #[error("the king would pass through an attacked square")]
    CastleThroughCheck,
    #[error("pawns cannot promote to that piece")]
    BadPromotionPiece,
    #[error("a promotion piece was given for a move that does not promote")]
    UnexpectedPromotion,
    #[error("the move was not validated on this position")]
    ForeignMove,
}

/// Failure of the legality pipeline
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MoveError {
    #[error("illegal move {mv}: {reason}")]
    Illegal {
        mv: RawMove,
        reason: IllegalMoveReason,
    },
    /// The move is legal but the pawn still needs a piece to promote to
    #[error("promotion {} awaits a piece choice", .0.raw())]
    PromotionPending(PendingPromotion),
}

impl MoveError {
    pub(crate) fn illegal(mv: RawMove, reason: IllegalMoveReason) -> Self {
        MoveError::Illegal { mv, reason }
    }
}

/// Failure to turn a short algebraic token into a move
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NotationError {
    #[error("unrecognized move notation `{0}`")]
    Malformed(String),
    /// The token has a known shape but zero or several pieces fit it
    #[error("`{token}` matches {candidates} pieces")]
    Ambiguous { token: String, candidates: usize },
    /// Guard against overlapping notation shapes. The shapes of each token
    /// length are disjoint by syntax, so no token currently reaches it.
    #[error("`{0}` fits more than one notation shape")]
    ConflictingShapes(String),
}

/// Failure to merge two diagram trees
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MergeError {
    #[error("the roots of the merged trees hold different positions")]
    RootMismatch,
    #[error("no diagram with id {0}")]
    UnknownDiagram(usize),
}

/// Failure to read a FEN snapshot
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FenError {
    #[error("expected at least 4 fields, found {0}")]
    MissingFields(usize),
    #[error("invalid piece placement `{0}`")]
    Placement(String),
    #[error("invalid side to move `{0}`")]
    SideToMove(String),
    #[error("invalid castling field `{0}`")]
    Castling(String),
    #[error("invalid en passant square `{0}`")]
    EnPassant(String),
    #[error("invalid move counter `{0}`")]
    Counter(String),
}

/// Failure to read a coordinate such as `e4` or `e7e8q`
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CoordinateError {
    #[error("invalid square `{0}`")]
    Square(String),
    #[error("invalid coordinate move `{0}`")]
    Move(String),
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BoardError {
    #[error("square {0} is already occupied")]
    Occupied(Position),
}

/// A game that could not be imported, naming the offending token
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("move {ply} (`{token}`): {source}")]
pub struct ImportError {
    /// 1-based half-move index of the failing token
    pub ply: usize,
    pub token: String,
    pub source: Error,
}

impl ImportError {
    /// Failure before any move was looked at
    pub(crate) fn at_start(source: impl Into<Error>) -> Self {
        Self {
            ply: 0,
            token: String::new(),
            source: source.into(),
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum Error {
    #[error(transparent)]
    Move(#[from] MoveError),
    #[error(transparent)]
    Notation(#[from] NotationError),
    #[error(transparent)]
    Merge(#[from] MergeError),
    #[error(transparent)]
    Fen(#[from] FenError),
    #[error(transparent)]
    Coordinate(#[from] CoordinateError),
    #[error(transparent)]
    Board(#[from] BoardError),
    #[error("no diagram with id {0}")]
    UnknownDiagram(usize),
    #[error("the root diagram cannot be deleted")]
    DeleteRoot,
    #[error("no promotion is waiting for a piece")]
    NoPendingPromotion,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
