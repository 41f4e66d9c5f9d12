//! Pure chess rules: no tree state, every value immutable.

pub mod board;
pub mod castling;
pub mod chess;
pub mod chess_board;
pub mod fen;
pub mod moves;
pub mod pgn;
pub mod pieces;
pub mod position;
pub mod san;
pub mod validator;

pub use board::Board;
pub use castling::{CastleSide, CastlingRights};
pub use chess::{Color, Piece, PieceKind};
pub use chess_board::ChessBoard;
pub use fen::START_FEN;
pub use moves::{PendingPromotion, RawMove, ValidMove};
pub use pgn::PgnGame;
pub use position::Position;
pub use validator::MoveValidator;
