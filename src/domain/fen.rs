//! FEN snapshots of a [`ChessBoard`].
//!
//! Half-move clock and full-move number are optional on input and default to
//! `0` and `1`.

use crate::domain::board::Board;
use crate::domain::castling::{CastleSide, CastlingRights};
use crate::domain::chess::{Color, Piece};
use crate::domain::chess_board::ChessBoard;
use crate::domain::position::Position;
use crate::error::FenError;

pub const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

impl ChessBoard {
    pub fn from_fen(fen: &str) -> Result<ChessBoard, FenError> {
        let fields: Vec<&str> = fen.split_whitespace().collect();
        if fields.len() < 4 {
            return Err(FenError::MissingFields(fields.len()));
        }
        let board = parse_placement(fields[0])?;
        let color = match fields[1] {
            "w" => Color::White,
            "b" => Color::Black,
            other => return Err(FenError::SideToMove(other.to_string())),
        };
        let castling = parse_castling(fields[2])?;
        let en_passant = match fields[3] {
            "-" => None,
            square => Some(
                Position::from_algebraic(square)
                    .filter(|p| p.y() == 3 || p.y() == 6)
                    .ok_or_else(|| FenError::EnPassant(square.to_string()))?,
            ),
        };
        let counter = |index: usize, default: u32| match fields.get(index) {
            None => Ok(default),
            Some(s) => s.parse::<u32>().map_err(|_| FenError::Counter(s.to_string())),
        };
        let halfmove_clock = counter(4, 0)?;
        let fullmove_number = counter(5, 1)?;
        Ok(ChessBoard::from_parts(
            board,
            color,
            castling,
            en_passant,
            halfmove_clock,
            fullmove_number,
        ))
    }

    pub fn to_fen(&self) -> String {
        let mut placement = String::new();
        for y in (1..=8u8).rev() {
            let mut empty = 0;
            for x in 1..=8u8 {
                match self.field(Position::at(x, y)) {
                    None => empty += 1,
                    Some(piece) => {
                        if empty > 0 {
                            placement.push_str(&empty.to_string());
                            empty = 0;
                        }
                        placement.push(piece.to_fen_char());
                    }
                }
            }
            if empty > 0 {
                placement.push_str(&empty.to_string());
            }
            if y > 1 {
                placement.push('/');
            }
        }
        let side = match self.color() {
            Color::White => "w",
            Color::Black => "b",
        };
        let en_passant = self
            .en_passant()
            .map_or_else(|| "-".to_string(), |p| p.to_string());
        format!(
            "{} {} {} {} {} {}",
            placement,
            side,
            self.castling().to_fen(),
            en_passant,
            self.halfmove_clock(),
            self.fullmove_number()
        )
    }
}

fn parse_placement(placement: &str) -> Result<Board, FenError> {
    let invalid = || FenError::Placement(placement.to_string());
    let ranks: Vec<&str> = placement.split('/').collect();
    if ranks.len() != 8 {
        return Err(invalid());
    }
    let mut board = Board::blank();
    for (row, rank) in ranks.iter().enumerate() {
        let y = 8 - row as u8;
        let mut x = 1u8;
        for c in rank.chars() {
            if let Some(run) = c.to_digit(10) {
                if !(1..=8).contains(&run) {
                    return Err(invalid());
                }
                x += run as u8;
            } else {
                let piece = Piece::from_fen_char(c).ok_or_else(invalid)?;
                let position = Position::new(x, y).ok_or_else(invalid)?;
                board = board.put(piece, position).map_err(|_| invalid())?;
                x += 1;
            }
            if x > 9 {
                return Err(invalid());
            }
        }
        if x != 9 {
            return Err(invalid());
        }
    }
    Ok(board)
}

fn parse_castling(field: &str) -> Result<CastlingRights, FenError> {
    let mut rights = CastlingRights::none();
    if field == "-" {
        return Ok(rights);
    }
    for c in field.chars() {
        let (color, side) = match c {
            'K' => (Color::White, CastleSide::Short),
            'Q' => (Color::White, CastleSide::Long),
            'k' => (Color::Black, CastleSide::Short),
            'q' => (Color::Black, CastleSide::Long),
            _ => return Err(FenError::Castling(field.to_string())),
        };
        rights = rights.with(color, side, true);
    }
    Ok(rights)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::moves::RawMove;

    #[test]
    fn test_start_fen_roundtrip() {
        let board = ChessBoard::from_fen(START_FEN).unwrap();
        assert_eq!(board, ChessBoard::new());
        assert_eq!(board.to_fen(), START_FEN);
        assert_eq!(ChessBoard::new().to_fen(), START_FEN);
    }

    #[test]
    fn test_fen_after_e4() {
        let board = ChessBoard::new()
            .make_move(RawMove::from_coordinates("e2e4").unwrap())
            .unwrap();
        assert_eq!(
            board.to_fen(),
            "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1"
        );
    }

    #[test]
    fn test_short_fen_defaults_counters() {
        let board = ChessBoard::from_fen("8/8/8/8/8/8/8/K6k b - -").unwrap();
        assert_eq!(board.halfmove_clock(), 0);
        assert_eq!(board.fullmove_number(), 1);
        assert_eq!(board.color(), Color::Black);
    }

    #[test]
    fn test_invalid_fens() {
        assert_eq!(
            ChessBoard::from_fen("8/8/8 w - -"),
            Err(FenError::Placement("8/8/8".to_string()))
        );
        let parse = ChessBoard::from_fen;
        assert!(matches!(parse("8/8/8/8/8/8/8/8 x - -"), Err(FenError::SideToMove(_))));
        assert!(matches!(parse("8/8/8/8/8/8/8/8 w X -"), Err(FenError::Castling(_))));
        assert!(matches!(parse("8/8/8/8/8/8/8/8 w - e4"), Err(FenError::EnPassant(_))));
        assert!(matches!(parse("9/8/8/8/8/8/8/8 w - -"), Err(FenError::Placement(_))));
        assert!(matches!(parse("8/8/8/8/8/8/8/8 w"), Err(FenError::MissingFields(2))));
    }
}
