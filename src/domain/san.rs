//! Short algebraic notation.
//!
//! [`parse`] turns a token such as `Nf3`, `exd5`, `Rad1` or `e8=Q` into a
//! [`RawMove`] by finding the one piece of the side to move that can make it.
//! [`to_san`] writes the canonical token for a legal move. The two are inverses
//! on the legal moves of a position.

use crate::domain::castling::CastleSide;
use crate::domain::chess::{Piece, PieceKind};
use crate::domain::chess_board::ChessBoard;
use crate::domain::moves::{RawMove, ValidMove};
use crate::domain::position::Position;
use crate::error::NotationError;

/// Which squares a disambiguator allows the moving piece to start from
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Origin {
    Any,
    File(u8),
    Rank(u8),
    Square(Position),
}

impl Origin {
    fn admits(self, from: Position) -> bool {
        match self {
            Origin::Any => true,
            Origin::File(x) => from.x() == x,
            Origin::Rank(y) => from.y() == y,
            Origin::Square(p) => from == p,
        }
    }
}

/// A token taken apart, before the board is consulted
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
struct Shape {
    kind: PieceKind,
    origin: Origin,
    target: Position,
    promotion: Option<PieceKind>,
}

type Matcher = fn(&[char]) -> Option<Shape>;

/// Candidate shapes per token length. For a well-formed token at most one
/// of them matches.
fn matchers(len: usize) -> &'static [Matcher] {
    match len {
        2 => &[pawn_push],
        3 => &[piece_move, bare_pawn_capture],
        4 => &[piece_capture, disambiguated_piece_move, pawn_capture, promotion],
        5 => &[
            disambiguated_piece_capture,
            square_disambiguated_piece_move,
            file_promotion,
            bare_capture_promotion,
        ],
        6 => &[square_disambiguated_piece_capture, pawn_capture_promotion],
        _ => &[],
    }
}

/// Parse a token against the side to move on `board`.
///
/// Only geometry is consulted unless several pieces fit; then the ones whose
/// move would leave their king in check are dropped.
pub fn parse(token: &str, board: &ChessBoard) -> Result<RawMove, NotationError> {
    let stripped = token.trim().trim_end_matches(['+', '#']);
    if let Some(side) = castle_side(stripped) {
        let color = board.color();
        return Ok(RawMove::new(
            CastleSide::square(5, color),
            CastleSide::square(side.king_target_file(), color),
        ));
    }

    let chars: Vec<char> = stripped.chars().collect();
    let mut shapes = matchers(chars.len()).iter().filter_map(|m| m(&chars));
    let shape = match (shapes.next(), shapes.next()) {
        (None, _) => return Err(NotationError::Malformed(token.to_string())),
        (Some(shape), None) => shape,
        (Some(_), Some(_)) => return Err(NotationError::ConflictingShapes(token.to_string())),
    };
    resolve(token, shape, board)
}

fn resolve(token: &str, shape: Shape, board: &ChessBoard) -> Result<RawMove, NotationError> {
    let piece = Piece::new(shape.kind, board.color());
    let validator = board.validator();
    let raw_from = |from: Position| RawMove {
        from,
        to: shape.target,
        promotion: shape.promotion,
    };

    let mut candidates: Vec<Position> = piece
        .possible_start_positions(shape.target, board.board())
        .into_iter()
        .filter(|&from| board.field(from) == Some(piece))
        .filter(|&from| {
            piece
                .possible_end_positions(from, board.board())
                .contains(&shape.target)
                || validator.is_en_passant_pattern(RawMove::new(from, shape.target), piece)
        })
        .filter(|&from| shape.origin.admits(from))
        .collect();
    candidates.sort();
    candidates.dedup();

    if candidates.len() > 1 {
        candidates.retain(|&from| validator.is_legal(raw_from(from)));
    }
    match candidates.as_slice() {
        [from] => Ok(raw_from(*from)),
        _ => Err(NotationError::Ambiguous {
            token: token.to_string(),
            candidates: candidates.len(),
        }),
    }
}

fn castle_side(token: &str) -> Option<CastleSide> {
    match token {
        "O-O" | "0-0" => Some(CastleSide::Short),
        "O-O-O" | "0-0-0" => Some(CastleSide::Long),
        _ => None,
    }
}

fn square(file: char, rank: char) -> Option<Position> {
    Position::new(Position::file_from_char(file)?, Position::rank_from_char(rank)?)
}

/// Uppercase piece letter; `P` is accepted for pawns
fn piece_letter(c: char) -> Option<PieceKind> {
    c.is_ascii_uppercase()
        .then(|| PieceKind::from_letter(c))
        .flatten()
}

fn promotion_letter(c: char) -> Option<PieceKind> {
    piece_letter(c).filter(|kind| kind.is_promotion_target())
}

fn disambiguator(c: char) -> Option<Origin> {
    Position::file_from_char(c)
        .map(Origin::File)
        .or_else(|| Position::rank_from_char(c).map(Origin::Rank))
}

fn shape(kind: PieceKind, origin: Origin, target: Position) -> Shape {
    Shape {
        kind,
        origin,
        target,
        promotion: None,
    }
}

// e4
fn pawn_push(c: &[char]) -> Option<Shape> {
    let &[f, r] = c else { return None };
    Some(shape(PieceKind::Pawn, Origin::Any, square(f, r)?))
}

// Nf3
fn piece_move(c: &[char]) -> Option<Shape> {
    let &[p, f, r] = c else { return None };
    Some(shape(piece_letter(p)?, Origin::Any, square(f, r)?))
}

// xe4
fn bare_pawn_capture(c: &[char]) -> Option<Shape> {
    let &['x', f, r] = c else { return None };
    Some(shape(PieceKind::Pawn, Origin::Any, square(f, r)?))
}

// Nxf3
fn piece_capture(c: &[char]) -> Option<Shape> {
    let &[p, 'x', f, r] = c else { return None };
    Some(shape(piece_letter(p)?, Origin::Any, square(f, r)?))
}

// Nbd2, R1e2
fn disambiguated_piece_move(c: &[char]) -> Option<Shape> {
    let &[p, d, f, r] = c else { return None };
    Some(shape(piece_letter(p)?, disambiguator(d)?, square(f, r)?))
}

// exd5
fn pawn_capture(c: &[char]) -> Option<Shape> {
    let &[d, 'x', f, r] = c else { return None };
    let file = Position::file_from_char(d)?;
    Some(shape(PieceKind::Pawn, Origin::File(file), square(f, r)?))
}

// e8=Q
fn promotion(c: &[char]) -> Option<Shape> {
    let &[f, r, '=', k] = c else { return None };
    Some(Shape {
        promotion: Some(promotion_letter(k)?),
        ..shape(PieceKind::Pawn, Origin::Any, square(f, r)?)
    })
}

// Nbxd2, R1xe2
fn disambiguated_piece_capture(c: &[char]) -> Option<Shape> {
    let &[p, d, 'x', f, r] = c else { return None };
    Some(shape(piece_letter(p)?, disambiguator(d)?, square(f, r)?))
}

// Qh4e1
fn square_disambiguated_piece_move(c: &[char]) -> Option<Shape> {
    let &[p, df, dr, f, r] = c else { return None };
    Some(shape(piece_letter(p)?, Origin::Square(square(df, dr)?), square(f, r)?))
}

// de8=Q
fn file_promotion(c: &[char]) -> Option<Shape> {
    let &[d, f, r, '=', k] = c else { return None };
    Some(Shape {
        promotion: Some(promotion_letter(k)?),
        ..shape(PieceKind::Pawn, Origin::File(Position::file_from_char(d)?), square(f, r)?)
    })
}

// xe8=Q
fn bare_capture_promotion(c: &[char]) -> Option<Shape> {
    let &['x', f, r, '=', k] = c else { return None };
    Some(Shape {
        promotion: Some(promotion_letter(k)?),
        ..shape(PieceKind::Pawn, Origin::Any, square(f, r)?)
    })
}

// Qh4xe1
fn square_disambiguated_piece_capture(c: &[char]) -> Option<Shape> {
    let &[p, df, dr, 'x', f, r] = c else { return None };
    Some(shape(piece_letter(p)?, Origin::Square(square(df, dr)?), square(f, r)?))
}

// dxe8=Q
fn pawn_capture_promotion(c: &[char]) -> Option<Shape> {
    let &[d, 'x', f, r, '=', k] = c else { return None };
    Some(Shape {
        promotion: Some(promotion_letter(k)?),
        ..shape(PieceKind::Pawn, Origin::File(Position::file_from_char(d)?), square(f, r)?)
    })
}

/// Canonical short algebraic token for a move legal on `board`
pub fn to_san(board: &ChessBoard, mv: &ValidMove) -> String {
    let mut san = match mv {
        ValidMove::Castle { side, .. } => side.notation().to_string(),
        _ if mv.moved_kind() == PieceKind::Pawn => {
            let mut s = String::new();
            if mv.is_capture() {
                s.push(mv.from().file_char());
                s.push('x');
            }
            s.push_str(&mv.to().to_string());
            if let ValidMove::Promotion { kind, .. } = mv {
                s.push('=');
                s.push(kind.letter());
            }
            s
        }
        _ => {
            let mut s = String::new();
            s.push(mv.moved_kind().letter());
            s.push_str(&disambiguation(board, mv));
            if mv.is_capture() {
                s.push('x');
            }
            s.push_str(&mv.to().to_string());
            s
        }
    };
    if let Ok(after) = board.play(mv) {
        if after.is_checkmate() {
            san.push('#');
        } else if after.is_check() {
            san.push('+');
        }
    }
    san
}

/// File, rank or full square of the origin, as much as needed to tell `mv`
/// apart from other legal moves of the same kind onto the same square
fn disambiguation(board: &ChessBoard, mv: &ValidMove) -> String {
    let from = mv.from();
    let rivals: Vec<Position> = board
        .all_possible_valid_moves()
        .iter()
        .filter(|other| {
            !matches!(other, ValidMove::Castle { .. })
                && other.moved_kind() == mv.moved_kind()
                && other.to() == mv.to()
                && other.from() != from
        })
        .map(ValidMove::from)
        .collect();
    if rivals.is_empty() {
        String::new()
    } else if rivals.iter().all(|r| r.x() != from.x()) {
        from.file_char().to_string()
    } else if rivals.iter().all(|r| r.y() != from.y()) {
        from.rank_char().to_string()
    } else {
        from.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::chess::Color;
    use std::collections::HashSet;

    fn sq(s: &str) -> Position {
        Position::from_algebraic(s).unwrap()
    }

    fn play_san(moves: &[&str]) -> ChessBoard {
        moves.iter().fold(ChessBoard::new(), |board, token| {
            let raw = parse(token, &board).unwrap();
            board.make_move(raw).unwrap()
        })
    }

    #[test]
    fn test_pawn_push_and_knight() {
        let start = ChessBoard::new();
        assert_eq!(parse("e4", &start).unwrap(), RawMove::new(sq("e2"), sq("e4")));
        assert_eq!(parse("e3", &start).unwrap(), RawMove::new(sq("e2"), sq("e3")));
        assert_eq!(parse("Nf3", &start).unwrap(), RawMove::new(sq("g1"), sq("f3")));
        assert_eq!(parse("Pd4", &start).unwrap(), RawMove::new(sq("d2"), sq("d4")));
    }

    #[test]
    fn test_black_to_move() {
        let board = play_san(&["e4"]);
        assert_eq!(parse("c5", &board).unwrap(), RawMove::new(sq("c7"), sq("c5")));
        assert_eq!(parse("Nc6", &board).unwrap(), RawMove::new(sq("b8"), sq("c6")));
    }

    #[test]
    fn test_captures_and_check_marks() {
        let board = play_san(&["e4", "d5"]);
        assert_eq!(parse("exd5", &board).unwrap(), RawMove::new(sq("e4"), sq("d5")));
        assert_eq!(parse("xd5", &board).unwrap(), RawMove::new(sq("e4"), sq("d5")));
        let board = play_san(&["e4", "e5", "Qh5", "Nc6", "Bc4", "Nf6"]);
        assert_eq!(parse("Qxf7#", &board).unwrap(), RawMove::new(sq("h5"), sq("f7")));
        assert_eq!(parse("Qxf7+", &board).unwrap(), RawMove::new(sq("h5"), sq("f7")));
    }

    #[test]
    fn test_castle_tokens() {
        let board = play_san(&["e4", "e5", "Nf3", "Nc6", "Bc4", "Bc5"]);
        assert_eq!(parse("O-O", &board).unwrap(), RawMove::new(sq("e1"), sq("g1")));
        assert_eq!(parse("0-0", &board).unwrap(), RawMove::new(sq("e1"), sq("g1")));
        let black = ChessBoard::from_fen("r3k3/8/8/8/8/8/8/4K3 b q - 0 1").unwrap();
        assert_eq!(parse("O-O-O", &black).unwrap(), RawMove::new(sq("e8"), sq("c8")));
    }

    #[test]
    fn test_disambiguation() {
        let board = ChessBoard::from_fen("7k/8/8/8/8/8/8/R4R1K w - - 0 1").unwrap();
        assert!(matches!(
            parse("Rd1", &board),
            Err(NotationError::Ambiguous { candidates: 2, .. })
        ));
        assert_eq!(parse("Rad1", &board).unwrap(), RawMove::new(sq("a1"), sq("d1")));
        assert_eq!(parse("Rfd1", &board).unwrap(), RawMove::new(sq("f1"), sq("d1")));
        assert_eq!(parse("Rfxd1", &board).unwrap(), RawMove::new(sq("f1"), sq("d1")));

        let board = ChessBoard::from_fen("4k3/8/8/8/R7/8/8/R3K3 w - - 0 1").unwrap();
        assert_eq!(parse("R1a2", &board).unwrap(), RawMove::new(sq("a1"), sq("a2")));
        assert_eq!(parse("R4a2", &board).unwrap(), RawMove::new(sq("a4"), sq("a2")));

        let board = ChessBoard::from_fen("4k3/8/8/8/Q6Q/8/8/Q3K3 w - - 0 1").unwrap();
        assert_eq!(parse("Qa4d1", &board).unwrap(), RawMove::new(sq("a4"), sq("d1")));
        assert_eq!(parse("Q1d4", &board).unwrap(), RawMove::new(sq("a1"), sq("d4")));
        assert_eq!(parse("Qa4xd4", &board).unwrap(), RawMove::new(sq("a4"), sq("d4")));
        assert!(matches!(
            parse("Qad4", &board),
            Err(NotationError::Ambiguous { candidates: 2, .. })
        ));
    }

    #[test]
    fn test_pinned_piece_breaks_the_tie() {
        // the knight on e2 is pinned against the king, so Nc3 means b1
        let board = ChessBoard::from_fen("4r2k/8/8/8/8/8/4N3/1N2K3 w - - 0 1").unwrap();
        assert_eq!(parse("Nc3", &board).unwrap(), RawMove::new(sq("b1"), sq("c3")));
    }

    #[test]
    fn test_promotion_tokens() {
        let board = ChessBoard::from_fen("3r3k/4P3/8/8/8/8/8/K7 w - - 0 1").unwrap();
        assert_eq!(
            parse("e8=Q", &board).unwrap(),
            RawMove::with_promotion(sq("e7"), sq("e8"), PieceKind::Queen)
        );
        assert_eq!(
            parse("exd8=N+", &board).unwrap(),
            RawMove::with_promotion(sq("e7"), sq("d8"), PieceKind::Knight)
        );
        assert_eq!(
            parse("ed8=R", &board).unwrap(),
            RawMove::with_promotion(sq("e7"), sq("d8"), PieceKind::Rook)
        );
        assert!(matches!(parse("e8=K", &board), Err(NotationError::Malformed(_))));
        // without a piece the move stays pending
        assert_eq!(parse("e8", &board).unwrap(), RawMove::new(sq("e7"), sq("e8")));
    }

    #[test]
    fn test_en_passant_token() {
        let board = play_san(&["e4", "a6", "e5", "d5"]);
        assert_eq!(parse("exd6", &board).unwrap(), RawMove::new(sq("e5"), sq("d6")));
    }

    #[test]
    fn test_rejections() {
        let start = ChessBoard::new();
        assert!(matches!(parse("e5", &start), Err(NotationError::Ambiguous { candidates: 0, .. })));
        assert!(matches!(parse("Nd4", &start), Err(NotationError::Ambiguous { .. })));
        assert!(matches!(parse("Zf3", &start), Err(NotationError::Malformed(_))));
        assert!(matches!(parse("", &start), Err(NotationError::Malformed(_))));
        assert!(matches!(parse("Nf3g5h6", &start), Err(NotationError::Malformed(_))));
    }

    #[test]
    fn test_ruy_lopez_a6() {
        let board = play_san(&["e4", "e5", "Nf3", "Nc6", "Bb5"]);
        let a6 = parse("a6", &board).unwrap();
        assert_eq!(a6, RawMove::new(sq("a7"), sq("a6")));
        let board = board.make_move(a6).unwrap();
        assert_eq!(board.color(), Color::White);
        let tokens: Vec<String> = board
            .all_possible_valid_moves()
            .iter()
            .map(|mv| to_san(&board, mv))
            .collect();
        assert!(tokens.contains(&"Bxc6".to_string()));
        // f1 and g1 are empty and nothing attacks e1, f1 or g1
        assert!(tokens.contains(&"O-O".to_string()));
    }

    #[test]
    fn test_san_writer() {
        let board = ChessBoard::from_fen("7k/8/8/8/8/8/8/R4R1K w - - 0 1").unwrap();
        let written: HashSet<String> = board
            .all_possible_valid_moves()
            .iter()
            .map(|mv| to_san(&board, mv))
            .collect();
        assert!(written.contains("Rad1"));
        assert!(written.contains("Rfd1"));
        assert!(written.contains("Ra8+"));
        assert!(written.contains("Rf8+"));
        assert!(written.contains("Kg2"));

        let board = ChessBoard::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
        let written: HashSet<String> = board
            .all_possible_valid_moves()
            .iter()
            .map(|mv| to_san(&board, mv))
            .collect();
        assert!(written.contains("O-O"));
        assert!(written.contains("O-O-O"));
        assert!(written.contains("Rxa8+"));

        let mate = play_san(&["e4", "e5", "Qh5", "Nc6", "Bc4", "Nf6"]);
        let qxf7 = mate.validate(RawMove::new(sq("h5"), sq("f7"))).unwrap();
        assert_eq!(to_san(&mate, &qxf7), "Qxf7#");
    }

    #[test]
    fn test_notation_roundtrip_is_exclusive() {
        let boards = [
            ChessBoard::new(),
            play_san(&["e4", "e5", "Nf3", "Nc6", "Bb5", "a6"]),
            ChessBoard::from_fen(
                "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
            )
            .unwrap(),
            ChessBoard::from_fen("r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1")
                .unwrap(),
            ChessBoard::from_fen("4k3/8/8/8/Q6Q/8/8/Q3K3 w - - 0 1").unwrap(),
            ChessBoard::from_fen("8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1").unwrap(),
        ];
        for board in boards {
            let moves = board.all_possible_valid_moves();
            let mut tokens = HashSet::new();
            for mv in &moves {
                let token = to_san(&board, mv);
                assert_eq!(parse(&token, &board).unwrap(), mv.raw(), "{token}");
                assert!(tokens.insert(token));
            }
            assert_eq!(tokens.len(), moves.len());
        }
    }
}
