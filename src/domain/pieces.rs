//! Per-piece movement geometry.
//!
//! Everything here is pseudo-legal: pieces are blocked by other pieces and
//! capture enemies, but nobody checks whether the mover's king is left in
//! check. That final filter belongs to the validator.

use crate::domain::board::Board;
use crate::domain::chess::{Color, Piece, PieceKind};
use crate::domain::position::Position;

const KNIGHT_JUMPS: [(i8, i8); 8] = [
    (1, 2),
    (2, 1),
    (2, -1),
    (1, -2),
    (-1, -2),
    (-2, -1),
    (-2, 1),
    (-1, 2),
];

const KING_STEPS: [(i8, i8); 8] = [
    (0, 1),
    (1, 1),
    (1, 0),
    (1, -1),
    (0, -1),
    (-1, -1),
    (-1, 0),
    (-1, 1),
];

const DIAGONALS: [(i8, i8); 4] = [(1, 1), (1, -1), (-1, -1), (-1, 1)];
const LINES: [(i8, i8); 4] = [(0, 1), (1, 0), (0, -1), (-1, 0)];

impl PieceKind {
    fn rays(self) -> &'static [(i8, i8)] {
        match self {
            PieceKind::Bishop => &DIAGONALS,
            PieceKind::Rook => &LINES,
            PieceKind::Queen => &KING_STEPS,
            _ => &[],
        }
    }
}

impl Piece {
    /// Squares this piece could move to from `from`, ignoring check
    pub fn possible_end_positions(self, from: Position, board: &Board) -> Vec<Position> {
        match self.kind {
            PieceKind::Pawn => pawn_end_positions(from, self.color, board),
            PieceKind::Knight => leap(from, &KNIGHT_JUMPS, self.color, board),
            PieceKind::King => leap(from, &KING_STEPS, self.color, board),
            kind => slide(from, kind.rays(), self.color, board),
        }
    }

    /// Squares from which a piece like this one could reach `target`.
    ///
    /// The result is a superset: callers keep only the squares that actually
    /// hold such a piece and whose end positions contain `target`.
    pub fn possible_start_positions(self, target: Position, board: &Board) -> Vec<Position> {
        match self.kind {
            PieceKind::Pawn => pawn_start_positions(target, self.color, board),
            PieceKind::Knight => KNIGHT_JUMPS
                .iter()
                .filter_map(|&(dx, dy)| target.offset(dx, dy))
                .collect(),
            PieceKind::King => KING_STEPS
                .iter()
                .filter_map(|&(dx, dy)| target.offset(dx, dy))
                .collect(),
            kind => {
                let mut result = Vec::new();
                for &(dx, dy) in kind.rays() {
                    let mut current = target;
                    while let Some(next) = current.offset(dx, dy) {
                        result.push(next);
                        if !board.is_empty(next) {
                            break;
                        }
                        current = next;
                    }
                }
                result
            }
        }
    }
}

fn leap(from: Position, offsets: &[(i8, i8)], color: Color, board: &Board) -> Vec<Position> {
    offsets
        .iter()
        .filter_map(|&(dx, dy)| from.offset(dx, dy))
        .filter(|&p| board.read(p).is_none_or(|other| other.color != color))
        .collect()
}

fn slide(from: Position, rays: &[(i8, i8)], color: Color, board: &Board) -> Vec<Position> {
    let mut result = Vec::new();
    for &(dx, dy) in rays {
        let mut current = from;
        while let Some(next) = current.offset(dx, dy) {
            match board.read(next) {
                None => result.push(next),
                Some(other) => {
                    if other.color != color {
                        result.push(next);
                    }
                    break;
                }
            }
            current = next;
        }
    }
    result
}

fn pawn_end_positions(from: Position, color: Color, board: &Board) -> Vec<Position> {
    let forward = color.forward();
    let mut result = Vec::new();
    if let Some(one) = from.offset(0, forward) {
        if board.is_empty(one) {
            result.push(one);
            if from.y() == color.pawn_rank() {
                if let Some(two) = one.offset(0, forward) {
                    if board.is_empty(two) {
                        result.push(two);
                    }
                }
            }
        }
    }
    for dx in [-1, 1] {
        if let Some(diagonal) = from.offset(dx, forward) {
            if board.read(diagonal).is_some_and(|other| other.color != color) {
                result.push(diagonal);
            }
        }
    }
    result
}

fn pawn_start_positions(target: Position, color: Color, board: &Board) -> Vec<Position> {
    let back = -color.forward();
    let mut result = Vec::new();
    if let Some(one) = target.offset(0, back) {
        result.push(one);
        if board.is_empty(one) {
            if let Some(two) = one.offset(0, back) {
                if two.y() == color.pawn_rank() {
                    result.push(two);
                }
            }
        }
    }
    for dx in [-1, 1] {
        if let Some(diagonal) = target.offset(dx, back) {
            result.push(diagonal);
        }
    }
    result
}

/// Squares holding a piece of color `by` that attacks `target`
pub fn attackers(board: &Board, target: Position, by: Color) -> Vec<Position> {
    let holds = |p: Position, kinds: &[PieceKind]| {
        board
            .read(p)
            .is_some_and(|piece| piece.color == by && kinds.contains(&piece.kind))
    };
    let mut result = Vec::new();

    for dx in [-1, 1] {
        if let Some(p) = target.offset(dx, -by.forward()) {
            if holds(p, &[PieceKind::Pawn]) {
                result.push(p);
            }
        }
    }
    for (offsets, kind) in [(&KNIGHT_JUMPS, PieceKind::Knight), (&KING_STEPS, PieceKind::King)] {
        for &(dx, dy) in offsets {
            if let Some(p) = target.offset(dx, dy) {
                if holds(p, &[kind]) {
                    result.push(p);
                }
            }
        }
    }
    for (rays, kinds) in [
        (&DIAGONALS, [PieceKind::Bishop, PieceKind::Queen]),
        (&LINES, [PieceKind::Rook, PieceKind::Queen]),
    ] {
        for &(dx, dy) in rays {
            let mut current = target;
            while let Some(next) = current.offset(dx, dy) {
                if !board.is_empty(next) {
                    if holds(next, &kinds) {
                        result.push(next);
                    }
                    break;
                }
                current = next;
            }
        }
    }
    result
}

/// Whether any piece of color `by` attacks `target`
pub fn is_attacked(board: &Board, target: Position, by: Color) -> bool {
    !attackers(board, target, by).is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(s: &str) -> Position {
        Position::from_algebraic(s).unwrap()
    }

    fn sorted(mut v: Vec<Position>) -> Vec<String> {
        v.sort();
        v.into_iter().map(|p| p.to_string()).collect()
    }

    fn white(kind: PieceKind) -> Piece {
        Piece::new(kind, Color::White)
    }

    #[test]
    fn test_knight_from_start() {
        let board = Board::start();
        let ends = white(PieceKind::Knight).possible_end_positions(sq("g1"), &board);
        assert_eq!(sorted(ends), vec!["f3", "h3"]);
    }

    #[test]
    fn test_pawn_double_step_and_block() {
        let board = Board::start();
        let pawn = white(PieceKind::Pawn);
        assert_eq!(sorted(pawn.possible_end_positions(sq("e2"), &board)), vec!["e3", "e4"]);

        let blocked = board
            .put(Piece::new(PieceKind::Knight, Color::Black), sq("e3"))
            .unwrap();
        assert!(pawn.possible_end_positions(sq("e2"), &blocked).is_empty());
    }

    #[test]
    fn test_pawn_captures_only_diagonally() {
        let board = Board::blank()
            .put(Piece::new(PieceKind::Pawn, Color::Black), sq("d5"))
            .unwrap()
            .put(Piece::new(PieceKind::Pawn, Color::Black), sq("e5"))
            .unwrap();
        let ends = white(PieceKind::Pawn).possible_end_positions(sq("e4"), &board);
        assert_eq!(sorted(ends), vec!["d5"]);
    }

    #[test]
    fn test_rook_stops_at_first_piece() {
        let board = Board::blank()
            .put(Piece::new(PieceKind::Pawn, Color::White), sq("a4"))
            .unwrap()
            .put(Piece::new(PieceKind::Pawn, Color::Black), sq("c1"))
            .unwrap();
        let ends = white(PieceKind::Rook).possible_end_positions(sq("a1"), &board);
        assert_eq!(sorted(ends), vec!["a2", "a3", "b1", "c1"]);
    }

    #[test]
    fn test_start_positions_cover_real_origin() {
        let board = Board::start();
        let starts = white(PieceKind::Knight).possible_start_positions(sq("f3"), &board);
        assert!(starts.contains(&sq("g1")));
        let pawn_starts = white(PieceKind::Pawn).possible_start_positions(sq("e4"), &board);
        assert!(pawn_starts.contains(&sq("e2")));
        let bishop_starts = white(PieceKind::Bishop).possible_start_positions(sq("b5"), &board);
        assert!(!bishop_starts.contains(&sq("f1")));
    }

    #[test]
    fn test_attackers() {
        let board = Board::start();
        assert!(is_attacked(&board, sq("f3"), Color::White));
        assert!(is_attacked(&board, sq("f6"), Color::Black));
        assert!(!is_attacked(&board, sq("e4"), Color::White));
        assert_eq!(attackers(&board, sq("f3"), Color::White).len(), 3);
    }
}
