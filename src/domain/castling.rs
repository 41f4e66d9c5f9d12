//! Castling rights and the fixed geometry of both castles.

use crate::domain::chess::{Color, PieceKind};
use crate::domain::moves::ValidMove;
use crate::domain::position::Position;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum CastleSide {
    /// Towards the h-file (`O-O`)
    Short,
    /// Towards the a-file (`O-O-O`)
    Long,
}

impl CastleSide {
    pub const BOTH: [CastleSide; 2] = [CastleSide::Short, CastleSide::Long];

    /// File the king lands on
    pub fn king_target_file(self) -> u8 {
        match self {
            CastleSide::Short => 7,
            CastleSide::Long => 3,
        }
    }

    /// File the rook starts on
    pub fn rook_file(self) -> u8 {
        match self {
            CastleSide::Short => 8,
            CastleSide::Long => 1,
        }
    }

    /// File the rook lands on
    pub fn rook_target_file(self) -> u8 {
        match self {
            CastleSide::Short => 6,
            CastleSide::Long => 4,
        }
    }

    /// Files between king and rook that must be empty
    pub fn empty_files(self) -> &'static [u8] {
        match self {
            CastleSide::Short => &[6, 7],
            CastleSide::Long => &[2, 3, 4],
        }
    }

    /// Files the king passes through or lands on; none may be attacked
    pub fn king_path_files(self) -> &'static [u8] {
        match self {
            CastleSide::Short => &[6, 7],
            CastleSide::Long => &[4, 3],
        }
    }

    pub fn notation(self) -> &'static str {
        match self {
            CastleSide::Short => "O-O",
            CastleSide::Long => "O-O-O",
        }
    }

    pub(crate) fn square(file: u8, color: Color) -> Position {
        Position::at(file, color.back_rank())
    }
}

/// Which castles are still allowed, per side and wing
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct CastlingRights {
    white_short: bool,
    white_long: bool,
    black_short: bool,
    black_long: bool,
}

impl CastlingRights {
    pub fn all() -> Self {
        Self {
            white_short: true,
            white_long: true,
            black_short: true,
            black_long: true,
        }
    }

    pub fn none() -> Self {
        Self {
            white_short: false,
            white_long: false,
            black_short: false,
            black_long: false,
        }
    }

    pub fn can_castle(&self, color: Color, side: CastleSide) -> bool {
        match (color, side) {
            (Color::White, CastleSide::Short) => self.white_short,
            (Color::White, CastleSide::Long) => self.white_long,
            (Color::Black, CastleSide::Short) => self.black_short,
            (Color::Black, CastleSide::Long) => self.black_long,
        }
    }

    pub fn with(mut self, color: Color, side: CastleSide, allowed: bool) -> Self {
        let flag = match (color, side) {
            (Color::White, CastleSide::Short) => &mut self.white_short,
            (Color::White, CastleSide::Long) => &mut self.white_long,
            (Color::Black, CastleSide::Short) => &mut self.black_short,
            (Color::Black, CastleSide::Long) => &mut self.black_long,
        };
        *flag = allowed;
        self
    }

    /// Rights once `mv` has been played. Rights are only ever cleared.
    pub fn after(self, mv: &ValidMove) -> Self {
        let mut next = self;
        let color = mv.color();
        if mv.moved_kind() == PieceKind::King {
            next = next.with(color, CastleSide::Short, false);
            next = next.with(color, CastleSide::Long, false);
        }
        // a rook leaving its corner or anything landing there
        for touched in [mv.from(), mv.to()] {
            for owner in [Color::White, Color::Black] {
                for side in CastleSide::BOTH {
                    if touched == CastleSide::square(side.rook_file(), owner) {
                        next = next.with(owner, side, false);
                    }
                }
            }
        }
        next
    }

    /// FEN castling field, `-` when empty
    pub fn to_fen(&self) -> String {
        let mut s = String::new();
        for (allowed, c) in [
            (self.white_short, 'K'),
            (self.white_long, 'Q'),
            (self.black_short, 'k'),
            (self.black_long, 'q'),
        ] {
            if allowed {
                s.push(c);
            }
        }
        if s.is_empty() {
            s.push('-');
        }
        s
    }
}

impl Default for CastlingRights {
    fn default() -> Self {
        Self::all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::chess_board::ChessBoard;
    use crate::domain::moves::RawMove;

    #[test]
    fn test_fen_field() {
        assert_eq!(CastlingRights::all().to_fen(), "KQkq");
        assert_eq!(CastlingRights::none().to_fen(), "-");
        let partial = CastlingRights::none().with(Color::Black, CastleSide::Long, true);
        assert_eq!(partial.to_fen(), "q");
    }

    #[test]
    fn test_king_move_clears_both_wings() {
        let board = ChessBoard::new();
        let mv = RawMove::from_coordinates("e2e4").unwrap();
        let board = board.make_move(mv).unwrap();
        let board = board.make_move(RawMove::from_coordinates("e7e5").unwrap()).unwrap();
        let king_move = board.validate(RawMove::from_coordinates("e1e2").unwrap()).unwrap();
        let rights = board.castling().after(&king_move);
        assert!(!rights.can_castle(Color::White, CastleSide::Short));
        assert!(!rights.can_castle(Color::White, CastleSide::Long));
        assert!(rights.can_castle(Color::Black, CastleSide::Short));
    }

    #[test]
    fn test_rook_move_clears_one_wing() {
        let board = ChessBoard::new()
            .make_move(RawMove::from_coordinates("h2h4").unwrap())
            .unwrap()
            .make_move(RawMove::from_coordinates("a7a5").unwrap())
            .unwrap();
        let rook_move = board.validate(RawMove::from_coordinates("h1h3").unwrap()).unwrap();
        let rights = board.castling().after(&rook_move);
        assert!(!rights.can_castle(Color::White, CastleSide::Short));
        assert!(rights.can_castle(Color::White, CastleSide::Long));
    }
}
