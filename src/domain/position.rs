//! Board coordinates.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoordinateError;

/// A square as (file, rank), both in `1..=8`. File 1 is `a`, rank 1 is White's back rank.
#[derive(
    Clone, Copy, PartialEq, Eq, Hash, Debug, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
pub struct Position {
    x: u8,
    y: u8,
}

impl Position {
    /// Create a position, rejecting coordinates off the board
    pub fn new(x: u8, y: u8) -> Option<Self> {
        if (1..=8).contains(&x) && (1..=8).contains(&y) {
            Some(Self { x, y })
        } else {
            None
        }
    }

    /// Position from coordinates already known to be on the board
    pub(crate) const fn at(x: u8, y: u8) -> Self {
        debug_assert!(x >= 1 && x <= 8 && y >= 1 && y <= 8);
        Self { x, y }
    }

    /// File, 1..=8
    pub fn x(self) -> u8 {
        self.x
    }

    /// Rank, 1..=8
    pub fn y(self) -> u8 {
        self.y
    }

    /// The square shifted by (dx, dy), if it stays on the board
    pub fn offset(self, dx: i8, dy: i8) -> Option<Self> {
        let x = self.x as i8 + dx;
        let y = self.y as i8 + dy;
        if (1..=8).contains(&x) && (1..=8).contains(&y) {
            Some(Self {
                x: x as u8,
                y: y as u8,
            })
        } else {
            None
        }
    }

    /// All 64 squares, file-major (a1, a2, .., a8, b1, ..)
    pub fn all() -> impl Iterator<Item = Position> {
        (1..=8u8).flat_map(|x| (1..=8u8).map(move |y| Position { x, y }))
    }

    pub fn file_char(self) -> char {
        (b'a' + self.x - 1) as char
    }

    pub fn rank_char(self) -> char {
        (b'0' + self.y) as char
    }

    /// Map a file letter `a..=h` to 1..=8
    pub fn file_from_char(c: char) -> Option<u8> {
        match c {
            'a'..='h' => Some(c as u8 - b'a' + 1),
            _ => None,
        }
    }

    /// Map a rank digit `1..=8` to 1..=8
    pub fn rank_from_char(c: char) -> Option<u8> {
        match c {
            '1'..='8' => Some(c as u8 - b'0'),
            _ => None,
        }
    }

    /// Parse a two-character square such as `e4`
    pub fn from_algebraic(s: &str) -> Option<Self> {
        let mut chars = s.chars();
        let x = Self::file_from_char(chars.next()?)?;
        let y = Self::rank_from_char(chars.next()?)?;
        if chars.next().is_some() {
            return None;
        }
        Some(Self { x, y })
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.file_char(), self.rank_char())
    }
}

impl FromStr for Position {
    type Err = CoordinateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_algebraic(s).ok_or_else(|| CoordinateError::Square(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds() {
        assert!(Position::new(0, 4).is_none());
        assert!(Position::new(9, 4).is_none());
        assert!(Position::new(8, 8).is_some());
    }

    #[test]
    fn test_algebraic() {
        let e4 = Position::from_algebraic("e4").unwrap();
        assert_eq!((e4.x(), e4.y()), (5, 4));
        assert_eq!(e4.to_string(), "e4");
        assert!(Position::from_algebraic("i1").is_none());
        assert!(Position::from_algebraic("e9").is_none());
        assert!(Position::from_algebraic("e44").is_none());
        assert!("zz".parse::<Position>().is_err());
    }

    #[test]
    fn test_offset() {
        let a1 = Position::new(1, 1).unwrap();
        assert!(a1.offset(-1, 0).is_none());
        assert_eq!(a1.offset(1, 2), Position::new(2, 3));
        assert_eq!(Position::all().count(), 64);
    }
}
