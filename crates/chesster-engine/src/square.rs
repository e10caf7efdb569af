//! Board squares in the 0..63 little-endian rank-file layout.

use serde::{Deserialize, Serialize};

/// A square on the chess board.
///
/// Index 0 is a1, index 7 is h1, index 63 is h8: file is `index % 8`
/// and rank is `index / 8`. The "no square" sentinel of the wire format
/// is represented as `Option<Square>` everywhere in this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Square(u8);

impl Square {
    /// a1.
    pub const A1: Self = Self(0);
    /// c1.
    pub const C1: Self = Self(2);
    /// d1.
    pub const D1: Self = Self(3);
    /// e1.
    pub const E1: Self = Self(4);
    /// f1.
    pub const F1: Self = Self(5);
    /// g1.
    pub const G1: Self = Self(6);
    /// h1.
    pub const H1: Self = Self(7);
    /// a8.
    pub const A8: Self = Self(56);
    /// c8.
    pub const C8: Self = Self(58);
    /// d8.
    pub const D8: Self = Self(59);
    /// e8.
    pub const E8: Self = Self(60);
    /// f8.
    pub const F8: Self = Self(61);
    /// g8.
    pub const G8: Self = Self(62);
    /// h8.
    pub const H8: Self = Self(63);

    /// Create a square from file (0-7, a-h) and rank (0-7, 1-8).
    #[must_use]
    pub const fn new(file: u8, rank: u8) -> Option<Self> {
        if file < 8 && rank < 8 {
            Some(Self(rank * 8 + file))
        } else {
            None
        }
    }

    /// Create a square from a raw 0..63 index.
    #[must_use]
    pub const fn from_index(index: u8) -> Option<Self> {
        if index < 64 {
            Some(Self(index))
        } else {
            None
        }
    }

    /// The raw 0..63 index, usable directly as a board array offset.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// The file (0-7, a-h).
    #[must_use]
    pub const fn file(self) -> u8 {
        self.0 % 8
    }

    /// The rank (0-7, 1-8).
    #[must_use]
    pub const fn rank(self) -> u8 {
        self.0 / 8
    }

    /// The square shifted by whole files and ranks, if still on the board.
    #[must_use]
    pub const fn offset(self, file_delta: i8, rank_delta: i8) -> Option<Self> {
        let file = self.file() as i8 + file_delta;
        let rank = self.rank() as i8 + rank_delta;
        if file >= 0 && file < 8 && rank >= 0 && rank < 8 {
            Some(Self((rank * 8 + file) as u8))
        } else {
            None
        }
    }

    /// Iterate every square from a1 to h8.
    pub fn all() -> impl Iterator<Item = Self> {
        (0..64).map(Self)
    }
}

impl std::fmt::Display for Square {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let file = (b'a' + self.file()) as char;
        let rank = (b'1' + self.rank()) as char;
        write!(f, "{file}{rank}")
    }
}

impl std::str::FromStr for Square {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        let (Some(file), Some(rank), None) = (chars.next(), chars.next(), chars.next()) else {
            return Err("square must be 2 characters");
        };
        if !('a'..='h').contains(&file) {
            return Err("file must be a-h");
        }
        if !('1'..='8').contains(&rank) {
            return Err("rank must be 1-8");
        }
        Ok(Self((rank as u8 - b'1') * 8 + (file as u8 - b'a')))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout() {
        let a1 = Square::new(0, 0).unwrap();
        let h1 = Square::new(7, 0).unwrap();
        let h8 = Square::new(7, 7).unwrap();
        assert_eq!(a1.index(), 0);
        assert_eq!(h1.index(), 7);
        assert_eq!(h8.index(), 63);
        assert_eq!(Square::new(8, 0), None);
    }

    #[test]
    fn algebraic_roundtrip() {
        for name in ["a1", "e4", "h8", "c6"] {
            let sq: Square = name.parse().unwrap();
            assert_eq!(sq.to_string(), name);
        }
        assert!("i4".parse::<Square>().is_err());
        assert!("e9".parse::<Square>().is_err());
        assert!("e44".parse::<Square>().is_err());
        assert!("e".parse::<Square>().is_err());
    }

    #[test]
    fn offsets_stay_on_board() {
        let e4: Square = "e4".parse().unwrap();
        assert_eq!(e4.offset(0, 1), Some("e5".parse().unwrap()));
        assert_eq!(e4.offset(-1, -1), Some("d3".parse().unwrap()));

        let a1: Square = "a1".parse().unwrap();
        assert_eq!(a1.offset(-1, 0), None);
        assert_eq!(a1.offset(0, -1), None);

        let h8: Square = "h8".parse().unwrap();
        assert_eq!(h8.offset(1, 0), None);
        assert_eq!(h8.offset(0, 1), None);
    }

    #[test]
    fn all_covers_the_board() {
        assert_eq!(Square::all().count(), 64);
        assert_eq!(Square::all().next().unwrap().to_string(), "a1");
        assert_eq!(Square::all().last().unwrap().to_string(), "h8");
    }
}
