//! Castling rights stored as a 4-bit field within a `u8`.

use std::fmt;
use std::ops::{BitAnd, BitOr, Not};

use crate::color::Color;
use crate::error::FenError;

/// Which side of the board to castle toward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CastleSide {
    KingSide,
    QueenSide,
}

/// Castling rights encoded as a 4-bit field.
///
/// Bits are grouped by side rather than by color: bit 0 = White king-side,
/// bit 1 = Black king-side, bit 2 = White queen-side, bit 3 = Black queen-side.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct CastleRights(u8);

impl CastleRights {
    /// No castling rights.
    pub const NONE: CastleRights = CastleRights(0);
    /// All castling rights.
    pub const ALL: CastleRights = CastleRights(0b1111);

    /// White king-side castling.
    pub const WHITE_KING: CastleRights = CastleRights(0b0001);
    /// Black king-side castling.
    pub const BLACK_KING: CastleRights = CastleRights(0b0010);
    /// White queen-side castling.
    pub const WHITE_QUEEN: CastleRights = CastleRights(0b0100);
    /// Black queen-side castling.
    pub const BLACK_QUEEN: CastleRights = CastleRights(0b1000);

    /// Both white castling rights.
    pub const WHITE_BOTH: CastleRights = CastleRights(0b0101);
    /// Both black castling rights.
    pub const BLACK_BOTH: CastleRights = CastleRights(0b1010);

    /// Create castling rights from a raw `u8`, masking to the lower 4 bits.
    #[inline]
    pub const fn new(bits: u8) -> CastleRights {
        CastleRights(bits & 0b1111)
    }

    /// Return the raw bits.
    #[inline]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Return `true` if no castling rights remain.
    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Return `true` if all bits in `other` are set in `self`.
    #[inline]
    pub const fn contains(self, other: CastleRights) -> bool {
        (self.0 & other.0) == other.0
    }

    /// Return new rights with all bits from `other` added.
    #[inline]
    pub const fn insert(self, other: CastleRights) -> CastleRights {
        CastleRights(self.0 | other.0)
    }

    /// Return new rights with all bits from `other` removed.
    #[inline]
    pub const fn remove(self, other: CastleRights) -> CastleRights {
        CastleRights(self.0 & !other.0)
    }

    /// Check whether a specific color and side can castle.
    #[inline]
    pub const fn has(self, color: Color, side: CastleSide) -> bool {
        let bit = Self::flag(color, side).0;
        (self.0 & bit) != 0
    }

    /// Remove all castling rights for the given color.
    #[inline]
    pub const fn remove_color(self, color: Color) -> CastleRights {
        match color {
            Color::White => self.remove(Self::WHITE_BOTH),
            Color::Black => self.remove(Self::BLACK_BOTH),
        }
    }

    /// Return the single-bit flag for a color and side.
    #[inline]
    const fn flag(color: Color, side: CastleSide) -> CastleRights {
        match (color, side) {
            (Color::White, CastleSide::KingSide) => Self::WHITE_KING,
            (Color::White, CastleSide::QueenSide) => Self::WHITE_QUEEN,
            (Color::Black, CastleSide::KingSide) => Self::BLACK_KING,
            (Color::Black, CastleSide::QueenSide) => Self::BLACK_QUEEN,
        }
    }

    /// Parse castling rights from the FEN castling field (e.g. "KQkq", "Kq", "-").
    pub fn from_fen(s: &str) -> Result<CastleRights, FenError> {
        if s == "-" {
            return Ok(CastleRights::NONE);
        }

        let mut rights = CastleRights::NONE;
        for c in s.chars() {
            let flag = match c {
                'K' => Self::WHITE_KING,
                'Q' => Self::WHITE_QUEEN,
                'k' => Self::BLACK_KING,
                'q' => Self::BLACK_QUEEN,
                _ => return Err(FenError::InvalidCastlingChar { character: c }),
            };
            rights = rights.insert(flag);
        }
        Ok(rights)
    }

    /// Serialize castling rights to the FEN castling field.
    pub fn to_fen(self) -> String {
        if self.is_empty() {
            return "-".to_string();
        }

        let mut s = String::with_capacity(4);
        if self.contains(Self::WHITE_KING) {
            s.push('K');
        }
        if self.contains(Self::WHITE_QUEEN) {
            s.push('Q');
        }
        if self.contains(Self::BLACK_KING) {
            s.push('k');
        }
        if self.contains(Self::BLACK_QUEEN) {
            s.push('q');
        }
        s
    }
}

impl BitAnd for CastleRights {
    type Output = CastleRights;
    #[inline]
    fn bitand(self, rhs: CastleRights) -> CastleRights {
        CastleRights(self.0 & rhs.0)
    }
}

impl BitOr for CastleRights {
    type Output = CastleRights;
    #[inline]
    fn bitor(self, rhs: CastleRights) -> CastleRights {
        CastleRights(self.0 | rhs.0)
    }
}

impl Not for CastleRights {
    type Output = CastleRights;
    #[inline]
    fn not(self) -> CastleRights {
        CastleRights(!self.0 & 0b1111)
    }
}

impl fmt::Display for CastleRights {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_fen())
    }
}

impl fmt::Debug for CastleRights {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CastleRights({})", self.to_fen())
    }
}
