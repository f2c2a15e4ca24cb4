//! Board levels and square addressing.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::{fmt, str::FromStr};
use strum::{Display, EnumIter, EnumString, FromRepr};

/// Board sizes indexed by level, from `one` to `nine`.
pub const LEVEL_SIZES: [u8; 9] = [5, 7, 9, 11, 13, 15, 17, 19, 21];

/// A board level, determining the board size.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    Display,
    EnumIter,
    EnumString,
    Eq,
    FromRepr,
    Hash,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
#[repr(u8)]
pub enum Level {
    /// A 5x5 board.
    #[default]
    One = 0,
    /// A 7x7 board.
    Two = 1,
    /// A 9x9 board.
    Three = 2,
    /// An 11x11 board.
    Four = 3,
    /// A 13x13 board.
    Five = 4,
    /// A 15x15 board.
    Six = 5,
    /// A 17x17 board.
    Seven = 6,
    /// A 19x19 board.
    Eight = 7,
    /// A 21x21 board.
    Nine = 8,
}

impl Level {
    /// Returns the side length of the square board.
    #[must_use]
    pub fn size(self) -> u8 {
        LEVEL_SIZES[self as usize]
    }

    /// Returns an iterator of all squares on the board, row by row.
    pub fn squares(self) -> impl Iterator<Item = Square> {
        let size = self.size();
        (0..size).flat_map(move |row| (0..size).map(move |col| Square::new(row, col)))
    }

    /// Tests if the square lies on a board of this level.
    #[must_use]
    pub fn contains(self, square: Square) -> bool {
        square.row < self.size() && square.col < self.size()
    }
}

/// Letters range from `A` to `Z`.
const MAX_ROWS: u8 = 26;

/// A square on the board, with 0-indexed coordinates.
///
/// Formats as `<RowLetter><ColumnNumber>`, where the letter is `'A' + row`
/// and the number is `col + 1`, e.g. row 2, column 3 is `"C4"`.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Square {
    /// The 0-indexed row.
    pub row: u8,
    /// The 0-indexed column.
    pub col: u8,
}

impl Square {
    /// Creates a square at the given row and column.
    ///
    /// # Panics
    ///
    /// Panics if `row` has no letter.
    #[must_use]
    pub fn new(row: u8, col: u8) -> Self {
        assert!(row < MAX_ROWS, "row out of range");
        Self { row, col }
    }

    /// Returns the row letter.
    #[must_use]
    pub fn row_letter(self) -> char {
        char::from(b'A' + self.row)
    }

    /// Returns the 1-indexed column number.
    #[must_use]
    pub fn col_number(self) -> u16 {
        u16::from(self.col) + 1
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.row_letter(), self.col_number())
    }
}

/// An error which can be returned when parsing a square ID.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
#[remain::sorted]
pub enum ParseSquareError {
    /// The column number is missing, zero, zero-padded or not a number.
    #[error("invalid column in square ID {0:?}")]
    InvalidColumn(String),
    /// The row letter is missing or not in `A..=Z`.
    #[error("invalid row in square ID {0:?}")]
    InvalidRow(String),
}

impl FromStr for Square {
    type Err = ParseSquareError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        let row = match chars.next() {
            Some(c @ 'A'..='Z') => c as u8 - b'A',
            _ => return Err(ParseSquareError::InvalidRow(s.into())),
        };

        let rest = chars.as_str();
        if rest.starts_with('0') || !rest.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ParseSquareError::InvalidColumn(s.into()));
        }
        let col = match rest.parse::<u16>() {
            Ok(n @ 1..=256) => (n - 1) as u8,
            _ => return Err(ParseSquareError::InvalidColumn(s.into())),
        };

        Ok(Self { row, col })
    }
}

impl Serialize for Square {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Square {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
