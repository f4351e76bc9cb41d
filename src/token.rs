//! Tokens and board coordinates.

use std::fmt;

/// Reserved type id carried by colour-clear tokens. Never a valid ordinary type.
pub const COLOR_CLEAR_TYPE: &str = "rainbow";

/// Board coordinate. Row 0 is the bottom row; gravity pulls towards it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Coord {
    pub row: usize,
    pub column: usize,
}

impl Coord {
    pub const fn new(row: usize, column: usize) -> Self {
        Self { row, column }
    }

    /// True for direct horizontal or vertical neighbours (never diagonal, never self).
    pub fn is_adjacent(self, other: Self) -> bool {
        self.row.abs_diff(other.row) + self.column.abs_diff(other.column) == 1
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.column)
    }
}

/// Special effect carried by a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SpecialKind {
    #[default]
    None,
    /// Clears the whole row or column of the run it ends up matched in.
    ClearLine,
    /// Removes every token of one type when swapped.
    ClearColor,
}

impl fmt::Display for SpecialKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::None => "ordinary token",
            Self::ClearLine => "line-clear special",
            Self::ClearColor => "colour-clear special",
        })
    }
}

/// Immutable cell value: a type id plus its special tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Token {
    type_id: String,
    special: SpecialKind,
}

impl Token {
    pub fn ordinary(type_id: impl Into<String>) -> Self {
        Self {
            type_id: type_id.into(),
            special: SpecialKind::None,
        }
    }

    pub fn line_clear(type_id: impl Into<String>) -> Self {
        Self {
            type_id: type_id.into(),
            special: SpecialKind::ClearLine,
        }
    }

    pub fn color_clear() -> Self {
        Self {
            type_id: COLOR_CLEAR_TYPE.to_string(),
            special: SpecialKind::ClearColor,
        }
    }

    pub fn type_id(&self) -> &str {
        &self.type_id
    }

    pub fn special(&self) -> SpecialKind {
        self.special
    }

    pub fn is_color_clear(&self) -> bool {
        self.special == SpecialKind::ClearColor
    }

    pub fn is_line_clear(&self) -> bool {
        self.special == SpecialKind::ClearLine
    }

    /// Same colour for run detection. Colour-clear tokens match nothing, not even each other.
    pub fn matches(&self, other: &Self) -> bool {
        !self.is_color_clear() && !other.is_color_clear() && self.type_id == other.type_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adjacency_excludes_diagonals_and_self() {
        let c = Coord::new(3, 3);
        assert!(c.is_adjacent(Coord::new(2, 3)));
        assert!(c.is_adjacent(Coord::new(3, 4)));
        assert!(!c.is_adjacent(Coord::new(4, 4)));
        assert!(!c.is_adjacent(c));
        assert!(!c.is_adjacent(Coord::new(3, 5)));
    }

    #[test]
    fn line_clear_matches_its_colour() {
        assert!(Token::line_clear("red").matches(&Token::ordinary("red")));
        assert!(!Token::line_clear("red").matches(&Token::ordinary("blue")));
    }

    #[test]
    fn color_clear_never_matches() {
        let rainbow = Token::color_clear();
        assert!(!rainbow.matches(&Token::color_clear()));
        assert!(!rainbow.matches(&Token::ordinary(COLOR_CLEAR_TYPE)));
    }
}
