//! Board fill strategies and premade level data.
//!
//! A level is a fully specified R x C array of token descriptors addressed `[row][column]`
//! with row 0 at the bottom. Descriptors:
//!
//! - `red`: ordinary token of type `red`
//! - `red_B`: line-clear special of type `red`
//! - `rainbow`: colour-clear special
//!
//! The text form has one line per board row, TOP row first, cells separated by `|` or
//! whitespace. Blank lines and lines starting with `#` are skipped.

use crate::config::EngineConfig;
use crate::error::{BoardError, Result};
use crate::grid::Grid;
use crate::token::{COLOR_CLEAR_TYPE, Token};

/// Suffix marking a line-clear special in a descriptor.
pub const LINE_CLEAR_SUFFIX: &str = "_B";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FillStrategy {
    /// Random ordinary tokens, no pre-existing runs.
    Random,
    /// Placed verbatim; runs already on the board are left for the first move to resolve.
    FromLevelData(LevelData),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelData {
    /// `cells[row][column]`, row 0 at the bottom.
    cells: Vec<Vec<String>>,
}

impl LevelData {
    pub fn new(cells: Vec<Vec<String>>) -> Self {
        Self { cells }
    }

    /// Parse the text form (top row first).
    pub fn parse(text: &str) -> Result<Self> {
        let mut cells: Vec<Vec<String>> = text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.starts_with('#'))
            .map(|l| {
                l.split(|c: char| c == '|' || c.is_whitespace())
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .collect();
        if cells.is_empty() {
            return Err(BoardError::InvalidLevelData("level has no rows".to_string()));
        }
        cells.reverse();
        Ok(Self { cells })
    }

    pub fn rows(&self) -> usize {
        self.cells.len()
    }

    pub fn columns(&self) -> usize {
        self.cells.first().map_or(0, Vec::len)
    }

    /// Decode into a grid for `config`. Nothing is returned unless every cell decodes.
    pub fn to_grid(&self, config: &EngineConfig) -> Result<Grid> {
        if self.rows() != config.rows {
            return Err(BoardError::InvalidLevelData(format!(
                "level has {} rows, board has {}",
                self.rows(),
                config.rows
            )));
        }
        let mut tokens = Vec::with_capacity(config.rows * config.columns);
        for (row, line) in self.cells.iter().enumerate() {
            if line.len() != config.columns {
                return Err(BoardError::InvalidLevelData(format!(
                    "row {row} has {} cells, board has {} columns",
                    line.len(),
                    config.columns
                )));
            }
            for (column, desc) in line.iter().enumerate() {
                let token = parse_descriptor(desc, config).map_err(|e| match e {
                    BoardError::InvalidLevelData(msg) => {
                        BoardError::InvalidLevelData(format!("({row}, {column}): {msg}"))
                    }
                    other => other,
                })?;
                tokens.push(Some(token));
            }
        }
        Grid::from_cells(config.rows, config.columns, tokens)
    }
}

/// Decode one cell descriptor against the configured token types.
pub fn parse_descriptor(desc: &str, config: &EngineConfig) -> Result<Token> {
    let desc = desc.trim();
    if desc == COLOR_CLEAR_TYPE {
        return Ok(Token::color_clear());
    }
    let (type_id, token) = match desc.strip_suffix(LINE_CLEAR_SUFFIX) {
        Some(base) => (base, Token::line_clear(base)),
        None => (desc, Token::ordinary(desc)),
    };
    if config.is_known_type(type_id) {
        Ok(token)
    } else {
        Err(BoardError::InvalidLevelData(format!(
            "unknown token `{desc}`"
        )))
    }
}
