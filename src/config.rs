//! Engine configuration: board size, token types, scoring and special definitions.

use crate::error::{BoardError, Result};
use crate::score::ScoreRules;
use crate::token::{COLOR_CLEAR_TYPE, SpecialKind, Token};
use std::collections::BTreeSet;

pub const DEFAULT_ROWS: usize = 12;
pub const DEFAULT_COLUMNS: usize = 8;
/// Ordinary token types, in palette order.
pub const DEFAULT_TOKEN_TYPES: [&str; 6] = ["green", "yellow", "red", "blue", "magenta", "cyan"];

/// Which special tokens the game knows how to build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecialDefinitions {
    /// Types that have a line-clear variant.
    pub line_clear_types: BTreeSet<String>,
    pub color_clear: bool,
}

impl SpecialDefinitions {
    /// Line clears for every given type, colour clear enabled.
    pub fn for_types<S: AsRef<str>>(types: &[S]) -> Self {
        Self {
            line_clear_types: types.iter().map(|t| t.as_ref().to_string()).collect(),
            color_clear: true,
        }
    }

    /// Build the special token of `kind` for a run of `type_id`.
    pub fn build(&self, kind: SpecialKind, type_id: &str) -> Result<Token> {
        let missing = || BoardError::Configuration {
            kind,
            type_id: type_id.to_string(),
        };
        match kind {
            SpecialKind::ClearLine if self.line_clear_types.contains(type_id) => {
                Ok(Token::line_clear(type_id))
            }
            SpecialKind::ClearColor if self.color_clear => Ok(Token::color_clear()),
            SpecialKind::None => Ok(Token::ordinary(type_id)),
            _ => Err(missing()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub rows: usize,
    pub columns: usize,
    pub token_types: Vec<String>,
    pub scoring: ScoreRules,
    pub specials: SpecialDefinitions,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::with_types(DEFAULT_ROWS, DEFAULT_COLUMNS, &DEFAULT_TOKEN_TYPES)
    }
}

impl EngineConfig {
    /// Default scoring, every special defined.
    pub fn with_types<S: AsRef<str>>(rows: usize, columns: usize, types: &[S]) -> Self {
        Self {
            rows,
            columns,
            token_types: types.iter().map(|t| t.as_ref().to_string()).collect(),
            scoring: ScoreRules::default(),
            specials: SpecialDefinitions::for_types(types),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.rows == 0 || self.columns == 0 {
            return Err(BoardError::InvalidSettings(format!(
                "board must be at least 1x1, got {}x{}",
                self.rows, self.columns
            )));
        }
        if self.token_types.len() < 2 {
            return Err(BoardError::InvalidSettings(
                "at least two token types are needed".to_string(),
            ));
        }
        let mut seen = BTreeSet::new();
        for t in &self.token_types {
            if t.is_empty() || t == COLOR_CLEAR_TYPE || t.contains(['_', '|']) {
                return Err(BoardError::InvalidSettings(format!(
                    "`{t}` cannot be used as a token type"
                )));
            }
            if !seen.insert(t.as_str()) {
                return Err(BoardError::InvalidSettings(format!(
                    "token type `{t}` listed twice"
                )));
            }
        }
        Ok(())
    }

    pub fn is_known_type(&self, type_id: &str) -> bool {
        self.token_types.iter().any(|t| t == type_id)
    }
}
