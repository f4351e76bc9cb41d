//! Engine error taxonomy.

use crate::token::{Coord, SpecialKind};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BoardError {
    /// A coordinate outside the board. Always a caller bug; fails the call, not the engine.
    #[error("cell ({row}, {column}) is outside the {rows}x{columns} board")]
    OutOfBounds {
        row: usize,
        column: usize,
        rows: usize,
        columns: usize,
    },
    /// Non-adjacent, identical or empty selection. Callers see this as a rejected swap.
    #[error("cannot swap {a} with {b}")]
    InvalidMove { a: Coord, b: Coord },
    /// No special-token definition exists for the type that earned one.
    #[error("no {kind} definition for token type `{type_id}`")]
    Configuration { kind: SpecialKind, type_id: String },
    #[error("invalid level data: {0}")]
    InvalidLevelData(String),
    #[error("invalid engine settings: {0}")]
    InvalidSettings(String),
}

pub type Result<T, E = BoardError> = std::result::Result<T, E>;
