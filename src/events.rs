//! Notifications emitted to the presentation layer, in the order things happened.

use crate::token::{Coord, Token};

/// Suspension points: places where a presentation layer may pause to animate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// The swap was committed; matches are evaluated next.
    AfterSwap,
    /// A removal batch is done; gravity comes next.
    AfterRemoval,
    /// Gravity and refill are done; the board is rescanned next.
    AfterRefill { max_fall_distance: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoardEvent {
    Swapped { a: Coord, b: Coord },
    TokenRemoved(Coord),
    /// `source_offset` is how many rows above its cell the token enters from (0 = in place).
    TokenSpawned {
        at: Coord,
        token: Token,
        source_offset: usize,
    },
    TokenMoved { from: Coord, to: Coord },
    ScoreChanged { delta: u32, total: u32 },
    Phase(Phase),
    CascadeSettled,
}

impl BoardEvent {
    pub fn is_phase(&self) -> bool {
        matches!(self, Self::Phase(_))
    }
}
