//! Match-3 board engine: swap resolution, cascades, specials and scoring.
//!
//! The engine is synchronous. Everything a presentation layer needs to animate a
//! move comes back as an ordered list of [`BoardEvent`]s, with [`Phase`] markers
//! where playback may pause.

#![forbid(unsafe_code)]

pub mod cascade;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod grid;
pub mod hints;
pub mod level;
pub mod matcher;
pub mod score;
pub mod source;
pub mod token;

pub use config::{EngineConfig, SpecialDefinitions};
pub use engine::{Engine, SwapOutcome, SwapState};
pub use error::{BoardError, Result};
pub use events::{BoardEvent, Phase};
pub use grid::Grid;
pub use level::{FillStrategy, LevelData};
pub use score::ScoreRules;
pub use token::{Coord, SpecialKind, Token};
