//! candytui: match-3 candy puzzle in the terminal.

mod app;
mod highscores;
mod input;
mod playback;
mod theme;
mod ui;

use anyhow::{Context, Result, bail};
use app::App;
use candytui::config::{DEFAULT_COLUMNS, DEFAULT_ROWS, DEFAULT_TOKEN_TYPES};
use candytui::{EngineConfig, FillStrategy, LevelData};
use clap::{Parser, ValueEnum};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::Level;

/// Options derived from the CLI that shape one play session.
#[derive(Debug, Clone)]
pub struct GameConfig {
    pub engine: EngineConfig,
    pub seed: u64,
    /// Premade board; restarts reload it.
    pub level: Option<LevelData>,
    pub animate: bool,
    pub hints: bool,
    pub frame_rate: f64,
}

impl GameConfig {
    fn from_args(args: &Args) -> Result<Self> {
        let level = args
            .level
            .as_deref()
            .map(|path| {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("cannot read level {}", path.display()))?;
                LevelData::parse(&text).with_context(|| format!("in level {}", path.display()))
            })
            .transpose()?;
        let (rows, columns) = match &level {
            Some(level) => (level.rows(), level.columns()),
            None => (args.rows, args.columns),
        };
        // Premade levels may use any colour.
        let colors = if level.is_some() {
            DEFAULT_TOKEN_TYPES.len()
        } else {
            usize::from(args.colors)
        };
        let engine = EngineConfig::with_types(rows, columns, &DEFAULT_TOKEN_TYPES[..colors]);
        engine.validate()?;
        if args.frame_rate <= 0.0 {
            bail!("--frame-rate must be positive");
        }
        Ok(Self {
            engine,
            seed: args.seed.unwrap_or_else(rand::random),
            level,
            animate: !args.no_animation,
            hints: !args.no_hints,
            frame_rate: args.frame_rate,
        })
    }

    pub fn fill_strategy(&self) -> FillStrategy {
        match &self.level {
            Some(level) => FillStrategy::FromLevelData(level.clone()),
            None => FillStrategy::Random,
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.log_file.as_deref(), args.verbose)?;
    let theme = theme::Theme::load(args.theme.as_deref(), args.palette).unwrap_or_default();
    let config = GameConfig::from_args(&args)?;
    tracing::info!(seed = config.seed, rows = config.engine.rows, columns = config.engine.columns, "starting");
    let mut app = App::new(config, theme)?;
    app.run()?;
    Ok(())
}

/// Log to a file only: the terminal belongs to the UI.
fn init_logging(path: Option<&Path>, verbose: bool) -> Result<()> {
    let Some(path) = path else {
        return Ok(());
    };
    let file = std::fs::File::create(path)
        .with_context(|| format!("cannot create log file {}", path.display()))?;
    tracing_subscriber::fmt()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_max_level(if verbose { Level::DEBUG } else { Level::INFO })
        .init();
    Ok(())
}

/// Match-3 candy puzzle in the terminal.
#[derive(Debug, Parser)]
#[command(
    name = "candytui",
    version,
    about = "Match-3 candy puzzle in the terminal. Swap neighbours to line up three or more of a colour.",
    long_about = "candytui is a terminal match-3 game.\n\n\
        Swap two neighbouring candies to line up three or more of one colour. Matched candies \
        vanish, the rest fall and new ones drop in; chains score a bonus. Four in a row leaves a \
        striped candy that clears its whole line when matched; five leaves a rainbow that clears \
        every candy of the colour it is swapped with.\n\n\
        CONTROLS:\n  Arrows / hjkl  Move cursor   Space / Enter  Pick cell   Esc  Cancel pick\n  \
        ?              Hint          R              Restart     P    Pause   Q  Quit\n\n\
        Use --theme to load a btop-style theme (e.g. onedark.theme)."
)]
pub struct Args {
    /// Board height in cells. Ignored with --level.
    #[arg(long, default_value_t = DEFAULT_ROWS, value_name = "ROWS")]
    pub rows: usize,

    /// Board width in cells. Ignored with --level.
    #[arg(long, default_value_t = DEFAULT_COLUMNS, value_name = "COLS")]
    pub columns: usize,

    /// Number of candy colours (3-6). Fewer colours means more cascades.
    #[arg(long, default_value_t = 6, value_name = "N", value_parser = clap::value_parser!(u8).range(3..=6))]
    pub colors: u8,

    /// Seed for the candy generator; random if not set.
    #[arg(long, value_name = "SEED")]
    pub seed: Option<u64>,

    /// Premade level file: one line per row (top row first), cells like `red`, `red_B`, `rainbow`.
    #[arg(long, value_name = "FILE")]
    pub level: Option<PathBuf>,

    /// Path to theme file (btop-style theme[key]=\"value\"). Uses One Dark if not set.
    #[arg(short, long, value_name = "FILE")]
    pub theme: Option<PathBuf>,

    /// Colour palette: normal (theme), high-contrast, or colorblind.
    #[arg(long, default_value = "normal")]
    pub palette: Palette,

    /// Apply moves instantly (no fades or falling).
    #[arg(long)]
    pub no_animation: bool,

    /// Never highlight a move after idling.
    #[arg(long)]
    pub no_hints: bool,

    /// Target render frames per second.
    #[arg(long, default_value = "60.0", value_name = "RATE")]
    pub frame_rate: f64,

    /// Write engine logs to this file.
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Log at debug level (every pass and rejected swap).
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Palette {
    #[default]
    Normal,

    #[value(alias = "highcontrast", alias = "contrast")]
    HighContrast,

    #[value(alias = "colourblind")]
    Colorblind,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_build_a_valid_config() {
        let args = Args::parse_from(["candytui", "--seed", "9"]);
        let config = GameConfig::from_args(&args).unwrap();
        assert_eq!(config.seed, 9);
        assert_eq!(config.engine.rows, DEFAULT_ROWS);
        assert_eq!(config.engine.token_types.len(), 6);
        assert!(config.animate && config.hints);
    }

    #[test]
    fn colour_count_is_bounded() {
        assert!(Args::try_parse_from(["candytui", "--colors", "2"]).is_err());
        let args = Args::parse_from(["candytui", "--colors", "3"]);
        let config = GameConfig::from_args(&args).unwrap();
        assert_eq!(config.engine.token_types, ["green", "yellow", "red"]);
    }
}
