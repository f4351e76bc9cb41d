//! App: terminal init, main loop, event playback and key handling.

use crate::GameConfig;
use crate::highscores;
use crate::input::{Action, key_to_action};
use crate::playback::Playback;
use crate::theme::Theme;
use crate::ui::{self, BoardView};
use anyhow::Result;
use candytui::{Coord, Engine, SwapOutcome, SwapState};
use crossterm::event::{self, Event, KeyEventKind};
use ratatui::DefaultTerminal;
use std::time::{Duration, Instant};
use tachyonfx::Effect;
use tracing::{debug, warn};

/// Idle time before the first potential move is highlighted.
const HINT_DELAY: Duration = Duration::from_secs(6);
/// How long the two cells of a reverted swap flash.
const FLASH_MS: u64 = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Playing,
    /// Board has no potential move left.
    NoMoves,
    QuitMenu,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuitOption {
    Resume,
    Restart,
    Exit,
}

impl QuitOption {
    fn next(self) -> Self {
        match self {
            Self::Resume => Self::Restart,
            Self::Restart => Self::Exit,
            Self::Exit => Self::Resume,
        }
    }

    fn prev(self) -> Self {
        match self {
            Self::Resume => Self::Exit,
            Self::Restart => Self::Resume,
            Self::Exit => Self::Restart,
        }
    }
}

/// A board with nothing to swap goes straight to the no-moves screen.
fn screen_for(moves_left: usize) -> Screen {
    if moves_left == 0 {
        Screen::NoMoves
    } else {
        Screen::Playing
    }
}

pub struct App {
    config: GameConfig,
    theme: Theme,
    engine: Engine,
    playback: Playback,
    screen: Screen,
    paused: bool,
    cursor: Coord,
    quit_selected: QuitOption,
    high_score: u32,
    /// Potential moves once the board last settled.
    moves_left: usize,
    last_input: Instant,
    hint: Option<(Coord, Coord)>,
    flash: Option<(Coord, Coord, Instant)>,
    /// TachyonFX fade for removed cells (created when a removal batch starts).
    removal_effect: Option<Effect>,
    /// Last time the removal effect was processed (for delta).
    removal_effect_time: Option<Instant>,
    frame: u64,
}

impl App {
    pub fn new(config: GameConfig, theme: Theme) -> Result<Self> {
        let mut engine = Engine::new(config.engine.clone(), config.seed)?;
        let grid = engine.initialize_board(config.fill_strategy())?.clone();
        let moves_left = engine.potential_moves().len();
        let cursor = Coord::new(grid.rows() / 2, grid.columns() / 2);
        Ok(Self {
            config,
            theme,
            engine,
            playback: Playback::new(grid),
            screen: screen_for(moves_left),
            paused: false,
            cursor,
            quit_selected: QuitOption::Resume,
            high_score: highscores::load_high_score(),
            moves_left,
            last_input: Instant::now(),
            hint: None,
            flash: None,
            removal_effect: None,
            removal_effect_time: None,
            frame: 0,
        })
    }

    fn restart(&mut self) -> Result<()> {
        self.record_high_score();
        let grid = self
            .engine
            .initialize_board(self.config.fill_strategy())?
            .clone();
        self.playback.reset(grid);
        self.moves_left = self.engine.potential_moves().len();
        self.screen = screen_for(self.moves_left);
        self.paused = false;
        self.hint = None;
        self.flash = None;
        self.removal_effect = None;
        self.removal_effect_time = None;
        self.last_input = Instant::now();
        Ok(())
    }

    fn record_high_score(&mut self) {
        if self.engine.score() > self.high_score {
            self.high_score = self.engine.score();
            if let Err(err) = highscores::save_high_score(self.high_score) {
                warn!(%err, "could not save high score");
            }
        }
    }

    fn move_cursor(&mut self, action: Action) {
        let grid = self.engine.grid();
        let Coord { row, column } = self.cursor;
        self.cursor = match action {
            Action::Up => Coord::new((row + 1).min(grid.rows() - 1), column),
            Action::Down => Coord::new(row.saturating_sub(1), column),
            Action::Left => Coord::new(row, column.saturating_sub(1)),
            Action::Right => Coord::new(row, (column + 1).min(grid.columns() - 1)),
            _ => self.cursor,
        };
    }

    fn select(&mut self, now: Instant) {
        let first = match self.engine.state() {
            SwapState::Selecting(first) => Some(first),
            _ => None,
        };
        match self.engine.select(self.cursor) {
            Ok(None) => {}
            Ok(Some(SwapOutcome::Rejected)) => {
                // Not a neighbour: start a new selection here instead.
                if let Err(err) = self.engine.select(self.cursor) {
                    warn!(%err, "selection failed");
                }
            }
            Ok(Some(SwapOutcome::Reverted)) => {
                if let Some(first) = first {
                    self.flash = Some((first, self.cursor, now));
                }
            }
            Ok(Some(SwapOutcome::Resolved {
                score_delta,
                events,
            })) => {
                debug!(score_delta, events = events.len(), "swap resolved");
                self.playback.enqueue(events);
                self.record_high_score();
            }
            Err(err) => warn!(%err, "selection failed"),
        }
    }

    /// Called every frame while playing: advance playback, then hint and dead-board checks.
    fn tick(&mut self, now: Instant) {
        let was_busy = self.playback.is_busy();
        if let Err(err) = self.playback.advance(now, self.config.animate) {
            warn!(%err, "playback out of step with the board");
            self.playback.reset(self.engine.grid().clone());
        }

        if self.playback.removing().is_empty() {
            self.removal_effect = None;
            self.removal_effect_time = None;
        }
        if self
            .flash
            .is_some_and(|(_, _, at)| now.duration_since(at) >= Duration::from_millis(FLASH_MS))
        {
            self.flash = None;
        }

        if was_busy && !self.playback.is_busy() {
            self.moves_left = self.engine.potential_moves().len();
            if self.moves_left == 0 {
                self.record_high_score();
                self.screen = Screen::NoMoves;
            }
        }

        if self.config.hints
            && self.hint.is_none()
            && !self.playback.is_busy()
            && now.duration_since(self.last_input) >= HINT_DELAY
        {
            self.hint = self.engine.hint();
        }
    }

    /// Returns `false` when the app should exit.
    fn handle_action(&mut self, action: Action, now: Instant) -> Result<bool> {
        self.last_input = now;
        self.hint = None;
        match self.screen {
            Screen::Playing if self.paused => match action {
                Action::Pause => self.paused = false,
                Action::Quit => self.open_quit_menu(),
                _ => {}
            },
            Screen::Playing => match action {
                Action::Up | Action::Down | Action::Left | Action::Right => self.move_cursor(action),
                // Input is ignored while a move is still playing out.
                Action::Select if !self.playback.is_busy() => self.select(now),
                Action::Cancel => self.engine.cancel_selection(),
                Action::Hint if !self.playback.is_busy() => self.hint = self.engine.hint(),
                Action::Restart => self.restart()?,
                Action::Pause => self.paused = true,
                Action::Quit => self.open_quit_menu(),
                _ => {}
            },
            Screen::NoMoves => match action {
                Action::Restart | Action::Select => self.restart()?,
                Action::Quit => return Ok(false),
                _ => {}
            },
            Screen::QuitMenu => match action {
                Action::Down | Action::Right => self.quit_selected = self.quit_selected.next(),
                Action::Up | Action::Left => self.quit_selected = self.quit_selected.prev(),
                Action::Select => match self.quit_selected {
                    QuitOption::Resume => self.screen = Screen::Playing,
                    QuitOption::Restart => self.restart()?,
                    QuitOption::Exit => return Ok(false),
                },
                Action::Cancel | Action::Pause | Action::Quit => self.screen = Screen::Playing,
                _ => {}
            },
        }
        Ok(true)
    }

    fn open_quit_menu(&mut self) {
        self.screen = Screen::QuitMenu;
        self.quit_selected = QuitOption::Resume;
    }

    pub fn run(&mut self) -> Result<()> {
        use crossterm::{
            execute,
            terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
        };

        enable_raw_mode()?;
        let mut stdout = std::io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let mut terminal =
            ratatui::DefaultTerminal::new(ratatui::backend::CrosstermBackend::new(stdout))?;

        let result = self.run_loop(&mut terminal);

        execute!(std::io::stdout(), LeaveAlternateScreen)?;
        disable_raw_mode()?;
        self.record_high_score();

        result
    }

    fn run_loop(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        let frame_duration = Duration::from_secs_f64(1.0 / self.config.frame_rate);
        loop {
            let now = Instant::now();
            if self.screen == Screen::Playing && !self.paused {
                self.tick(now);
            }

            let selected = match self.engine.state() {
                SwapState::Selecting(at) => Some(at),
                _ => None,
            };
            let view = BoardView {
                theme: &self.theme,
                playback: &self.playback,
                token_types: &self.config.engine.token_types,
                screen: self.screen,
                paused: self.paused,
                cursor: self.cursor,
                selected,
                hint: self.hint,
                flash: self.flash.map(|(a, b, _)| (a, b)),
                high_score: self.high_score.max(self.playback.score()),
                moves_left: self.moves_left,
                quit_selected: self.quit_selected,
                animate: self.config.animate,
                frame: self.frame,
                now,
            };
            terminal.draw(|f| {
                ui::draw(
                    f,
                    &view,
                    &mut self.removal_effect,
                    &mut self.removal_effect_time,
                )
            })?;
            self.frame = self.frame.wrapping_add(1);

            let timeout = frame_duration.saturating_sub(now.elapsed());
            if event::poll(timeout)? {
                while event::poll(Duration::ZERO)? {
                    let Event::Key(key) = event::read()? else {
                        continue;
                    };
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if !self.handle_action(key_to_action(key), Instant::now())? {
                        return Ok(());
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use candytui::config::DEFAULT_TOKEN_TYPES;
    use candytui::{EngineConfig, LevelData};

    fn config(level: &str) -> GameConfig {
        let level = LevelData::parse(level).unwrap();
        GameConfig {
            engine: EngineConfig::with_types(level.rows(), level.columns(), &DEFAULT_TOKEN_TYPES),
            seed: 1,
            level: Some(level),
            animate: false,
            hints: false,
            frame_rate: 60.0,
        }
    }

    #[test]
    fn dead_starting_board_opens_no_moves() {
        let app = App::new(
            config("green red green\nyellow blue yellow\ngreen red green"),
            Theme::default(),
        )
        .unwrap();
        assert_eq!(app.moves_left, 0);
        assert_eq!(app.screen, Screen::NoMoves);
    }

    #[test]
    fn restart_onto_a_dead_board_stays_on_no_moves() {
        let mut app = App::new(
            config("green red green\nyellow blue yellow\ngreen red green"),
            Theme::default(),
        )
        .unwrap();
        app.screen = Screen::QuitMenu;
        app.restart().unwrap();
        assert_eq!(app.screen, Screen::NoMoves);
    }

    #[test]
    fn playable_board_starts_playing() {
        let app = App::new(
            config("green red green\nyellow green yellow\nred blue red"),
            Theme::default(),
        )
        .unwrap();
        assert!(app.moves_left > 0);
        assert_eq!(app.screen, Screen::Playing);
    }
}
