//! Layout and drawing: board, sidebar, pause, no-moves and quit overlays.

use crate::app::{QuitOption, Screen};
use crate::playback::{Playback, REMOVE_FADE_MS};
use crate::theme::Theme;
use candytui::{Coord, Grid, SpecialKind, Token};
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Position, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Paragraph, Widget};
use std::collections::HashSet;
use std::time::Instant;
use tachyonfx::{
    CellFilter, Duration as TfxDuration, Effect, EffectRenderer, Interpolation, fx, ref_count,
};

/// Each board cell is three terminal columns: cursor bracket, token, cursor bracket.
const CELL_WIDTH: u16 = 3;
const CELL_HEIGHT: u16 = 1;
const SIDEBAR_WIDTH: u16 = 24;

/// Everything one frame needs, borrowed from the app.
pub struct BoardView<'a> {
    pub theme: &'a Theme,
    pub playback: &'a Playback,
    pub token_types: &'a [String],
    pub screen: Screen,
    pub paused: bool,
    pub cursor: Coord,
    pub selected: Option<Coord>,
    pub hint: Option<(Coord, Coord)>,
    pub flash: Option<(Coord, Coord)>,
    pub high_score: u32,
    pub moves_left: usize,
    pub quit_selected: QuitOption,
    pub animate: bool,
    pub frame: u64,
    pub now: Instant,
}

/// Board size in terminal cells, border included.
fn board_outer_size(grid: &Grid) -> (u16, u16) {
    (
        grid.columns() as u16 * CELL_WIDTH + 2,
        grid.rows() as u16 * CELL_HEIGHT + 2,
    )
}

/// Terminal position of the left edge of `at`, given the board's inner rect.
fn cell_origin(inner: Rect, grid: &Grid, at: Coord) -> (u16, u16) {
    // Row 0 is drawn at the bottom.
    let y = inner.y + (grid.rows() - 1 - at.row) as u16 * CELL_HEIGHT;
    let x = inner.x + at.column as u16 * CELL_WIDTH;
    (x, y)
}

/// Draw the current screen; while cells are being removed, runs the TachyonFX fade over them.
pub fn draw(
    frame: &mut Frame,
    view: &BoardView,
    removal_effect: &mut Option<Effect>,
    removal_effect_time: &mut Option<Instant>,
) {
    let area = frame.area();
    let board_inner = draw_game(frame, view, area);
    if view.animate && !view.playback.removing().is_empty() {
        apply_removal_effect(frame, view, board_inner, removal_effect, removal_effect_time);
    }
    match view.screen {
        Screen::Playing if view.paused => draw_pause_overlay(frame, view.theme, area),
        Screen::Playing => {}
        Screen::NoMoves => draw_no_moves(frame, view, area),
        Screen::QuitMenu => draw_quit_menu(frame, view.theme, view.quit_selected),
    }
}

/// Create or update the fade of removed cells and process it.
fn apply_removal_effect(
    frame: &mut Frame,
    view: &BoardView,
    board_inner: Rect,
    removal_effect: &mut Option<Effect>,
    removal_effect_time: &mut Option<Instant>,
) {
    let delta = removal_effect_time
        .map(|t| view.now.saturating_duration_since(t))
        .unwrap_or(std::time::Duration::ZERO);
    let delta_ms = delta.as_millis().min(u32::MAX as u128) as u32;
    *removal_effect_time = Some(view.now);

    if removal_effect.is_none() {
        let grid = view.playback.view();
        let mut cells = HashSet::new();
        for &at in view.playback.removing() {
            let (x, y) = cell_origin(board_inner, grid, at);
            for dx in 0..CELL_WIDTH {
                cells.insert((x + dx, y));
            }
        }
        let filter =
            CellFilter::PositionFn(ref_count(move |pos: Position| cells.contains(&(pos.x, pos.y))));
        let bg = view.theme.bg;
        let effect = fx::fade_to(bg, bg, (REMOVE_FADE_MS, Interpolation::Linear))
            .with_filter(filter)
            .with_area(board_inner);
        *removal_effect = Some(effect);
    }

    if let Some(effect) = removal_effect {
        frame.render_effect(effect, board_inner, TfxDuration::from_millis(delta_ms));
    }
}

/// Board + sidebar, centered. Returns the board's inner rect.
fn draw_game(frame: &mut Frame, view: &BoardView, area: Rect) -> Rect {
    let (bw, bh) = board_outer_size(view.playback.view());
    let total_w = bw + SIDEBAR_WIDTH;
    let sidebar_h = 21u16;

    let horiz_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(total_w),
            Constraint::Fill(1),
        ])
        .split(area);
    let vert_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(bh.max(sidebar_h)),
            Constraint::Fill(1),
        ])
        .split(horiz_chunks[1]);
    let inner = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(bw), Constraint::Length(SIDEBAR_WIDTH)])
        .split(vert_chunks[1]);

    let board_area = Rect {
        height: bh.min(inner[0].height),
        ..inner[0]
    };
    let board_inner = draw_board(frame, view, board_area);
    draw_sidebar(frame, view, inner[1]);
    board_inner
}

fn draw_board(frame: &mut Frame, view: &BoardView, area: Rect) -> Rect {
    let theme = view.theme;
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
        .title(Span::styled(" candytui ", Style::default().fg(theme.title)));
    let inner = block.inner(area);
    block.render(area, frame.buffer_mut());

    let grid = view.playback.view();
    let fits = |x: u16, y: u16| x + CELL_WIDTH <= inner.x + inner.width && y < inner.y + inner.height;
    let is_pair = |pair: Option<(Coord, Coord)>, at: Coord| pair.is_some_and(|(a, b)| a == at || b == at);
    let buf = frame.buffer_mut();

    // Cell backgrounds: selection, hint and flash belong to positions, not tokens.
    for at in grid.coords() {
        let (x, y) = cell_origin(inner, grid, at);
        if !fits(x, y) {
            continue;
        }
        let bg = if is_pair(view.flash, at) {
            Color::Red
        } else if view.selected == Some(at) {
            theme.selected_bg
        } else if is_pair(view.hint, at) {
            theme.inactive_fg
        } else {
            theme.bg
        };
        buf.set_string(x, y, "   ", Style::default().bg(bg));
    }

    for at in grid.coords() {
        let Some(token) = grid.token(at.row, at.column) else {
            continue;
        };
        let shown = Coord::new(at.row + view.playback.fall_offset(at, view.now), at.column);
        if shown.row >= grid.rows() {
            continue;
        }
        let (x, y) = cell_origin(inner, grid, shown);
        if fits(x, y) {
            let (symbol, style) = token_glyph(theme, token, at.column, view.frame);
            // The glyph style carries no background, so the cell highlight stays.
            buf[(x + 1, y)].set_symbol(symbol).set_style(style);
        }
    }

    let (x, y) = cell_origin(inner, grid, view.cursor);
    if fits(x, y) && view.screen == Screen::Playing {
        let cursor = Style::default().fg(theme.title).add_modifier(Modifier::BOLD);
        buf.set_string(x, y, "[", cursor);
        buf.set_string(x + 2, y, "]", cursor);
    }

    for popup in view.playback.popups() {
        let (x, y) = cell_origin(inner, grid, popup.at);
        let label = if popup.chain > 1 {
            format!("+{} x{}", popup.amount, popup.chain)
        } else {
            format!("+{}", popup.amount)
        };
        let room = (inner.x + inner.width).saturating_sub(x) as usize;
        if room > 0 && y < inner.y + inner.height {
            let style = Style::default()
                .fg(theme.title)
                .bg(theme.bg)
                .add_modifier(Modifier::BOLD);
            buf.set_stringn(x, y, label, room, style);
        }
    }
    inner
}

/// Symbol and style for one token.
fn token_glyph(theme: &Theme, token: &Token, column: usize, frame: u64) -> (&'static str, Style) {
    match token.special() {
        SpecialKind::None => ("●", Style::default().fg(theme.token_color(token.type_id()))),
        SpecialKind::ClearLine => (
            "═",
            Style::default()
                .fg(theme.token_color(token.type_id()))
                .add_modifier(Modifier::BOLD),
        ),
        SpecialKind::ClearColor => (
            "✦",
            Style::default()
                .fg(theme.rainbow_color(frame, column))
                .add_modifier(Modifier::BOLD),
        ),
    }
}

fn sidebar_block(theme: &Theme) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
}

fn draw_sidebar(frame: &mut Frame, view: &BoardView, area: Rect) {
    let theme = view.theme;
    let title_style = Style::default().fg(theme.title);
    let fg_style = Style::default().fg(theme.main_fg);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(7), // Stats
            Constraint::Length(1), // gap
            Constraint::Length(4), // Colours
            Constraint::Length(1), // gap
            Constraint::Length(8), // Keys
        ])
        .split(area);

    let stats_block = sidebar_block(theme);
    let stats_inner = stats_block.inner(chunks[0]);
    stats_block.render(chunks[0], frame.buffer_mut());
    let stat = |label: &'static str, value: String| {
        Line::from(vec![
            Span::styled(label, title_style),
            Span::styled(value, fg_style),
        ])
    };
    let moves = if view.playback.is_busy() {
        "…".to_string()
    } else {
        view.moves_left.to_string()
    };
    let specials = view
        .playback
        .view()
        .count_where(|t| t.special() != SpecialKind::None);
    Paragraph::new(Text::from(vec![
        stat("Score: ", view.playback.score().to_string()),
        stat("Best: ", view.high_score.to_string()),
        stat("Chain: ", view.playback.last_chain().to_string()),
        stat("Moves: ", moves),
        stat("Specials: ", specials.to_string()),
    ]))
    .render(stats_inner, frame.buffer_mut());

    let colours_block = sidebar_block(theme);
    let colours_inner = colours_block.inner(chunks[2]);
    colours_block.render(chunks[2], frame.buffer_mut());
    let colours_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(1)])
        .split(colours_inner);
    Paragraph::new(Line::from(Span::styled("Colours", title_style)))
        .render(colours_layout[0], frame.buffer_mut());
    draw_colour_strip(frame, view, colours_layout[1]);

    let keys_block = sidebar_block(theme);
    let keys_inner = keys_block.inner(chunks[4]);
    keys_block.render(chunks[4], frame.buffer_mut());
    let key = |k: &'static str, what: &'static str| {
        Line::from(vec![
            Span::styled(k, title_style),
            Span::styled(what, fg_style),
        ])
    };
    Paragraph::new(Text::from(vec![
        key("←↓↑→ ", "move"),
        key("Space ", "pick / swap"),
        key("Esc ", "cancel pick"),
        key("? ", "hint"),
        key("R ", "restart"),
        key("P Q ", "pause, quit"),
    ]))
    .render(keys_inner, frame.buffer_mut());
}

/// One token glyph per colour in play.
fn draw_colour_strip(frame: &mut Frame, view: &BoardView, area: Rect) {
    let spans: Vec<Span> = view
        .token_types
        .iter()
        .map(|t| Span::styled("● ", Style::default().fg(view.theme.token_color(t))))
        .chain(std::iter::once(Span::styled(
            "✦",
            Style::default().fg(view.theme.rainbow_color(view.frame, 0)),
        )))
        .collect();
    Paragraph::new(Line::from(spans)).render(area, frame.buffer_mut());
}

/// Centered popup rect, clipped to `area`.
fn popup_rect(area: Rect, width: u16, height: u16) -> Rect {
    Rect {
        x: area.x + area.width.saturating_sub(width) / 2,
        y: area.y + area.height.saturating_sub(height) / 2,
        width: width.min(area.width),
        height: height.min(area.height),
    }
}

fn draw_pause_overlay(frame: &mut Frame, theme: &Theme, area: Rect) {
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            " Paused ",
            Style::default().fg(Color::Black).bg(Color::Yellow),
        )),
        Line::from(""),
        Line::from(Span::styled(
            " P Resume    Q Quit ",
            Style::default().fg(theme.main_fg),
        )),
    ];
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.div_line).bg(theme.bg)),
        )
        .render(popup_rect(area, 28, 6), frame.buffer_mut());
}

fn draw_no_moves(frame: &mut Frame, view: &BoardView, area: Rect) {
    let theme = view.theme;
    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            " No moves left ",
            Style::default().fg(Color::White).bg(Color::Red),
        )),
        Line::from(""),
        Line::from(Span::styled(
            format!(" Score: {} ", view.playback.score()),
            Style::default().fg(theme.main_fg),
        )),
        Line::from(Span::styled(
            format!(" Best: {} ", view.high_score),
            Style::default().fg(theme.main_fg),
        )),
    ];
    if view.playback.score() > 0 && view.playback.score() >= view.high_score {
        lines.push(Line::from(Span::styled(
            " New record! ",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        " R Restart    Q Quit ",
        Style::default().fg(theme.main_fg),
    )));
    let height = lines.len() as u16 + 2;
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
                .title(Span::styled(" candytui ", Style::default().fg(theme.title))),
        )
        .render(popup_rect(area, 30, height), frame.buffer_mut());
}

pub fn draw_quit_menu(frame: &mut Frame, theme: &Theme, selected: QuitOption) {
    let quit_rect = popup_rect(frame.area(), 24, 8);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.title))
        .title(" Quit? ");

    for y in quit_rect.y..quit_rect.y + quit_rect.height {
        for x in quit_rect.x..quit_rect.x + quit_rect.width {
            frame.buffer_mut()[(x, y)].set_style(Style::default().bg(theme.bg));
        }
    }

    let inner = block.inner(quit_rect);
    block.render(quit_rect, frame.buffer_mut());

    let options = [
        (QuitOption::Resume, " Resume "),
        (QuitOption::Restart, " Restart "),
        (QuitOption::Exit, " Exit "),
    ];

    for (i, (opt, label)) in options.iter().enumerate() {
        let style = if *opt == selected {
            Style::default()
                .fg(theme.bg)
                .bg(theme.title)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(theme.title)
        };
        let rx = inner.x + (inner.width.saturating_sub(label.len() as u16)) / 2;
        let ry = inner.y + i as u16 * 2;
        if ry < inner.y + inner.height {
            frame.buffer_mut().set_string(rx, ry, label, style);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_zero_is_drawn_at_the_bottom() {
        let grid = Grid::new(4, 3);
        let inner = Rect::new(10, 5, 9, 4);
        assert_eq!(cell_origin(inner, &grid, Coord::new(0, 0)), (10, 8));
        assert_eq!(cell_origin(inner, &grid, Coord::new(3, 2)), (16, 5));
    }

    #[test]
    fn board_size_includes_border() {
        assert_eq!(board_outer_size(&Grid::new(12, 8)), (26, 14));
    }
}
