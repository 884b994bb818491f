mod direction;
mod grid;
mod name;
mod powerup;
mod registry;
mod rules;
mod session;
mod snake;
mod spawner;
use self::direction::Direction;
use self::powerup::PowerUpKind;
use self::session::{Session, SessionState};
use crate::app::Quit;
use crate::command::Command;
use crate::config::Config;
use crate::consts;
use crate::highscores::{HighScoreStore, HighScoreTable};
use crate::util::{center_rect, get_display_area};
use crate::warning::{Warning, WarningOutcome};
use crossterm::event::{Event, KeyEvent, KeyCode, KeyModifiers};
use rand::Rng;
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Layout, Margin, Position, Rect, Size},
    style::Style,
    text::{Line, Span, Text},
    widgets::{
        block::{Block, Padding},
        Clear, Widget,
    },
};
use std::fmt::Write;
use std::time::Duration;
use unicode_width::UnicodeWidthStr;

/// The game screen: a [`Session`] plus the high score store it reports to
#[derive(Clone, Debug)]
pub(crate) struct Game<R, S> {
    session: Session<R>,
    store: S,
    warning: Option<Warning>,
}

impl<R: Rng, S: HighScoreStore> Game<R, S> {
    /// Load the high score table once and keep it in memory for every
    /// session after.  This assumes no other process writes to the store
    /// while the game runs.
    pub(crate) fn new(config: &Config, store: S, rng: R) -> Game<R, S> {
        let (high_scores, warning) = match store.load() {
            Ok(table) => (table, None),
            Err(e) => {
                log::warn!(
                    "{}; starting with an empty high score table",
                    error_chain(&e)
                );
                (HighScoreTable::default(), Some(Warning::from(e)))
            }
        };
        let session = Session::new(config.game, config.features, high_scores, rng);
        Game {
            session,
            store,
            warning,
        }
    }

    /// Let `delta` of time pass.  The game holds still while a warning is
    /// shown.
    pub(crate) fn update(&mut self, delta: Duration) {
        if self.warning.is_none() {
            self.session.update(delta);
        }
    }

    pub(crate) fn handle_event(&mut self, event: Event) -> Option<Quit> {
        let ev = event.as_key_press_event()?;
        if let Some(ref warning) = self.warning {
            match warning.handle_command(Command::from_key_event(ev)?)? {
                WarningOutcome::Dismissed => self.warning = None,
                WarningOutcome::Quit => return Some(Quit),
            }
            return None;
        }
        if self.session.state() == SessionState::NameEntry {
            return self.handle_name_key(ev);
        }
        let game_over = self.session.state() == SessionState::GameOver;
        match Command::from_key_event(ev)? {
            Command::Quit => return Some(Quit),
            Command::Q | Command::Esc if game_over => return Some(Quit),
            Command::Up => self.session.on_direction(Direction::North),
            Command::Left => self.session.on_direction(Direction::West),
            Command::Down => self.session.on_direction(Direction::South),
            Command::Right => self.session.on_direction(Direction::East),
            Command::Space => {
                self.session.on_activate_special();
            }
            Command::R => {
                self.session.on_restart();
            }
            _ => (),
        }
        None
    }

    fn handle_name_key(&mut self, ev: KeyEvent) -> Option<Quit> {
        if Command::from_key_event(ev) == Some(Command::Quit) {
            return Some(Quit);
        }
        match ev.code {
            KeyCode::Char(ch)
                if !ev
                    .modifiers
                    .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
            {
                self.session.on_text_append(ch);
            }
            KeyCode::Backspace => self.session.on_backspace(),
            KeyCode::Enter => {
                if self.session.on_confirm_name().is_some() {
                    self.save_high_scores();
                }
            }
            _ => (),
        }
        None
    }

    fn save_high_scores(&mut self) {
        match self.store.save(self.session.high_scores()) {
            Ok(()) => log::debug!("Saved high scores"),
            Err(e) => {
                log::error!("{}", error_chain(&e));
                self.warning = Some(Warning::from(e));
            }
        }
    }
}

impl<R, S> Game<R, S> {
    fn areas(&self, area: Rect) -> Areas {
        let display = get_display_area(area);
        let [score_bar, board_area] =
            Layout::vertical([Constraint::Length(1), Constraint::Fill(1)]).areas(display);
        let bounds = self.session.registry().bounds();
        let block = center_rect(
            board_area,
            Size {
                width: bounds.width.saturating_add(2),
                height: bounds.height.saturating_add(2),
            },
        );
        Areas {
            display,
            score_bar,
            block,
            board: block.inner(Margin::new(1, 1)),
        }
    }

    fn score_bar_text(&self) -> String {
        let s = &self.session;
        let mut text = format!(
            " Score: {}  Level: {}  Length: {}",
            s.score(),
            s.level(),
            s.snake().len()
        );
        if s.features().combo && s.combo() > 1 {
            let _ = write!(text, "  Combo: x{}", s.combo());
        }
        let power_up = s.power_up();
        if power_up.kind != PowerUpKind::None {
            let _ = write!(text, "  {}: {}", power_up.kind, power_up.remaining_ticks);
        }
        if power_up.shield_active() {
            let _ = write!(text, "  [shielded: {}]", power_up.shield_ticks);
        }
        text
    }

    /// Right-hand side of the score bar: the countdown before play, or a
    /// reminder that a shield is ready to raise
    fn score_bar_hint(&self) -> Option<Line<'static>> {
        let s = &self.session;
        if s.state() == SessionState::Countdown {
            let left = s.countdown();
            let secs = left.as_secs() + u64::from(left.subsec_nanos() > 0);
            Some(Line::from_iter([
                Span::raw(format!("GET READY {secs}  ")),
                Span::styled("Space", consts::KEY_STYLE),
                Span::raw(" to start now "),
            ]))
        } else if s.state() == SessionState::Playing && s.power_up().shield_held {
            Some(Line::from_iter([
                Span::styled("Space", consts::KEY_STYLE),
                Span::raw(" to raise shield "),
            ]))
        } else {
            None
        }
    }

    fn render_score_bar(&self, area: Rect, buf: &mut Buffer) {
        Line::styled(self.score_bar_text(), consts::SCORE_BAR_STYLE).render(area, buf);
        if let Some(hint) = self.score_bar_hint() {
            hint.right_aligned().render(area, buf);
        }
    }

    fn render_board(&self, board: Rect, buf: &mut Buffer) {
        let s = &self.session;
        let snake = s.snake();
        let mut canvas = Canvas { area: board, buf };
        if s.state() == SessionState::Playing && s.interpolation() < 0.5 {
            if let Some(&tail) = snake.previous().last() {
                if !snake.occupies(tail) {
                    canvas.draw_cell(tail, consts::TRAIL_SYMBOL, consts::TRAIL_STYLE);
                }
            }
        }
        for &pos in s.registry().obstacles() {
            canvas.draw_cell(pos, consts::OBSTACLE_SYMBOL, consts::OBSTACLE_STYLE);
        }
        for &pos in s.registry().apples() {
            canvas.draw_cell(pos, consts::APPLE_SYMBOL, consts::APPLE_STYLE);
        }
        let snake_style = if s.power_up().shield_active() {
            consts::SHIELDED_SNAKE_STYLE
        } else {
            consts::SNAKE_STYLE
        };
        for &pos in snake.segments().iter().skip(1) {
            canvas.draw_cell(pos, consts::SNAKE_BODY_SYMBOL, snake_style);
        }
        // Draw the head last so that, if it's a collision, we overwrite
        // whatever it's colliding with
        if s.state() != SessionState::Playing && s.last_outcome().is_collision() {
            canvas.draw_cell(
                snake.head(),
                consts::COLLISION_SYMBOL,
                consts::COLLISION_STYLE,
            );
        } else {
            canvas.draw_cell(snake.head(), head_symbol(snake.direction()), snake_style);
        }
    }

    /// The game-over panel goes on whichever half of the display the crashed
    /// head is not on
    fn render_game_over(&self, areas: Areas, buf: &mut Buffer) {
        let s = &self.session;
        let mut lines = vec![Line::from(format!("Score: {}", s.score())), Line::default()];
        if s.state() == SessionState::NameEntry {
            lines.push(Line::from_iter([
                Span::raw("Name: "),
                Span::raw(s.name()),
                Span::styled("_", consts::KEY_STYLE),
            ]));
            lines.push(Line::default());
        }
        let entries = s.high_scores().entries();
        if entries.is_empty() {
            lines.push(Line::from("No high scores yet"));
        }
        for (i, entry) in entries.iter().enumerate() {
            let pad = consts::NAME_MAX_WIDTH.saturating_sub(entry.name.width());
            let text = format!(
                "{:>2}. {}{} {:>6}",
                i + 1,
                entry.name,
                " ".repeat(pad),
                entry.score
            );
            if s.new_entry() == Some(i) {
                lines.push(Line::styled(text, consts::NEW_HIGH_SCORE_STYLE));
            } else {
                lines.push(Line::from(text));
            }
        }
        lines.push(Line::default());
        if s.state() == SessionState::NameEntry {
            lines.push(Line::from_iter([
                Span::raw("Type your name, then press "),
                Span::styled("Enter", consts::KEY_STYLE),
            ]));
        } else {
            lines.push(Line::from_iter([
                Span::raw("Restart ("),
                Span::styled("r", consts::KEY_STYLE),
                Span::raw(")  Quit ("),
                Span::styled("q", consts::KEY_STYLE),
                Span::raw(")"),
            ]));
        }
        let head_x = areas.board.x.saturating_add(s.snake().head().x);
        Popup {
            title: " GAME OVER ",
            text: Text::from(lines),
            width: 40,
        }
        .render(away_from(areas.display, head_x), buf);
    }
}

impl<R, S> Widget for &Game<R, S> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let areas = self.areas(area);
        self.render_score_bar(areas.score_bar, buf);
        Block::bordered().render(areas.block, buf);
        self.render_board(areas.board, buf);
        match self.session.state() {
            SessionState::Countdown | SessionState::Playing => (),
            SessionState::NameEntry | SessionState::GameOver => {
                self.render_game_over(areas, buf);
            }
        }
        if let Some(ref warning) = self.warning {
            warning.render(areas.display, buf);
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
struct Areas {
    display: Rect,
    score_bar: Rect,
    /// The playfield including its border
    block: Rect,
    board: Rect,
}

/// The half of `display` that does not contain column `x`
fn away_from(display: Rect, x: u16) -> Rect {
    let [left, right] =
        Layout::horizontal([Constraint::Fill(1), Constraint::Fill(1)]).areas(display);
    if x < right.x {
        right
    } else {
        left
    }
}

/// A bordered box of text drawn over the middle of an area
#[derive(Clone, Debug, Eq, PartialEq)]
struct Popup<'a> {
    title: &'static str,
    text: Text<'a>,
    width: u16,
}

impl Widget for Popup<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let height = u16::try_from(self.text.height())
            .unwrap_or(u16::MAX)
            .saturating_add(2);
        let popup_area = center_rect(
            area,
            Size {
                width: self.width,
                height,
            },
        );
        let block = Block::bordered()
            .title(self.title)
            .title_alignment(Alignment::Center)
            .padding(Padding::horizontal(1));
        let inner = block.inner(popup_area);
        Clear.render(popup_area, buf);
        block.render(popup_area, buf);
        self.text.render(inner, buf);
    }
}

#[derive(Debug, Eq, PartialEq)]
struct Canvas<'a> {
    area: Rect,
    buf: &'a mut Buffer,
}

impl Canvas<'_> {
    fn draw_cell(&mut self, pos: Position, symbol: char, style: Style) {
        let Some(x) = self.area.x.checked_add(pos.x) else {
            return;
        };
        let Some(y) = self.area.y.checked_add(pos.y) else {
            return;
        };
        if !self.area.contains(Position::new(x, y)) {
            return;
        }
        if let Some(cell) = self.buf.cell_mut((x, y)) {
            cell.set_char(symbol);
            cell.set_style(Style::reset().patch(style));
        }
    }
}

fn head_symbol(direction: Direction) -> char {
    match direction {
        Direction::North => consts::SNAKE_HEAD_NORTH_SYMBOL,
        Direction::South => consts::SNAKE_HEAD_SOUTH_SYMBOL,
        Direction::East => consts::SNAKE_HEAD_EAST_SYMBOL,
        Direction::West => consts::SNAKE_HEAD_WEST_SYMBOL,
    }
}

/// Format an error and all of its sources on one line
fn error_chain(e: &dyn std::error::Error) -> String {
    let mut msg = e.to_string();
    let mut source = e.source();
    while let Some(src) = source {
        let _ = write!(msg, ": {src}");
        source = src.source();
    }
    msg
}
