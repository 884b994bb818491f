use crate::consts;
use crate::game::Game;
use crate::highscores::HighScoreStore;
use crossterm::event::{poll, read};
use rand::Rng;
use ratatui::{backend::Backend, Terminal};
use std::io;
use std::time::Instant;

/// Request from a screen to end the program
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct Quit;

#[derive(Clone, Debug)]
pub(crate) struct App<R, S> {
    game: Game<R, S>,
    quitting: bool,
}

impl<R: Rng, S: HighScoreStore> App<R, S> {
    pub(crate) fn new(game: Game<R, S>) -> App<R, S> {
        App {
            game,
            quitting: false,
        }
    }

    /// Draw a frame, wait up to one frame period for input, then advance the
    /// game by however much time actually passed
    pub(crate) fn run<B: Backend>(mut self, mut terminal: Terminal<B>) -> io::Result<()> {
        let mut last_update = Instant::now();
        while !self.quitting {
            terminal.draw(|frame| frame.render_widget(&self.game, frame.area()))?;
            self.process_input()?;
            let now = Instant::now();
            self.game
                .update(now.saturating_duration_since(last_update));
            last_update = now;
        }
        log::info!("Quitting");
        Ok(())
    }

    fn process_input(&mut self) -> io::Result<()> {
        if poll(consts::FRAME_PERIOD)? && self.game.handle_event(read()?) == Some(Quit) {
            self.quitting = true;
        }
        Ok(())
    }
}
