use super::direction::Direction;
use super::grid::Bounds;
use super::name::NameBuffer;
use super::powerup::{PowerUpKind, PowerUpState};
use super::registry::Registry;
use super::rules::{crossings, evaluate, Outcome, Scoring};
use super::snake::Snake;
use super::spawner::{spawn_apples, spawn_obstacle, GridFull};
use crate::config::{AppleRespawn, Features, GameConfig};
use crate::consts;
use crate::highscores::HighScoreTable;
use rand::Rng;
use ratatui::layout::Position;
use std::time::Duration;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum SessionState {
    /// "Get ready" phase; nothing moves
    Countdown,
    Playing,
    /// The snake has crashed and the player's name is being typed in
    NameEntry,
    /// The snake has crashed and the score has been recorded
    GameOver,
}

/// One game from countdown to crash, plus the high score table it is
/// competing for.  Time only advances through [`Session::update()`].
#[derive(Clone, Debug)]
pub(crate) struct Session<R> {
    rng: R,
    config: GameConfig,
    features: Features,
    registry: Registry,
    state: SessionState,
    countdown: Duration,
    since_last_move: Duration,
    /// Direction to move in on the next step
    pending: Direction,
    scoring: Scoring,
    power_up: PowerUpState,
    last_outcome: Outcome,
    name: NameBuffer,
    high_scores: HighScoreTable,
    /// Index in `high_scores` of the score recorded for this session
    new_entry: Option<usize>,
}

impl<R: Rng> Session<R> {
    pub(crate) fn new(
        config: GameConfig,
        features: Features,
        high_scores: HighScoreTable,
        rng: R,
    ) -> Session<R> {
        let bounds = Bounds::new(config.width, config.height);
        let mut session = Session {
            rng,
            config,
            features,
            registry: Registry::new(bounds, Self::starting_snake(config)),
            state: SessionState::Countdown,
            countdown: config.countdown,
            since_last_move: Duration::ZERO,
            pending: Direction::East,
            scoring: Scoring::default(),
            power_up: PowerUpState::default(),
            last_outcome: Outcome::Continue,
            name: NameBuffer::default(),
            high_scores,
            new_entry: None,
        };
        session.populate();
        session
    }

    /// Advance the simulation by `delta` of wall-clock time
    pub(crate) fn update(&mut self, delta: Duration) {
        match self.state {
            SessionState::Countdown => {
                self.countdown = self.countdown.saturating_sub(delta);
                if self.countdown.is_zero() {
                    log::debug!("Countdown finished");
                    self.state = SessionState::Playing;
                }
            }
            SessionState::Playing => {
                self.since_last_move = self.since_last_move.saturating_add(delta);
                let interval = self.move_interval();
                if self.since_last_move >= interval {
                    // Carry over the fraction of a step, but drop any backlog
                    // left by a stalled frame.
                    let rest = self.since_last_move.saturating_sub(interval);
                    self.since_last_move = if rest < interval {
                        rest
                    } else {
                        Duration::ZERO
                    };
                    self.advance();
                }
            }
            SessionState::NameEntry | SessionState::GameOver => (),
        }
    }

    /// Start over with a brand-new snake, apples & obstacles.  Only accepted
    /// once the score has been recorded.  Returns `true` if the session was
    /// reset.
    pub(crate) fn on_restart(&mut self) -> bool {
        if self.state != SessionState::GameOver {
            return false;
        }
        self.reset();
        true
    }

    /// Space bar: cut the countdown short, raise a held shield during play,
    /// or restart after a game over.  Returns `true` if anything happened.
    pub(crate) fn on_activate_special(&mut self) -> bool {
        match self.state {
            SessionState::Countdown => {
                self.countdown = Duration::ZERO;
                self.state = SessionState::Playing;
                true
            }
            SessionState::Playing => {
                let raised = self.power_up.raise_shield(self.config.shield_ticks);
                if raised {
                    log::info!("Shield raised for {} steps", self.config.shield_ticks);
                }
                raised
            }
            SessionState::GameOver => self.on_restart(),
            SessionState::NameEntry => false,
        }
    }

    fn reset(&mut self) {
        self.registry = Registry::new(self.registry.bounds(), Self::starting_snake(self.config));
        self.state = SessionState::Countdown;
        self.countdown = self.config.countdown;
        self.since_last_move = Duration::ZERO;
        self.pending = Direction::East;
        self.scoring = Scoring::default();
        self.power_up = PowerUpState::default();
        self.last_outcome = Outcome::Continue;
        self.name.clear();
        self.new_entry = None;
        self.populate();
    }

    fn starting_snake(config: GameConfig) -> Snake {
        let bounds = Bounds::new(config.width, config.height);
        Snake::new(bounds.center(), Direction::East, config.initial_length, bounds)
    }

    /// Place the initial obstacles and the first apple
    fn populate(&mut self) {
        for _ in 0..self.config.initial_obstacles {
            if let Err(e) = self.add_obstacle() {
                log::warn!("Placed fewer obstacles than configured: {e}");
                break;
            }
        }
        self.place_apples(1);
        log::info!(
            "New session on a {}x{} grid with {} obstacles",
            self.config.width,
            self.config.height,
            self.registry.obstacles().len()
        );
    }

    /// Move the snake one step and apply the consequences.  The running
    /// power-up counts this step before any new one is triggered, so every
    /// power-up lasts its full number of steps.
    fn advance(&mut self) {
        let bounds = self.registry.bounds();
        self.registry.snake.step(self.pending, bounds);
        let outcome = evaluate(&self.registry);
        self.last_outcome = outcome;
        let absorbed = outcome.is_collision() && self.power_up.absorb();
        if let Some(kind) = self.power_up.tick() {
            log::info!("{kind} power-up wore off");
        }
        match outcome {
            Outcome::SelfCollision | Outcome::ObstacleCollision => {
                self.scoring.break_streak();
                if absorbed {
                    log::info!("Shield absorbed {outcome:?}");
                } else {
                    log::info!(
                        "Game over ({outcome:?}) with score {} and length {}",
                        self.scoring.score,
                        self.registry.snake().len()
                    );
                    self.state = SessionState::NameEntry;
                }
            }
            Outcome::AteApple => self.eat_apple(),
            Outcome::Continue => self.scoring.break_streak(),
        }
    }

    fn eat_apple(&mut self) {
        let head = self.registry.snake().head();
        self.registry.apples.remove(&head);
        let old_score = self.scoring.score;
        let points = self.scoring.award(self.features.combo);
        log::debug!(
            "Ate apple at {head:?} for {points} point(s); score is now {}",
            self.scoring.score
        );
        self.respawn_apples();
        self.registry.snake.grow();
        self.escalate(old_score, self.scoring.score);
    }

    fn respawn_apples(&mut self) {
        let have = self.registry.apples().len();
        let qty = match self.features.apple_respawn {
            AppleRespawn::Immediate => self.apple_target().saturating_sub(have),
            AppleRespawn::Batch if have == 0 => self.apple_target(),
            AppleRespawn::Batch => 0,
        };
        self.place_apples(qty);
    }

    /// Number of apples that should be on the field when fully stocked
    fn apple_target(&self) -> usize {
        if self.power_up.is(PowerUpKind::MultiApple) {
            self.features.multi_apple_count.get()
        } else {
            1
        }
    }

    fn escalate(&mut self, old_score: u32, new_score: u32) {
        for _ in 0..crossings(old_score, new_score, self.features.obstacle_interval) {
            match self.add_obstacle() {
                Ok(pos) => log::info!("Score {new_score}: added obstacle at {pos:?}"),
                Err(e) => {
                    log::warn!("Skipping obstacle escalation: {e}");
                    break;
                }
            }
        }
        if self.features.power_ups
            && crossings(old_score, new_score, self.features.power_up_interval) > 0
        {
            let kind =
                self.power_up
                    .trigger(&mut self.rng, self.features.shield, self.config.power_up_ticks);
            log::info!("Score {new_score}: {kind} power-up");
            if kind == PowerUpKind::MultiApple {
                let qty = self.apple_target().saturating_sub(self.registry.apples().len());
                self.place_apples(qty);
            }
        }
    }

    fn add_obstacle(&mut self) -> Result<Position, GridFull> {
        let snake = self.registry.snake();
        let bounds = self.registry.bounds();
        let lane = std::iter::successors(Some(snake.head()), |&p| {
            Some(snake.direction().advance(p, bounds))
        })
        .take(consts::FORWARDS_CLEARANCE + 1)
        .collect::<Vec<_>>();
        spawn_obstacle(&mut self.rng, &mut self.registry, &lane)
    }

    fn place_apples(&mut self, qty: usize) {
        if let Err(e) = spawn_apples(&mut self.rng, &mut self.registry, qty) {
            log::warn!("Could not place all apples: {e}");
        }
    }
}

impl<R> Session<R> {
    /// Queue a turn for the next step.  Turning straight back is ignored, as
    /// is any direction outside of play.
    pub(crate) fn on_direction(&mut self, direction: Direction) {
        if self.state == SessionState::Playing
            && direction != self.registry.snake().direction().reverse()
        {
            self.pending = direction;
        }
    }

    pub(crate) fn on_text_append(&mut self, ch: char) {
        if self.state == SessionState::NameEntry {
            self.name.push(ch);
        }
    }

    pub(crate) fn on_backspace(&mut self) {
        if self.state == SessionState::NameEntry {
            self.name.backspace();
        }
    }

    /// Record the score under the typed-in name.  Returns the score's index
    /// in the high score table if it made the cut.
    pub(crate) fn on_confirm_name(&mut self) -> Option<usize> {
        if self.state != SessionState::NameEntry {
            return None;
        }
        let name = self.name.to_entry_name();
        let score = self.scoring.score;
        self.new_entry = self.high_scores.insert(name.clone(), score);
        match self.new_entry {
            Some(i) => log::info!("High score #{} for {name:?}: {score}", i + 1),
            None => log::info!("Score {score} for {name:?} did not make the table"),
        }
        self.name.clear();
        self.state = SessionState::GameOver;
        self.new_entry
    }

    pub(crate) fn state(&self) -> SessionState {
        self.state
    }

    pub(crate) fn features(&self) -> Features {
        self.features
    }

    pub(crate) fn score(&self) -> u32 {
        self.scoring.score
    }

    pub(crate) fn combo(&self) -> u32 {
        self.scoring.combo
    }

    /// One more than the number of obstacle escalations the score has earned
    pub(crate) fn level(&self) -> u32 {
        (self.scoring.score / self.features.obstacle_interval).saturating_add(1)
    }

    pub(crate) fn registry(&self) -> &Registry {
        &self.registry
    }

    pub(crate) fn snake(&self) -> &Snake {
        self.registry.snake()
    }

    pub(crate) fn power_up(&self) -> PowerUpState {
        self.power_up
    }

    pub(crate) fn last_outcome(&self) -> Outcome {
        self.last_outcome
    }

    /// Time left before play starts
    pub(crate) fn countdown(&self) -> Duration {
        self.countdown
    }

    pub(crate) fn name(&self) -> &str {
        self.name.as_str()
    }

    pub(crate) fn high_scores(&self) -> &HighScoreTable {
        &self.high_scores
    }

    pub(crate) fn new_entry(&self) -> Option<usize> {
        self.new_entry
    }

    /// The current time between two steps of the snake
    pub(crate) fn move_interval(&self) -> Duration {
        if self.power_up.is(PowerUpKind::SlowDown) {
            self.config.slow_down_interval
        } else {
            self.config.move_interval
        }
    }

    /// How far along the current step is, from 0 (just moved) to 1 (about to
    /// move)
    pub(crate) fn interpolation(&self) -> f64 {
        match self.state {
            SessionState::Countdown => 0.0,
            SessionState::Playing => {
                let interval = self.move_interval();
                if interval.is_zero() {
                    1.0
                } else {
                    (self.since_last_move.as_secs_f64() / interval.as_secs_f64()).clamp(0.0, 1.0)
                }
            }
            SessionState::NameEntry | SessionState::GameOver => 1.0,
        }
    }
}

#[cfg(test)]
impl<R> Session<R> {
    /// Put an obstacle right in front of the snake's head
    pub(crate) fn block_ahead(&mut self) {
        let cell = self
            .pending
            .advance(self.registry.snake().head(), self.registry.bounds());
        self.registry.apples.remove(&cell);
        self.registry.obstacles.insert(cell);
    }

    /// Hand the player a Shield power-up
    pub(crate) fn grant_shield(&mut self) {
        self.power_up.start(PowerUpKind::Shield, self.config.power_up_ticks);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rand::SeedableRng;
    use rand_chacha::ChaCha12Rng;
    use std::collections::HashSet;
    use std::num::NonZeroU32;

    const RNG_SEED: u64 = 0x0123456789ABCDEF;

    fn config() -> GameConfig {
        GameConfig {
            initial_obstacles: 0,
            ..GameConfig::default()
        }
    }

    fn features() -> Features {
        Features {
            power_ups: false,
            ..Features::default()
        }
    }

    fn session_with(config: GameConfig, features: Features) -> Session<ChaCha12Rng> {
        Session::new(
            config,
            features,
            HighScoreTable::default(),
            ChaCha12Rng::seed_from_u64(RNG_SEED),
        )
    }

    fn session() -> Session<ChaCha12Rng> {
        session_with(config(), features())
    }

    fn playing() -> Session<ChaCha12Rng> {
        let mut s = session();
        s.update(consts::COUNTDOWN);
        assert_eq!(s.state(), SessionState::Playing);
        s
    }

    fn ahead(s: &Session<ChaCha12Rng>) -> Position {
        let snake = s.snake();
        s.pending.advance(snake.head(), s.registry.bounds())
    }

    /// Put the only apple right in front of the snake and take a step
    fn feed(s: &mut Session<ChaCha12Rng>) {
        let cell = ahead(s);
        s.registry.apples = HashSet::from([cell]);
        s.registry.obstacles.remove(&cell);
        s.advance();
        assert_eq!(s.last_outcome(), Outcome::AteApple);
    }

    /// Take a step with no apple in the way
    fn starve(s: &mut Session<ChaCha12Rng>) {
        let cell = ahead(s);
        s.registry.apples.remove(&cell);
        s.advance();
        assert_eq!(s.last_outcome(), Outcome::Continue);
    }

    #[test]
    fn new_session() {
        let s = session_with(GameConfig::default(), features());
        assert_eq!(s.state(), SessionState::Countdown);
        assert_eq!(s.countdown(), Duration::from_secs(3));
        assert_eq!(s.score(), 0);
        assert_eq!(s.snake().len(), 4);
        assert_eq!(s.snake().head(), Position::new(20, 10));
        assert_eq!(s.snake().direction(), Direction::East);
        assert_eq!(s.registry().apples().len(), 1);
        assert_eq!(s.registry().obstacles().len(), 5);
        for pos in (21..=27).map(|x| Position::new(x, 10)) {
            assert!(!s.registry().obstacles().contains(&pos));
        }
        let mut cells = s.registry().obstacles().clone();
        cells.extend(s.registry().apples());
        cells.extend(s.snake().segments());
        assert_eq!(cells.len(), 10, "entities should not overlap");
    }

    #[test]
    fn countdown_then_first_step() {
        let mut s = session();
        s.registry.apples = HashSet::from([Position::new(0, 0)]);
        s.update(Duration::from_secs(1));
        s.update(Duration::from_millis(1999));
        assert_eq!(s.state(), SessionState::Countdown);
        assert_eq!(s.countdown(), Duration::from_millis(1));
        assert_eq!(s.snake().head(), Position::new(20, 10));
        s.update(Duration::from_millis(1));
        assert_eq!(s.state(), SessionState::Playing);
        assert_eq!(s.snake().head(), Position::new(20, 10));
        let tail = s.snake().segments()[3];
        s.update(s.move_interval());
        assert_eq!(s.snake().head(), Position::new(21, 10));
        assert_eq!(s.snake().len(), 4);
        assert!(!s.snake().occupies(tail));
        assert_eq!(s.snake().previous()[3], tail);
    }

    #[test]
    fn waits_for_move_interval() {
        let mut s = playing();
        s.registry.apples = HashSet::from([Position::new(0, 0)]);
        let head = s.snake().head();
        s.update(s.move_interval() / 2);
        assert_eq!(s.snake().head(), head);
        assert!((s.interpolation() - 0.5).abs() < 1e-9);
        s.update(s.move_interval() / 2);
        assert_ne!(s.snake().head(), head);
        assert!(s.interpolation() < 1e-9);
    }

    #[test]
    fn stalled_frame_moves_once() {
        let mut s = playing();
        s.registry.apples = HashSet::from([Position::new(0, 0)]);
        s.update(s.move_interval() * 10);
        assert_eq!(s.snake().head(), Position::new(21, 10));
        assert_eq!(s.since_last_move, Duration::ZERO);
    }

    #[test]
    fn directions_ignored_during_countdown() {
        let mut s = session();
        s.on_direction(Direction::North);
        assert_eq!(s.pending, Direction::East);
    }

    #[test]
    fn turn_and_reverse() {
        let mut s = playing();
        s.registry.apples = HashSet::from([Position::new(0, 0)]);
        s.on_direction(Direction::West);
        assert_eq!(s.pending, Direction::East);
        s.on_direction(Direction::North);
        s.on_direction(Direction::West);
        assert_eq!(s.pending, Direction::North);
        s.update(s.move_interval());
        assert_eq!(s.snake().head(), Position::new(20, 9));
    }

    #[test]
    fn special_skips_countdown() {
        let mut s = session();
        assert!(s.on_activate_special());
        assert_eq!(s.state(), SessionState::Playing);
        assert!(!s.on_activate_special());
    }

    #[test]
    fn eating_grows_and_scores() {
        let mut s = playing();
        feed(&mut s);
        assert_eq!(s.score(), 1);
        assert_eq!(s.snake().len(), 5);
        assert_eq!(s.registry().apples().len(), 1);
        assert!(!s.registry().apples().contains(&s.snake().head()));
    }

    #[test]
    fn obstacle_every_fifth_point() {
        let mut s = playing();
        for _ in 0..4 {
            feed(&mut s);
        }
        assert_eq!(s.score(), 4);
        assert_eq!(s.registry().obstacles().len(), 0);
        feed(&mut s);
        assert_eq!(s.score(), 5);
        assert_eq!(s.registry().obstacles().len(), 1);
        for _ in 0..5 {
            feed(&mut s);
        }
        assert_eq!(s.registry().obstacles().len(), 2);
        assert_eq!(s.snake().len(), 14);
    }

    #[test]
    fn obstacle_interval_is_configurable() {
        let mut s = session_with(
            config(),
            Features {
                obstacle_interval: NonZeroU32::new(15).unwrap(),
                ..features()
            },
        );
        s.update(consts::COUNTDOWN);
        for _ in 0..14 {
            feed(&mut s);
        }
        assert_eq!(s.registry().obstacles().len(), 0);
        feed(&mut s);
        assert_eq!(s.registry().obstacles().len(), 1);
    }

    #[test]
    fn combo_scoring() {
        let mut s = session_with(
            config(),
            Features {
                combo: true,
                ..features()
            },
        );
        s.update(consts::COUNTDOWN);
        feed(&mut s);
        feed(&mut s);
        feed(&mut s);
        assert_eq!(s.score(), 6);
        assert_eq!(s.combo(), 3);
        // Crossing 5 on the way to 6 still adds an obstacle
        assert_eq!(s.registry().obstacles().len(), 1);
        starve(&mut s);
        assert_eq!(s.combo(), 0);
        feed(&mut s);
        assert_eq!(s.score(), 7);
    }

    #[test]
    fn self_collision_ends_game() {
        let mut s = playing();
        s.registry.apples = HashSet::from([Position::new(0, 0)]);
        s.registry.snake.segments = vec![
            Position::new(5, 6),
            Position::new(6, 6),
            Position::new(6, 5),
            Position::new(5, 5),
            Position::new(4, 5),
        ];
        s.registry.snake.previous = s.registry.snake.segments.clone();
        s.registry.snake.direction = Direction::West;
        s.pending = Direction::West;
        s.on_direction(Direction::North);
        s.update(s.move_interval());
        assert_eq!(s.last_outcome(), Outcome::SelfCollision);
        assert_eq!(s.state(), SessionState::NameEntry);
    }

    #[test]
    fn entering_vacated_tail_cell_is_safe() {
        let mut s = playing();
        s.registry.apples = HashSet::from([Position::new(0, 0)]);
        s.registry.snake.segments = vec![
            Position::new(5, 6),
            Position::new(6, 6),
            Position::new(6, 5),
            Position::new(5, 5),
        ];
        s.registry.snake.previous = s.registry.snake.segments.clone();
        s.registry.snake.direction = Direction::West;
        s.pending = Direction::North;
        s.update(s.move_interval());
        assert_eq!(s.last_outcome(), Outcome::Continue);
        assert_eq!(s.state(), SessionState::Playing);
    }

    #[test]
    fn tiny_wrapping_grid_collision() {
        let mut s = playing();
        let bounds = Bounds::new(2, 2);
        let mut snake = Snake::new(Position::new(1, 0), Direction::East, 1, bounds);
        snake.segments = vec![
            Position::new(1, 0),
            Position::new(0, 0),
            Position::new(0, 1),
            Position::new(1, 1),
        ];
        snake.previous = snake.segments.clone();
        s.registry = Registry::new(bounds, snake);
        s.update(s.move_interval());
        assert_eq!(s.snake().head(), Position::new(0, 0));
        assert_eq!(s.state(), SessionState::NameEntry);
    }

    #[test]
    fn obstacle_collision_ends_game() {
        let mut s = playing();
        s.registry.apples = HashSet::from([Position::new(0, 0)]);
        let cell = ahead(&s);
        s.registry.obstacles.insert(cell);
        s.update(s.move_interval());
        assert_eq!(s.last_outcome(), Outcome::ObstacleCollision);
        assert_eq!(s.state(), SessionState::NameEntry);
        let head = s.snake().head();
        s.update(s.move_interval());
        assert_eq!(s.snake().head(), head, "nothing moves after a crash");
    }

    #[test]
    fn raised_shield_absorbs_one_collision() {
        let mut s = playing();
        s.registry.apples = HashSet::from([Position::new(0, 0)]);
        s.power_up.start(PowerUpKind::Shield, 10);
        assert!(s.on_activate_special());
        assert!(s.power_up().shield_active());
        let cell = ahead(&s);
        s.registry.obstacles.insert(cell);
        s.advance();
        assert_eq!(s.last_outcome(), Outcome::ObstacleCollision);
        assert_eq!(s.state(), SessionState::Playing);
        assert!(!s.power_up().shield_active());
        let cell = ahead(&s);
        s.registry.obstacles.insert(cell);
        s.advance();
        assert_eq!(s.state(), SessionState::NameEntry);
    }

    #[test]
    fn held_shield_does_not_protect() {
        let mut s = playing();
        s.registry.apples = HashSet::from([Position::new(0, 0)]);
        s.power_up.start(PowerUpKind::Shield, 10);
        let cell = ahead(&s);
        s.registry.obstacles.insert(cell);
        s.advance();
        assert_eq!(s.state(), SessionState::NameEntry);
    }

    #[test]
    fn special_during_play_needs_held_shield() {
        let mut s = playing();
        assert!(!s.on_activate_special());
        s.power_up.start(PowerUpKind::SlowDown, 10);
        assert!(!s.on_activate_special());
        s.power_up.start(PowerUpKind::Shield, 10);
        assert!(s.on_activate_special());
        assert!(!s.on_activate_special(), "the shield is already spent");
        assert_eq!(s.state(), SessionState::Playing);
    }

    #[test]
    fn shield_window_lasts_configured_steps() {
        let mut s = session_with(
            GameConfig {
                shield_ticks: 3,
                ..config()
            },
            features(),
        );
        s.update(consts::COUNTDOWN);
        s.registry.apples = HashSet::from([Position::new(0, 0)]);
        s.power_up.start(PowerUpKind::Shield, 10);
        assert!(s.on_activate_special());
        starve(&mut s);
        starve(&mut s);
        assert!(s.power_up().shield_active());
        // The third step is still covered
        s.registry.obstacles.insert(ahead(&s));
        s.advance();
        assert_eq!(s.state(), SessionState::Playing);
        assert!(!s.power_up().shield_active());
    }

    #[test]
    fn shield_window_expires_unused() {
        let mut s = session_with(
            GameConfig {
                shield_ticks: 2,
                ..config()
            },
            features(),
        );
        s.update(consts::COUNTDOWN);
        s.registry.apples = HashSet::from([Position::new(0, 0)]);
        s.power_up.start(PowerUpKind::Shield, 10);
        assert!(s.on_activate_special());
        starve(&mut s);
        starve(&mut s);
        assert!(!s.power_up().shield_active());
        s.registry.obstacles.insert(ahead(&s));
        s.advance();
        assert_eq!(s.state(), SessionState::NameEntry);
    }

    #[test]
    fn held_shield_can_be_raised_on_last_power_up_step() {
        let mut s = playing();
        s.registry.apples = HashSet::from([Position::new(0, 0)]);
        s.power_up.start(PowerUpKind::Shield, 2);
        starve(&mut s);
        assert!(s.power_up().shield_held);
        assert!(s.on_activate_special());
        starve(&mut s);
        assert_eq!(s.power_up().kind, PowerUpKind::None);
        assert!(s.power_up().shield_active());
    }

    #[test]
    fn unraised_shield_lapses_with_power_up() {
        let mut s = playing();
        s.registry.apples = HashSet::from([Position::new(0, 0)]);
        s.power_up.start(PowerUpKind::Shield, 2);
        starve(&mut s);
        starve(&mut s);
        assert!(!s.power_up().shield_held);
        assert!(!s.on_activate_special());
    }

    #[test]
    fn power_up_every_tenth_point() {
        let mut s = session_with(
            config(),
            Features {
                power_ups: true,
                ..features()
            },
        );
        s.update(consts::COUNTDOWN);
        for _ in 0..9 {
            feed(&mut s);
        }
        assert_eq!(s.power_up().kind, PowerUpKind::None);
        feed(&mut s);
        assert_ne!(s.power_up().kind, PowerUpKind::None);
        assert_eq!(s.power_up().remaining_ticks, consts::POWER_UP_TICKS);
    }

    #[test]
    fn triggered_power_up_keeps_full_duration() {
        let mut s = session_with(
            config(),
            Features {
                power_ups: true,
                ..features()
            },
        );
        s.update(consts::COUNTDOWN);
        s.scoring.score = 9;
        s.power_up.start(PowerUpKind::SlowDown, 1);
        feed(&mut s);
        assert_ne!(s.power_up().kind, PowerUpKind::None);
        assert_eq!(s.power_up().remaining_ticks, consts::POWER_UP_TICKS);
    }

    #[test]
    fn level_follows_obstacle_interval() {
        let mut s = playing();
        assert_eq!(s.level(), 1);
        for _ in 0..4 {
            feed(&mut s);
        }
        assert_eq!(s.level(), 1);
        feed(&mut s);
        assert_eq!(s.level(), 2);
        s.scoring.score = 23;
        assert_eq!(s.level(), 5);
    }

    #[test]
    fn slow_down_changes_interval_until_expiry() {
        let mut s = playing();
        s.registry.apples = HashSet::from([Position::new(0, 0)]);
        s.power_up.start(PowerUpKind::SlowDown, 2);
        assert_eq!(s.move_interval(), consts::SLOW_DOWN_INTERVAL);
        let head = s.snake().head();
        s.update(consts::SLOW_DOWN_INTERVAL);
        assert_ne!(s.snake().head(), head);
        s.update(consts::SLOW_DOWN_INTERVAL);
        assert_eq!(s.power_up().kind, PowerUpKind::None);
        assert_eq!(s.move_interval(), consts::MOVE_INTERVAL);
    }

    #[test]
    fn multi_apple_tops_up_field() {
        let mut s = playing();
        s.power_up.start(PowerUpKind::MultiApple, 5);
        feed(&mut s);
        assert_eq!(s.registry().apples().len(), 3);
        s.power_up = PowerUpState::default();
        feed(&mut s);
        assert_eq!(s.registry().apples().len(), 1);
    }

    #[test]
    fn multi_apple_trigger_spawns_extra_apples() {
        let features = Features {
            power_ups: true,
            shield: false,
            ..features()
        };
        let mut seen = false;
        for seed in 0..32 {
            let mut s = Session::new(
                config(),
                features,
                HighScoreTable::default(),
                ChaCha12Rng::seed_from_u64(seed),
            );
            s.update(consts::COUNTDOWN);
            s.scoring.score = 9;
            feed(&mut s);
            assert_ne!(s.power_up().kind, PowerUpKind::Shield);
            if s.power_up().is(PowerUpKind::MultiApple) {
                assert_eq!(s.registry().apples().len(), 3);
                seen = true;
            } else {
                assert_eq!(s.registry().apples().len(), 1);
            }
        }
        assert!(seen);
    }

    #[test]
    fn batch_respawn_waits_for_empty_field() {
        let mut s = session_with(
            config(),
            Features {
                apple_respawn: AppleRespawn::Batch,
                ..features()
            },
        );
        s.update(consts::COUNTDOWN);
        let far = Position::new(0, 0);
        let cell = ahead(&s);
        s.registry.apples = HashSet::from([cell, far]);
        s.advance();
        assert_eq!(s.last_outcome(), Outcome::AteApple);
        assert_eq!(s.registry().apples().iter().copied().collect::<Vec<_>>(), [far]);
        feed(&mut s);
        assert_eq!(s.registry().apples().len(), 1);
    }

    #[test]
    fn name_entry_and_high_score() {
        let mut s = playing();
        s.scoring.score = 12;
        s.registry.obstacles.insert(ahead(&s));
        s.update(s.move_interval());
        assert_eq!(s.state(), SessionState::NameEntry);
        assert!(!s.on_restart());
        for ch in "Kay!".chars() {
            s.on_text_append(ch);
        }
        s.on_backspace();
        assert_eq!(s.name(), "Kay");
        assert_eq!(s.on_confirm_name(), Some(0));
        assert_eq!(s.state(), SessionState::GameOver);
        assert_eq!(s.high_scores().entries()[0].name, "Kay");
        assert_eq!(s.high_scores().entries()[0].score, 12);
        assert_eq!(s.new_entry(), Some(0));
        assert_eq!(s.name(), "");
        assert_eq!(s.on_confirm_name(), None);
    }

    #[test]
    fn restart_resets_everything() {
        let mut s = session_with(GameConfig::default(), features());
        s.update(consts::COUNTDOWN);
        for _ in 0..6 {
            feed(&mut s);
        }
        s.registry.obstacles.insert(ahead(&s));
        s.advance();
        s.on_text_append('Q');
        s.on_confirm_name();
        assert!(s.on_restart());
        assert_eq!(s.state(), SessionState::Countdown);
        assert_eq!(s.score(), 0);
        assert_eq!(s.snake().len(), 4);
        assert_eq!(s.snake().head(), Position::new(20, 10));
        assert_eq!(s.registry().obstacles().len(), 5);
        assert_eq!(s.registry().apples().len(), 1);
        assert_eq!(s.power_up(), PowerUpState::default());
        assert_eq!(s.new_entry(), None);
        assert_eq!(s.high_scores().entries().len(), 1);
    }

    #[test]
    fn events_in_wrong_state_are_ignored() {
        let mut s = playing();
        s.on_text_append('x');
        s.on_backspace();
        assert_eq!(s.name(), "");
        assert_eq!(s.on_confirm_name(), None);
        assert!(!s.on_restart());
        assert_eq!(s.state(), SessionState::Playing);
    }

    #[test]
    fn length_never_decreases() {
        let mut s = session_with(
            GameConfig::default(),
            Features {
                combo: true,
                power_ups: true,
                ..Features::default()
            },
        );
        s.update(consts::COUNTDOWN);
        let turns = [
            Direction::North,
            Direction::West,
            Direction::South,
            Direction::East,
        ];
        let mut len = s.snake().len();
        for i in 0..2000 {
            if i % 7 == 0 {
                s.on_direction(turns[(i / 7) % 4]);
            }
            s.update(consts::FRAME_PERIOD * 4);
            assert!(s.snake().len() >= len);
            len = s.snake().len();
            let head = s.snake().head();
            assert!(s.registry().bounds().contains(head));
            if s.state() != SessionState::Playing {
                break;
            }
        }
    }
}
