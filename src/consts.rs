//! Assorted constants & hard-coded configuration
use ratatui::{
    layout::Size,
    style::{Color, Modifier, Style},
};
use std::num::{NonZeroU32, NonZeroUsize};
use std::time::Duration;

/// Time between two redraws of the screen
pub(crate) const FRAME_PERIOD: Duration = Duration::from_millis(16);

/// Default time between movements of the snake
pub(crate) const MOVE_INTERVAL: Duration = Duration::from_millis(120);

/// Default time between movements of the snake while a Slow Down power-up is
/// in effect
pub(crate) const SLOW_DOWN_INTERVAL: Duration = Duration::from_millis(80);

/// Default length of the "get ready" phase
pub(crate) const COUNTDOWN: Duration = Duration::from_secs(3);

/// Default number of steps a power-up lasts
pub(crate) const POWER_UP_TICKS: u32 = 40;

/// Default number of steps a raised shield stays up
pub(crate) const SHIELD_TICKS: u32 = 25;

/// Draw everything inside a rectangle of this size in the center of the
/// terminal window.
///
/// Cf. [`crate::util::get_display_area()`]
pub(crate) const DISPLAY_SIZE: Size = Size {
    width: 80,
    height: 24,
};

/// Default size of the playfield, in cells
pub(crate) const GRID_SIZE: Size = Size {
    width: 40,
    height: 20,
};

/// Default snake length at the start of a session
pub(crate) const INITIAL_SNAKE_LENGTH: usize = 4;

/// Default number of obstacles at the start of a session
pub(crate) const INITIAL_OBSTACLES: usize = 5;

/// Default number of apples on the field during a Multi-Apple power-up
pub(crate) const MULTI_APPLE_COUNT: NonZeroUsize = match NonZeroUsize::new(3) {
    Some(n) => n,
    None => panic!("MULTI_APPLE_COUNT should be nonzero"),
};

/// Default number of points between two added obstacles
pub(crate) const OBSTACLE_INTERVAL: NonZeroU32 = match NonZeroU32::new(5) {
    Some(n) => n,
    None => panic!("OBSTACLE_INTERVAL should be nonzero"),
};

/// Default number of points between two power-ups
pub(crate) const POWER_UP_INTERVAL: NonZeroU32 = match NonZeroU32::new(10) {
    Some(n) => n,
    None => panic!("POWER_UP_INTERVAL should be nonzero"),
};

/// When placing obstacles, keep this many cells in front of the snake's head
/// clear
pub(crate) const FORWARDS_CLEARANCE: usize = 7;

/// Maximum number of entries in the high score table
pub(crate) const MAX_HIGH_SCORES: usize = 10;

/// Maximum display width of a name in the high score table
pub(crate) const NAME_MAX_WIDTH: usize = 16;

/// Name recorded for a high score when none was entered
pub(crate) const ANONYMOUS: &str = "Anonymous";

/// Glyph for the snake's head when it is moving north/up
pub(crate) const SNAKE_HEAD_NORTH_SYMBOL: char = 'v';

/// Glyph for the snake's head when it is moving south/down
pub(crate) const SNAKE_HEAD_SOUTH_SYMBOL: char = '^';

/// Glyph for the snake's head when it is moving east/right
pub(crate) const SNAKE_HEAD_EAST_SYMBOL: char = '<';

/// Glyph for the snake's head when it is moving west/left
pub(crate) const SNAKE_HEAD_WEST_SYMBOL: char = '>';

/// Glyph for the parts of the snake's body
pub(crate) const SNAKE_BODY_SYMBOL: char = '⚬';

/// Glyph for the cell the snake's tail has just left, shown during the first
/// half of a move interval
pub(crate) const TRAIL_SYMBOL: char = '·';

/// Glyph for apples
pub(crate) const APPLE_SYMBOL: char = '●';

/// Glyph for obstacles
pub(crate) const OBSTACLE_SYMBOL: char = '█';

/// Glyph for the snake's head when it's collided with an obstacle or itself
pub(crate) const COLLISION_SYMBOL: char = '×';

/// Style for the snake's head and body
pub(crate) const SNAKE_STYLE: Style = Style::new().fg(Color::Green).add_modifier(Modifier::BOLD);

/// Style for the snake's head and body while a shield is up
pub(crate) const SHIELDED_SNAKE_STYLE: Style =
    Style::new().fg(Color::Cyan).add_modifier(Modifier::BOLD);

/// Style for [`TRAIL_SYMBOL`]
pub(crate) const TRAIL_STYLE: Style = Style::new().fg(Color::Green).add_modifier(Modifier::DIM);

/// Style for apples
pub(crate) const APPLE_STYLE: Style = Style::new().fg(Color::LightRed);

/// Style for obstacles
pub(crate) const OBSTACLE_STYLE: Style = Style::new().fg(Color::Gray);

/// Style for [`COLLISION_SYMBOL`]
pub(crate) const COLLISION_STYLE: Style = Style::new()
    .fg(Color::LightRed)
    .add_modifier(Modifier::REVERSED);

/// Style for key codes shown in the interface
pub(crate) const KEY_STYLE: Style = Style::new().fg(Color::Yellow);

/// Style for the score bar at the top of the game screen
pub(crate) const SCORE_BAR_STYLE: Style = Style::new().add_modifier(Modifier::REVERSED);

/// Style for the entry of the current session in the high score table
pub(crate) const NEW_HIGH_SCORE_STYLE: Style = Style::new().add_modifier(Modifier::UNDERLINED);
