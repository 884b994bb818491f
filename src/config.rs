use crate::consts;
use crate::highscores::FileStore;
use serde::Deserialize;
use std::borrow::Cow;
use std::num::{NonZeroU32, NonZeroUsize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Program configuration read from a configuration file
#[derive(Clone, Deserialize, Debug, Default, Eq, PartialEq)]
pub(crate) struct Config {
    /// Playfield & timing settings
    #[serde(default)]
    pub(crate) game: GameConfig,

    /// Which optional rules are in effect
    #[serde(default)]
    pub(crate) features: Features,

    /// Settings about data files
    #[serde(default)]
    pub(crate) files: FileConfig,
}

impl Config {
    /// Return the default configuration file path
    pub(crate) fn default_path() -> Result<PathBuf, ConfigError> {
        dirs::config_local_dir()
            .map(|p| p.join("gridsnake").join("config.toml"))
            .ok_or(ConfigError::NoPath)
    }

    /// Read configuration from a file on disk.  If the file does not exist and
    /// `allow_missing` is true, a default `Config` value is returned.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the file could not be read or if the file's contents
    /// could not be deserialized.
    pub(crate) fn load(path: &Path, allow_missing: bool) -> Result<Config, ConfigError> {
        let content = match fs_err::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound && allow_missing => {
                return Ok(Config::default())
            }
            Err(e) => return Err(ConfigError::Read(e)),
        };
        toml::from_str(&content).map_err(Into::into)
    }

    /// Return the high score store to use, or `None` if high scores should
    /// not be kept on disk
    pub(crate) fn high_score_store(&self) -> Option<FileStore> {
        self.files
            .save_high_scores
            .then(|| FileStore::new(self.files.high_scores_file().map(Cow::into_owned)))
    }
}

#[derive(Clone, Copy, Deserialize, Debug, Eq, PartialEq)]
#[serde(try_from = "RawGameConfig")]
pub(crate) struct GameConfig {
    /// Width of the playfield in cells
    pub(crate) width: u16,

    /// Height of the playfield in cells
    pub(crate) height: u16,

    /// Number of snake segments at the start of a session
    pub(crate) initial_length: usize,

    /// Number of obstacles placed at the start of a session
    pub(crate) initial_obstacles: usize,

    /// Time between two steps of the snake
    pub(crate) move_interval: Duration,

    /// Time between two steps while a Slow Down power-up is running
    pub(crate) slow_down_interval: Duration,

    /// Length of the "get ready" phase before play starts
    pub(crate) countdown: Duration,

    /// How many steps a power-up lasts
    pub(crate) power_up_ticks: u32,

    /// How many steps a raised shield stays up
    pub(crate) shield_ticks: u32,
}

impl Default for GameConfig {
    fn default() -> GameConfig {
        GameConfig {
            width: consts::GRID_SIZE.width,
            height: consts::GRID_SIZE.height,
            initial_length: consts::INITIAL_SNAKE_LENGTH,
            initial_obstacles: consts::INITIAL_OBSTACLES,
            move_interval: consts::MOVE_INTERVAL,
            slow_down_interval: consts::SLOW_DOWN_INTERVAL,
            countdown: consts::COUNTDOWN,
            power_up_ticks: consts::POWER_UP_TICKS,
            shield_ticks: consts::SHIELD_TICKS,
        }
    }
}

#[derive(Clone, Deserialize, Debug, Eq, PartialEq)]
#[serde(default, rename_all = "kebab-case")]
struct RawGameConfig {
    width: u16,
    height: u16,
    initial_length: usize,
    initial_obstacles: usize,
    move_interval_ms: u64,
    slow_down_interval_ms: u64,
    countdown_secs: u64,
    power_up_ticks: u32,
    shield_ticks: u32,
}

impl Default for RawGameConfig {
    fn default() -> RawGameConfig {
        let game = GameConfig::default();
        RawGameConfig {
            width: game.width,
            height: game.height,
            initial_length: game.initial_length,
            initial_obstacles: game.initial_obstacles,
            move_interval_ms: duration_millis(game.move_interval),
            slow_down_interval_ms: duration_millis(game.slow_down_interval),
            countdown_secs: game.countdown.as_secs(),
            power_up_ticks: game.power_up_ticks,
            shield_ticks: game.shield_ticks,
        }
    }
}

impl TryFrom<RawGameConfig> for GameConfig {
    type Error = InvalidSetting;

    fn try_from(value: RawGameConfig) -> Result<GameConfig, InvalidSetting> {
        if value.width < 2 || value.height < 2 {
            return Err(InvalidSetting::GridTooSmall);
        }
        if value.initial_length == 0 || value.initial_length > usize::from(value.width) {
            return Err(InvalidSetting::SnakeLength(value.initial_length));
        }
        if value.move_interval_ms == 0 || value.slow_down_interval_ms == 0 {
            return Err(InvalidSetting::ZeroInterval);
        }
        Ok(GameConfig {
            width: value.width,
            height: value.height,
            initial_length: value.initial_length,
            initial_obstacles: value.initial_obstacles,
            move_interval: Duration::from_millis(value.move_interval_ms),
            slow_down_interval: Duration::from_millis(value.slow_down_interval_ms),
            countdown: Duration::from_secs(value.countdown_secs),
            power_up_ticks: value.power_up_ticks,
            shield_ticks: value.shield_ticks,
        })
    }
}

fn duration_millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

#[derive(Clone, Copy, Debug, Eq, Error, PartialEq)]
pub(crate) enum InvalidSetting {
    #[error("grid must be at least 2 cells wide and 2 cells high")]
    GridTooSmall,
    #[error("initial snake length {0} must be between 1 and the grid width")]
    SnakeLength(usize),
    #[error("move intervals must be nonzero")]
    ZeroInterval,
}

/// Optional rules, covering the differences between the classic game and its
/// power-up variants
#[derive(Clone, Copy, Deserialize, Debug, Eq, PartialEq)]
#[serde(default, rename_all = "kebab-case")]
pub(crate) struct Features {
    /// Award increasing points for apples eaten on consecutive steps
    pub(crate) combo: bool,

    /// Trigger a random power-up every `power_up_interval` points
    pub(crate) power_ups: bool,

    /// Include the Shield among the possible power-ups
    pub(crate) shield: bool,

    /// Total number of apples on the field right after a Multi-Apple
    /// power-up starts
    pub(crate) multi_apple_count: NonZeroUsize,

    /// Add an obstacle every this many points
    pub(crate) obstacle_interval: NonZeroU32,

    /// Trigger a power-up every this many points
    pub(crate) power_up_interval: NonZeroU32,

    /// When to replace eaten apples
    pub(crate) apple_respawn: AppleRespawn,
}

impl Default for Features {
    fn default() -> Features {
        Features {
            combo: false,
            power_ups: true,
            shield: true,
            multi_apple_count: consts::MULTI_APPLE_COUNT,
            obstacle_interval: consts::OBSTACLE_INTERVAL,
            power_up_interval: consts::POWER_UP_INTERVAL,
            apple_respawn: AppleRespawn::default(),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub(crate) enum AppleRespawn {
    /// Each eaten apple is replaced at once
    #[default]
    Immediate,

    /// Apples are only replaced, as a batch, once all of them have been eaten
    Batch,
}

#[derive(Clone, Deserialize, Debug, Eq, PartialEq)]
#[serde(try_from = "RawFileConfig")]
pub(crate) struct FileConfig {
    /// Path at which high scores should be stored
    high_scores_file: Option<PathBuf>,

    /// Whether to load & save high scores in a file
    save_high_scores: bool,
}

impl FileConfig {
    /// Return the filepath at which high scores should be stored: the file
    /// given in the configuration or, if that is not set, the default high
    /// scores file path.  Return `None` if no path is present in the
    /// configuration and the default path could not be computed.
    fn high_scores_file(&self) -> Option<Cow<'_, Path>> {
        self.high_scores_file
            .as_deref()
            .map(Cow::from)
            .or_else(|| FileStore::default_path().map(Cow::from))
    }
}

impl Default for FileConfig {
    fn default() -> FileConfig {
        FileConfig {
            high_scores_file: None,
            save_high_scores: true,
        }
    }
}

#[derive(Clone, Deserialize, Debug, Eq, PartialEq)]
#[serde(default, rename_all = "kebab-case")]
struct RawFileConfig {
    high_scores_file: Option<String>,
    save_high_scores: bool,
}

impl Default for RawFileConfig {
    fn default() -> RawFileConfig {
        RawFileConfig {
            high_scores_file: None,
            save_high_scores: true,
        }
    }
}

impl TryFrom<RawFileConfig> for FileConfig {
    type Error = std::io::Error;

    fn try_from(value: RawFileConfig) -> Result<FileConfig, std::io::Error> {
        Ok(FileConfig {
            high_scores_file: value
                .high_scores_file
                .map(expanduser::expanduser)
                .transpose()?,
            save_high_scores: value.save_high_scores,
        })
    }
}

#[derive(Debug, Error)]
pub(crate) enum ConfigError {
    #[error("failed to determine path to local configuration directory")]
    NoPath,
    #[error("failed to read configuration file")]
    Read(#[from] std::io::Error),
    #[error("failed to parse configuration file")]
    Parse(#[from] toml::de::Error),
}
