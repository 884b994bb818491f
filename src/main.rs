mod app;
mod command;
mod config;
mod consts;
mod game;
mod highscores;
mod util;
mod warning;
use crate::app::App;
use crate::config::Config;
use crate::game::Game;
use anyhow::Context;
use lexopt::{Arg, Parser};
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

const USAGE: &str = "Usage: gridsnake [-c|--config <FILE>] [--log-file <FILE>]";

const HELP: &str = "\
gridsnake: snake on a wraparound grid, in your terminal

Usage: gridsnake [<options>]

Options:
  -c, --config <FILE>   Read configuration from <FILE>
      --log-file <FILE> Write log messages to <FILE>; verbosity is set with
                        the RUST_LOG environment variable
  -h, --help            Display this help message and exit
  -V, --version         Show the program version and exit

Controls: arrow keys, hjkl, or wasd to steer; Space to start early or to
raise a shield; r to restart; q to quit after a game; Ctrl-C to quit at any
time";

#[derive(Clone, Debug, Eq, PartialEq)]
enum Action {
    Run(Arguments),
    Help,
    Version,
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
struct Arguments {
    config: Option<PathBuf>,
    log_file: Option<PathBuf>,
}

impl Action {
    fn from_parser(mut parser: Parser) -> Result<Action, lexopt::Error> {
        let mut args = Arguments::default();
        while let Some(arg) = parser.next()? {
            match arg {
                Arg::Short('c') | Arg::Long("config") => {
                    args.config = Some(PathBuf::from(parser.value()?));
                }
                Arg::Long("log-file") => args.log_file = Some(PathBuf::from(parser.value()?)),
                Arg::Short('h') | Arg::Long("help") => return Ok(Action::Help),
                Arg::Short('V') | Arg::Long("version") => return Ok(Action::Version),
                _ => return Err(arg.unexpected()),
            }
        }
        Ok(Action::Run(args))
    }
}

fn main() -> ExitCode {
    match Action::from_parser(Parser::from_env()) {
        Ok(Action::Run(args)) => finish(run(args)),
        Ok(Action::Help) => {
            println!("{HELP}");
            ExitCode::SUCCESS
        }
        Ok(Action::Version) => {
            println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("gridsnake: {e}");
            eprintln!("{USAGE}");
            ExitCode::from(2)
        }
    }
}

fn run(args: Arguments) -> anyhow::Result<()> {
    if let Some(ref path) = args.log_file {
        init_logging(path)?;
    }
    log::info!("Starting {} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
    let config = match args.config {
        Some(path) => Config::load(&path, false)
            .with_context(|| format!("failed to load configuration from {}", path.display()))?,
        None => match Config::default_path() {
            Ok(path) => Config::load(&path, true).with_context(|| {
                format!("failed to load configuration from {}", path.display())
            })?,
            Err(e) => {
                log::warn!("{e}; using default configuration");
                Config::default()
            }
        },
    };
    log::debug!("Configuration: {config:?}");
    let game = Game::new(&config, config.high_score_store(), rand::rng());
    let terminal = ratatui::init();
    let r = App::new(game).run(terminal);
    ratatui::restore();
    r.context("terminal I/O failed")
}

/// Send log messages to `path`.  The terminal belongs to the game, so nothing
/// is logged unless a log file is given.
fn init_logging(path: &Path) -> anyhow::Result<()> {
    let file = fs_err::File::create(path).context("failed to open log file")?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .format_timestamp_millis()
        .init();
    Ok(())
}

fn finish(r: anyhow::Result<()>) -> ExitCode {
    match r {
        Ok(()) => ExitCode::SUCCESS,
        Err(e)
            if e.downcast_ref::<io::Error>()
                .is_some_and(|e| e.kind() == ErrorKind::BrokenPipe) =>
        {
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("{e:#}");
            eprintln!("gridsnake: {e:?}");
            ExitCode::from(2)
        }
    }
}
