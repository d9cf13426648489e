use std::{env, fmt::Display, str::FromStr};

use colored::Colorize;
use log::{Level, LevelFilter, SetLoggerError};

/// Environment variable overriding how verbose sara's own crates are
pub const LOG_LEVEL_VAR: &str = "SARA_LOG";

/// External crates are capped here regardless of [LOG_LEVEL_VAR]
const EXTERNAL_LEVEL: LevelFilter = LevelFilter::Warn;
const DEFAULT_LEVEL: LevelFilter = LevelFilter::Info;

/// Reads the level for sara's crates from the environment, falling back to info
pub fn level_from_env() -> LevelFilter {
    env::var(LOG_LEVEL_VAR)
        .ok()
        .and_then(|value| parse_level(&value))
        .unwrap_or(DEFAULT_LEVEL)
}

fn parse_level(value: &str) -> Option<LevelFilter> {
    LevelFilter::from_str(value.trim()).ok()
}

pub fn init_logger(local_level: LevelFilter) -> Result<(), SetLoggerError> {
    fern::Dispatch::new()
        .format(move |out, message, record| {
            let target = Target::from_str(record.target());
            let now = chrono::Local::now();

            out.finish(format_args!(
                "{:^5} {} {:^8} {}",
                level_badge(record.level()),
                now.format("%H:%M:%S").to_string().bright_black(),
                target,
                message
            ))
        })
        .filter(move |meta| Target::from_str(meta.target()).allows(meta.level(), local_level))
        .chain(std::io::stdout())
        .apply()
}

#[derive(Debug, PartialEq)]
enum Target {
    External(String),
    Main,
    Server,
    Care,
    Core,
}

impl Target {
    fn from_str(target: &str) -> Self {
        let module = target.split("::").next().unwrap_or_default();

        match module {
            "sara" => Self::Main,
            "sara_core" => Self::Core,
            "sara_care" => Self::Care,
            "sara_server" => Self::Server,
            other => Self::External(other.to_string()),
        }
    }

    fn allows(&self, level: Level, local_level: LevelFilter) -> bool {
        match self {
            Self::External(_) => level <= EXTERNAL_LEVEL,
            _ => level <= local_level,
        }
    }
}

impl Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let result = match self {
            Target::External(x) => x.as_str().clear(),
            Target::Main => "SARA".bright_cyan(),
            Target::Server => "SERVER".bright_green(),
            Target::Care => "CARE".bright_purple(),
            Target::Core => "CORE".blue(),
        };

        Display::fmt(&result, f)
    }
}

fn level_badge(level: Level) -> String {
    match level {
        Level::Error => " ERR ".black().on_red().bold().to_string(),
        Level::Warn => " WRN ".black().on_yellow().bold().to_string(),
        Level::Info => " INF ".black().on_blue().bold().to_string(),
        Level::Debug => " DBG ".white().on_black().to_string(),
        Level::Trace => " TRC ".to_string(),
    }
}
