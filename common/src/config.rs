use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::pattern::TimestampPattern;
use crate::worker::WorkerCount;

/// Fixed location of the application program, relative to the working directory.
pub const DEFAULT_APP_PATH: &str = "app/app";

pub const DEFAULT_LOG_DIRECTIVE: &str = "info";

pub const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct Config {
    pub log: LogSettings,
    pub app: AppSpec,
    /// Number of sibling worker processes to run.
    ///
    /// Anything above one turns this process into a primary that only supervises.
    pub workers: WorkerCount,
    /// How long the application may take to stop after a shutdown request
    /// before it is killed.
    pub shutdown_grace: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log: LogSettings::default(),
            app: AppSpec::default(),
            workers: WorkerCount::default(),
            shutdown_grace: DEFAULT_SHUTDOWN_GRACE,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LogSettings {
    pub pattern: TimestampPattern,
    /// Prints the level label (e.g. `[INFO]`) after the timestamp.
    pub label: bool,
    /// Filter directive used when `RUST_LOG` is not set.
    pub directive: String,
    pub color: ColorMode,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            pattern: TimestampPattern::default(),
            label: true,
            directive: DEFAULT_LOG_DIRECTIVE.to_string(),
            color: ColorMode::Auto,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppSpec {
    pub path: PathBuf,
    pub args: Vec<String>,
}

impl Default for AppSpec {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_APP_PATH),
            args: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorMode {
    /// Colors when stdout is a terminal and `NO_COLOR` is unset.
    #[default]
    Auto,
    Always,
    Never,
}

impl ColorMode {
    pub fn enabled(&self, is_terminal: bool) -> bool {
        match self {
            ColorMode::Always => true,
            ColorMode::Never => false,
            ColorMode::Auto => is_terminal && std::env::var_os("NO_COLOR").is_none(),
        }
    }
}

impl fmt::Display for ColorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ColorMode::Auto => "auto",
            ColorMode::Always => "always",
            ColorMode::Never => "never",
        })
    }
}

impl FromStr for ColorMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(ColorMode::Auto),
            "always" => Ok(ColorMode::Always),
            "never" => Ok(ColorMode::Never),
            _ => Err(format!("invalid color mode: {s}")),
        }
    }
}
