pub mod patterns;
pub mod run;

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use ignite_common::config::{
    AppSpec, ColorMode, Config, DEFAULT_APP_PATH, DEFAULT_LOG_DIRECTIVE, DEFAULT_SHUTDOWN_GRACE,
    LogSettings,
};
use ignite_common::pattern::TimestampPattern;
use ignite_common::worker::WorkerCount;

#[derive(Parser)]
#[command(name = "ignite")]
#[command(about = "Starts an application with timestamped console output.")]
#[command(version, args_conflicts_with_subcommands = true)]
pub struct CommandLine {
    #[command(subcommand)]
    pub command: Option<Commands>,

    #[command(flatten)]
    pub run: RunArgs,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the application (default when no command is given)
    #[command(alias = "r")]
    Run(RunArgs),
    /// List the named timestamp patterns with a sample of each
    #[command(alias = "p")]
    Patterns,
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Application program to start
    #[arg(long, default_value = DEFAULT_APP_PATH)]
    pub app: PathBuf,

    /// Timestamp pattern: a named pattern or a strftime string ("UTC:" prefix for UTC)
    #[arg(long, default_value_t = TimestampPattern::default())]
    pub pattern: TimestampPattern,

    /// Do not print the level label after the timestamp
    #[arg(long)]
    pub no_label: bool,

    /// Number of worker processes, or "auto" for one per CPU
    #[arg(short, long, default_value_t = WorkerCount::ONE)]
    pub workers: WorkerCount,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = DEFAULT_LOG_DIRECTIVE)]
    pub log_level: String,

    #[arg(long, default_value_t = ColorMode::Auto)]
    pub color: ColorMode,

    /// Seconds the application gets to exit after a shutdown signal before it is killed
    #[arg(long, value_name = "SECONDS", default_value_t = DEFAULT_SHUTDOWN_GRACE.as_secs())]
    pub grace: u64,

    /// Arguments passed to the application
    #[arg(last = true)]
    pub app_args: Vec<String>,
}

impl RunArgs {
    pub fn into_config(self) -> Config {
        Config {
            log: LogSettings {
                pattern: self.pattern,
                label: !self.no_label,
                directive: self.log_level,
                color: self.color,
            },
            app: AppSpec {
                path: self.app,
                args: self.app_args,
            },
            workers: self.workers,
            shutdown_grace: Duration::from_secs(self.grace),
        }
    }
}

impl CommandLine {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// The command to execute; `run` when none was named.
    pub fn into_command(self) -> Commands {
        self.command.unwrap_or(Commands::Run(self.run))
    }
}
