//! Timestamped console logging.
//!
//! A [`LogContext`] is built once at startup from [`LogSettings`]. It owns the
//! `tracing` dispatcher that stamps every event, and it can stamp raw output
//! through [`StampWriter`]. The same context is installed as the process-wide
//! default and handed to the application, so both paths share one pattern.

use std::io::{IsTerminal, Write};
use std::sync::Arc;

use ignite_common::config::LogSettings;
use ignite_common::error::BootstrapError;
use ignite_common::pattern::TimestampPattern;
use tracing::Dispatch;
use tracing::Level;
use tracing::dispatcher::{self, DefaultGuard};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::fmt::writer::{BoxMakeWriter, MakeWriterExt};

mod format;
mod writer;

pub use format::{StampFormatter, StampTimer};
pub use writer::StampWriter;

#[derive(Clone)]
pub struct LogContext {
    inner: Arc<Inner>,
}

struct Inner {
    dispatch: Dispatch,
    pattern: TimestampPattern,
}

impl LogContext {
    pub fn builder(settings: LogSettings) -> LogContextBuilder {
        LogContextBuilder {
            settings,
            writer: None,
            tag: None,
            honor_env: true,
        }
    }

    pub fn pattern(&self) -> &TimestampPattern {
        &self.inner.pattern
    }

    pub fn dispatch(&self) -> &Dispatch {
        &self.inner.dispatch
    }

    /// Renders `line` with the current timestamp prefix.
    pub fn stamp(&self, line: &str) -> String {
        format!("{} {}", self.inner.pattern.render_now(), line)
    }

    pub fn stamp_writer<W: Write>(&self, inner: W) -> StampWriter<W> {
        StampWriter::new(inner, self.inner.pattern.clone())
    }

    /// Makes this context the process-wide default. Can only succeed once.
    pub fn install(&self) -> Result<(), BootstrapError> {
        dispatcher::set_global_default(self.inner.dispatch.clone())
            .map_err(|_| BootstrapError::LoggingAlreadyInstalled)
    }

    /// Makes this context the default for the current thread until the guard drops.
    pub fn scoped(&self) -> DefaultGuard {
        dispatcher::set_default(&self.inner.dispatch)
    }
}

pub struct LogContextBuilder {
    settings: LogSettings,
    writer: Option<BoxMakeWriter>,
    tag: Option<String>,
    honor_env: bool,
}

impl LogContextBuilder {
    /// Sends events to `make_writer` instead of stdout/stderr.
    ///
    /// Colors are only used with a custom writer when forced with `ColorMode::Always`.
    pub fn writer<M>(mut self, make_writer: M) -> Self
    where
        M: for<'a> MakeWriter<'a> + Send + Sync + 'static,
    {
        self.writer = Some(BoxMakeWriter::new(make_writer));
        self
    }

    /// Short marker printed after the timestamp, e.g. the worker id.
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Whether `RUST_LOG` overrides the configured directive.
    pub fn honor_env(mut self, honor_env: bool) -> Self {
        self.honor_env = honor_env;
        self
    }

    pub fn build(self) -> Result<LogContext, BootstrapError> {
        let filter = self.filter()?;
        let ansi = match self.writer {
            Some(_) => self.settings.color.enabled(false),
            None => self.settings.color.enabled(std::io::stdout().is_terminal()),
        };
        let writer = self.writer.unwrap_or_else(|| {
            BoxMakeWriter::new(
                std::io::stderr
                    .with_max_level(Level::WARN)
                    .or_else(std::io::stdout),
            )
        });

        let formatter =
            StampFormatter::new(self.settings.pattern.clone(), self.settings.label, self.tag);
        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(writer)
            .with_ansi(ansi)
            .event_format(formatter)
            .finish();

        Ok(LogContext {
            inner: Arc::new(Inner {
                dispatch: Dispatch::new(subscriber),
                pattern: self.settings.pattern,
            }),
        })
    }

    fn filter(&self) -> Result<EnvFilter, BootstrapError> {
        if self.honor_env {
            if let Ok(filter) = EnvFilter::try_from_default_env() {
                return Ok(filter);
            }
        }

        EnvFilter::try_new(&self.settings.directive).map_err(|e| BootstrapError::InvalidLogFilter {
            directive: self.settings.directive.clone(),
            reason: e.to_string(),
        })
    }
}
