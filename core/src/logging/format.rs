use std::fmt::Write as _;

use colored::*;
use ignite_common::pattern::TimestampPattern;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::fmt::format::{self, Writer};
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::fmt::{FmtContext, FormatEvent};
use tracing_subscriber::registry::LookupSpan;

/// Renders the current time with a [`TimestampPattern`].
#[derive(Debug, Clone)]
pub struct StampTimer {
    pattern: TimestampPattern,
}

impl StampTimer {
    pub fn new(pattern: TimestampPattern) -> Self {
        Self { pattern }
    }
}

impl FormatTime for StampTimer {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        w.write_str(&self.pattern.render_now())
    }
}

/// Event formatter producing `<timestamp> [tag] [LEVEL] <fields>`.
///
/// The timestamp is always the first thing on the line and is never colored.
pub struct StampFormatter {
    timer: StampTimer,
    label: bool,
    tag: Option<String>,
}

impl StampFormatter {
    pub fn new(pattern: TimestampPattern, label: bool, tag: Option<String>) -> Self {
        Self {
            timer: StampTimer::new(pattern),
            label,
            tag,
        }
    }
}

impl<S, N> FormatEvent<S, N> for StampFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> format::FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> std::fmt::Result {
        self.timer.format_time(&mut writer)?;
        writer.write_char(' ')?;

        if let Some(tag) = &self.tag {
            write!(writer, "[{tag}] ")?;
        }

        if self.label {
            let (label, color_func): (&str, fn(ColoredString) -> ColoredString) =
                match *event.metadata().level() {
                    Level::TRACE => ("[TRACE]", |s| s.dimmed()),
                    Level::DEBUG => ("[DEBUG]", |s| s.blue()),
                    Level::INFO => ("[INFO]", |s| s.green().bold()),
                    Level::WARN => ("[WARN]", |s| s.yellow().bold()),
                    Level::ERROR => ("[ERROR]", |s| s.red().bold()),
                };

            if writer.has_ansi_escapes() {
                write!(writer, "{} ", color_func(label.into()))?;
            } else {
                write!(writer, "{label} ")?;
            }
        }

        ctx.field_format().format_fields(writer.by_ref(), event)?;

        writeln!(writer)
    }
}
