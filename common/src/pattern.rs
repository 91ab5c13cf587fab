//! # Timestamp Patterns
//!
//! Defines how the timestamp prefix of a log line is rendered.
//!
//! A pattern is either one of the named masks or a custom strftime string:
//! * `isoUtcDateTime` (default): `2024-01-31T09:15:02.123Z`, always UTC.
//! * `isoDateTime`: local time with milliseconds and offset.
//! * `isoDate`, `isoTime`: local date or local time only.
//! * `default`: `Wed Jan 31 2024 09:15:02`, local time.
//! * Custom strftime (e.g. `%H:%M:%S`). Prefix with `UTC:` to render in UTC.

use std::fmt;
use std::str::FromStr;

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Local, Utc};

use crate::error::BootstrapError;

const ISO_UTC_DATE_TIME: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";
const ISO_DATE_TIME: &str = "%Y-%m-%dT%H:%M:%S%.3f%:z";
const ISO_DATE: &str = "%Y-%m-%d";
const ISO_TIME: &str = "%H:%M:%S";
const DEFAULT_DATE_TIME: &str = "%a %b %d %Y %H:%M:%S";

const UTC_PREFIX: &str = "UTC:";

/// Which clock a pattern is rendered against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Zone {
    Utc,
    Local,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TimestampPattern {
    #[default]
    IsoUtcDateTime,
    IsoDateTime,
    IsoDate,
    IsoTime,
    Default,
    Custom { format: String, zone: Zone },
}

impl TimestampPattern {
    /// Every named pattern, in the order `ignite patterns` lists them.
    pub const NAMED: [TimestampPattern; 5] = [
        TimestampPattern::IsoUtcDateTime,
        TimestampPattern::IsoDateTime,
        TimestampPattern::IsoDate,
        TimestampPattern::IsoTime,
        TimestampPattern::Default,
    ];

    pub fn name(&self) -> &str {
        match self {
            TimestampPattern::IsoUtcDateTime => "isoUtcDateTime",
            TimestampPattern::IsoDateTime => "isoDateTime",
            TimestampPattern::IsoDate => "isoDate",
            TimestampPattern::IsoTime => "isoTime",
            TimestampPattern::Default => "default",
            TimestampPattern::Custom { format, .. } => format,
        }
    }

    fn strftime(&self) -> &str {
        match self {
            TimestampPattern::IsoUtcDateTime => ISO_UTC_DATE_TIME,
            TimestampPattern::IsoDateTime => ISO_DATE_TIME,
            TimestampPattern::IsoDate => ISO_DATE,
            TimestampPattern::IsoTime => ISO_TIME,
            TimestampPattern::Default => DEFAULT_DATE_TIME,
            TimestampPattern::Custom { format, .. } => format,
        }
    }

    pub fn zone(&self) -> Zone {
        match self {
            TimestampPattern::IsoUtcDateTime => Zone::Utc,
            TimestampPattern::Custom { zone, .. } => *zone,
            _ => Zone::Local,
        }
    }

    /// Renders `instant` with this pattern.
    pub fn render(&self, instant: DateTime<Utc>) -> String {
        match self.zone() {
            Zone::Utc => instant.format(self.strftime()).to_string(),
            Zone::Local => instant
                .with_timezone(&Local)
                .format(self.strftime())
                .to_string(),
        }
    }

    pub fn render_now(&self) -> String {
        self.render(Utc::now())
    }
}

impl fmt::Display for TimestampPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimestampPattern::Custom {
                format,
                zone: Zone::Utc,
            } => write!(f, "{UTC_PREFIX}{format}"),
            other => f.write_str(other.name()),
        }
    }
}

impl FromStr for TimestampPattern {
    type Err = BootstrapError;

    /// Parses a named pattern (case-insensitive) or a custom strftime string.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(named) = parse_named(s) {
            return Ok(named);
        }

        parse_custom(s)
    }
}

fn parse_named(s: &str) -> Option<TimestampPattern> {
    TimestampPattern::NAMED
        .into_iter()
        .find(|named| named.name().eq_ignore_ascii_case(s.trim()))
}

fn parse_custom(s: &str) -> Result<TimestampPattern, BootstrapError> {
    let (format, zone) = match s.strip_prefix(UTC_PREFIX) {
        Some(rest) => (rest, Zone::Utc),
        None => (s, Zone::Local),
    };

    if format.trim().is_empty() {
        return Err(BootstrapError::InvalidPattern {
            pattern: s.to_string(),
            reason: "pattern is empty".to_string(),
        });
    }

    if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
        return Err(BootstrapError::InvalidPattern {
            pattern: s.to_string(),
            reason: "not a valid strftime format".to_string(),
        });
    }

    Ok(TimestampPattern::Custom {
        format: format.to_string(),
        zone,
    })
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
