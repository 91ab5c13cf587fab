//! Worker fan-out model.
//!
//! A process started with a worker count above one becomes the *primary* and
//! spawns that many copies of itself. Each copy finds [`WORKER_ID_ENV`] in its
//! environment and runs the application directly.

use std::fmt;
use std::num::NonZeroUsize;
use std::str::FromStr;

use crate::error::BootstrapError;

/// Environment variable the primary sets on every worker it spawns.
pub const WORKER_ID_ENV: &str = "IGNITE_WORKER_ID";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerCount {
    /// One worker per available CPU.
    Auto,
    Fixed(NonZeroUsize),
}

impl WorkerCount {
    pub const ONE: WorkerCount = WorkerCount::Fixed(NonZeroUsize::MIN);

    pub fn resolve(&self) -> usize {
        match self {
            WorkerCount::Auto => std::thread::available_parallelism()
                .map(NonZeroUsize::get)
                .unwrap_or(1),
            WorkerCount::Fixed(n) => n.get(),
        }
    }
}

impl Default for WorkerCount {
    fn default() -> Self {
        WorkerCount::ONE
    }
}

impl fmt::Display for WorkerCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkerCount::Auto => f.write_str("auto"),
            WorkerCount::Fixed(n) => write!(f, "{n}"),
        }
    }
}

impl FromStr for WorkerCount {
    type Err = BootstrapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("auto") {
            return Ok(WorkerCount::Auto);
        }

        s.parse::<NonZeroUsize>()
            .map(WorkerCount::Fixed)
            .map_err(|_| BootstrapError::InvalidWorkerCount(s.to_string()))
    }
}

/// What this process does once logging is installed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerRole {
    /// No fan-out: run the application in this process.
    Single,
    /// Spawn and supervise `workers` sibling processes.
    Primary { workers: usize },
    /// A sibling spawned by a primary.
    Worker { id: usize },
}

impl WorkerRole {
    /// Determines the role from the configured count and the value of
    /// [`WORKER_ID_ENV`], if set.
    ///
    /// A worker id always wins, so workers never fan out again. A malformed
    /// id is ignored.
    pub fn resolve(count: WorkerCount, worker_id: Option<&str>) -> WorkerRole {
        if let Some(Ok(id)) = worker_id.map(|raw| raw.trim().parse::<usize>()) {
            return WorkerRole::Worker { id };
        }

        match count.resolve() {
            0 | 1 => WorkerRole::Single,
            workers => WorkerRole::Primary { workers },
        }
    }

    /// Resolves the role from [`WORKER_ID_ENV`]. A malformed id is handed
    /// back so it can be reported once logging is installed.
    pub fn from_env(count: WorkerCount) -> (WorkerRole, Option<String>) {
        let worker_id = std::env::var(WORKER_ID_ENV).ok();
        let role = WorkerRole::resolve(count, worker_id.as_deref());
        let ignored = worker_id.filter(|_| !matches!(role, WorkerRole::Worker { .. }));
        (role, ignored)
    }

    pub fn is_primary(&self) -> bool {
        matches!(self, WorkerRole::Primary { .. })
    }
}

impl fmt::Display for WorkerRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkerRole::Single => f.write_str("single"),
            WorkerRole::Primary { workers } => write!(f, "primary of {workers}"),
            WorkerRole::Worker { id } => write!(f, "worker {id}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed(n: usize) -> WorkerCount {
        WorkerCount::Fixed(NonZeroUsize::new(n).unwrap())
    }

    #[test]
    fn parses_worker_counts() {
        assert_eq!("auto".parse::<WorkerCount>().unwrap(), WorkerCount::Auto);
        assert_eq!("AUTO".parse::<WorkerCount>().unwrap(), WorkerCount::Auto);
        assert_eq!("4".parse::<WorkerCount>().unwrap(), fixed(4));
        assert_eq!(" 2 ".parse::<WorkerCount>().unwrap(), fixed(2));

        assert!("0".parse::<WorkerCount>().is_err());
        assert!("-3".parse::<WorkerCount>().is_err());
        assert!("many".parse::<WorkerCount>().is_err());
    }

    #[test]
    fn auto_resolves_to_at_least_one() {
        assert!(WorkerCount::Auto.resolve() >= 1);
        assert_eq!(WorkerCount::default().resolve(), 1);
    }

    #[test]
    fn role_from_count() {
        assert_eq!(WorkerRole::resolve(WorkerCount::ONE, None), WorkerRole::Single);
        assert_eq!(
            WorkerRole::resolve(fixed(3), None),
            WorkerRole::Primary { workers: 3 }
        );
    }

    #[test]
    fn worker_id_wins_over_count() {
        assert_eq!(
            WorkerRole::resolve(fixed(8), Some("2")),
            WorkerRole::Worker { id: 2 }
        );
        assert_eq!(
            WorkerRole::resolve(WorkerCount::ONE, Some("1")),
            WorkerRole::Worker { id: 1 }
        );
    }

    #[test]
    fn malformed_worker_id_is_ignored() {
        assert_eq!(
            WorkerRole::resolve(fixed(2), Some("two")),
            WorkerRole::Primary { workers: 2 }
        );
    }
}
