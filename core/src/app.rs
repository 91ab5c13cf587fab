//! The boundary between the entrypoint and the application it starts.
//!
//! Applications are either linked into the binary and implement
//! [`Application`] directly, or live in a separate executable and are started
//! through [`ProgramApplication`].

use std::sync::Arc;

use async_trait::async_trait;
use ignite_common::config::Config;
use ignite_common::worker::WorkerRole;

use crate::logging::LogContext;
use crate::signal::Shutdown;

mod program;

pub use program::{ProgramApplication, Sink};

/// The application the entrypoint hands control to.
///
/// `run` owns the rest of the process's life: when it returns, the process exits.
/// On a shutdown signal it is expected to wind down and return; one that is
/// still running after the grace period is dropped.
#[async_trait]
pub trait Application: Send + Sync {
    /// Name used in startup and shutdown log lines.
    fn name(&self) -> &str;

    async fn run(&self, ctx: AppContext) -> anyhow::Result<()>;
}

/// Everything the entrypoint set up, handed to the application.
#[derive(Clone)]
pub struct AppContext {
    log: LogContext,
    role: WorkerRole,
    config: Arc<Config>,
    shutdown: Shutdown,
}

impl AppContext {
    pub fn new(log: LogContext, role: WorkerRole, config: Arc<Config>, shutdown: Shutdown) -> Self {
        Self {
            log,
            role,
            config,
            shutdown,
        }
    }

    pub fn log(&self) -> &LogContext {
        &self.log
    }

    pub fn role(&self) -> WorkerRole {
        self.role
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn shutdown(&self) -> &Shutdown {
        &self.shutdown
    }
}
