//! One-shot startup sequence.
//!
//! Order is fixed: build and install logging, announce startup with a stamped
//! line, then either fan out workers (primary) or hand control to the
//! application. Any failure along the way is returned to the caller, which is
//! expected to exit non-zero.

use std::ffi::OsString;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use ignite_common::config::Config;
use ignite_common::error::BootstrapError;
use ignite_common::worker::{WORKER_ID_ENV, WorkerRole};
use tracing::{error, info, warn};

use crate::app::{AppContext, Application};
use crate::cluster::Cluster;
use crate::logging::LogContext;
use crate::signal::{shutdown_channel, shutdown_signal};

/// Extra time a primary gives its workers on top of their own grace period.
const WORKER_GRACE_MARGIN: Duration = Duration::from_secs(2);

pub struct Bootstrap {
    config: Arc<Config>,
    role: WorkerRole,
    ignored_worker_id: Option<String>,
    worker_command: Option<(PathBuf, Vec<OsString>)>,
}

impl Bootstrap {
    /// Derives the worker role from the config and the process environment.
    pub fn new(config: Config) -> Self {
        let (role, ignored_worker_id) = WorkerRole::from_env(config.workers);
        Self {
            ignored_worker_id,
            ..Self::with_role(config, role)
        }
    }

    pub fn with_role(config: Config, role: WorkerRole) -> Self {
        Self {
            config: Arc::new(config),
            role,
            ignored_worker_id: None,
            worker_command: None,
        }
    }

    /// Runs `program` as each worker instead of re-running this executable.
    pub fn with_worker_command(
        mut self,
        program: impl Into<PathBuf>,
        args: Vec<OsString>,
    ) -> Self {
        self.worker_command = Some((program.into(), args));
        self
    }

    pub fn role(&self) -> WorkerRole {
        self.role
    }

    /// Builds the logging context for this process. Workers tag their lines
    /// with their id so sibling output can be told apart.
    pub fn log_context(&self) -> Result<LogContext, BootstrapError> {
        let builder = LogContext::builder(self.config.log.clone());
        match self.role {
            WorkerRole::Worker { id } => builder.tag(format!("w{id}")).build(),
            _ => builder.build(),
        }
    }

    /// Installs logging process-wide, then runs `app` (or its workers).
    pub async fn run<A: Application>(self, app: A) -> anyhow::Result<()> {
        let log = self.log_context()?;
        log.install()?;
        self.run_with(log, app).await
    }

    /// Runs with a logging context the caller has already made active.
    pub async fn run_with<A: Application>(self, log: LogContext, app: A) -> anyhow::Result<()> {
        self.run_until(log, app, shutdown_signal()).await
    }

    /// Like [`Bootstrap::run_with`], with `stop` standing in for the process
    /// shutdown signal.
    ///
    /// When `stop` resolves the application is asked to shut down and given
    /// the configured grace period to return. Its result is then reported as
    /// usual. An application still running after the grace period is dropped
    /// and the run ends with [`BootstrapError::Interrupted`].
    pub async fn run_until<A, F>(self, log: LogContext, app: A, stop: F) -> anyhow::Result<()>
    where
        A: Application,
        F: Future<Output = ()>,
    {
        info!(
            version = env!("CARGO_PKG_VERSION"),
            role = %self.role,
            pattern = %log.pattern(),
            "ignite starting"
        );
        if let Some(raw) = &self.ignored_worker_id {
            warn!("ignoring malformed {WORKER_ID_ENV}={raw:?}");
        }

        let grace = self.config.shutdown_grace;
        if let WorkerRole::Primary { workers } = self.role {
            let cluster = match &self.worker_command {
                Some((program, args)) => Cluster::new(workers, program.clone(), args.clone()),
                None => Cluster::for_current_process(workers)?,
            };
            cluster
                .with_grace(grace + WORKER_GRACE_MARGIN)
                .supervise_until(stop)
                .await?;
            return Ok(());
        }

        let (trigger, shutdown) = shutdown_channel();
        let ctx = AppContext::new(log, self.role, Arc::clone(&self.config), shutdown);
        info!(app = app.name(), "starting application");

        let running = app.run(ctx);
        tokio::pin!(running);
        tokio::pin!(stop);
        tokio::select! {
            result = &mut running => result?,
            _ = &mut stop => {
                info!(app = app.name(), ?grace, "shutting down, waiting for the application");
                trigger.request();
                match tokio::time::timeout(grace, &mut running).await {
                    Ok(result) => result?,
                    Err(_) => {
                        error!(app = app.name(), "application did not stop in time");
                        return Err(BootstrapError::Interrupted.into());
                    }
                }
            }
        }

        info!(app = app.name(), "application finished");
        Ok(())
    }
}
