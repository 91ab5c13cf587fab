//! Native worker fan-out.
//!
//! The primary starts `N` copies of its own executable, marks each with
//! [`WORKER_ID_ENV`], and supervises them. It does not restart anything: the
//! first unsuccessful exit stops the siblings and fails the primary, leaving
//! restart policy to the external process supervisor.

use std::ffi::OsString;
use std::future::Future;
use std::io;
use std::path::PathBuf;
use std::process::ExitStatus;
use std::time::Duration;

use anyhow::Context;
use ignite_common::config::DEFAULT_SHUTDOWN_GRACE;
use ignite_common::error::BootstrapError;
use ignite_common::worker::WORKER_ID_ENV;
use tokio::process::{Child, Command};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::signal::shutdown_signal;

pub struct Cluster {
    workers: usize,
    program: PathBuf,
    args: Vec<OsString>,
    grace: Duration,
}

struct WorkerExit {
    id: usize,
    status: io::Result<ExitStatus>,
}

impl Cluster {
    pub fn new(workers: usize, program: impl Into<PathBuf>, args: Vec<OsString>) -> Self {
        Self {
            workers,
            program: program.into(),
            args,
            grace: DEFAULT_SHUTDOWN_GRACE,
        }
    }

    /// Workers re-run this executable with the arguments it was started with.
    pub fn for_current_process(workers: usize) -> anyhow::Result<Self> {
        let program = std::env::current_exe().context("locating the current executable")?;
        let args = std::env::args_os().skip(1).collect();
        Ok(Self::new(workers, program, args))
    }

    /// How long a stopped worker may take to exit before it is killed.
    pub fn with_grace(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    pub async fn supervise(self) -> Result<(), BootstrapError> {
        self.supervise_until(shutdown_signal()).await
    }

    /// Starts every worker, then waits until all exit successfully, one fails,
    /// or `shutdown` resolves.
    ///
    /// Each worker leads its own process group. Stopping a worker sends SIGTERM
    /// to that group, so whatever the worker started is asked to stop too;
    /// a group still alive after the grace period is killed.
    pub async fn supervise_until<F>(self, shutdown: F) -> Result<(), BootstrapError>
    where
        F: Future<Output = ()>,
    {
        let (tx, mut rx) = mpsc::unbounded_channel::<WorkerExit>();
        let (stop_tx, stop_rx) = watch::channel(false);
        let mut handles: Vec<JoinHandle<()>> = Vec::with_capacity(self.workers);

        for id in 1..=self.workers {
            let mut command = Command::new(&self.program);
            command
                .args(&self.args)
                .env(WORKER_ID_ENV, id.to_string())
                .kill_on_drop(true);
            #[cfg(unix)]
            command.process_group(0);

            let child = match command.spawn() {
                Ok(child) => child,
                Err(source) => {
                    stop_all(&stop_tx, handles).await;
                    return Err(BootstrapError::WorkerSpawn { id, source });
                }
            };

            info!(worker = id, pid = ?child.id(), "worker started");
            handles.push(tokio::spawn(watch_worker(
                id,
                child,
                stop_rx.clone(),
                self.grace,
                tx.clone(),
            )));
        }
        drop(tx);

        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                exit = rx.recv() => match exit {
                    None => {
                        info!("all workers exited");
                        return Ok(());
                    }
                    Some(WorkerExit { id, status: Ok(status) }) if status.success() => {
                        info!(worker = id, "worker exited");
                    }
                    Some(WorkerExit { id, status }) => {
                        let code = status.as_ref().ok().and_then(ExitStatus::code);
                        match &status {
                            Ok(status) => {
                                error!(worker = id, %status, "worker failed, stopping siblings")
                            }
                            Err(e) => error!(worker = id, "lost track of worker: {e}"),
                        }
                        stop_all(&stop_tx, handles).await;
                        return Err(BootstrapError::WorkerFailed { id, code });
                    }
                },
                _ = &mut shutdown => {
                    warn!("stopping {} workers", self.workers);
                    stop_all(&stop_tx, handles).await;
                    return Err(BootstrapError::Interrupted);
                }
            }
        }
    }
}

/// Waits for one worker, stopping it early when asked to. Dropping the stop
/// sender counts as a request.
async fn watch_worker(
    id: usize,
    mut child: Child,
    mut stop: watch::Receiver<bool>,
    grace: Duration,
    exits: mpsc::UnboundedSender<WorkerExit>,
) {
    let leader = child.id();
    let exited = tokio::select! {
        status = child.wait() => Some(status),
        _ = stop.changed() => None,
    };

    let status = match exited {
        Some(status) => status,
        None => {
            let status = stop_worker(id, leader, &mut child, grace).await;
            if let Ok(status) = &status {
                info!(worker = id, %status, "worker stopped");
            }
            status
        }
    };
    let _ = exits.send(WorkerExit { id, status });
}

#[cfg(unix)]
async fn stop_worker(
    id: usize,
    leader: Option<u32>,
    child: &mut Child,
    grace: Duration,
) -> io::Result<ExitStatus> {
    let Some(leader) = leader else {
        return child.wait().await;
    };

    if let Err(e) = crate::signal::signal_group(leader, libc::SIGTERM) {
        warn!(worker = id, "cannot signal worker: {e}");
    }
    if let Ok(status) = tokio::time::timeout(grace, child.wait()).await {
        return status;
    }

    warn!(worker = id, ?grace, "worker did not stop in time, killing it");
    if let Err(e) = crate::signal::signal_group(leader, libc::SIGKILL) {
        warn!(worker = id, "cannot kill worker: {e}");
        child.start_kill()?;
    }
    child.wait().await
}

#[cfg(not(unix))]
async fn stop_worker(
    _id: usize,
    _leader: Option<u32>,
    child: &mut Child,
    _grace: Duration,
) -> io::Result<ExitStatus> {
    child.start_kill()?;
    child.wait().await
}

/// Asks every worker still running to stop and waits until each has exited.
async fn stop_all(stop: &watch::Sender<bool>, handles: Vec<JoinHandle<()>>) {
    stop.send_replace(true);
    for handle in handles {
        let _ = handle.await;
    }
}
