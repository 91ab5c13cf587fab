use std::io;

use tokio::process::Child;
use tokio::signal;
use tokio::sync::watch;
use tracing::{info, warn};

/// Resolves when the process is asked to stop: Ctrl-C, or SIGTERM on Unix.
///
/// If a handler cannot be registered, that source is ignored and never fires.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("cannot listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("cannot listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received Ctrl-C"),
        _ = terminate => info!("received SIGTERM"),
    }
}

/// Creates a linked pair: the trigger stays with the entrypoint, the
/// [`Shutdown`] handle goes to the application.
pub fn shutdown_channel() -> (ShutdownTrigger, Shutdown) {
    let (tx, rx) = watch::channel(false);
    (ShutdownTrigger(tx), Shutdown(rx))
}

pub struct ShutdownTrigger(watch::Sender<bool>);

impl ShutdownTrigger {
    pub fn request(&self) {
        self.0.send_replace(true);
    }
}

/// The application's view of a shutdown request.
#[derive(Clone, Debug)]
pub struct Shutdown(watch::Receiver<bool>);

impl Shutdown {
    /// A handle whose shutdown is never requested.
    pub fn never() -> Self {
        shutdown_channel().1
    }

    pub fn is_requested(&self) -> bool {
        *self.0.borrow()
    }

    /// Resolves once shutdown has been requested. Never resolves if the
    /// trigger is dropped without a request.
    pub async fn requested(&self) {
        let mut rx = self.0.clone();
        let observed = rx.wait_for(|requested| *requested).await.is_ok();
        if !observed {
            std::future::pending::<()>().await;
        }
    }
}

/// Asks `child` to stop with SIGTERM. A child that was already reaped is left alone.
#[cfg(unix)]
pub(crate) fn terminate(child: &mut Child) -> io::Result<()> {
    match child.id() {
        Some(pid) => send(pid, libc::SIGTERM, false),
        None => Ok(()),
    }
}

#[cfg(not(unix))]
pub(crate) fn terminate(child: &mut Child) -> io::Result<()> {
    child.start_kill()
}

/// Sends `signal` to the process group led by `leader`.
#[cfg(unix)]
pub(crate) fn signal_group(leader: u32, signal: libc::c_int) -> io::Result<()> {
    send(leader, signal, true)
}

#[cfg(unix)]
fn send(pid: u32, signal: libc::c_int, group: bool) -> io::Result<()> {
    let pid = libc::pid_t::try_from(pid)
        .map_err(|_| io::Error::from(io::ErrorKind::InvalidInput))?;
    let target = if group { -pid } else { pid };
    // SAFETY: kill(2) only takes integers; no memory is shared with the callee.
    if unsafe { libc::kill(target, signal) } == 0 {
        Ok(())
    } else {
        Err(io::Error::last_os_error())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn request_reaches_every_handle() {
        let (trigger, shutdown) = shutdown_channel();
        let other = shutdown.clone();
        assert!(!shutdown.is_requested());

        trigger.request();
        assert!(shutdown.is_requested());
        tokio::time::timeout(Duration::from_secs(1), other.requested())
            .await
            .expect("request was not observed");
    }

    #[tokio::test]
    async fn never_stays_pending() {
        let shutdown = Shutdown::never();
        let waited = tokio::time::timeout(Duration::from_millis(50), shutdown.requested()).await;
        assert!(waited.is_err());
        assert!(!shutdown.is_requested());
    }
}
