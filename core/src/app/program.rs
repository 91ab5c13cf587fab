use std::io::{self, Write};
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use ignite_common::config::AppSpec;
use ignite_common::error::BootstrapError;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tracing::{debug, info, warn};

use super::{AppContext, Application};
use crate::logging::StampWriter;
use crate::signal::terminate;

/// Destination of one relayed output stream.
pub type Sink = Box<dyn Write + Send>;
type SinkFactory = Arc<dyn Fn() -> Sink + Send + Sync>;

/// Runs the application as a separate executable.
///
/// The program inherits stdin and the environment. Its stdout and stderr are
/// relayed line by line to the matching stream of this process, each line
/// stamped with the configured timestamp. A shutdown request is passed on to
/// the program as SIGTERM, and the program is then waited for as usual.
pub struct ProgramApplication {
    spec: AppSpec,
    stdout: SinkFactory,
    stderr: SinkFactory,
}

impl ProgramApplication {
    pub fn new(spec: AppSpec) -> Self {
        Self {
            spec,
            stdout: Arc::new(|| Box::new(io::stdout()) as Sink),
            stderr: Arc::new(|| Box::new(io::stderr()) as Sink),
        }
    }

    /// Relays the program's output to the given streams instead of our own.
    pub fn with_output<O, E>(mut self, stdout: O, stderr: E) -> Self
    where
        O: Fn() -> Sink + Send + Sync + 'static,
        E: Fn() -> Sink + Send + Sync + 'static,
    {
        self.stdout = Arc::new(stdout);
        self.stderr = Arc::new(stderr);
        self
    }

    pub fn path(&self) -> &PathBuf {
        &self.spec.path
    }

    fn spawn_error(&self, source: io::Error) -> BootstrapError {
        match source.kind() {
            io::ErrorKind::NotFound => BootstrapError::AppMissing(self.spec.path.clone()),
            _ => BootstrapError::AppSpawn {
                path: self.spec.path.clone(),
                source,
            },
        }
    }
}

#[async_trait]
impl Application for ProgramApplication {
    fn name(&self) -> &str {
        self.spec.path.to_str().unwrap_or("application")
    }

    async fn run(&self, ctx: AppContext) -> anyhow::Result<()> {
        let mut child = Command::new(&self.spec.path)
            .args(&self.spec.args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| self.spawn_error(e))?;

        info!(pid = ?child.id(), "application started");

        let stdout = child.stdout.take().context("application stdout was not captured")?;
        let stderr = child.stderr.take().context("application stderr was not captured")?;
        let out_relay = tokio::spawn(relay(stdout, ctx.log().stamp_writer((self.stdout)())));
        let err_relay = tokio::spawn(relay(stderr, ctx.log().stamp_writer((self.stderr)())));

        let shutdown = ctx.shutdown();
        let waited = tokio::select! {
            status = child.wait() => status,
            _ = shutdown.requested() => {
                info!(pid = ?child.id(), "passing shutdown on to the application");
                if let Err(e) = terminate(&mut child) {
                    warn!("cannot signal application: {e}");
                }
                child.wait().await
            }
        };
        let status = waited.context("waiting for application")?;
        out_relay.await?.context("relaying application stdout")?;
        err_relay.await?.context("relaying application stderr")?;

        debug!(%status, "application exited");
        match status.code() {
            Some(0) => Ok(()),
            Some(code) => Err(BootstrapError::AppExited { code }.into()),
            None if shutdown.is_requested() => Err(BootstrapError::Interrupted.into()),
            None => Err(BootstrapError::AppKilled.into()),
        }
    }
}

async fn relay<R>(stream: R, mut sink: StampWriter<Sink>) -> io::Result<()>
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(stream);
    let mut line: Vec<u8> = Vec::new();

    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line).await? == 0 {
            break;
        }
        sink.write_all(&line)?;
        sink.flush()?;
    }

    sink.flush()
}
