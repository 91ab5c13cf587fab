#![cfg(test)]
use std::io::Write;
use std::path::PathBuf;

use async_trait::async_trait;
use ignite_common::config::AppSpec;
use ignite_common::error::BootstrapError;
use ignite_common::worker::WorkerRole;
use ignite_core::app::{AppContext, Application, ProgramApplication, Sink};
use ignite_core::bootstrap::Bootstrap;
use tracing::info;

use crate::utils::{MemorySink, capture_log, config, starts_with_iso_utc};

/// A statically linked application that logs through both paths the
/// entrypoint hands it: `tracing` events and raw stamped output.
struct Greeter {
    raw: MemorySink,
}

#[async_trait]
impl Application for Greeter {
    fn name(&self) -> &str {
        "greeter"
    }

    async fn run(&self, ctx: AppContext) -> anyhow::Result<()> {
        info!("ready to serve");
        let mut out = ctx.log().stamp_writer(self.raw.clone());
        writeln!(out, "raw hello")?;
        out.flush()?;
        Ok(())
    }
}

fn shell(script: &str, out: &MemorySink) -> ProgramApplication {
    let out = out.clone();
    ProgramApplication::new(AppSpec {
        path: PathBuf::from("/bin/sh"),
        args: vec!["-c".to_string(), script.to_string()],
    })
    .with_output(move || Box::new(out.clone()) as Sink, || Box::new(std::io::sink()) as Sink)
}

#[tokio::test]
async fn startup_line_precedes_application_output() {
    let log_sink = MemorySink::default();
    let raw_sink = MemorySink::default();
    let log = capture_log(&log_sink);
    let _guard = log.scoped();

    let app = Greeter { raw: raw_sink.clone() };
    let result = Bootstrap::with_role(config(), WorkerRole::Single)
        .run_with(log.clone(), app)
        .await;
    assert!(result.is_ok(), "Bootstrap failed: {:?}", result.err());

    let lines = log_sink.lines();
    assert!(lines.len() >= 3, "Too few log lines: {lines:?}");
    assert!(lines.iter().all(|l| starts_with_iso_utc(l)), "Unstamped line in {lines:?}");
    assert!(lines[0].contains("ignite starting"));

    let ready = lines.iter().position(|l| l.contains("ready to serve")).unwrap();
    assert!(ready > 0, "Application logged before startup line");

    let raw = raw_sink.lines();
    assert_eq!(raw.len(), 1);
    assert!(starts_with_iso_utc(&raw[0]));
    assert!(raw[0].ends_with(" raw hello"));
}

#[tokio::test]
async fn missing_application_fails_with_non_zero_status() {
    let log_sink = MemorySink::default();
    let log = capture_log(&log_sink);
    let _guard = log.scoped();

    let app = ProgramApplication::new(AppSpec::default());
    let err = Bootstrap::with_role(config(), WorkerRole::Single)
        .run_with(log.clone(), app)
        .await
        .unwrap_err();

    match err.downcast_ref::<BootstrapError>() {
        Some(e @ BootstrapError::AppMissing(path)) => {
            assert_eq!(path, &PathBuf::from("app/app"));
            assert_ne!(e.exit_code(), 0);
        }
        other => panic!("Unexpected error: {other:?}"),
    }

    // Logging was in place before the application was looked up.
    assert!(log_sink.lines()[0].contains("ignite starting"));
}

#[tokio::test]
#[cfg(unix)]
async fn program_output_is_stamped() {
    let log_sink = MemorySink::default();
    let out_sink = MemorySink::default();
    let log = capture_log(&log_sink);
    let _guard = log.scoped();

    let app = shell("echo listening; echo handled request", &out_sink);
    Bootstrap::with_role(config(), WorkerRole::Single)
        .run_with(log.clone(), app)
        .await
        .unwrap();

    let out = out_sink.lines();
    assert_eq!(out.len(), 2);
    assert!(out.iter().all(|l| starts_with_iso_utc(l)));
    assert!(out[0].ends_with(" listening"));
    assert!(out[1].ends_with(" handled request"));

    let lines = log_sink.lines();
    assert!(lines.iter().any(|l| l.contains("application started")));
    assert!(lines.last().unwrap().contains("application finished"));
}

#[tokio::test]
#[cfg(unix)]
async fn application_exit_status_passes_through() {
    let log_sink = MemorySink::default();
    let log = capture_log(&log_sink);
    let _guard = log.scoped();

    let app = shell("exit 5", &MemorySink::default());
    let err = Bootstrap::with_role(config(), WorkerRole::Single)
        .run_with(log.clone(), app)
        .await
        .unwrap_err();

    let bootstrap_err = err.downcast_ref::<BootstrapError>().expect("not a bootstrap error");
    assert_eq!(bootstrap_err.exit_code(), 5);
}

#[tokio::test]
#[cfg(unix)]
async fn program_gets_to_finish_its_shutdown() {
    let log_sink = MemorySink::default();
    let out_sink = MemorySink::default();
    let log = capture_log(&log_sink);
    let _guard = log.scoped();

    let script = "trap 'echo draining; sleep 0.2; echo drained; exit 0' TERM; \
                  echo up; while :; do sleep 0.1; done";
    let app = shell(script, &out_sink);
    let started = {
        let out = out_sink.clone();
        async move {
            while !out.contains(" up") {
                tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            }
        }
    };

    let result = Bootstrap::with_role(config(), WorkerRole::Single)
        .run_until(log.clone(), app, started)
        .await;
    assert!(result.is_ok(), "Shutdown was not graceful: {:?}", result.err());

    let out = out_sink.lines();
    assert!(out.iter().all(|l| starts_with_iso_utc(l)), "Unstamped line in {out:?}");
    assert!(out.iter().any(|l| l.ends_with(" drained")), "Application was cut off: {out:?}");
    assert!(log_sink.lines().last().unwrap().contains("application finished"));
}
