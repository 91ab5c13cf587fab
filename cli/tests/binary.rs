use std::process::{Command, Output};

use ignite_core::test_support::starts_with_iso_utc;

fn ignite() -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_ignite"));
    command
        .current_dir(env!("CARGO_MANIFEST_DIR"))
        .env_remove("RUST_LOG")
        .env_remove("IGNITE_WORKER_ID")
        .env("NO_COLOR", "1");
    command
}

fn lines(bytes: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(bytes).lines().map(str::to_string).collect()
}

fn describe(output: &Output) -> String {
    format!(
        "status: {}\nstdout:\n{}\nstderr:\n{}",
        output.status,
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    )
}

#[test]
#[cfg(unix)]
fn every_stdout_line_is_stamped() {
    let output = ignite()
        .args(["--app", "/bin/echo", "--", "hello from echo"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", describe(&output));

    let stdout = lines(&output.stdout);
    assert!(!stdout.is_empty(), "{}", describe(&output));
    assert!(stdout.iter().all(|l| starts_with_iso_utc(l)), "{}", describe(&output));
    assert!(stdout[0].contains("[INFO] ignite starting"), "{}", describe(&output));
    assert!(stdout.iter().any(|l| l.ends_with(" hello from echo")), "{}", describe(&output));

    // Nothing at WARN or above, so nothing on stderr.
    assert!(output.stderr.is_empty(), "{}", describe(&output));
}

#[test]
fn missing_application_exits_with_one() {
    let output = ignite().output().unwrap();
    assert_eq!(output.status.code(), Some(1), "{}", describe(&output));

    let stdout = lines(&output.stdout);
    assert!(stdout.first().is_some_and(|l| starts_with_iso_utc(l)), "{}", describe(&output));

    let stderr = lines(&output.stderr);
    let failure = stderr.iter().find(|l| l.contains("[ERROR]"));
    assert!(
        failure.is_some_and(|l| starts_with_iso_utc(l) && l.contains("app/app")),
        "{}",
        describe(&output)
    );
}

#[test]
#[cfg(unix)]
fn application_exit_status_is_the_process_status() {
    let output = ignite()
        .args(["--app", "/bin/sh", "--", "-c", "exit 6"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(6), "{}", describe(&output));
}

#[test]
#[cfg(unix)]
fn workers_each_run_the_application() {
    let output = ignite()
        .args(["-w", "2", "--app", "/bin/echo", "--", "worker says hi"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", describe(&output));

    let stdout = lines(&output.stdout);
    assert!(stdout.iter().all(|l| starts_with_iso_utc(l)), "{}", describe(&output));
    let greetings = stdout.iter().filter(|l| l.ends_with(" worker says hi")).count();
    assert_eq!(greetings, 2, "{}", describe(&output));
    for tag in ["[w1]", "[w2]"] {
        assert!(stdout.iter().any(|l| l.contains(tag)), "{}", describe(&output));
    }
}

#[test]
#[cfg(unix)]
fn sigterm_lets_the_application_shut_down() {
    use std::io::{BufRead, BufReader};
    use std::process::Stdio;

    let script = "trap 'echo graceful; exit 0' TERM; echo up; while :; do sleep 0.1; done";
    let mut child = ignite()
        .args(["--app", "/bin/sh", "--", "-c", script])
        .stdout(Stdio::piped())
        .spawn()
        .unwrap();

    let mut stdout = BufReader::new(child.stdout.take().unwrap()).lines();
    let mut seen = Vec::new();
    for line in stdout.by_ref() {
        let line = line.unwrap();
        let up = line.ends_with(" up");
        seen.push(line);
        if up {
            break;
        }
    }
    assert!(seen.last().is_some_and(|l| l.ends_with(" up")), "{seen:?}");

    let pid = libc::pid_t::try_from(child.id()).unwrap();
    assert_eq!(unsafe { libc::kill(pid, libc::SIGTERM) }, 0);

    seen.extend(stdout.map(Result::unwrap));
    let status = child.wait().unwrap();
    assert!(status.success(), "{status}: {seen:?}");

    let graceful = seen.iter().find(|l| l.ends_with(" graceful"));
    assert!(graceful.is_some_and(|l| starts_with_iso_utc(l)), "{seen:?}");
}

#[test]
fn patterns_lists_the_default() {
    let output = ignite().arg("patterns").output().unwrap();
    assert!(output.status.success(), "{}", describe(&output));
    assert!(String::from_utf8_lossy(&output.stdout).contains("isoUtcDateTime"));
}
