//! Helpers shared by the unit tests here and by other crates' tests
//! (through the `test-support` feature).

use std::io::{self, Write};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::DateTime;

/// In-memory sink usable both as a `MakeWriter` and as a raw output stream.
#[derive(Clone, Default)]
pub struct MemorySink(Arc<Mutex<Vec<u8>>>);

impl MemorySink {
    pub fn lines(&self) -> Vec<String> {
        let bytes = self.0.lock().unwrap().clone();
        String::from_utf8(bytes)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines().iter().any(|l| l.contains(needle))
    }
}

impl Write for MemorySink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// True when `line` starts with `YYYY-MM-DDTHH:mm:ss.sssZ`.
pub fn starts_with_iso_utc(line: &str) -> bool {
    let Some(stamp) = line.get(..24) else {
        return false;
    };
    stamp.ends_with('Z')
        && stamp.as_bytes()[19] == b'.'
        && DateTime::parse_from_rfc3339(stamp).is_ok()
}

/// Polls `condition` for up to ten seconds.
pub async fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    for _ in 0..500 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    condition()
}

/// False once `pid` has exited, even before anyone reaps it.
#[cfg(target_os = "linux")]
pub fn is_running(pid: u32) -> bool {
    let Ok(stat) = std::fs::read_to_string(format!("/proc/{pid}/stat")) else {
        return false;
    };
    stat.rsplit_once(')')
        .and_then(|(_, rest)| rest.trim_start().chars().next())
        .is_some_and(|state| state != 'Z' && state != 'X')
}
