use std::io::{self, Write};

use ignite_common::pattern::TimestampPattern;

/// Line-oriented writer that prefixes every line with a timestamp.
///
/// Bytes are held back until a newline arrives, so a line written in several
/// pieces is stamped exactly once. [`Write::flush`] terminates and stamps any
/// pending partial line.
pub struct StampWriter<W: Write> {
    inner: W,
    pattern: TimestampPattern,
    pending: Vec<u8>,
}

impl<W: Write> StampWriter<W> {
    pub fn new(inner: W, pattern: TimestampPattern) -> Self {
        Self {
            inner,
            pattern,
            pending: Vec::new(),
        }
    }

    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    /// Flushes pending output and returns the wrapped writer.
    pub fn into_inner(mut self) -> io::Result<W> {
        self.flush()?;
        Ok(self.inner)
    }

    /// Writes one stamped line with a single `write_all`, so output from
    /// other writers sharing `inner` cannot land between stamp and line.
    fn emit(inner: &mut W, pattern: &TimestampPattern, line: &[u8]) -> io::Result<()> {
        let stamp = pattern.render_now();
        let mut stamped = Vec::with_capacity(stamp.len() + 1 + line.len());
        stamped.extend_from_slice(stamp.as_bytes());
        stamped.push(b' ');
        stamped.extend_from_slice(line);
        inner.write_all(&stamped)
    }
}

impl<W: Write> Write for StampWriter<W> {
    /// A line that fails to reach the inner writer stays unconsumed, so the
    /// caller can retry it without losing or duplicating output.
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut rest = buf;

        while let Some(pos) = rest.iter().position(|b| *b == b'\n') {
            let (line, tail) = rest.split_at(pos + 1);
            self.pending.extend_from_slice(line);

            if let Err(e) = Self::emit(&mut self.inner, &self.pattern, &self.pending) {
                self.pending.truncate(self.pending.len() - line.len());
                return match buf.len() - rest.len() {
                    0 => Err(e),
                    written => Ok(written),
                };
            }

            self.pending.clear();
            rest = tail;
        }

        self.pending.extend_from_slice(rest);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if !self.pending.is_empty() {
            self.pending.push(b'\n');
            if let Err(e) = Self::emit(&mut self.inner, &self.pattern, &self.pending) {
                self.pending.pop();
                return Err(e);
            }
            self.pending.clear();
        }
        self.inner.flush()
    }
}
