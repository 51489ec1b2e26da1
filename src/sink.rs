use std::io::{self, Write};
use std::sync::Mutex;

/// Destination for formatted log lines.
///
/// Implementations receive one complete, newline-terminated line per call
/// and must write it atomically with respect to other writers of the same
/// stream, so lines from concurrent events never interleave.
pub trait LineSink: Send + Sync {
    /// Write a single formatted line.
    ///
    /// **Parameters**
    /// - `line`: one JSON object followed by `\n`.
    ///
    /// **Returns**
    /// - `Ok(())` once the whole line was handed to the stream.
    /// - `Err(..)` if the underlying stream failed.
    fn write_line(&self, line: &[u8]) -> io::Result<()>;

    /// Flush any buffered output. Default implementation is a no-op.
    fn flush(&self) -> io::Result<()> {
        Ok(())
    }
}

/// Writes to the process's standard output, holding the stdout lock for the
/// duration of each line.
#[derive(Clone, Copy, Debug, Default)]
pub struct StdoutSink;

impl LineSink for StdoutSink {
    fn write_line(&self, line: &[u8]) -> io::Result<()> {
        io::stdout().lock().write_all(line)
    }

    fn flush(&self) -> io::Result<()> {
        io::stdout().lock().flush()
    }
}

/// Wraps any [`Write`] implementation behind a mutex.
#[derive(Debug, Default)]
pub struct WriterSink<W> {
    inner: Mutex<W>,
}

impl<W: Write + Send> WriterSink<W> {
    pub fn new(writer: W) -> Self {
        WriterSink { inner: Mutex::new(writer) }
    }

    /// Run `f` with the wrapped writer, e.g. to inspect captured output.
    pub fn with_inner<R>(&self, f: impl FnOnce(&W) -> R) -> R {
        let guard = self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&guard)
    }

    pub fn into_inner(self) -> W {
        self.inner.into_inner().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<W: Write + Send> LineSink for WriterSink<W> {
    fn write_line(&self, line: &[u8]) -> io::Result<()> {
        let mut writer = self
            .inner
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "log writer lock poisoned"))?;
        writer.write_all(line)
    }

    fn flush(&self) -> io::Result<()> {
        let mut writer = self
            .inner
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "log writer lock poisoned"))?;
        writer.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn concurrent_lines_do_not_interleave() {
        let sink = Arc::new(WriterSink::new(Vec::new()));
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let sink = Arc::clone(&sink);
                thread::spawn(move || {
                    for i in 0..100 {
                        let line = format!("{{\"thread\":{},\"i\":{}}}\n", t, i);
                        sink.write_line(line.as_bytes()).unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let out = sink.with_inner(|buf| String::from_utf8(buf.clone()).unwrap());
        assert_eq!(out.lines().count(), 800);
        for line in out.lines() {
            serde_json::from_str::<serde_json::Value>(line).unwrap();
        }
    }
}
