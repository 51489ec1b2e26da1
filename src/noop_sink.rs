use crate::sink::LineSink;
use std::io;

/// A sink that simply drops all lines.
///
/// Useful for measuring the cost of formatting without any output I/O.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl LineSink for NoopSink {
    fn write_line(&self, _line: &[u8]) -> io::Result<()> {
        Ok(())
    }
}
