use crate::fingerprint::Fingerprint;
use crate::record::LogEvent;
use crate::severity::Severity;
use crate::template::MessageTemplate;
use chrono::{DateTime, Utc};
use std::borrow::Cow;
use std::io::{self, Write};

/// Error returned when a [`LogEvent`] cannot be written out.
#[derive(thiserror::Error, Debug)]
pub enum FormatError {
    #[error("failed to serialize log event: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("failed to write log event: {0}")]
    Io(#[from] io::Error),
}

/// Formats [`LogEvent`]s as newline-delimited JSON objects using the field
/// names Stackdriver recognizes (`timestamp`, `message`, `severity`,
/// `exception`).
///
/// Output shape:
///
/// ```text
/// {"timestamp":"2024-01-01T00:00:00.0000000Z","message":"Hello World","fingerprint":"49a13499","severity":"INFO","name":"World"}
/// ```
///
/// The formatter holds no state, so one instance can be shared freely
/// between threads.
#[derive(Debug, Clone, Copy, Default)]
pub struct StackdriverJsonFormatter;

impl StackdriverJsonFormatter {
    pub fn new() -> Self {
        StackdriverJsonFormatter
    }

    /// Write `event` followed by a newline using a single `write_all` call,
    /// so concurrent writers sharing a locked stream never interleave.
    pub fn format<W: Write + ?Sized>(&self, event: &LogEvent, output: &mut W) -> Result<(), FormatError> {
        let line = self.format_line(event)?;
        output.write_all(&line)?;
        Ok(())
    }

    /// Write `event` without the trailing newline.
    pub fn format_event<W: Write + ?Sized>(&self, event: &LogEvent, output: &mut W) -> Result<(), FormatError> {
        let mut buf = Vec::with_capacity(256);
        write_event(event, &mut buf)?;
        output.write_all(&buf)?;
        Ok(())
    }

    /// Render `event` as a complete, newline-terminated line.
    pub fn format_line(&self, event: &LogEvent) -> Result<Vec<u8>, FormatError> {
        let mut buf = Vec::with_capacity(256);
        write_event(event, &mut buf)?;
        buf.push(b'\n');
        Ok(buf)
    }

    pub fn format_to_string(&self, event: &LogEvent) -> Result<String, FormatError> {
        let line = self.format_line(event)?;
        // Everything written is either serde_json output or ASCII.
        String::from_utf8(line).map_err(|e| FormatError::Io(io::Error::new(io::ErrorKind::InvalidData, e)))
    }
}

fn write_event(event: &LogEvent, buf: &mut Vec<u8>) -> Result<(), FormatError> {
    buf.extend_from_slice(b"{\"timestamp\":\"");
    buf.extend_from_slice(format_timestamp(&event.timestamp).as_bytes());

    buf.extend_from_slice(b"\",\"message\":");
    let message = MessageTemplate::parse(&event.message_template).render(&event.properties);
    serde_json::to_writer(&mut *buf, &message)?;

    buf.extend_from_slice(b",\"fingerprint\":\"");
    write!(buf, "{}", Fingerprint::of(&event.message_template))?;

    buf.extend_from_slice(b"\",\"severity\":\"");
    buf.extend_from_slice(Severity::from(event.level).as_str().as_bytes());
    buf.push(b'"');

    if let Some(exception) = &event.exception {
        buf.extend_from_slice(b",\"exception\":");
        serde_json::to_writer(&mut *buf, exception)?;
    }

    for (name, value) in &event.properties {
        buf.push(b',');
        serde_json::to_writer(&mut *buf, &property_key(name))?;
        buf.push(b':');
        serde_json::to_writer(&mut *buf, value)?;
    }

    buf.push(b'}');
    Ok(())
}

/// Output field names written by the formatter itself.
pub const RESERVED_FIELDS: [&str; 5] = ["timestamp", "message", "fingerprint", "severity", "exception"];

/// Output key for a user property.
///
/// A leading '@' is doubled, and a name equal to one of [`RESERVED_FIELDS`]
/// gets a single '@' prefix. Output keys starting with `@@` therefore came
/// from `@`-prefixed names, and `@<reserved>` from a bare reserved name.
pub fn property_key(name: &str) -> Cow<'_, str> {
    if name.starts_with('@') || RESERVED_FIELDS.contains(&name) {
        Cow::Owned(format!("@{}", name))
    } else {
        Cow::Borrowed(name)
    }
}

/// Round-trip UTC form with seven fractional digits, e.g.
/// `2024-01-01T00:00:00.1234567Z`.
pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    // Leap seconds report nanos >= 1e9.
    let ticks = timestamp.timestamp_subsec_nanos().min(999_999_999) / 100;
    format!("{}.{:07}Z", timestamp.format("%Y-%m-%dT%H:%M:%S"), ticks)
}
