use crate::exception::ErrorDescription;
use crate::formatter::{FormatError, StackdriverJsonFormatter};
use crate::level::LogLevel;
use crate::record::{LogContext, LogEvent, Properties};
use crate::sink::LineSink;
use serde_json::Value;
use std::sync::Arc;

/// Minimal logging pipeline for code that does not go through `tracing`.
///
/// A `Logger` filters by minimum level, enriches each event with its
/// [`LogContext`], formats it and hands one line to the sink. Request
/// handlers derive a scoped logger with [`Logger::for_context`] and pass
/// it down instead of relying on ambient state.
#[derive(Clone)]
pub struct Logger {
    sink: Arc<dyn LineSink>,
    formatter: StackdriverJsonFormatter,
    min_level: LogLevel,
    context: LogContext,
}

impl Logger {
    pub fn new(sink: Arc<dyn LineSink>, min_level: LogLevel) -> Self {
        Logger {
            sink,
            formatter: StackdriverJsonFormatter::new(),
            min_level,
            context: LogContext::new(),
        }
    }

    /// A logger whose events additionally carry `name = value`.
    pub fn for_context(&self, name: impl Into<String>, value: impl Into<Value>) -> Logger {
        let mut scoped = self.clone();
        scoped.context.push(name, value);
        scoped
    }

    pub fn context(&self) -> &LogContext {
        &self.context
    }

    pub fn is_enabled(&self, level: LogLevel) -> bool {
        level >= self.min_level
    }

    /// Format and write `event` if its level passes the minimum.
    pub fn write(&self, event: LogEvent) -> Result<(), FormatError> {
        if !self.is_enabled(event.level) {
            return Ok(());
        }
        let event = event.with_context(&self.context);
        let line = self.formatter.format_line(&event)?;
        self.sink.write_line(&line)?;
        Ok(())
    }

    pub fn log(&self, level: LogLevel, template: &str, properties: Properties) -> Result<(), FormatError> {
        self.write(LogEvent::new(level, template).with_properties(properties))
    }

    pub fn verbose(&self, template: &str, properties: Properties) -> Result<(), FormatError> {
        self.log(LogLevel::Verbose, template, properties)
    }

    pub fn debug(&self, template: &str, properties: Properties) -> Result<(), FormatError> {
        self.log(LogLevel::Debug, template, properties)
    }

    pub fn information(&self, template: &str, properties: Properties) -> Result<(), FormatError> {
        self.log(LogLevel::Information, template, properties)
    }

    pub fn warning(&self, template: &str, properties: Properties) -> Result<(), FormatError> {
        self.log(LogLevel::Warning, template, properties)
    }

    pub fn error(&self, template: &str, properties: Properties) -> Result<(), FormatError> {
        self.log(LogLevel::Error, template, properties)
    }

    pub fn fatal(&self, template: &str, properties: Properties) -> Result<(), FormatError> {
        self.log(LogLevel::Fatal, template, properties)
    }

    /// Log at `Error` with `error` attached as the exception.
    pub fn error_with<E: ErrorDescription + ?Sized>(
        &self,
        error: &E,
        template: &str,
        properties: Properties,
    ) -> Result<(), FormatError> {
        self.write(
            LogEvent::new(LogLevel::Error, template)
                .with_properties(properties)
                .with_exception(error),
        )
    }

    pub fn flush(&self) -> Result<(), FormatError> {
        self.sink.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::WriterSink;
    use serde_json::json;

    fn props(value: Value) -> Properties {
        value.as_object().cloned().unwrap_or_default()
    }

    fn lines(sink: &WriterSink<Vec<u8>>) -> Vec<Value> {
        sink.with_inner(|buf| {
            String::from_utf8_lossy(buf)
                .lines()
                .map(|l| serde_json::from_str(l).unwrap())
                .collect()
        })
    }

    #[test]
    fn filters_below_minimum_level() {
        let sink = Arc::new(WriterSink::new(Vec::new()));
        let logger = Logger::new(sink.clone(), LogLevel::Information);

        logger.debug("hidden", Properties::new()).unwrap();
        logger.information("shown", Properties::new()).unwrap();
        logger.fatal("also shown", Properties::new()).unwrap();

        let out = lines(&sink);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0]["message"], "shown");
        assert_eq!(out[1]["severity"], "CRITICAL");
    }

    #[test]
    fn scoped_context_is_appended_to_events() {
        let sink = Arc::new(WriterSink::new(Vec::new()));
        let root = Logger::new(sink.clone(), LogLevel::Debug);
        let request = root
            .for_context("requestMethod", "GET")
            .for_context("requestUrl", "http://localhost:6100/");

        request
            .information(
                "Structured logging for customer ID {customerId}.",
                props(json!({"customerId": 42})),
            )
            .unwrap();
        root.warning("outside the request", Properties::new()).unwrap();

        let out = lines(&sink);
        let keys: Vec<&str> = out[0].as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            ["timestamp", "message", "fingerprint", "severity", "customerId", "requestMethod", "requestUrl"]
        );
        assert_eq!(out[0]["message"], "Structured logging for customer ID 42.");
        assert!(out[1].get("requestMethod").is_none());
    }

    #[test]
    fn error_with_attaches_exception() {
        let sink = Arc::new(WriterSink::new(Vec::new()));
        let logger = Logger::new(sink.clone(), LogLevel::Debug);
        let err = std::io::Error::new(std::io::ErrorKind::InvalidInput, "Oh noes");

        logger
            .error_with(&err, "Look: An intentional error.", Properties::new())
            .unwrap();

        let out = lines(&sink);
        assert_eq!(out[0]["severity"], "ERROR");
        assert_eq!(out[0]["exception"], "Oh noes");
    }
}
