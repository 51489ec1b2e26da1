use crate::exception::ErrorDescription;
use crate::level::LogLevel;
use chrono::{DateTime, Utc};
use serde_json::Value;

/// Named event properties, iterated in insertion order.
pub type Properties = serde_json::Map<String, Value>;

/// One structured log statement, ready to be formatted.
#[derive(Debug, Clone, PartialEq)]
pub struct LogEvent {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub message_template: String,
    pub properties: Properties,
    /// Descriptive text of the attached error, if any.
    pub exception: Option<String>,
}

impl LogEvent {
    /// Create an event stamped with the current time and no properties.
    pub fn new(level: LogLevel, message_template: impl Into<String>) -> Self {
        LogEvent {
            timestamp: Utc::now(),
            level,
            message_template: message_template.into(),
            properties: Properties::new(),
            exception: None,
        }
    }

    /// Override the timestamp. Any time zone is accepted and converted to UTC.
    pub fn at<Tz: chrono::TimeZone>(mut self, timestamp: DateTime<Tz>) -> Self {
        self.timestamp = timestamp.with_timezone(&Utc);
        self
    }

    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }

    pub fn with_properties(mut self, properties: Properties) -> Self {
        self.properties.extend(properties);
        self
    }

    pub fn with_exception<E: ErrorDescription + ?Sized>(mut self, error: &E) -> Self {
        self.exception = Some(error.describe());
        self
    }

    pub fn with_exception_text(mut self, text: impl Into<String>) -> Self {
        self.exception = Some(text.into());
        self
    }

    /// Append the context's properties that the event does not already carry.
    pub fn with_context(mut self, context: &LogContext) -> Self {
        context.enrich(&mut self);
        self
    }
}

/// Properties shared by every event logged within one unit of work, such as
/// a request. Passed explicitly instead of living in ambient state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LogContext {
    properties: Properties,
}

impl LogContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.push(name, value);
        self
    }

    pub fn push(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.properties.insert(name.into(), value.into());
    }

    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    pub fn enrich(&self, event: &mut LogEvent) {
        for (name, value) in &self.properties {
            if !event.properties.contains_key(name) {
                event.properties.insert(name.clone(), value.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone};

    #[test]
    fn context_never_overrides_event_properties() {
        let ctx = LogContext::new()
            .with_property("requestMethod", "GET")
            .with_property("customerId", 1);
        let event = LogEvent::new(LogLevel::Information, "x")
            .with_property("customerId", 42)
            .with_context(&ctx);

        let keys: Vec<&str> = event.properties.keys().map(String::as_str).collect();
        assert_eq!(keys, ["customerId", "requestMethod"]);
        assert_eq!(event.properties["customerId"], 42);
    }

    #[test]
    fn timestamp_is_converted_to_utc() {
        let offset = FixedOffset::east_opt(2 * 3600).unwrap();
        let local = offset.with_ymd_and_hms(2024, 1, 1, 2, 0, 0).unwrap();
        let event = LogEvent::new(LogLevel::Debug, "x").at(local);
        assert_eq!(event.timestamp, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn exception_describes_error() {
        let err = std::io::Error::new(std::io::ErrorKind::Other, "disk on fire");
        let event = LogEvent::new(LogLevel::Error, "Boom").with_exception(&err);
        assert_eq!(event.exception.as_deref(), Some("disk on fire"));
    }
}
