use crate::exception::ErrorDescription;
use crate::formatter::{FormatError, StackdriverJsonFormatter};
use crate::level::LogLevel;
use crate::record::{LogEvent, Properties};
use crate::sink::LineSink;
use chrono::Utc;
use serde_json::Value;
use std::error::Error;
use std::sync::{Arc, atomic::{AtomicU64, Ordering}};
use tracing::field::{Field, Visit};
use tracing::span::{Attributes, Id, Record};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::LookupSpan;

/// `tracing_subscriber` layer that turns every event into a Stackdriver
/// JSON line and writes it synchronously to a [`LineSink`].
///
/// The event's `message` is used as the message template. Since `tracing`
/// formats the message with `format_args!`, placeholders are written with
/// doubled braces in the macro:
///
/// ```ignore
/// info!(customer_id = 42, "Order placed for customer {{customer_id}}");
/// ```
///
/// Fields of the enclosing spans are appended after the event's own fields,
/// the innermost span winning on duplicate names.
pub struct StackdriverLayer {
    sink: Arc<dyn LineSink>,
    formatter: StackdriverJsonFormatter,
    include_span_fields: bool,
    /// Events formatted and written successfully.
    pub formatted_events: Arc<AtomicU64>,
    /// Events lost to a formatting or write error.
    pub failed_events: Arc<AtomicU64>,
}

impl StackdriverLayer {
    pub fn new(sink: Arc<dyn LineSink>) -> Self {
        StackdriverLayer {
            sink,
            formatter: StackdriverJsonFormatter::new(),
            include_span_fields: true,
            formatted_events: Arc::new(AtomicU64::new(0)),
            failed_events: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn with_span_fields(mut self, include: bool) -> Self {
        self.include_span_fields = include;
        self
    }
}

/// Fields recorded on a span, stored in its extensions.
#[derive(Debug, Default)]
struct SpanFields(Properties);

impl<S> Layer<S> for StackdriverLayer
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
        if !self.include_span_fields {
            return;
        }
        let Some(span) = ctx.span(id) else { return };

        let mut fields = SpanFields::default();
        attrs.record(&mut SpanFieldVisitor(&mut fields.0));
        span.extensions_mut().insert(fields);
    }

    fn on_record(&self, id: &Id, values: &Record<'_>, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else { return };
        let mut extensions = span.extensions_mut();
        if let Some(fields) = extensions.get_mut::<SpanFields>() {
            values.record(&mut SpanFieldVisitor(&mut fields.0));
        }
    }

    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let mut properties = Properties::new();
        let mut visitor = FieldVisitor::new(&mut properties);
        event.record(&mut visitor);
        let message = visitor.message.take().unwrap_or_default();
        let exception = visitor.exception.take();

        if self.include_span_fields {
            if let Some(scope) = ctx.event_scope(event) {
                for span in scope {
                    let extensions = span.extensions();
                    let Some(fields) = extensions.get::<SpanFields>() else { continue };
                    for (name, value) in &fields.0 {
                        if !properties.contains_key(name) {
                            properties.insert(name.clone(), value.clone());
                        }
                    }
                }
            }
        }

        let record = LogEvent {
            timestamp: Utc::now(),
            level: LogLevel::from(*event.metadata().level()),
            message_template: message,
            properties,
            exception,
        };

        let result = self
            .formatter
            .format_line(&record)
            .and_then(|line| self.sink.write_line(&line).map_err(FormatError::from));

        match result {
            Ok(()) => {
                self.formatted_events.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                self.failed_events.fetch_add(1, Ordering::Relaxed);
                eprintln!("error writing log event: {}", e);
            }
        }
    }
}

/// Collects `tracing` fields into event properties, pulling out the
/// `message` and the `exception`/`error` field.
pub struct FieldVisitor<'a> {
    pub fields: &'a mut Properties,
    pub message: Option<String>,
    pub exception: Option<String>,
}

impl<'a> FieldVisitor<'a> {
    pub fn new(fields: &'a mut Properties) -> Self {
        FieldVisitor { fields, message: None, exception: None }
    }

    fn is_exception_field(field: &Field) -> bool {
        matches!(field.name(), "exception" | "error")
    }

    fn insert(&mut self, field: &Field, value: Value) {
        self.fields.insert(field.name().to_string(), value);
    }
}

impl<'a> Visit for FieldVisitor<'a> {
    fn record_f64(&mut self, field: &Field, value: f64) {
        self.insert(field, Value::from(value));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.insert(field, Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.insert(field, Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.insert(field, Value::from(value));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = Some(value.to_string());
        } else if Self::is_exception_field(field) && self.exception.is_none() {
            self.exception = Some(value.to_string());
        } else {
            self.insert(field, Value::String(value.to_string()));
        }
    }

    fn record_error(&mut self, field: &Field, value: &(dyn Error + 'static)) {
        if Self::is_exception_field(field) && self.exception.is_none() {
            self.exception = Some(value.describe());
        } else {
            self.insert(field, Value::String(value.describe()));
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = Some(format!("{:?}", value));
        } else if Self::is_exception_field(field) && self.exception.is_none() {
            self.exception = Some(format!("{:?}", value));
        } else {
            self.insert(field, Value::String(format!("{:?}", value)));
        }
    }
}

/// Records span fields under their own names. Spans carry context only, so
/// nothing is pulled out as message or exception.
struct SpanFieldVisitor<'a>(&'a mut Properties);

impl<'a> SpanFieldVisitor<'a> {
    fn insert(&mut self, field: &Field, value: Value) {
        self.0.insert(field.name().to_string(), value);
    }
}

impl<'a> Visit for SpanFieldVisitor<'a> {
    fn record_f64(&mut self, field: &Field, value: f64) {
        self.insert(field, Value::from(value));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.insert(field, Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.insert(field, Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.insert(field, Value::from(value));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.insert(field, Value::String(value.to_string()));
    }

    fn record_error(&mut self, field: &Field, value: &(dyn Error + 'static)) {
        self.insert(field, Value::String(value.describe()));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.insert(field, Value::String(format!("{:?}", value)));
    }
}
