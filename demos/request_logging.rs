use std::sync::Arc;

use serde_json::json;
use tracing::{error, info, info_span, warn};

use stackdriver_log_format::env::env_or;
use stackdriver_log_format::init::init_tracing;
use stackdriver_log_format::logger::Logger;
use stackdriver_log_format::sink::StdoutSink;
use stackdriver_log_format::{LogLevel, Properties};

#[derive(Debug, thiserror::Error)]
#[error("Oh noes, it's broken (intentionally)")]
struct Crash;

fn crash() -> Result<(), Crash> {
    Err(Crash)
}

/// What a request handler does with an explicitly passed logger.
fn home(logger: &Logger, method: &str, url: &str) -> Result<(), Box<dyn std::error::Error>> {
    let request = logger
        .for_context("requestMethod", method)
        .for_context("requestUrl", url);

    let mut props = Properties::new();
    props.insert("customerId".to_string(), json!(42));
    request.information("Structured logging for customer ID {customerId}.", props)?;
    request.warning("Ooooo, this is a warning!", Properties::new())?;

    if let Err(e) = crash() {
        request.error_with(&e, "Look: An intentional error.", Properties::new())?;
    }
    Ok(())
}

/// The same handler written against `tracing`, using a span for context.
fn home_traced(method: &str, url: &str) {
    let span = info_span!("request", requestMethod = method, requestUrl = url);
    let _guard = span.enter();

    info!(customerId = 42, "Structured logging for customer ID {{customerId}}.");
    warn!("Ooooo, this is a warning!");
    if let Err(e) = crash() {
        error!(error = &e as &(dyn std::error::Error + 'static), "Look: An intentional error.");
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let port = env_or("PORT", "6100");
    let hostname = env_or("HOSTNAME", "localhost");
    let url = format!("http://{}:{}/", hostname, port);

    let level: LogLevel = env_or("LOG_LEVEL", "debug").parse()?;
    let logger = Logger::new(Arc::new(StdoutSink), level);
    logger.information("Logging demo starting...", Properties::new())?;
    home(&logger, "GET", &url)?;

    init_tracing(Arc::new(StdoutSink))?;
    home_traced("GET", &url);

    logger.flush()?;
    Ok(())
}
