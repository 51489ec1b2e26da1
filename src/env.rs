//! Environment variable names used by this crate for convenient
//! configuration of the logging layer from services.
//!
//! These are purely helpers; the formatter itself never reads the
//! environment.

/// Minimum level written, e.g. `debug` or `information`.
pub const LOG_LEVEL_ENV: &str = "LOG_LEVEL";

/// Optional `EnvFilter` directives that override [`LOG_LEVEL_ENV`], e.g.
/// `debug,hyper=info` to keep a noisy dependency at `info`.
pub const LOG_FILTER_ENV: &str = "LOG_FILTER";

/// Whether span fields are appended to events (`true`/`false`).
pub const LOG_SPAN_FIELDS_ENV: &str = "LOG_SPAN_FIELDS";

pub const DEFAULT_LOG_LEVEL: &str = "debug";

/// Read an environment variable or fall back to a provided default.
pub fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Read an optional, non-empty environment variable.
pub fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
