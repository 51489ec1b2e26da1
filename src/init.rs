use crate::env::{env_opt, env_or, DEFAULT_LOG_LEVEL, LOG_FILTER_ENV, LOG_LEVEL_ENV, LOG_SPAN_FIELDS_ENV};
use crate::layer::StackdriverLayer;
use crate::level::{LogLevel, ParseLevelError};
use crate::sink::LineSink;
use serde::Deserialize;
use std::sync::Arc;
use tracing_subscriber::filter::{EnvFilter, ParseError};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Registry;

/// Configuration of the logging layer.
///
/// **Fields**
/// - `min_level`: events below this level are not written.
/// - `directives`: optional `EnvFilter` directives; when set they replace
///   `min_level` entirely (e.g. `debug,hyper=info`).
/// - `include_span_fields`: append the fields of enclosing spans to each
///   event as context properties.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct LayerConfig {
    pub min_level: LogLevel,
    pub directives: Option<String>,
    pub include_span_fields: bool,
}

impl Default for LayerConfig {
    fn default() -> Self {
        Self {
            min_level: LogLevel::Debug,
            directives: None,
            include_span_fields: true,
        }
    }
}

impl LayerConfig {
    /// Build a config from `LOG_LEVEL`, `LOG_FILTER` and `LOG_SPAN_FIELDS`.
    pub fn from_env() -> Result<Self, InitError> {
        let min_level = env_or(LOG_LEVEL_ENV, DEFAULT_LOG_LEVEL).parse()?;
        let include_span_fields = match env_opt(LOG_SPAN_FIELDS_ENV) {
            Some(v) => parse_bool(&v).ok_or(InitError::InvalidFlag(LOG_SPAN_FIELDS_ENV, v))?,
            None => true,
        };
        Ok(LayerConfig {
            min_level,
            directives: env_opt(LOG_FILTER_ENV),
            include_span_fields,
        })
    }

    pub fn env_filter(&self) -> Result<EnvFilter, InitError> {
        let filter = match &self.directives {
            Some(directives) => EnvFilter::try_new(directives)?,
            None => EnvFilter::try_new(self.min_level.to_level_filter().to_string())?,
        };
        Ok(filter)
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Error returned when the logging layer cannot be installed.
#[derive(thiserror::Error, Debug)]
pub enum InitError {
    #[error(transparent)]
    InvalidLevel(#[from] ParseLevelError),

    #[error("invalid log filter directives: {0}")]
    InvalidFilter(#[from] ParseError),

    #[error("invalid value for {0}: {1:?}")]
    InvalidFlag(&'static str, String),

    #[error("a global tracing subscriber is already installed")]
    AlreadyInstalled(#[from] tracing::subscriber::SetGlobalDefaultError),
}

/// Initialize the global `tracing` subscriber with the provided sink and
/// [`LayerConfig`].
///
/// **Effects**
///
/// Installs a [`Registry`] with an [`EnvFilter`] and a
/// [`StackdriverLayer`] as the global default subscriber, so every
/// `tracing` event in the process is written as one JSON line.
pub fn init_tracing_with_config(sink: Arc<dyn LineSink>, config: LayerConfig) -> Result<(), InitError> {
    let filter = config.env_filter()?;
    let layer = StackdriverLayer::new(sink).with_span_fields(config.include_span_fields);

    let subscriber = Registry::default().with(filter).with(layer);
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

/// Initialize tracing with the configuration read from the environment.
pub fn init_tracing(sink: Arc<dyn LineSink>) -> Result<(), InitError> {
    init_tracing_with_config(sink, LayerConfig::from_env()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_partial_config() {
        let config: LayerConfig =
            serde_json::from_str(r#"{"min_level":"warning","include_span_fields":false}"#).unwrap();
        assert_eq!(config.min_level, LogLevel::Warning);
        assert!(config.directives.is_none());
        assert!(!config.include_span_fields);
    }

    #[test]
    fn rejects_unknown_level_in_config() {
        assert!(serde_json::from_str::<LayerConfig>(r#"{"min_level":"loud"}"#).is_err());
    }

    #[test]
    fn builds_filters() {
        assert!(LayerConfig::default().env_filter().is_ok());

        let config = LayerConfig {
            directives: Some("debug,hyper=info".to_string()),
            ..LayerConfig::default()
        };
        assert!(config.env_filter().is_ok());

        let bad = LayerConfig {
            directives: Some("app=notalevel".to_string()),
            ..LayerConfig::default()
        };
        assert!(matches!(bad.env_filter(), Err(InitError::InvalidFilter(_))));
    }

    #[test]
    fn parses_flags() {
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool("off"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }
}
