use crate::level::LogLevel;
use serde::Serialize;
use std::fmt;

/// Log severity as understood by Stackdriver / Cloud Logging.
///
/// See <https://cloud.google.com/logging/docs/reference/v2/rest/v2/LogEntry#LogSeverity>.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Default,
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Default => "DEFAULT",
            Severity::Debug => "DEBUG",
            Severity::Info => "INFO",
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
            Severity::Critical => "CRITICAL",
        }
    }

    /// Map a raw level name, falling back to [`Severity::Default`] for
    /// anything that is not a known [`LogLevel`].
    pub fn from_level_name(name: &str) -> Self {
        name.parse::<LogLevel>()
            .map(Severity::from)
            .unwrap_or(Severity::Default)
    }
}

impl From<LogLevel> for Severity {
    fn from(level: LogLevel) -> Self {
        match level {
            // Stackdriver has no verbose level.
            LogLevel::Verbose | LogLevel::Debug => Severity::Debug,
            LogLevel::Information => Severity::Info,
            LogLevel::Warning => Severity::Warning,
            LogLevel::Error => Severity::Error,
            LogLevel::Fatal => Severity::Critical,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_every_level() {
        let mapped: Vec<&str> = LogLevel::ALL
            .iter()
            .map(|l| Severity::from(*l).as_str())
            .collect();
        assert_eq!(mapped, ["DEBUG", "DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"]);
    }

    #[test]
    fn unknown_level_name_falls_back_to_default() {
        assert_eq!(Severity::from_level_name("notice"), Severity::Default);
        assert_eq!(Severity::from_level_name(""), Severity::Default);
        assert_eq!(Severity::from_level_name("fatal"), Severity::Critical);
    }

    #[test]
    fn serializes_in_backend_vocabulary() {
        let json = serde_json::to_string(&Severity::Warning).unwrap();
        assert_eq!(json, "\"WARNING\"");
        assert_eq!(serde_json::to_string(&Severity::Default).unwrap(), "\"DEFAULT\"");
    }
}
