pub mod level;
pub mod severity;
pub mod fingerprint;
pub mod template;
pub mod exception;
pub mod record;
pub mod formatter;
pub mod sink;
pub mod noop_sink;
pub mod logger;
pub mod layer;

pub mod env;
pub mod init;

pub use formatter::{FormatError, StackdriverJsonFormatter};
pub use level::LogLevel;
pub use record::{LogContext, LogEvent, Properties};
pub use severity::Severity;
