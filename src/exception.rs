use std::error::Error;

/// Anything that can describe itself as the `exception` text of a log entry.
///
/// Every [`std::error::Error`] gets an implementation that renders the error
/// followed by its `source()` chain, one `Caused by:` line per cause.
pub trait ErrorDescription {
    fn describe(&self) -> String;
}

impl<E: Error + ?Sized> ErrorDescription for E {
    fn describe(&self) -> String {
        let mut out = self.to_string();
        let mut source = self.source();
        while let Some(cause) = source {
            out.push_str("\nCaused by: ");
            out.push_str(&cause.to_string());
            source = cause.source();
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(thiserror::Error, Debug)]
    #[error("request failed")]
    struct Outer(#[source] std::io::Error);

    #[test]
    fn includes_cause_chain() {
        let err = Outer(std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"));
        assert_eq!(err.describe(), "request failed\nCaused by: no such file");
    }

    #[test]
    fn works_through_trait_objects() {
        let err: Box<dyn Error + Send + Sync> = "plain message".into();
        assert_eq!(err.as_ref().describe(), "plain message");
    }
}
