//! Query logging.

use std::fmt;
use std::sync::Arc;

use bson::Document;
use tracing::debug;

/// Caller-supplied logging callback; receives the rendered log line.
pub type QueryLogFn = Arc<dyn Fn(&str) + Send + Sync>;

/// Announces executed queries through an optional callback.
///
/// Every line is prefixed with the configured prefix. Lines are also
/// emitted at debug level through `tracing` regardless of the callback.
#[derive(Clone)]
pub struct QueryLogger {
    callback: Option<QueryLogFn>,
    prefix: String,
}

impl QueryLogger {
    /// Create a logger with the given callback and prefix.
    pub fn new(callback: Option<QueryLogFn>, prefix: impl Into<String>) -> Self {
        Self {
            callback,
            prefix: prefix.into(),
        }
    }

    /// The configured prefix.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Whether a caller callback is attached.
    pub fn has_callback(&self) -> bool {
        self.callback.is_some()
    }

    /// Announce one query.
    pub fn log_query(&self, query: &Document) {
        let line = format!("{}{}", self.prefix, query);
        debug!(query = %line, "query executed");
        if let Some(callback) = &self.callback {
            callback(&line);
        }
    }
}

impl fmt::Debug for QueryLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryLogger")
            .field("prefix", &self.prefix)
            .field("callback", &self.callback.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use bson::doc;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_lines_are_prefixed() {
        let lines = Arc::new(Mutex::new(Vec::new()));
        let sink = lines.clone();
        let callback: QueryLogFn = Arc::new(move |line| sink.lock().unwrap().push(line.to_string()));

        let logger = QueryLogger::new(Some(callback), "MongoDB query: ");
        logger.log_query(&doc! { "ping": 1 });

        let lines = lines.lock().unwrap();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("MongoDB query: "));
        assert!(lines[0].contains("ping"));
    }

    #[test]
    fn test_logging_without_callback_is_a_noop() {
        let logger = QueryLogger::new(None, "q: ");
        assert!(!logger.has_callback());
        logger.log_query(&doc! { "find": "users" });
    }
}
