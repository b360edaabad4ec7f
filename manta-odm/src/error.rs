//! Error types for document-manager construction and operations.

use thiserror::Error;

/// Result type for ODM operations.
pub type OdmResult<T> = Result<T, OdmError>;

/// Errors that can occur while building or using a document manager.
#[derive(Error, Debug)]
pub enum OdmError {
    /// MongoDB driver error.
    #[error("mongodb error: {0}")]
    Driver(#[from] mongodb::error::Error),

    /// BSON serialization error.
    #[error("bson error: {0}")]
    Bson(#[from] bson::ser::Error),

    /// BSON deserialization error.
    #[error("bson deserialization error: {0}")]
    BsonDe(#[from] bson::de::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Connection error.
    #[error("connection error: {0}")]
    Connection(String),

    /// Mapping metadata error.
    #[error("metadata error: {0}")]
    Metadata(String),

    /// A mapping descriptor could not be parsed.
    #[error("invalid mapping descriptor for {class}: {source}")]
    Descriptor {
        /// The class whose descriptor failed to parse.
        class: String,
        /// The underlying TOML error.
        #[source]
        source: toml::de::Error,
    },

    /// Proxy or hydrator artifact generation failed.
    #[error("artifact generation failed: {0}")]
    Generation(String),

    /// No mapping metadata found for a class.
    #[error("no mapping found for class: {0}")]
    NotFound(String),
}

impl OdmError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a connection error.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection(message.into())
    }

    /// Create a metadata error.
    pub fn metadata(message: impl Into<String>) -> Self {
        Self::Metadata(message.into())
    }

    /// Create an artifact generation error.
    pub fn generation(message: impl Into<String>) -> Self {
        Self::Generation(message.into())
    }

    /// Create a not found error.
    pub fn not_found(class: impl Into<String>) -> Self {
        Self::NotFound(class.into())
    }

    /// Check if this is a connection error.
    pub fn is_connection_error(&self) -> bool {
        matches!(self, Self::Connection(_))
    }

    /// Check if this is a not found error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Check if this is a configuration error.
    pub fn is_config_error(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = OdmError::config("bad cache prefix");
        assert!(err.is_config_error());

        let err = OdmError::connection("server unreachable");
        assert!(err.is_connection_error());

        let err = OdmError::not_found("User");
        assert!(err.is_not_found());
    }

    #[test]
    fn test_error_display() {
        let err = OdmError::connection("document manager is offline");
        assert_eq!(
            err.to_string(),
            "connection error: document manager is offline"
        );

        let err = OdmError::NotFound("User".to_string());
        assert_eq!(err.to_string(), "no mapping found for class: User");
    }
}
