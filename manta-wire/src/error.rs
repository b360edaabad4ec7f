//! Error types for the service container.

use manta_odm::OdmError;
use thiserror::Error;

/// Result type for container operations.
pub type WireResult<T> = Result<T, WireError>;

/// Errors that can occur while registering or resolving services.
#[derive(Error, Debug)]
pub enum WireError {
    /// No service is registered under the given name.
    #[error("service not found: {0}")]
    ServiceNotFound(String),

    /// A service or alias is already registered under the given name.
    #[error("service already registered: {0}")]
    DuplicateService(String),

    /// The service resolved, but not to the requested type.
    #[error("service {name} is not a {expected}")]
    TypeMismatch {
        /// The requested service name.
        name: String,
        /// The requested type.
        expected: &'static str,
    },

    /// The service factory failed.
    #[error("service construction failed: {0}")]
    Construction(String),
}

impl WireError {
    /// Create a not found error.
    pub fn service_not_found(name: impl Into<String>) -> Self {
        Self::ServiceNotFound(name.into())
    }

    /// Create a duplicate registration error.
    pub fn duplicate(name: impl Into<String>) -> Self {
        Self::DuplicateService(name.into())
    }

    /// Check if this is a not found error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ServiceNotFound(_))
    }

    /// Check if this is a construction failure.
    pub fn is_construction_error(&self) -> bool {
        matches!(self, Self::Construction(_))
    }
}

impl From<OdmError> for WireError {
    fn from(err: OdmError) -> Self {
        Self::Construction(err.to_string())
    }
}
