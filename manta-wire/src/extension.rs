//! Container extension registering the document manager.

use manta_odm::{DocumentManager, OdmConfig, create_document_manager};
use smol_str::SmolStr;
use tracing::info;

use crate::container::ServiceContainer;
use crate::error::WireResult;

/// Public service name the document manager is aliased under.
pub const DOCUMENT_MANAGER_SERVICE: &str = "document_manager";

/// Wires a document manager into a [`ServiceContainer`].
///
/// Registers two names resolving to the same singleton: the canonical,
/// prefixed one and the public [`DOCUMENT_MANAGER_SERVICE`] alias.
/// Registration has no side effects beyond the definitions; the object
/// graph is built when the service is first resolved.
///
/// # Example
///
/// ```rust,ignore
/// use manta_odm::OdmConfig;
/// use manta_wire::{DocumentManagerExtension, ServiceContainer};
///
/// let container = ServiceContainer::new();
/// let extension = DocumentManagerExtension::new("mongo", OdmConfig::default());
/// extension.load_configuration(&container)?;
///
/// let dm = container
///     .resolve::<manta_odm::DocumentManager>("document_manager")
///     .await?;
/// ```
#[derive(Debug)]
pub struct DocumentManagerExtension {
    prefix: SmolStr,
    config: OdmConfig,
}

impl DocumentManagerExtension {
    /// Create an extension with the given service-name prefix and
    /// configuration. Omitted configuration options carry their documented
    /// defaults.
    pub fn new(prefix: impl Into<SmolStr>, config: OdmConfig) -> Self {
        Self {
            prefix: prefix.into(),
            config,
        }
    }

    /// The configured prefix.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// The canonical (prefixed) service name.
    pub fn service_name(&self) -> String {
        format!("{}.{}", self.prefix, DOCUMENT_MANAGER_SERVICE)
    }

    /// Populate the container definitions.
    pub fn load_configuration(&self, container: &ServiceContainer) -> WireResult<()> {
        let service_name = self.service_name();
        let config = self.config.clone();

        container.register::<DocumentManager, _, _>(service_name.as_str(), move || {
            let config = config.clone();
            async move {
                create_document_manager(&config)
                    .await
                    .map_err(Into::into)
            }
        })?;
        container.alias(DOCUMENT_MANAGER_SERVICE, service_name.as_str())?;

        info!(
            service = %service_name,
            alias = DOCUMENT_MANAGER_SERVICE,
            "document manager registered"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use manta_odm::ConnectOptions;
    use pretty_assertions::assert_eq;

    use super::*;

    fn offline_config() -> OdmConfig {
        // Nothing listens on this port; construction degrades to an
        // offline manager after a short ping timeout.
        OdmConfig::builder()
            .uri("mongodb://127.0.0.1:9/app")
            .connect_options(ConnectOptions {
                connect_timeout: Some(Duration::from_millis(200)),
                server_selection_timeout: Some(Duration::from_millis(200)),
                ..ConnectOptions::default()
            })
            .build()
    }

    #[test]
    fn test_registration_is_lazy() {
        let container = ServiceContainer::new();
        let extension = DocumentManagerExtension::new("mongo", offline_config());
        extension.load_configuration(&container).unwrap();

        // Both names exist, nothing constructed yet.
        assert!(container.is_registered("mongo.document_manager"));
        assert!(container.is_registered(DOCUMENT_MANAGER_SERVICE));
        assert_eq!(container.service_names().len(), 1);
    }

    #[tokio::test]
    async fn test_both_names_resolve_the_same_singleton() {
        let container = ServiceContainer::new();
        let extension = DocumentManagerExtension::new("mongo", offline_config());
        extension.load_configuration(&container).unwrap();

        let canonical: Arc<DocumentManager> =
            container.resolve("mongo.document_manager").await.unwrap();
        let aliased: Arc<DocumentManager> =
            container.resolve(DOCUMENT_MANAGER_SERVICE).await.unwrap();

        assert!(Arc::ptr_eq(&canonical, &aliased));
        assert!(!canonical.is_connected());
    }

    #[test]
    fn test_double_load_rejected() {
        let container = ServiceContainer::new();
        let extension = DocumentManagerExtension::new("mongo", offline_config());
        extension.load_configuration(&container).unwrap();

        let err = extension.load_configuration(&container).unwrap_err();
        assert!(matches!(err, crate::error::WireError::DuplicateService(_)));
    }
}
