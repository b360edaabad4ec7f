//! Document-manager configuration.
//!
//! Every option has a documented default; omitted options take it. Values
//! are not validated here — a bad value surfaces from whichever component
//! receives it.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use indexmap::IndexMap;
use mongodb::options::ClientOptions;
use smol_str::SmolStr;

use crate::cache::{MetadataCache, MetadataCacheKind};
use crate::error::{OdmError, OdmResult};
use crate::events::EventManager;
use crate::logger::QueryLogFn;

/// The configuration block the factory consumes.
#[derive(Clone)]
pub struct OdmConfig {
    /// Directory scanned for mapping descriptors.
    pub documents_dir: PathBuf,
    /// Where lazy-loading proxy artifacts are emitted.
    pub proxy_dir: PathBuf,
    /// Namespace recorded in the proxy manifest.
    pub proxy_namespace: String,
    /// Where hydrator artifacts are emitted.
    pub hydrator_dir: PathBuf,
    /// Namespace recorded in the hydrator manifest.
    pub hydrator_namespace: String,
    /// Default database selected on the connection.
    pub database: String,
    /// Connection string.
    pub uri: String,
    /// Driver-level connect options.
    pub connect_options: ConnectOptions,
    /// Namespace prefix applied to the metadata cache.
    pub cache_prefix: String,
    /// Which cache implementation to build when none is supplied.
    pub metadata_cache_kind: MetadataCacheKind,
    /// Pre-built cache instance to reuse; wins over the kind.
    pub metadata_cache: Option<Arc<dyn MetadataCache>>,
    /// Whether proxy artifacts are (re)written on every build.
    pub auto_generate_proxies: bool,
    /// Whether hydrator artifacts are (re)written on every build.
    pub auto_generate_hydrators: bool,
    /// Wrap the reader in the caching decorator.
    pub cache_mappings: bool,
    /// Wrap the reader in the per-class index decorator.
    pub index_mappings: bool,
    /// Revalidate cached metadata against descriptor mtimes.
    pub debug: bool,
    /// Externally supplied event manager; a fresh one is built when absent.
    pub event_manager: Option<Arc<EventManager>>,
    /// Named behavior listener to enabled flag.
    pub listeners: IndexMap<SmolStr, bool>,
    /// Optional query-logging callback.
    pub logger: Option<QueryLogFn>,
    /// Prefix prepended to every logged query line.
    pub logger_prefix: String,
}

impl Default for OdmConfig {
    fn default() -> Self {
        Self {
            documents_dir: PathBuf::from("model/documents"),
            proxy_dir: PathBuf::from("tmp/proxies"),
            proxy_namespace: "Proxies".to_string(),
            hydrator_dir: PathBuf::from("tmp/hydrators"),
            hydrator_namespace: "Hydrators".to_string(),
            database: "app".to_string(),
            uri: "mongodb://localhost:27017/app".to_string(),
            connect_options: ConnectOptions::default(),
            cache_prefix: "app".to_string(),
            metadata_cache_kind: MetadataCacheKind::InMemory,
            metadata_cache: None,
            auto_generate_proxies: false,
            auto_generate_hydrators: false,
            cache_mappings: true,
            index_mappings: true,
            debug: false,
            event_manager: None,
            listeners: IndexMap::new(),
            logger: None,
            logger_prefix: "MongoDB query: ".to_string(),
        }
    }
}

impl OdmConfig {
    /// Create a builder.
    pub fn builder() -> OdmConfigBuilder {
        OdmConfigBuilder::new()
    }
}

impl fmt::Debug for OdmConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OdmConfig")
            .field("documents_dir", &self.documents_dir)
            .field("proxy_dir", &self.proxy_dir)
            .field("hydrator_dir", &self.hydrator_dir)
            .field("database", &self.database)
            .field("uri", &self.uri)
            .field("connect_options", &self.connect_options)
            .field("cache_prefix", &self.cache_prefix)
            .field("metadata_cache_kind", &self.metadata_cache_kind)
            .field("metadata_cache", &self.metadata_cache.is_some())
            .field("auto_generate_proxies", &self.auto_generate_proxies)
            .field("auto_generate_hydrators", &self.auto_generate_hydrators)
            .field("cache_mappings", &self.cache_mappings)
            .field("index_mappings", &self.index_mappings)
            .field("debug", &self.debug)
            .field("event_manager", &self.event_manager.is_some())
            .field("listeners", &self.listeners)
            .field("logger", &self.logger.is_some())
            .field("logger_prefix", &self.logger_prefix)
            .finish()
    }
}

/// Driver-level connect options applied on top of the URI.
#[derive(Debug, Clone)]
pub struct ConnectOptions {
    /// Application name shown in server logs.
    pub app_name: Option<String>,
    /// Minimum connection pool size.
    pub min_pool_size: Option<u32>,
    /// Maximum connection pool size.
    pub max_pool_size: Option<u32>,
    /// Connection timeout.
    pub connect_timeout: Option<Duration>,
    /// Server selection timeout; also bounds the startup ping.
    pub server_selection_timeout: Option<Duration>,
    /// Direct connection (bypass replica set discovery).
    pub direct_connection: Option<bool>,
}

impl Default for ConnectOptions {
    fn default() -> Self {
        Self {
            app_name: Some("manta".to_string()),
            min_pool_size: None,
            max_pool_size: Some(10),
            connect_timeout: Some(Duration::from_secs(10)),
            server_selection_timeout: Some(Duration::from_secs(30)),
            direct_connection: None,
        }
    }
}

impl ConnectOptions {
    /// Parse `uri` and apply these options on top.
    pub async fn to_client_options(&self, uri: &str) -> OdmResult<ClientOptions> {
        let mut options = ClientOptions::parse(uri)
            .await
            .map_err(|e| OdmError::config(format!("failed to parse URI: {e}")))?;

        if let Some(ref app_name) = self.app_name {
            options.app_name = Some(app_name.clone());
        }
        if let Some(min_pool) = self.min_pool_size {
            options.min_pool_size = Some(min_pool);
        }
        if let Some(max_pool) = self.max_pool_size {
            options.max_pool_size = Some(max_pool);
        }
        if let Some(connect_timeout) = self.connect_timeout {
            options.connect_timeout = Some(connect_timeout);
        }
        if let Some(selection_timeout) = self.server_selection_timeout {
            options.server_selection_timeout = Some(selection_timeout);
        }
        if let Some(direct) = self.direct_connection {
            options.direct_connection = Some(direct);
        }

        Ok(options)
    }
}

/// Builder for [`OdmConfig`].
#[derive(Default)]
pub struct OdmConfigBuilder {
    config: OdmConfig,
}

impl OdmConfigBuilder {
    /// Create a builder with all defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the documents directory.
    pub fn documents_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.documents_dir = dir.into();
        self
    }

    /// Set the proxy artifact directory.
    pub fn proxy_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.proxy_dir = dir.into();
        self
    }

    /// Set the proxy namespace.
    pub fn proxy_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.config.proxy_namespace = namespace.into();
        self
    }

    /// Set the hydrator artifact directory.
    pub fn hydrator_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.hydrator_dir = dir.into();
        self
    }

    /// Set the hydrator namespace.
    pub fn hydrator_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.config.hydrator_namespace = namespace.into();
        self
    }

    /// Set the default database name.
    pub fn database(mut self, database: impl Into<String>) -> Self {
        self.config.database = database.into();
        self
    }

    /// Set the connection string.
    pub fn uri(mut self, uri: impl Into<String>) -> Self {
        self.config.uri = uri.into();
        self
    }

    /// Set the driver-level connect options.
    pub fn connect_options(mut self, options: ConnectOptions) -> Self {
        self.config.connect_options = options;
        self
    }

    /// Set the metadata cache namespace prefix.
    pub fn cache_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.cache_prefix = prefix.into();
        self
    }

    /// Set the cache implementation to build.
    pub fn metadata_cache_kind(mut self, kind: MetadataCacheKind) -> Self {
        self.config.metadata_cache_kind = kind;
        self
    }

    /// Reuse a pre-built cache instance.
    pub fn metadata_cache(mut self, cache: Arc<dyn MetadataCache>) -> Self {
        self.config.metadata_cache = Some(cache);
        self
    }

    /// Enable or disable proxy artifact generation at build time.
    pub fn auto_generate_proxies(mut self, enabled: bool) -> Self {
        self.config.auto_generate_proxies = enabled;
        self
    }

    /// Enable or disable hydrator artifact generation at build time.
    pub fn auto_generate_hydrators(mut self, enabled: bool) -> Self {
        self.config.auto_generate_hydrators = enabled;
        self
    }

    /// Enable or disable the caching reader decorator.
    pub fn cache_mappings(mut self, enabled: bool) -> Self {
        self.config.cache_mappings = enabled;
        self
    }

    /// Enable or disable the indexing reader decorator.
    pub fn index_mappings(mut self, enabled: bool) -> Self {
        self.config.index_mappings = enabled;
        self
    }

    /// Enable or disable debug revalidation of cached metadata.
    pub fn debug(mut self, enabled: bool) -> Self {
        self.config.debug = enabled;
        self
    }

    /// Supply an event manager to reuse.
    pub fn event_manager(mut self, events: Arc<EventManager>) -> Self {
        self.config.event_manager = Some(events);
        self
    }

    /// Enable or disable one named listener.
    pub fn listener(mut self, name: impl Into<SmolStr>, enabled: bool) -> Self {
        self.config.listeners.insert(name.into(), enabled);
        self
    }

    /// Set the query-logging callback.
    pub fn logger(mut self, logger: QueryLogFn) -> Self {
        self.config.logger = Some(logger);
        self
    }

    /// Set the query log line prefix.
    pub fn logger_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.logger_prefix = prefix.into();
        self
    }

    /// Build the configuration.
    pub fn build(self) -> OdmConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_documented_defaults() {
        let config = OdmConfig::default();

        assert_eq!(config.documents_dir, PathBuf::from("model/documents"));
        assert_eq!(config.proxy_dir, PathBuf::from("tmp/proxies"));
        assert_eq!(config.proxy_namespace, "Proxies");
        assert_eq!(config.hydrator_dir, PathBuf::from("tmp/hydrators"));
        assert_eq!(config.hydrator_namespace, "Hydrators");
        assert_eq!(config.database, "app");
        assert_eq!(config.uri, "mongodb://localhost:27017/app");
        assert_eq!(config.cache_prefix, "app");
        assert_eq!(config.metadata_cache_kind, MetadataCacheKind::InMemory);
        assert!(config.metadata_cache.is_none());
        assert!(!config.auto_generate_proxies);
        assert!(!config.auto_generate_hydrators);
        assert!(config.cache_mappings);
        assert!(config.index_mappings);
        assert!(!config.debug);
        assert!(config.event_manager.is_none());
        assert!(config.listeners.is_empty());
        assert!(config.logger.is_none());
        assert_eq!(config.logger_prefix, "MongoDB query: ");
    }

    #[test]
    fn test_builder_overrides_keep_other_defaults() {
        let config = OdmConfig::builder()
            .database("shop")
            .uri("mongodb://db.internal:27017/shop")
            .cache_prefix("shop")
            .listener("timestampable", true)
            .debug(true)
            .build();

        assert_eq!(config.database, "shop");
        assert_eq!(config.cache_prefix, "shop");
        assert_eq!(config.listeners.get("timestampable"), Some(&true));
        assert!(config.debug);
        // Untouched options keep their defaults.
        assert_eq!(config.proxy_namespace, "Proxies");
        assert!(config.cache_mappings);
    }

    #[tokio::test]
    async fn test_connect_options_applied_over_uri() {
        let options = ConnectOptions {
            max_pool_size: Some(20),
            server_selection_timeout: Some(Duration::from_millis(250)),
            ..ConnectOptions::default()
        };

        let client_options = options
            .to_client_options("mongodb://localhost:27017/app")
            .await
            .unwrap();

        assert_eq!(client_options.app_name.as_deref(), Some("manta"));
        assert_eq!(client_options.max_pool_size, Some(20));
        assert_eq!(
            client_options.server_selection_timeout,
            Some(Duration::from_millis(250))
        );
    }

    #[tokio::test]
    async fn test_invalid_uri_is_a_config_error() {
        let err = ConnectOptions::default()
            .to_client_options("not-a-uri")
            .await
            .unwrap_err();
        assert!(err.is_config_error());
    }
}
