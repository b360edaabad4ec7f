//! The mapping configuration object the factory assembles.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use bson::Document;
use indexmap::IndexMap;
use serde::Serialize;
use smol_str::SmolStr;
use tracing::{debug, info};

use crate::cache::MetadataCache;
use crate::driver::MappingDriver;
use crate::error::{OdmError, OdmResult};
use crate::logger::QueryLogger;

/// Holds everything the document manager needs besides the connection:
/// artifact settings, metadata cache and driver, default database, query
/// filters, and the query logger.
pub struct MappingConfiguration {
    proxy_dir: PathBuf,
    proxy_namespace: String,
    hydrator_dir: PathBuf,
    hydrator_namespace: String,
    auto_generate_proxies: bool,
    auto_generate_hydrators: bool,
    metadata_cache: Option<Arc<dyn MetadataCache>>,
    driver: Option<Arc<MappingDriver>>,
    default_database: String,
    filters: IndexMap<SmolStr, Document>,
    logger: Option<QueryLogger>,
}

impl MappingConfiguration {
    /// Create an empty configuration.
    pub fn new() -> Self {
        Self {
            proxy_dir: PathBuf::from("tmp/proxies"),
            proxy_namespace: "Proxies".to_string(),
            hydrator_dir: PathBuf::from("tmp/hydrators"),
            hydrator_namespace: "Hydrators".to_string(),
            auto_generate_proxies: false,
            auto_generate_hydrators: false,
            metadata_cache: None,
            driver: None,
            default_database: String::new(),
            filters: IndexMap::new(),
            logger: None,
        }
    }

    /// Set the proxy artifact directory.
    pub fn set_proxy_dir(&mut self, dir: impl Into<PathBuf>) {
        self.proxy_dir = dir.into();
    }

    /// The proxy artifact directory.
    pub fn proxy_dir(&self) -> &Path {
        &self.proxy_dir
    }

    /// Set the proxy namespace.
    pub fn set_proxy_namespace(&mut self, namespace: impl Into<String>) {
        self.proxy_namespace = namespace.into();
    }

    /// The proxy namespace.
    pub fn proxy_namespace(&self) -> &str {
        &self.proxy_namespace
    }

    /// Set the hydrator artifact directory.
    pub fn set_hydrator_dir(&mut self, dir: impl Into<PathBuf>) {
        self.hydrator_dir = dir.into();
    }

    /// The hydrator artifact directory.
    pub fn hydrator_dir(&self) -> &Path {
        &self.hydrator_dir
    }

    /// Set the hydrator namespace.
    pub fn set_hydrator_namespace(&mut self, namespace: impl Into<String>) {
        self.hydrator_namespace = namespace.into();
    }

    /// The hydrator namespace.
    pub fn hydrator_namespace(&self) -> &str {
        &self.hydrator_namespace
    }

    /// Set whether proxy artifacts are (re)written at build time.
    pub fn set_auto_generate_proxies(&mut self, enabled: bool) {
        self.auto_generate_proxies = enabled;
    }

    /// Whether proxy artifacts are written at build time.
    pub fn auto_generate_proxies(&self) -> bool {
        self.auto_generate_proxies
    }

    /// Set whether hydrator artifacts are (re)written at build time.
    pub fn set_auto_generate_hydrators(&mut self, enabled: bool) {
        self.auto_generate_hydrators = enabled;
    }

    /// Whether hydrator artifacts are written at build time.
    pub fn auto_generate_hydrators(&self) -> bool {
        self.auto_generate_hydrators
    }

    /// Attach the metadata cache.
    pub fn set_metadata_cache(&mut self, cache: Arc<dyn MetadataCache>) {
        self.metadata_cache = Some(cache);
    }

    /// The attached metadata cache.
    pub fn metadata_cache(&self) -> Option<&Arc<dyn MetadataCache>> {
        self.metadata_cache.as_ref()
    }

    /// Attach the mapping driver.
    pub fn set_metadata_driver(&mut self, driver: Arc<MappingDriver>) {
        self.driver = Some(driver);
    }

    /// The attached mapping driver.
    pub fn metadata_driver(&self) -> Option<&Arc<MappingDriver>> {
        self.driver.as_ref()
    }

    /// Set the default database name.
    pub fn set_default_database(&mut self, name: impl Into<String>) {
        self.default_database = name.into();
    }

    /// The default database name.
    pub fn default_database(&self) -> &str {
        &self.default_database
    }

    /// Register a query filter under `name`.
    pub fn add_filter(&mut self, name: impl Into<SmolStr>, criteria: Document) {
        self.filters.insert(name.into(), criteria);
    }

    /// Look up a registered filter.
    pub fn filter(&self, name: &str) -> Option<&Document> {
        self.filters.get(name)
    }

    /// Names of registered filters, in registration order.
    pub fn filter_names(&self) -> impl Iterator<Item = &str> {
        self.filters.keys().map(|k| k.as_str())
    }

    /// Attach the query logger.
    pub fn set_logger(&mut self, logger: QueryLogger) {
        self.logger = Some(logger);
    }

    /// The attached query logger.
    pub fn logger(&self) -> Option<&QueryLogger> {
        self.logger.as_ref()
    }

    /// Write artifact manifests for the enabled kinds.
    ///
    /// With both auto-generate flags off this touches the filesystem not at
    /// all; pre-generated artifacts are then the caller's responsibility.
    pub fn prepare_artifacts(&self, classes: &[SmolStr]) -> OdmResult<()> {
        if self.auto_generate_proxies {
            write_manifest(&self.proxy_dir, &self.proxy_namespace, classes)?;
            info!(dir = %self.proxy_dir.display(), "proxy manifest written");
        }
        if self.auto_generate_hydrators {
            write_manifest(&self.hydrator_dir, &self.hydrator_namespace, classes)?;
            info!(dir = %self.hydrator_dir.display(), "hydrator manifest written");
        }
        Ok(())
    }
}

impl Default for MappingConfiguration {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MappingConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MappingConfiguration")
            .field("proxy_dir", &self.proxy_dir)
            .field("proxy_namespace", &self.proxy_namespace)
            .field("hydrator_dir", &self.hydrator_dir)
            .field("hydrator_namespace", &self.hydrator_namespace)
            .field("auto_generate_proxies", &self.auto_generate_proxies)
            .field("auto_generate_hydrators", &self.auto_generate_hydrators)
            .field("metadata_cache", &self.metadata_cache.is_some())
            .field("driver", &self.driver.is_some())
            .field("default_database", &self.default_database)
            .field("filters", &self.filters.keys().collect::<Vec<_>>())
            .field("logger", &self.logger)
            .finish()
    }
}

#[derive(Serialize)]
struct Manifest<'a> {
    namespace: &'a str,
    classes: &'a [SmolStr],
}

fn write_manifest(dir: &Path, namespace: &str, classes: &[SmolStr]) -> OdmResult<()> {
    fs::create_dir_all(dir)
        .map_err(|e| OdmError::generation(format!("cannot create {}: {}", dir.display(), e)))?;

    let manifest = toml::to_string(&Manifest { namespace, classes })
        .map_err(|e| OdmError::generation(format!("cannot render manifest: {e}")))?;

    let path = dir.join("manifest.toml");
    fs::write(&path, manifest)
        .map_err(|e| OdmError::generation(format!("cannot write {}: {}", path.display(), e)))?;

    debug!(path = %path.display(), classes = classes.len(), "manifest written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use bson::doc;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_defaults() {
        let configuration = MappingConfiguration::new();
        assert_eq!(configuration.proxy_namespace(), "Proxies");
        assert_eq!(configuration.hydrator_namespace(), "Hydrators");
        assert!(!configuration.auto_generate_proxies());
        assert!(configuration.metadata_driver().is_none());
    }

    #[test]
    fn test_filters_keep_registration_order() {
        let mut configuration = MappingConfiguration::new();
        configuration.add_filter("soft-deleteable", doc! { "deleted_at": null });
        configuration.add_filter("tenant", doc! { "tenant_id": 1 });

        assert!(configuration.filter("soft-deleteable").is_some());
        let names: Vec<_> = configuration.filter_names().collect();
        assert_eq!(names, vec!["soft-deleteable", "tenant"]);
    }

    #[test]
    fn test_disabled_generation_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let proxy_dir = dir.path().join("proxies");

        let mut configuration = MappingConfiguration::new();
        configuration.set_proxy_dir(&proxy_dir);
        configuration.set_hydrator_dir(dir.path().join("hydrators"));

        configuration
            .prepare_artifacts(&[SmolStr::new("User")])
            .unwrap();
        assert!(!proxy_dir.exists());
        assert!(!dir.path().join("hydrators").exists());
    }

    #[test]
    fn test_enabled_generation_writes_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let proxy_dir = dir.path().join("proxies");

        let mut configuration = MappingConfiguration::new();
        configuration.set_proxy_dir(&proxy_dir);
        configuration.set_auto_generate_proxies(true);

        configuration
            .prepare_artifacts(&[SmolStr::new("User"), SmolStr::new("Order")])
            .unwrap();

        let manifest = fs::read_to_string(proxy_dir.join("manifest.toml")).unwrap();
        assert!(manifest.contains("Proxies"));
        assert!(manifest.contains("User"));
        assert!(manifest.contains("Order"));
    }
}
