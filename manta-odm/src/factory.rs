//! Ordered construction of the document manager.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::behaviors::{SOFT_DELETE_FILTER, configure_listener, register_behaviors, soft_delete_criteria};
use crate::cache::{MetadataCache, NamespacedCache};
use crate::config::OdmConfig;
use crate::connection::Connection;
use crate::driver::MappingDriver;
use crate::error::OdmResult;
use crate::events::EventManager;
use crate::logger::QueryLogger;
use crate::manager::DocumentManager;
use crate::mapping::MappingConfiguration;
use crate::reader::{CachedReader, DescriptorReader, IndexedReader, MetadataReader};

/// Build one ready-to-use document manager from a configuration block.
///
/// Construction order is a contract; later steps depend on earlier ones:
/// event manager, mapping configuration, metadata cache, reader chain,
/// behaviors, driver and default database, query logger, connection.
///
/// Connection policy: an unreachable server is tolerated. The startup ping
/// is bounded by the server selection timeout and a failure yields an
/// offline manager whose data operations fail at first use. Anything else
/// (unparseable URI, bad options) is fatal here.
pub async fn create_document_manager(config: &OdmConfig) -> OdmResult<Arc<DocumentManager>> {
    // 1. Event manager: reuse the supplied one or start empty.
    let events = config
        .event_manager
        .clone()
        .unwrap_or_else(|| Arc::new(EventManager::new()));

    // 2. Mapping configuration: artifact dirs, namespaces, generation flags.
    let mut configuration = MappingConfiguration::new();
    configuration.set_proxy_dir(&config.proxy_dir);
    configuration.set_proxy_namespace(&config.proxy_namespace);
    configuration.set_hydrator_dir(&config.hydrator_dir);
    configuration.set_hydrator_namespace(&config.hydrator_namespace);
    configuration.set_auto_generate_proxies(config.auto_generate_proxies);
    configuration.set_auto_generate_hydrators(config.auto_generate_hydrators);

    // 3. Metadata cache: reuse the supplied instance, else build the
    // configured kind namespaced by the cache prefix.
    let metadata_cache: Arc<dyn MetadataCache> = match &config.metadata_cache {
        Some(cache) => cache.clone(),
        None => Arc::new(NamespacedCache::new(
            config.metadata_cache_kind.build(),
            config.cache_prefix.clone(),
        )),
    };
    configuration.set_metadata_cache(metadata_cache.clone());

    // 4. Reader chain. Wrap order is the invariant: cache innermost, index
    // outermost, so a cache miss is indexed too.
    let mut reader: Arc<dyn MetadataReader> = Arc::new(DescriptorReader::new(&config.documents_dir));
    if config.cache_mappings {
        reader = Arc::new(CachedReader::new(
            reader,
            metadata_cache.clone(),
            config.debug,
        ));
    }
    if config.index_mappings {
        reader = Arc::new(IndexedReader::new(reader));
    }

    // 5. Behaviors: idempotent global registration, then the soft-delete
    // filter, then listener wiring (in that order).
    let behaviors = register_behaviors();
    debug!(?behaviors, "behavior extensions available");
    configuration.add_filter(SOFT_DELETE_FILTER, soft_delete_criteria());
    for (name, enabled) in &config.listeners {
        if !enabled {
            continue;
        }
        if let Some(listener) = configure_listener(name, &reader) {
            events.add_subscriber(listener);
            debug!(listener = %name, "listener attached");
        }
    }

    // 6. Mapping driver over the final reader; default database.
    let driver = Arc::new(MappingDriver::new(reader.clone(), &config.documents_dir));
    configuration.set_metadata_driver(driver.clone());
    configuration.set_default_database(&config.database);

    if config.auto_generate_proxies || config.auto_generate_hydrators {
        let classes = driver.class_names()?;
        configuration.prepare_artifacts(&classes)?;
    }

    // 7. Query logger.
    configuration.set_logger(QueryLogger::new(
        config.logger.clone(),
        config.logger_prefix.clone(),
    ));

    // 8. Connection. Ping failure degrades to an offline manager.
    let connection = Connection::open(&config.uri, &config.database, &config.connect_options).await?;
    let connection = match connection.ping().await {
        Ok(()) => {
            info!(database = %config.database, "document manager connected");
            Some(connection)
        }
        Err(error) => {
            warn!(%error, uri = %config.uri, "database unreachable, building offline document manager");
            None
        }
    };

    Ok(Arc::new(DocumentManager::create(
        connection,
        configuration,
        events,
    )))
}
