//! # manta-odm
//!
//! Construction and configuration of a MongoDB document manager.
//!
//! This crate provides:
//! - A configuration block with documented defaults for every option
//! - Mapping metadata from per-class TOML descriptors
//! - A composable reader chain (base, caching, indexing) over that metadata
//! - Lifecycle events with behavior listeners (soft-delete filter, audit
//!   timestamps)
//! - A factory that assembles the whole object graph in a fixed order,
//!   tolerating an unreachable database by building an offline manager
//!
//! The mapping and query engine proper lives in the MongoDB driver and the
//! application; this crate only wires a configured [`DocumentManager`]
//! together.
//!
//! ## Example
//!
//! ```rust,ignore
//! use manta_odm::{OdmConfig, create_document_manager};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = OdmConfig::builder()
//!         .uri("mongodb://localhost:27017/shop")
//!         .database("shop")
//!         .documents_dir("model/documents")
//!         .listener("timestampable", true)
//!         .build();
//!
//!     let manager = create_document_manager(&config).await?;
//!     let users = manager.collection_for("User")?;
//!
//!     Ok(())
//! }
//! ```

pub mod behaviors;
pub mod cache;
pub mod config;
pub mod connection;
pub mod driver;
pub mod error;
pub mod events;
pub mod factory;
pub mod logger;
pub mod logging;
pub mod manager;
pub mod mapping;
pub mod metadata;
pub mod reader;

pub use bson::{Bson, Document, doc};
pub use cache::{InMemoryCache, MetadataCache, MetadataCacheKind, NamespacedCache, NullCache};
pub use config::{ConnectOptions, OdmConfig, OdmConfigBuilder};
pub use connection::Connection;
pub use driver::MappingDriver;
pub use error::{OdmError, OdmResult};
pub use events::{EventManager, EventSubscriber, LifecycleStage};
pub use factory::create_document_manager;
pub use logger::{QueryLogFn, QueryLogger};
pub use manager::DocumentManager;
pub use mapping::MappingConfiguration;
pub use metadata::{ClassMetadata, FieldKind, FieldMapping};
pub use reader::{CachedReader, DescriptorReader, IndexedReader, MetadataReader};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::behaviors::{SOFT_DELETE_FILTER, TimestampableListener};
    pub use crate::cache::{InMemoryCache, MetadataCache, MetadataCacheKind, NamespacedCache};
    pub use crate::config::{ConnectOptions, OdmConfig, OdmConfigBuilder};
    pub use crate::connection::Connection;
    pub use crate::driver::MappingDriver;
    pub use crate::error::{OdmError, OdmResult};
    pub use crate::events::{EventManager, EventSubscriber, LifecycleStage};
    pub use crate::factory::create_document_manager;
    pub use crate::logger::{QueryLogFn, QueryLogger};
    pub use crate::manager::DocumentManager;
    pub use crate::mapping::MappingConfiguration;
    pub use crate::metadata::{ClassMetadata, FieldKind, FieldMapping};
    pub use crate::reader::{CachedReader, DescriptorReader, IndexedReader, MetadataReader};
    pub use bson::{Bson, Document, doc};
}
