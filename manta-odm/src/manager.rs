//! The document manager.

use std::fmt;
use std::sync::Arc;

use bson::{Bson, Document, doc};
use futures::TryStreamExt;
use mongodb::Collection;
use tracing::debug;

use crate::connection::Connection;
use crate::driver::MappingDriver;
use crate::error::{OdmError, OdmResult};
use crate::events::{EventManager, LifecycleStage};
use crate::mapping::MappingConfiguration;
use crate::metadata::ClassMetadata;

/// The top-level handle document operations go through.
///
/// A manager may be built without a live connection; everything except the
/// data operations keeps working, and those fail at first use with a
/// connection error.
pub struct DocumentManager {
    connection: Option<Connection>,
    configuration: MappingConfiguration,
    events: Arc<EventManager>,
}

impl DocumentManager {
    /// Create a manager from its three parts.
    pub fn create(
        connection: Option<Connection>,
        configuration: MappingConfiguration,
        events: Arc<EventManager>,
    ) -> Self {
        Self {
            connection,
            configuration,
            events,
        }
    }

    /// Whether a live connection is attached.
    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    /// The attached connection, if any.
    pub fn connection(&self) -> Option<&Connection> {
        self.connection.as_ref()
    }

    /// The mapping configuration.
    pub fn configuration(&self) -> &MappingConfiguration {
        &self.configuration
    }

    /// The event manager.
    pub fn event_manager(&self) -> &Arc<EventManager> {
        &self.events
    }

    fn driver(&self) -> OdmResult<&Arc<MappingDriver>> {
        self.configuration
            .metadata_driver()
            .ok_or_else(|| OdmError::config("no metadata driver attached"))
    }

    fn require_connection(&self) -> OdmResult<&Connection> {
        self.connection
            .as_ref()
            .ok_or_else(|| OdmError::connection("document manager is offline"))
    }

    /// Resolve mapping metadata for `class`.
    pub fn metadata_for(&self, class: &str) -> OdmResult<Arc<ClassMetadata>> {
        self.driver()?.metadata_for(class)
    }

    /// The collection documents of `class` are stored in.
    pub fn collection_for(&self, class: &str) -> OdmResult<Collection<Document>> {
        let metadata = self.metadata_for(class)?;
        let connection = self.require_connection()?;
        Ok(connection.collection_doc(metadata.collection.as_str()))
    }

    /// Run the pre-insert lifecycle stage over `document`.
    pub fn prepare_insert(&self, class: &str, document: &mut Document) {
        self.events
            .dispatch(LifecycleStage::PrePersist, class, document);
    }

    /// Run the pre-update lifecycle stage over `document`.
    pub fn prepare_update(&self, class: &str, document: &mut Document) {
        self.events
            .dispatch(LifecycleStage::PreUpdate, class, document);
    }

    /// Insert one document of `class`, running lifecycle stages and
    /// announcing the operation through the query logger.
    pub async fn insert_one(&self, class: &str, mut document: Document) -> OdmResult<Bson> {
        self.prepare_insert(class, &mut document);
        let collection = self.collection_for(class)?;

        if let Some(logger) = self.configuration.logger() {
            logger.log_query(&doc! {
                "insert": collection.name(),
                "document": document.clone(),
            });
        }

        debug!(class = %class, collection = %collection.name(), "inserting document");
        let result = collection.insert_one(document.clone(), None).await?;
        self.events
            .dispatch(LifecycleStage::PostPersist, class, &mut document);
        Ok(result.inserted_id)
    }

    /// Find all documents of `class` matching `filter`.
    pub async fn find(&self, class: &str, filter: Document) -> OdmResult<Vec<Document>> {
        let collection = self.collection_for(class)?;

        if let Some(logger) = self.configuration.logger() {
            logger.log_query(&doc! {
                "find": collection.name(),
                "filter": filter.clone(),
            });
        }

        let cursor = collection.find(filter, None).await?;
        let documents = cursor.try_collect().await?;
        Ok(documents)
    }

    /// Update one document of `class` matching `filter` with a `$set` of
    /// `changes`.
    pub async fn update_one(
        &self,
        class: &str,
        filter: Document,
        mut changes: Document,
    ) -> OdmResult<u64> {
        self.prepare_update(class, &mut changes);
        let collection = self.collection_for(class)?;

        if let Some(logger) = self.configuration.logger() {
            logger.log_query(&doc! {
                "update": collection.name(),
                "filter": filter.clone(),
                "set": changes.clone(),
            });
        }

        debug!(class = %class, collection = %collection.name(), "updating document");
        let result = collection
            .update_one(filter, doc! { "$set": changes.clone() }, None)
            .await?;
        self.events
            .dispatch(LifecycleStage::PostUpdate, class, &mut changes);
        Ok(result.modified_count)
    }
}

impl fmt::Debug for DocumentManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentManager")
            .field("connected", &self.is_connected())
            .field("configuration", &self.configuration)
            .field("events", &self.events)
            .finish()
    }
}
