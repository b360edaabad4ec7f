//! Behavior extensions: soft-delete filtering and audit timestamps.

use std::sync::{Arc, OnceLock};

use bson::{Bson, Document, doc};
use chrono::Utc;
use tracing::{debug, warn};

use crate::events::{EventSubscriber, LifecycleStage};
use crate::reader::MetadataReader;

/// Name under which the soft-delete query filter is registered.
pub const SOFT_DELETE_FILTER: &str = "soft-deleteable";

static BEHAVIORS: OnceLock<Vec<&'static str>> = OnceLock::new();

/// Register the behavior set process-wide.
///
/// Idempotent: repeated container builds (tests included) perform the
/// registration exactly once. Returns the registered behavior names.
pub fn register_behaviors() -> &'static [&'static str] {
    BEHAVIORS
        .get_or_init(|| {
            debug!("registering behavior extensions");
            vec!["timestampable", SOFT_DELETE_FILTER]
        })
        .as_slice()
}

/// Filter criteria excluding soft-deleted documents.
pub fn soft_delete_criteria() -> Document {
    doc! { "deleted_at": Bson::Null }
}

/// Build the listener registered under `name`, if any.
///
/// `"timestampable"` is the one built-in. Unknown names attach nothing and
/// raise no error; a warning makes the miss observable.
pub fn configure_listener(
    name: &str,
    reader: &Arc<dyn MetadataReader>,
) -> Option<Arc<dyn EventSubscriber>> {
    match name {
        "timestampable" => Some(Arc::new(TimestampableListener::new(reader.clone()))),
        _ => {
            warn!(listener = %name, "unknown listener name, nothing attached");
            None
        }
    }
}

/// Maintains `created_at` / `updated_at` on classes flagged timestampable.
pub struct TimestampableListener {
    reader: Arc<dyn MetadataReader>,
}

impl TimestampableListener {
    /// Create a listener consulting `reader` for class metadata.
    pub fn new(reader: Arc<dyn MetadataReader>) -> Self {
        Self { reader }
    }
}

impl EventSubscriber for TimestampableListener {
    fn subscribed_stages(&self) -> &'static [LifecycleStage] {
        &[LifecycleStage::PrePersist, LifecycleStage::PreUpdate]
    }

    fn handle(&self, stage: LifecycleStage, class: &str, document: &mut Document) {
        let Ok(metadata) = self.reader.read_class(class) else {
            return;
        };
        if !metadata.timestampable {
            return;
        }

        let now = bson::DateTime::from_chrono(Utc::now());
        match stage {
            LifecycleStage::PrePersist => {
                document.insert("created_at", now);
                document.insert("updated_at", now);
            }
            LifecycleStage::PreUpdate => {
                document.insert("updated_at", now);
            }
            _ => {}
        }
    }
}
