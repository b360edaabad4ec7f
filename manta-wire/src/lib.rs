//! # manta-wire
//!
//! Service-container wiring for the Manta document manager.
//!
//! This crate provides:
//! - **`ServiceContainer`**: named, lazily-constructed singleton services
//!   with aliases
//! - **`DocumentManagerExtension`**: reads a configuration block and
//!   registers one document manager under a canonical prefixed name plus a
//!   public alias
//!
//! # Example
//!
//! ```rust,ignore
//! use manta_odm::{DocumentManager, OdmConfig};
//! use manta_wire::{DocumentManagerExtension, ServiceContainer};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let container = ServiceContainer::new();
//!
//!     let config = OdmConfig::builder()
//!         .uri("mongodb://localhost:27017/shop")
//!         .database("shop")
//!         .listener("timestampable", true)
//!         .build();
//!     DocumentManagerExtension::new("mongo", config).load_configuration(&container)?;
//!
//!     // Construction happens here, once.
//!     let dm = container.resolve::<DocumentManager>("document_manager").await?;
//!     Ok(())
//! }
//! ```

pub mod container;
pub mod error;
pub mod extension;

pub use container::{ServiceContainer, SharedService};
pub use error::{WireError, WireResult};
pub use extension::{DOCUMENT_MANAGER_SERVICE, DocumentManagerExtension};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::container::ServiceContainer;
    pub use crate::error::{WireError, WireResult};
    pub use crate::extension::{DOCUMENT_MANAGER_SERVICE, DocumentManagerExtension};
    pub use manta_odm::prelude::*;
}
