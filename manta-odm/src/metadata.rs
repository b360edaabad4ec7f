//! Per-class mapping metadata and the TOML descriptor format.
//!
//! Each mapped class is described by one descriptor file under the
//! configured documents directory, named `<Class>.toml`:
//!
//! ```toml
//! [document]
//! class = "User"
//! collection = "users"
//! timestampable = true
//!
//! [[field]]
//! name = "email"
//! field = "email"
//! kind = "string"
//! ```
//!
//! When `collection` is omitted it defaults to the lowercased class name
//! with an `s` suffix.

use std::path::PathBuf;
use std::time::SystemTime;

use serde::Deserialize;
use smol_str::SmolStr;

use crate::error::{OdmError, OdmResult};

/// Mapping metadata for one document class.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassMetadata {
    /// The class name.
    pub class: SmolStr,
    /// The collection documents of this class are stored in.
    pub collection: SmolStr,
    /// Mapped fields.
    pub fields: Vec<FieldMapping>,
    /// Whether the timestampable behavior applies to this class.
    pub timestampable: bool,
    /// Whether the soft-delete behavior applies to this class.
    pub soft_deleteable: bool,
    /// Descriptor file this metadata was parsed from, if any.
    pub source_path: Option<PathBuf>,
    /// Modification time of the descriptor at parse time, if known.
    pub source_mtime: Option<SystemTime>,
}

/// A single field mapping.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FieldMapping {
    /// Field name on the class.
    pub name: SmolStr,
    /// Stored field name in the document. Defaults to `name`.
    #[serde(default)]
    pub field: Option<SmolStr>,
    /// Field kind.
    #[serde(default)]
    pub kind: FieldKind,
}

impl FieldMapping {
    /// The stored name for this field.
    pub fn stored_name(&self) -> &str {
        self.field.as_deref().unwrap_or(self.name.as_str())
    }
}

/// Supported field kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// UTF-8 string.
    #[default]
    String,
    /// 64-bit integer.
    Int,
    /// 64-bit float.
    Float,
    /// Boolean.
    Bool,
    /// BSON datetime.
    DateTime,
    /// BSON ObjectId.
    ObjectId,
    /// Embedded document.
    Document,
    /// Array.
    Array,
}

#[derive(Debug, Deserialize)]
struct DescriptorFile {
    document: DocumentSection,
    #[serde(default)]
    field: Vec<FieldMapping>,
}

#[derive(Debug, Deserialize)]
struct DocumentSection {
    class: SmolStr,
    #[serde(default)]
    collection: Option<SmolStr>,
    #[serde(default)]
    timestampable: bool,
    #[serde(default)]
    soft_deleteable: bool,
}

impl ClassMetadata {
    /// Parse metadata from descriptor TOML.
    ///
    /// `class` is the expected class name; a descriptor declaring a
    /// different class is rejected.
    pub fn from_descriptor(class: &str, contents: &str) -> OdmResult<Self> {
        let parsed: DescriptorFile =
            toml::from_str(contents).map_err(|source| OdmError::Descriptor {
                class: class.to_string(),
                source,
            })?;

        if parsed.document.class != class {
            return Err(OdmError::metadata(format!(
                "descriptor for {} declares class {}",
                class, parsed.document.class
            )));
        }

        let collection = parsed
            .document
            .collection
            .unwrap_or_else(|| SmolStr::new(format!("{}s", class.to_lowercase())));

        Ok(Self {
            class: parsed.document.class,
            collection,
            fields: parsed.field,
            timestampable: parsed.document.timestampable,
            soft_deleteable: parsed.document.soft_deleteable,
            source_path: None,
            source_mtime: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    const USER_DESCRIPTOR: &str = r#"
        [document]
        class = "User"
        collection = "users"
        timestampable = true

        [[field]]
        name = "email"
        kind = "string"

        [[field]]
        name = "signedUpAt"
        field = "signed_up_at"
        kind = "date_time"
    "#;

    #[test]
    fn test_parse_descriptor() {
        let metadata = ClassMetadata::from_descriptor("User", USER_DESCRIPTOR).unwrap();

        assert_eq!(metadata.class, "User");
        assert_eq!(metadata.collection, "users");
        assert!(metadata.timestampable);
        assert!(!metadata.soft_deleteable);
        assert_eq!(metadata.fields.len(), 2);
        assert_eq!(metadata.fields[0].stored_name(), "email");
        assert_eq!(metadata.fields[1].stored_name(), "signed_up_at");
        assert_eq!(metadata.fields[1].kind, FieldKind::DateTime);
    }

    #[test]
    fn test_collection_defaults_to_pluralized_class() {
        let metadata =
            ClassMetadata::from_descriptor("Order", "[document]\nclass = \"Order\"\n").unwrap();
        assert_eq!(metadata.collection, "orders");
        assert!(metadata.fields.is_empty());
    }

    #[test]
    fn test_class_mismatch_rejected() {
        let err =
            ClassMetadata::from_descriptor("User", "[document]\nclass = \"Order\"\n").unwrap_err();
        assert!(matches!(err, OdmError::Metadata(_)));
    }

    #[test]
    fn test_invalid_toml_rejected() {
        let err = ClassMetadata::from_descriptor("User", "not a descriptor").unwrap_err();
        assert!(matches!(err, OdmError::Descriptor { .. }));
    }
}
