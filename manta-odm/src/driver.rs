//! Mapping driver bound to a reader and the documents directory.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use smol_str::SmolStr;
use tracing::debug;

use crate::error::{OdmError, OdmResult};
use crate::metadata::ClassMetadata;
use crate::reader::MetadataReader;

/// Discovers mapped classes and resolves their metadata.
///
/// Class discovery scans the documents directory for `*.toml` descriptors;
/// metadata resolution goes through the configured reader chain.
pub struct MappingDriver {
    reader: Arc<dyn MetadataReader>,
    documents_dir: PathBuf,
}

impl MappingDriver {
    /// Create a driver over `documents_dir` using `reader`.
    pub fn new(reader: Arc<dyn MetadataReader>, documents_dir: impl Into<PathBuf>) -> Self {
        Self {
            reader,
            documents_dir: documents_dir.into(),
        }
    }

    /// The directory scanned for descriptors.
    pub fn documents_dir(&self) -> &Path {
        &self.documents_dir
    }

    /// The reader metadata resolution goes through.
    pub fn reader(&self) -> &Arc<dyn MetadataReader> {
        &self.reader
    }

    /// All mapped class names, sorted.
    ///
    /// A missing documents directory yields no classes rather than an
    /// error, so a manager can be built before the mapping files exist.
    pub fn class_names(&self) -> OdmResult<Vec<SmolStr>> {
        if !self.documents_dir.exists() {
            debug!(dir = %self.documents_dir.display(), "documents directory missing, no classes");
            return Ok(Vec::new());
        }

        let entries = fs::read_dir(&self.documents_dir).map_err(|e| {
            OdmError::metadata(format!(
                "cannot scan {}: {}",
                self.documents_dir.display(),
                e
            ))
        })?;

        let mut names = Vec::new();
        for entry in entries {
            let path = entry
                .map_err(|e| OdmError::metadata(format!("cannot scan documents dir: {e}")))?
                .path();
            if path.extension().is_some_and(|ext| ext == "toml") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    names.push(SmolStr::new(stem));
                }
            }
        }
        names.sort();
        Ok(names)
    }

    /// Resolve metadata for one class.
    pub fn metadata_for(&self, class: &str) -> OdmResult<Arc<ClassMetadata>> {
        self.reader.read_class(class)
    }

    /// Resolve metadata for every mapped class.
    pub fn load_all(&self) -> OdmResult<Vec<Arc<ClassMetadata>>> {
        self.class_names()?
            .iter()
            .map(|class| self.metadata_for(class))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::reader::DescriptorReader;

    fn driver_over(dir: &Path) -> MappingDriver {
        MappingDriver::new(Arc::new(DescriptorReader::new(dir)), dir)
    }

    #[test]
    fn test_class_names_sorted() {
        let dir = tempfile::tempdir().unwrap();
        for class in ["User", "Order", "Invoice"] {
            fs::write(
                dir.path().join(format!("{class}.toml")),
                format!("[document]\nclass = \"{class}\"\n"),
            )
            .unwrap();
        }
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let names = driver_over(dir.path()).class_names().unwrap();
        assert_eq!(names, vec!["Invoice", "Order", "User"]);
    }

    #[test]
    fn test_missing_dir_yields_no_classes() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nowhere");
        let driver = driver_over(&missing);
        assert!(driver.class_names().unwrap().is_empty());
    }

    #[test]
    fn test_load_all() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("User.toml"),
            "[document]\nclass = \"User\"\n",
        )
        .unwrap();

        let loaded = driver_over(dir.path()).load_all().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].class, "User");
    }
}
