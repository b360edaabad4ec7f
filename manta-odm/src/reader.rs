//! Mapping readers and their decorator chain.
//!
//! [`DescriptorReader`] parses descriptor files; [`CachedReader`] and
//! [`IndexedReader`] are composable wrappers over any reader. Wrap order is
//! an invariant, not a detail: the cache wraps the base reader and the
//! index wraps the (possibly caching) reader, so a cache miss is indexed
//! too.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use smol_str::SmolStr;
use tracing::{debug, trace};

use crate::cache::MetadataCache;
use crate::error::{OdmError, OdmResult};
use crate::metadata::ClassMetadata;

/// Reads mapping metadata for a class.
pub trait MetadataReader: Send + Sync {
    /// Read the metadata for `class`.
    fn read_class(&self, class: &str) -> OdmResult<Arc<ClassMetadata>>;
}

/// Base reader parsing TOML descriptors from the documents directory.
#[derive(Debug, Clone)]
pub struct DescriptorReader {
    documents_dir: PathBuf,
}

impl DescriptorReader {
    /// Create a reader over `documents_dir`.
    pub fn new(documents_dir: impl Into<PathBuf>) -> Self {
        Self {
            documents_dir: documents_dir.into(),
        }
    }

    /// The directory descriptors are read from.
    pub fn documents_dir(&self) -> &Path {
        &self.documents_dir
    }

    fn descriptor_path(&self, class: &str) -> PathBuf {
        self.documents_dir.join(format!("{class}.toml"))
    }
}

impl MetadataReader for DescriptorReader {
    fn read_class(&self, class: &str) -> OdmResult<Arc<ClassMetadata>> {
        let path = self.descriptor_path(class);
        let contents = fs::read_to_string(&path).map_err(|_| OdmError::not_found(class))?;

        let mut metadata = ClassMetadata::from_descriptor(class, &contents)?;
        metadata.source_mtime = fs::metadata(&path).and_then(|m| m.modified()).ok();
        metadata.source_path = Some(path);

        trace!(class = %class, "parsed mapping descriptor");
        Ok(Arc::new(metadata))
    }
}

/// Caching wrapper over a reader.
///
/// With `debug` enabled, cached entries are revalidated against the
/// descriptor file's modification time and re-read when stale; otherwise
/// the cache is trusted as-is.
pub struct CachedReader {
    inner: Arc<dyn MetadataReader>,
    cache: Arc<dyn MetadataCache>,
    debug: bool,
}

impl CachedReader {
    /// Wrap `inner`, storing results in `cache`.
    pub fn new(inner: Arc<dyn MetadataReader>, cache: Arc<dyn MetadataCache>, debug: bool) -> Self {
        Self {
            inner,
            cache,
            debug,
        }
    }

    fn is_stale(metadata: &ClassMetadata) -> bool {
        let (Some(path), Some(recorded)) = (&metadata.source_path, metadata.source_mtime) else {
            return false;
        };
        match fs::metadata(path).and_then(|m| m.modified()) {
            Ok(current) => current > recorded,
            Err(_) => false,
        }
    }
}

impl MetadataReader for CachedReader {
    fn read_class(&self, class: &str) -> OdmResult<Arc<ClassMetadata>> {
        if let Some(cached) = self.cache.get(class) {
            if !self.debug || !Self::is_stale(&cached) {
                trace!(class = %class, "metadata served from cache");
                return Ok(cached);
            }
            debug!(class = %class, "cached metadata stale, re-reading");
        }

        let metadata = self.inner.read_class(class)?;
        self.cache.put(class, metadata.clone());
        Ok(metadata)
    }
}

/// Wrapper memoizing reads per class within one reader instance.
///
/// Amortizes repeated lookups for the same class; the inner reader is
/// invoked at most once per class.
pub struct IndexedReader {
    inner: Arc<dyn MetadataReader>,
    index: RwLock<HashMap<SmolStr, Arc<ClassMetadata>>>,
}

impl IndexedReader {
    /// Wrap `inner`.
    pub fn new(inner: Arc<dyn MetadataReader>) -> Self {
        Self {
            inner,
            index: RwLock::new(HashMap::new()),
        }
    }
}

impl MetadataReader for IndexedReader {
    fn read_class(&self, class: &str) -> OdmResult<Arc<ClassMetadata>> {
        if let Some(metadata) = self.index.read().get(class) {
            return Ok(metadata.clone());
        }

        let metadata = self.inner.read_class(class)?;
        self.index
            .write()
            .insert(SmolStr::new(class), metadata.clone());
        Ok(metadata)
    }
}
