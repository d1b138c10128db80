//! Cache backend implementations.

use super::key::CacheLocation;
use crate::Result;
use async_trait::async_trait;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::collections::{BTreeSet, HashMap};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

/// Extension of every on-disk cache entry.
pub const CACHE_FILE_SUFFIX: &str = ".xml.gz";

/// Raw key/value storage for response bodies.
///
/// Entries are written once: `put` on an existing location keeps the stored
/// bytes. A missing entry is `Ok(None)`, never an error.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    async fn get(&self, location: &CacheLocation) -> Result<Option<Vec<u8>>>;
    async fn put(&self, location: &CacheLocation, value: &[u8]) -> Result<()>;
    /// Names stored directly under a resource class: keys and subdirectories.
    async fn keys(&self, resource_class: &str) -> Result<Vec<String>>;
    fn name(&self) -> &'static str;
}

/// Gzip-compressed files under `<root>/<resource-class>/[<subdir>/]<key>.xml.gz`.
pub struct DiskCache {
    root: PathBuf,
}

impl DiskCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, location: &CacheLocation) -> PathBuf {
        self.root
            .join(location.relative_dir())
            .join(format!("{}{}", location.key(), CACHE_FILE_SUFFIX))
    }

    fn read_entry(path: &Path) -> Result<Option<Vec<u8>>> {
        let file = match std::fs::File::open(path) {
            Ok(f) => f,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let mut data = Vec::new();
        GzDecoder::new(file).read_to_end(&mut data)?;
        Ok(Some(data))
    }

    fn write_entry(path: &Path, value: &[u8]) -> Result<()> {
        if path.exists() {
            return Ok(());
        }
        let dir = path.parent().unwrap_or(Path::new("."));
        std::fs::create_dir_all(dir)?;

        // Compress into a sibling temp file and move it into place, so readers
        // never observe a partially written entry.
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        {
            let mut encoder = GzEncoder::new(tmp.as_file_mut(), Compression::default());
            encoder.write_all(value)?;
            encoder.finish()?;
        }
        match tmp.persist_noclobber(path) {
            Ok(_) => Ok(()),
            Err(e) if e.error.kind() == io::ErrorKind::AlreadyExists => Ok(()),
            Err(e) => Err(e.error.into()),
        }
    }

    fn list_entries(dir: &Path) -> Result<Vec<String>> {
        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut names = BTreeSet::new();
        for entry in entries {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if entry.file_type()?.is_dir() {
                names.insert(name);
            } else if let Some(stem) = name.strip_suffix(CACHE_FILE_SUFFIX) {
                names.insert(stem.to_string());
            }
        }
        Ok(names.into_iter().collect())
    }
}

async fn blocking<T, F>(f: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| io::Error::other(e.to_string()))?
}

#[async_trait]
impl CacheBackend for DiskCache {
    async fn get(&self, location: &CacheLocation) -> Result<Option<Vec<u8>>> {
        let path = self.path_for(location);
        blocking(move || Self::read_entry(&path)).await
    }

    async fn put(&self, location: &CacheLocation, value: &[u8]) -> Result<()> {
        let path = self.path_for(location);
        let value = value.to_vec();
        blocking(move || Self::write_entry(&path, &value)).await
    }

    async fn keys(&self, resource_class: &str) -> Result<Vec<String>> {
        let dir = self.root.join(resource_class);
        blocking(move || Self::list_entries(&dir)).await
    }

    fn name(&self) -> &'static str {
        "disk"
    }
}

/// Process-local cache, mostly for tests and throwaway runs.
///
/// Clones share the same entries.
#[derive(Default, Clone)]
pub struct MemoryCache {
    entries: Arc<RwLock<HashMap<CacheLocation, Vec<u8>>>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl CacheBackend for MemoryCache {
    async fn get(&self, location: &CacheLocation) -> Result<Option<Vec<u8>>> {
        let entries = self
            .entries
            .read()
            .map_err(|_| io::Error::other("memory cache poisoned"))?;
        Ok(entries.get(location).cloned())
    }

    async fn put(&self, location: &CacheLocation, value: &[u8]) -> Result<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| io::Error::other("memory cache poisoned"))?;
        entries
            .entry(location.clone())
            .or_insert_with(|| value.to_vec());
        Ok(())
    }

    async fn keys(&self, resource_class: &str) -> Result<Vec<String>> {
        let entries = self
            .entries
            .read()
            .map_err(|_| io::Error::other("memory cache poisoned"))?;
        let names: BTreeSet<String> = entries
            .keys()
            .filter(|loc| loc.resource_class() == resource_class)
            .map(|loc| {
                loc.subdir()
                    .map(str::to_string)
                    .unwrap_or_else(|| loc.key().to_string())
            })
            .collect();
        Ok(names.into_iter().collect())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

/// Never stores anything; every lookup is a miss.
pub struct NullCache;

impl NullCache {
    pub fn new() -> Self {
        Self
    }
}

impl Default for NullCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheBackend for NullCache {
    async fn get(&self, _: &CacheLocation) -> Result<Option<Vec<u8>>> {
        Ok(None)
    }
    async fn put(&self, _: &CacheLocation, _: &[u8]) -> Result<()> {
        Ok(())
    }
    async fn keys(&self, _: &str) -> Result<Vec<String>> {
        Ok(Vec::new())
    }
    fn name(&self) -> &'static str {
        "null"
    }
}
