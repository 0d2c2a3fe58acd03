/*!
 * Scope Read Cache
 * Size- and time-bounded cache in front of a storage backend
 *
 * Entries are keyed by cache group (one per scope instance) and the
 * validated real path of the target, so every alias of a file (symlink,
 * `./` spelling, absolute spelling) shares one entry. Reads populate the
 * cache; creates and writes through the same facade invalidate the
 * affected keys of their group.
 *
 * A fill carries the store generation observed before it read storage.
 * Every invalidation bumps the generation, and `put` drops a fill whose
 * generation is stale, so a read racing a write never re-caches old bytes.
 */

use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use lru::LruCache;
use parking_lot::Mutex;
use tracing::trace;
use uuid::Uuid;

use super::config::ScopeConfig;
use super::local::display_name;
use super::traits::{Backend, OpenFile, WritableFile};
use super::types::*;
use crate::core::limits::{CACHE_DIR_ENTRY_OVERHEAD, CACHE_ENTRY_OVERHEAD};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum EntryKind {
    Content,
    Listing,
    Stat,
}

const ALL_KINDS: [EntryKind; 3] = [EntryKind::Content, EntryKind::Listing, EntryKind::Stat];

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    group: Uuid,
    kind: EntryKind,
    path: PathBuf,
}

#[derive(Clone)]
enum CachedValue {
    Content { data: Arc<[u8]>, metadata: Metadata },
    Listing(Arc<[Entry]>),
    Stat(Metadata),
}

impl CachedValue {
    fn footprint(&self) -> usize {
        CACHE_ENTRY_OVERHEAD
            + match self {
                CachedValue::Content { data, metadata } => data.len() + metadata.footprint(),
                CachedValue::Listing(entries) => entries
                    .iter()
                    .map(|e| e.name.len() + CACHE_DIR_ENTRY_OVERHEAD)
                    .sum(),
                CachedValue::Stat(metadata) => metadata.footprint(),
            }
    }
}

struct CacheEntry {
    value: CachedValue,
    size: u64,
    inserted: Instant,
}

struct StoreInner {
    entries: LruCache<CacheKey, CacheEntry>,
    bytes: u64,
    generation: u64,
}

/// Thread-safe LRU store bounded by total bytes and entry age
///
/// One store may back several scopes; each scope reads and writes only
/// under its own group id.
pub struct CacheStore {
    inner: Mutex<StoreInner>,
    capacity_bytes: u64,
    ttl: Duration,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl CacheStore {
    pub fn new(capacity_bytes: u64, ttl: Duration) -> Self {
        Self {
            inner: Mutex::new(StoreInner {
                entries: LruCache::unbounded(),
                bytes: 0,
                generation: 0,
            }),
            capacity_bytes,
            ttl,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    /// Store for `config`, or `None` when caching is disabled
    pub fn from_config(config: &ScopeConfig) -> Option<Arc<Self>> {
        config
            .is_caching_enabled()
            .then(|| Arc::new(Self::new(config.cache_size_bytes, config.cache_duration)))
    }

    fn get(&self, key: &CacheKey) -> Option<CachedValue> {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;

        let expired = match inner.entries.get(key) {
            Some(entry) if entry.inserted.elapsed() < self.ttl => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                trace!(group = %key.group, path = %key.path.display(), kind = ?key.kind, "cache hit");
                return Some(entry.value.clone());
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            if let Some(old) = inner.entries.pop(key) {
                inner.bytes -= old.size;
            }
            trace!(group = %key.group, path = %key.path.display(), "cache entry expired");
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    /// Current invalidation generation; take it before reading storage
    fn generation(&self) -> u64 {
        self.inner.lock().generation
    }

    /// Insert a value read while the store was at generation `since`
    fn put(&self, key: CacheKey, value: CachedValue, since: u64) {
        let size = value.footprint() as u64;
        if size > self.capacity_bytes {
            trace!(path = %key.path.display(), size, "value larger than cache, not cached");
            return;
        }

        let mut guard = self.inner.lock();
        let inner = &mut *guard;
        if inner.generation != since {
            trace!(path = %key.path.display(), "invalidated during fill, not cached");
            return;
        }

        let entry = CacheEntry {
            value,
            size,
            inserted: Instant::now(),
        };
        if let Some(old) = inner.entries.put(key, entry) {
            inner.bytes -= old.size;
        }
        inner.bytes += size;

        while inner.bytes > self.capacity_bytes {
            match inner.entries.pop_lru() {
                Some((evicted, old)) => {
                    inner.bytes -= old.size;
                    self.evictions.fetch_add(1, Ordering::Relaxed);
                    trace!(path = %evicted.path.display(), size = old.size, "cache eviction");
                }
                None => break,
            }
        }
    }

    fn invalidate(&self, group: Uuid, path: &Path) {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;
        inner.generation += 1;
        for kind in ALL_KINDS {
            let key = CacheKey {
                group,
                kind,
                path: path.to_path_buf(),
            };
            if let Some(old) = inner.entries.pop(&key) {
                inner.bytes -= old.size;
            }
        }
        trace!(group = %group, path = %path.display(), "cache invalidated");
    }

    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.lock();
        CacheStats {
            entries: inner.entries.len(),
            bytes: inner.bytes,
            capacity_bytes: self.capacity_bytes,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }
}

/// Cache statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    pub entries: usize,
    pub bytes: u64,
    pub capacity_bytes: u64,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64 * 100.0
        }
    }
}

fn parent_key_path(real: &Path) -> PathBuf {
    real.parent().unwrap_or(real).to_path_buf()
}

/// Result of a content lookup
enum Fill {
    Cached(Arc<[u8]>, Metadata),
    /// Not cacheable (directory, or larger than the whole budget)
    Direct(Box<dyn OpenFile>),
}

/// Read/write cache facade over a backend
///
/// Every method takes the relative `name`, used to address the backend,
/// and the `real` path the validator resolved it to, used as cache key.
/// With caching disabled every call passes straight through.
pub struct CachedFS<B: Backend> {
    inner: B,
    group: Uuid,
    store: Option<Arc<CacheStore>>,
}

impl<B: Backend> CachedFS<B> {
    /// Wrap `inner` under a fresh group of `store`
    pub fn with_store(inner: B, store: Option<Arc<CacheStore>>) -> Self {
        Self {
            inner,
            group: Uuid::new_v4(),
            store,
        }
    }

    pub fn group(&self) -> Uuid {
        self.group
    }

    pub fn store(&self) -> Option<&Arc<CacheStore>> {
        self.store.as_ref()
    }

    fn key(&self, kind: EntryKind, real: &Path) -> CacheKey {
        CacheKey {
            group: self.group,
            kind,
            path: real.to_path_buf(),
        }
    }

    /// Fetch file content and metadata, populating the cache on a miss
    ///
    /// Never allocates more than the store's capacity for a file.
    fn content(&self, store: &CacheStore, name: &Path, real: &Path) -> VfsResult<Fill> {
        let key = self.key(EntryKind::Content, real);
        if let Some(CachedValue::Content { data, mut metadata }) = store.get(&key) {
            metadata.name = display_name(name);
            return Ok(Fill::Cached(data, metadata));
        }

        let since = store.generation();
        let mut file = self.inner.open(name)?;
        let metadata = file.metadata()?;
        if metadata.is_dir() || metadata.size > store.capacity_bytes {
            return Ok(Fill::Direct(file));
        }

        let limit = store.capacity_bytes;
        let mut buf = Vec::new();
        Read::take(&mut file, limit.saturating_add(1))
            .read_to_end(&mut buf)
            .map_err(|e| VfsError::from_io(e, format!("read {}", name.display())))?;
        if buf.len() as u64 > limit {
            // Grew past the budget after the metadata was taken
            file.seek(SeekFrom::Start(0))
                .map_err(|e| VfsError::from_io(e, format!("rewind {}", name.display())))?;
            return Ok(Fill::Direct(file));
        }

        let data: Arc<[u8]> = buf.into();
        store.put(
            key,
            CachedValue::Content {
                data: Arc::clone(&data),
                metadata: metadata.clone(),
            },
            since,
        );
        Ok(Fill::Cached(data, metadata))
    }

    pub fn open(&self, name: &Path, real: &Path) -> VfsResult<Box<dyn OpenFile>> {
        let Some(store) = &self.store else {
            return self.inner.open(name);
        };

        match self.content(store, name, real)? {
            Fill::Cached(data, metadata) => Ok(Box::new(MemFile::new(data, metadata))),
            Fill::Direct(file) => Ok(file),
        }
    }

    pub fn read_file(&self, name: &Path, real: &Path) -> VfsResult<Vec<u8>> {
        let Some(store) = &self.store else {
            return self.inner.read_file(name);
        };

        match self.content(store, name, real)? {
            Fill::Cached(data, _) => Ok(data.to_vec()),
            Fill::Direct(mut file) => {
                let mut buf = Vec::new();
                file.read_to_end(&mut buf)
                    .map_err(|e| VfsError::from_io(e, format!("read {}", name.display())))?;
                Ok(buf)
            }
        }
    }

    pub fn read_dir(&self, name: &Path, real: &Path) -> VfsResult<Vec<Entry>> {
        let Some(store) = &self.store else {
            return self.inner.read_dir(name);
        };

        let key = self.key(EntryKind::Listing, real);
        if let Some(CachedValue::Listing(entries)) = store.get(&key) {
            return Ok(entries.to_vec());
        }

        let since = store.generation();
        let entries = self.inner.read_dir(name)?;
        store.put(key, CachedValue::Listing(entries.clone().into()), since);
        Ok(entries)
    }

    pub fn stat(&self, name: &Path, real: &Path) -> VfsResult<Metadata> {
        let Some(store) = &self.store else {
            return self.inner.stat(name);
        };

        let key = self.key(EntryKind::Stat, real);
        if let Some(CachedValue::Stat(mut md)) = store.get(&key) {
            md.name = display_name(name);
            return Ok(md);
        }

        let since = store.generation();
        let md = self.inner.stat(name)?;
        store.put(key, CachedValue::Stat(md.clone()), since);
        Ok(md)
    }

    pub fn create(&self, name: &Path, real: &Path) -> VfsResult<Box<dyn WritableFile>> {
        let Some(store) = &self.store else {
            return self.inner.create(name);
        };

        let file = self.inner.create(name)?;
        let invalidating = InvalidatingFile {
            inner: file,
            store: Arc::clone(store),
            group: self.group,
            path: real.to_path_buf(),
            parent: parent_key_path(real),
        };
        invalidating.invalidate();
        Ok(Box::new(invalidating))
    }
}

/// In-memory read handle served from the cache
struct MemFile {
    cursor: std::io::Cursor<Arc<[u8]>>,
    metadata: Metadata,
}

impl MemFile {
    fn new(data: Arc<[u8]>, metadata: Metadata) -> Self {
        Self {
            cursor: std::io::Cursor::new(data),
            metadata,
        }
    }
}

impl Read for MemFile {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.cursor.read(buf)
    }
}

impl Seek for MemFile {
    fn seek(&mut self, pos: SeekFrom) -> std::io::Result<u64> {
        self.cursor.seek(pos)
    }
}

impl OpenFile for MemFile {
    fn metadata(&self) -> VfsResult<Metadata> {
        Ok(self.metadata.clone())
    }
}

/// Write handle that keeps its group's cache coherent with what it writes
///
/// Invalidates the file's entries and its parent listing on create, on
/// every write and flush, and once more when dropped.
struct InvalidatingFile {
    inner: Box<dyn WritableFile>,
    store: Arc<CacheStore>,
    group: Uuid,
    path: PathBuf,
    parent: PathBuf,
}

impl InvalidatingFile {
    fn invalidate(&self) {
        self.store.invalidate(self.group, &self.path);
        self.store.invalidate(self.group, &self.parent);
    }
}

impl Read for InvalidatingFile {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.inner.read(buf)
    }
}

impl Seek for InvalidatingFile {
    fn seek(&mut self, pos: SeekFrom) -> std::io::Result<u64> {
        self.inner.seek(pos)
    }
}

impl Write for InvalidatingFile {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let written = self.inner.write(buf)?;
        self.invalidate();
        Ok(written)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()?;
        self.invalidate();
        Ok(())
    }
}

impl OpenFile for InvalidatingFile {
    fn metadata(&self) -> VfsResult<Metadata> {
        self.inner.metadata()
    }
}

impl WritableFile for InvalidatingFile {
    fn sync(&mut self) -> VfsResult<()> {
        self.inner.sync()?;
        self.invalidate();
        Ok(())
    }
}

impl Drop for InvalidatingFile {
    fn drop(&mut self) {
        self.invalidate();
    }
}
