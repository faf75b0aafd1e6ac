//! Persistent resolution cache and the in-flight processing set.
//!
//! The cache is a single JSON file mapping raw citation text to the
//! resolved document. It is loaded fully at startup and rewritten in
//! full after every write. A missing or malformed file starts an
//! empty cache; malformed is logged, never fatal.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{debug, info, warn};

use circex_shared::{CachedDocument, CircexError, Result};

// ---------------------------------------------------------------------------
// CacheStore
// ---------------------------------------------------------------------------

/// File-backed cache keyed by raw citation text.
///
/// Raw-text keying means two phrasings of the same citation cache
/// separately; cycle detection compensates by using normalized keys.
pub struct CacheStore {
    path: PathBuf,
    entries: HashMap<String, CachedDocument>,
}

impl CacheStore {
    /// Load the cache from `path`, tolerating absence and corruption.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match std::fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<HashMap<String, CachedDocument>>(&raw) {
                Ok(entries) => {
                    info!(count = entries.len(), path = %path.display(), "loaded cache");
                    entries
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "malformed cache file, starting fresh");
                    HashMap::new()
                }
            },
            Err(_) => {
                debug!(path = %path.display(), "no cache file, starting fresh");
                HashMap::new()
            }
        };
        Self { path, entries }
    }

    pub fn get(&self, title: &str) -> Option<&CachedDocument> {
        self.entries.get(title)
    }

    /// Insert an entry and rewrite the file. Persistence failures are
    /// logged and swallowed; losing the cache must not fail the run.
    pub fn insert(&mut self, title: impl Into<String>, document: CachedDocument) {
        self.entries.insert(title.into(), document);
        if let Err(e) = self.persist() {
            warn!(path = %self.path.display(), error = %e, "failed to persist cache");
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.entries)
            .map_err(|e| CircexError::Cache(e.to_string()))?;
        std::fs::write(&self.path, json).map_err(|e| CircexError::io(&self.path, e))?;
        debug!(count = self.entries.len(), "persisted cache");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// VisitedSet
// ---------------------------------------------------------------------------

/// Normalized keys currently being resolved on the active call path.
/// Membership means "a resolution for this document is in flight above
/// us", i.e. a cycle.
#[derive(Default)]
pub struct VisitedSet {
    inner: Mutex<HashSet<String>>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.inner.lock().expect("visited set poisoned").contains(key)
    }

    /// Mark `key` as in flight. The returned guard removes the entry
    /// on drop, on every exit path.
    pub fn begin(&self, key: impl Into<String>) -> ProcessingGuard<'_> {
        let key = key.into();
        self.inner
            .lock()
            .expect("visited set poisoned")
            .insert(key.clone());
        ProcessingGuard { set: self, key }
    }
}

/// Removes its key from the [`VisitedSet`] when dropped.
pub struct ProcessingGuard<'a> {
    set: &'a VisitedSet,
    key: String,
}

impl Drop for ProcessingGuard<'_> {
    fn drop(&mut self) {
        self.set
            .inner
            .lock()
            .expect("visited set poisoned")
            .remove(&self.key);
    }
}
