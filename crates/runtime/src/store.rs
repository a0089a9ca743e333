//! Runtime store
//!
//! A bounded cache of loaded DARs shared across evaluation requests. Entries
//! are kept in access order: every `register` or successful `get` moves the
//! entry to the back, and the front is evicted once `max_entries` is
//! exceeded. Entries idle longer than `time_to_idle` are dropped lazily on
//! the next operation. A miss never reloads.

use std::fmt;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use indexmap::IndexMap;
use tracing::{debug, trace};

use crate::config::StoreConfig;
use crate::context::DarRuntimeContext;
use crate::error::{Error, Result};
use crate::loader::DarLoader;

/// Identity of a loaded archive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DarId {
    pub name: String,
    pub version: u32,
}

impl DarId {
    pub fn new(name: impl Into<String>, version: u32) -> Self {
        Self {
            name: name.into(),
            version,
        }
    }
}

impl fmt::Display for DarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.version)
    }
}

#[derive(Debug)]
struct Entry {
    context: Arc<DarRuntimeContext>,
    last_access: Instant,
}

#[derive(Debug)]
pub struct DarRuntimeStore {
    config: StoreConfig,
    entries: Mutex<IndexMap<DarId, Entry>>,
}

impl DarRuntimeStore {
    pub fn new(config: StoreConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            entries: Mutex::new(IndexMap::new()),
        })
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Load the archive at `path` and register it under `id`.
    pub fn load(&self, id: DarId, path: &Path) -> Result<Arc<DarRuntimeContext>> {
        let context = Arc::new(DarLoader::load(path)?);
        self.register(id, Arc::clone(&context));
        Ok(context)
    }

    /// Insert or replace the context registered under `id`.
    pub fn register(&self, id: DarId, context: Arc<DarRuntimeContext>) -> DarId {
        self.register_at(id, context, Instant::now())
    }

    /// The context registered under `id`; fails if it was never registered
    /// or has since been evicted.
    pub fn get(&self, id: &DarId) -> Result<Arc<DarRuntimeContext>> {
        self.get_at(id, Instant::now())
    }

    /// Evict `id`. Returns whether it was present.
    pub fn unload(&self, id: &DarId) -> bool {
        let removed = self.lock().shift_remove(id).is_some();
        if removed {
            debug!(dar = %id, "DAR unloaded");
        }
        removed
    }

    /// Number of entries, including idle ones not yet purged.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn register_at(&self, id: DarId, context: Arc<DarRuntimeContext>, now: Instant) -> DarId {
        let mut entries = self.lock();
        self.purge_idle(&mut entries, now);
        entries.shift_remove(&id);
        entries.insert(
            id.clone(),
            Entry {
                context,
                last_access: now,
            },
        );
        while entries.len() > self.config.max_entries {
            if let Some((evicted, _)) = entries.shift_remove_index(0) {
                debug!(dar = %evicted, "DAR evicted, store full");
            }
        }
        debug!(dar = %id, entries = entries.len(), "DAR registered");
        id
    }

    fn get_at(&self, id: &DarId, now: Instant) -> Result<Arc<DarRuntimeContext>> {
        let mut entries = self.lock();
        self.purge_idle(&mut entries, now);
        let index = entries
            .get_index_of(id)
            .ok_or_else(|| Error::DarNotLoaded(id.clone()))?;
        let last = entries.len() - 1;
        entries.move_index(index, last);
        let (_, entry) = entries
            .get_index_mut(last)
            .ok_or_else(|| Error::DarNotLoaded(id.clone()))?;
        entry.last_access = now;
        trace!(dar = %id, "DAR accessed");
        Ok(Arc::clone(&entry.context))
    }

    fn purge_idle(&self, entries: &mut IndexMap<DarId, Entry>, now: Instant) {
        let tti = self.config.time_to_idle;
        entries.retain(|id, entry| {
            let keep = now.saturating_duration_since(entry.last_access) < tti;
            if !keep {
                debug!(dar = %id, "DAR expired after idling");
            }
            keep
        });
    }

    fn lock(&self) -> MutexGuard<'_, IndexMap<DarId, Entry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
