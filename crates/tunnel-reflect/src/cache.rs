//! Resolution cache
//!
//! Maps a [`CacheKey`] to a resolved handle. Built on a sharded concurrent
//! map: a missing key is computed while the write lock of its shard is held,
//! so racing first lookups of the same key store exactly one handle. Keys in
//! other shards never wait on it. Distinct keys that hash to the same shard
//! do wait, hits included, until the computation finishes; a resolution is
//! a short hierarchy scan. `compute` must not call back into the same
//! cache. Failed computations store nothing.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::class::Class;
use crate::error::ReflectResult;

/// Key of a resolved member: runtime type, member name, constraint type and,
/// for methods, the argument count
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    runtime: Class,
    name: String,
    constraint: Class,
    parameter_count: Option<usize>,
}

impl CacheKey {
    /// Key for a field lookup
    pub fn field(runtime: &Class, name: &str, field_type: &Class) -> Self {
        Self {
            runtime: runtime.clone(),
            name: name.to_string(),
            constraint: field_type.clone(),
            parameter_count: None,
        }
    }

    /// Key for a method lookup
    pub fn method(runtime: &Class, name: &str, return_type: &Class, parameter_count: usize) -> Self {
        Self {
            runtime: runtime.clone(),
            name: name.to_string(),
            constraint: return_type.clone(),
            parameter_count: Some(parameter_count),
        }
    }

    /// Runtime type the lookup starts from
    pub fn runtime(&self) -> &Class {
        &self.runtime
    }

    /// Requested member name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Requested field type or return type
    pub fn constraint(&self) -> &Class {
        &self.constraint
    }

    /// Requested argument count (methods only)
    pub fn parameter_count(&self) -> Option<usize> {
        self.parameter_count
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}#{}", self.runtime, self.name, self.constraint)?;
        if let Some(count) = self.parameter_count {
            write!(f, "#{count}")?;
        }
        Ok(())
    }
}

/// Write-once-per-key cache of resolved handles
pub struct ResolutionCache<H> {
    entries: DashMap<CacheKey, Arc<H>>,
    computed: AtomicUsize,
}

impl<H> ResolutionCache<H> {
    /// Create an empty cache
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
            computed: AtomicUsize::new(0),
        }
    }

    /// Return the handle stored under `key`, computing and storing it if
    /// absent. `compute` is not called on a hit.
    pub fn resolve(
        &self,
        key: CacheKey,
        compute: impl FnOnce(&CacheKey) -> ReflectResult<H>,
    ) -> ReflectResult<Arc<H>> {
        if let Some(handle) = self.entries.get(&key) {
            tracing::trace!(%key, "resolution cache hit");
            return Ok(handle.clone());
        }

        match self.entries.entry(key) {
            Entry::Occupied(entry) => Ok(entry.get().clone()),
            Entry::Vacant(entry) => {
                self.computed.fetch_add(1, Ordering::Relaxed);
                let handle = Arc::new(compute(entry.key())?);
                entry.insert(handle.clone());
                Ok(handle)
            }
        }
    }

    /// Compute a handle without consulting or filling the cache
    pub fn resolve_uncached(
        &self,
        key: CacheKey,
        compute: impl FnOnce(&CacheKey) -> ReflectResult<H>,
    ) -> ReflectResult<Arc<H>> {
        self.computed.fetch_add(1, Ordering::Relaxed);
        compute(&key).map(Arc::new)
    }

    /// The stored handle for `key`, if resolved
    pub fn get(&self, key: &CacheKey) -> Option<Arc<H>> {
        self.entries.get(key).map(|handle| handle.clone())
    }

    /// Number of stored handles
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been resolved yet
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// How many times a resolution was computed, successful or not
    pub fn computed(&self) -> usize {
        self.computed.load(Ordering::Relaxed)
    }
}

impl<H> Default for ResolutionCache<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H> fmt::Debug for ResolutionCache<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolutionCache")
            .field("entries", &self.entries.len())
            .field("computed", &self.computed())
            .finish()
    }
}
