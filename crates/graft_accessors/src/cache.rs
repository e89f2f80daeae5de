//! Memoized member resolution.

use core::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use graft_system::api::API;
use hashbrown::HashMap;
use parking_lot::Mutex;

use crate::catalog::MemberResolver;
use crate::error::AccessError;
use crate::key::{AccessorKey, TypeKey};
use crate::member::MemberHandle;

/// Caches the result of member lookups, keyed by [`AccessorKey`].
///
/// The first request for a key runs the underlying [`MemberResolver`]; every
/// later request for an equal key returns the stored result, including a
/// stored "not found". Entries are never evicted or overwritten.
///
/// Concurrent first requests for the same key run the resolver once: the
/// cache lock is held across check, resolve, and insert.
///
/// The cache is cheap to clone; clones share entries.
#[derive(Clone)]
pub struct AccessorCache {
    inner: Arc<CacheInner>,
}

struct CacheInner {
    resolver: Box<dyn MemberResolver>,
    entries: Mutex<HashMap<AccessorKey, Option<MemberHandle>>>,
    resolutions: AtomicUsize,
}

impl API for AccessorCache {}

impl AccessorCache {
    /// Wraps a resolver.
    #[must_use]
    pub fn new(resolver: impl MemberResolver) -> Self {
        Self {
            inner: Arc::new(CacheInner {
                resolver: Box::new(resolver),
                entries: Mutex::new(HashMap::new()),
                resolutions: AtomicUsize::new(0),
            }),
        }
    }

    /// Returns the member for `key`, resolving it on first use.
    pub fn resolve(&self, key: &AccessorKey) -> Option<MemberHandle> {
        let mut entries = self.inner.entries.lock();
        if let Some(cached) = entries.get(key) {
            return cached.clone();
        }

        let resolved = self.inner.resolver.resolve(key);
        self.inner.resolutions.fetch_add(1, Ordering::Relaxed);
        if resolved.is_none() {
            tracing::debug!(key = %key, "member not found");
        }
        entries.insert(key.clone(), resolved.clone());
        resolved
    }

    /// Resolves `name` on `T`, any signature.
    pub fn resolve_in<T: 'static>(&self, name: &str) -> Option<MemberHandle> {
        self.resolve(&AccessorKey::of::<T>(name))
    }

    /// Resolves `name` on `T` with an exact argument signature.
    pub fn resolve_with<T: 'static>(&self, name: &str, arguments: &[TypeKey]) -> Option<MemberHandle> {
        self.resolve(&AccessorKey::of::<T>(name).with_arguments(arguments))
    }

    /// Like [`resolve`](Self::resolve), but absence is an error.
    ///
    /// # Errors
    ///
    /// [`AccessError::MemberNotFound`] if the member does not exist.
    pub fn require(&self, key: &AccessorKey) -> Result<MemberHandle, AccessError> {
        self.resolve(key)
            .ok_or_else(|| AccessError::MemberNotFound(key.clone()))
    }

    /// Number of cached keys, found or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.entries.lock().len()
    }

    /// Returns `true` if nothing has been resolved yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of times the underlying resolver has run.
    #[must_use]
    pub fn resolution_count(&self) -> usize {
        self.inner.resolutions.load(Ordering::Relaxed)
    }
}

impl core::fmt::Debug for AccessorCache {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AccessorCache")
            .field("entries", &self.len())
            .field("resolutions", &self.resolution_count())
            .finish()
    }
}
