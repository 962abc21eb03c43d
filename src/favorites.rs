use std::collections::BTreeSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, warn};

use crate::error::PersistenceError;
use crate::kv::KeyValueStore;
use crate::observe::{Publisher, Subscription};

pub const FAVORITES_KEY: &str = "favorites_key";

pub type FavoriteSet = BTreeSet<String>;

/// Durable, observable set of favorite player ids.
///
/// Mutations run under one lock that is held across the durable write, so
/// racing toggles never lose an update. The in-memory set only changes once
/// the write succeeded, and subscribers hear about membership changes only.
pub struct FavoritesStore<S> {
    storage: S,
    key: String,
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    set: Option<FavoriteSet>,
    publisher: Publisher<FavoriteSet>,
}

impl<S: KeyValueStore> FavoritesStore<S> {
    pub fn new(storage: S) -> Self {
        Self::with_key(storage, FAVORITES_KEY)
    }

    pub fn with_key(storage: S, key: impl Into<String>) -> Self {
        Self {
            storage,
            key: key.into(),
            inner: Mutex::new(Inner::default()),
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn read(&self) -> Result<FavoriteSet, PersistenceError> {
        let mut inner = self.lock();
        Ok(self.loaded(&mut inner)?.clone())
    }

    pub fn contains(&self, id: &str) -> Result<bool, PersistenceError> {
        let mut inner = self.lock();
        Ok(self.loaded(&mut inner)?.contains(id))
    }

    /// Returns whether `id` was newly added.
    pub fn add(&self, id: &str) -> Result<bool, PersistenceError> {
        self.apply(|set| set.insert(id.to_string()))
    }

    /// Returns whether `id` was present and got removed.
    pub fn remove(&self, id: &str) -> Result<bool, PersistenceError> {
        self.apply(|set| set.remove(id))
    }

    /// Flips membership of `id` and returns whether it is now a favorite.
    pub fn toggle(&self, id: &str) -> Result<bool, PersistenceError> {
        let mut now_favorite = false;
        self.apply(|set| {
            now_favorite = !set.remove(id);
            if now_favorite {
                set.insert(id.to_string());
            }
            true
        })?;
        Ok(now_favorite)
    }

    /// Yields the full set immediately, then after every membership change.
    pub fn subscribe(&self) -> Result<Subscription<FavoriteSet>, PersistenceError> {
        let mut inner = self.lock();
        let current = self.loaded(&mut inner)?.clone();
        Ok(inner.publisher.subscribe(current))
    }

    fn apply(&self, change: impl FnOnce(&mut FavoriteSet) -> bool) -> Result<bool, PersistenceError> {
        let mut inner = self.lock();
        let mut next = self.loaded(&mut inner)?.clone();
        if !change(&mut next) {
            return Ok(false);
        }
        if let Err(err) = self.storage.set_string_set(&self.key, &next) {
            warn!(error = %err, "failed to persist favorites");
            return Err(err);
        }
        debug!(count = next.len(), "favorites persisted");
        inner.publisher.publish(&next);
        inner.set = Some(next);
        Ok(true)
    }

    fn loaded<'a>(&self, inner: &'a mut Inner) -> Result<&'a FavoriteSet, PersistenceError> {
        if inner.set.is_none() {
            let stored = self.storage.get_string_set(&self.key)?.unwrap_or_default();
            inner.set = Some(stored);
        }
        Ok(inner.set.get_or_insert_with(FavoriteSet::new))
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<S: std::fmt::Debug> std::fmt::Debug for FavoritesStore<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FavoritesStore")
            .field("storage", &self.storage)
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}
