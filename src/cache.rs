//! In-memory cache for listing responses, bounded by entry count and age.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use indexmap::IndexMap;

use crate::responses::PaginatedResult;
use crate::types::{Priority, Project, Status, User, WorkPackageType};

/// Sizing and expiry for a [`ResponseCache`]. The default lifespan matches
/// the two hour validity of backend access tokens; a shorter-lived token can
/// still be served from cache until the entry ages out.
#[derive(Debug, Clone)]
pub struct CacheOptions {
    pub max_entries: usize,
    pub lifespan: Duration,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self {
            max_entries: 1000,
            lifespan: Duration::from_secs(7200),
        }
    }
}

/// One cached page, tagged by the resource kind it came from.
#[derive(Debug, Clone)]
pub enum CachedPage {
    Users(PaginatedResult<User>),
    Projects(PaginatedResult<Project>),
    Types(PaginatedResult<WorkPackageType>),
    Statuses(PaginatedResult<Status>),
    Priorities(PaginatedResult<Priority>),
}

struct CacheEntry {
    page: CachedPage,
    inserted_at: Instant,
}

/// Least-recently-used store with a capacity ceiling and a maximum entry
/// lifespan. Entries keep their insertion age when touched; only reads
/// refresh their position in the eviction order.
pub struct ResponseCache {
    entries: Mutex<IndexMap<String, CacheEntry>>,
    options: CacheOptions,
}

impl ResponseCache {
    pub fn new(options: CacheOptions) -> Self {
        Self {
            entries: Mutex::new(IndexMap::new()),
            options,
        }
    }

    /// Returns a clone of the entry and marks it as most recently used.
    /// An entry past its lifespan is removed and reported as a miss.
    pub fn get(&self, key: &str) -> Option<CachedPage> {
        let mut entries = self.lock();
        let index = entries.get_index_of(key)?;
        if entries[index].inserted_at.elapsed() >= self.options.lifespan {
            entries.shift_remove_index(index);
            return None;
        }
        let last = entries.len() - 1;
        entries.move_index(index, last);
        Some(entries[last].page.clone())
    }

    pub fn insert(&self, key: impl Into<String>, page: CachedPage) {
        let mut entries = self.lock();
        let lifespan = self.options.lifespan;
        entries.retain(|_, entry| entry.inserted_at.elapsed() < lifespan);

        let key = key.into();
        // Remove first so a refreshed key lands at the back of the order
        entries.shift_remove(&key);
        entries.insert(
            key,
            CacheEntry {
                page,
                inserted_at: Instant::now(),
            },
        );
        while entries.len() > self.options.max_entries {
            entries.shift_remove_index(0);
        }
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, IndexMap<String, CacheEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new(CacheOptions::default())
    }
}
