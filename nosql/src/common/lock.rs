use dashmap::DashMap;
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::sync::Arc;

/// Shared handle to one named lock of a [`LockRegistry`].
#[derive(Clone)]
pub struct LockHandle {
    lock: Arc<RwLock<()>>,
}

impl LockHandle {
    fn new() -> Self {
        LockHandle {
            lock: Arc::new(RwLock::new(())),
        }
    }

    /// Acquires the lock for reading.
    pub fn read(&self) -> RwLockReadGuard<'_, ()> {
        self.lock.read()
    }

    /// Acquires the lock exclusively.
    pub fn write(&self) -> RwLockWriteGuard<'_, ()> {
        self.lock.write()
    }
}

/// Registry of named read-write locks, one per collection.
///
/// Backends serialize read-modify-write operations (update, delete) on a
/// collection by taking its write lock, while inserts and lookups take the
/// read side. Locks are created lazily on first use and live as long as the registry.
///
/// # Examples
///
/// ```
/// use nosql::common::LockRegistry;
///
/// let registry = LockRegistry::new();
/// let handle = registry.get_lock("users");
/// {
///     let _guard = handle.write();
/// }
/// let same = registry.get_lock("users");
/// let _shared = same.read();
/// ```
#[derive(Clone, Default)]
pub struct LockRegistry {
    locks: Arc<DashMap<String, LockHandle>>,
}

impl LockRegistry {
    pub fn new() -> Self {
        LockRegistry {
            locks: Arc::new(DashMap::new()),
        }
    }

    /// Returns the lock registered under `name`, creating it if needed.
    pub fn get_lock(&self, name: &str) -> LockHandle {
        self.locks
            .entry(name.to_string())
            .or_insert_with(LockHandle::new)
            .clone()
    }
}
