use super::map::{InMemoryCollection, InMemoryCursor};
use crate::collection::{DeletePlan, DocIterator, Document, FilteredIterator, QueryPlan, UpdatePlan};
use crate::common::{gen_key, Key, LockRegistry};
use crate::context::Context;
use crate::database::{Database, DatabaseProvider};
use crate::errors::{ErrorKind, NosqlError, NosqlResult};
use crate::index::{Index, IndexSet};
use dashmap::DashMap;
use itertools::Itertools;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A [DatabaseProvider] keeping every collection in memory.
///
/// # Characteristics
/// - **Ordered**: each collection is a concurrent skip list keyed by [Key]
/// - **Lazy iteration**: iterators seek from their last key instead of
///   copying the collection, so they see writes made after they started
/// - **Serialized read-modify-write**: updates and deletes hold the
///   collection's write lock, inserts and lookups the read lock
/// - **No native batching**: [`Database::batch_insert`] uses the sequential
///   emulation
///
/// All data is lost when the last handle is dropped.
///
/// # Usage
/// ```rust
/// use nosql::context::Context;
/// use nosql::store::memory::InMemoryDatabase;
/// use nosql::doc;
///
/// let db = InMemoryDatabase::open();
/// let ctx = Context::background();
/// let key = db.insert(&ctx, "notes", None, doc! { text: "hi" }).unwrap();
/// assert_eq!(db.find_by_key(&ctx, "notes", &key).unwrap(), doc! { text: "hi" });
/// ```
#[derive(Clone, Default)]
pub struct InMemoryDatabase {
    inner: Arc<InMemoryDatabaseInner>,
}

impl InMemoryDatabase {
    pub fn new() -> Self {
        InMemoryDatabase {
            inner: Arc::new(InMemoryDatabaseInner::default()),
        }
    }

    /// Creates a fresh in-memory database behind a [Database] handle.
    pub fn open() -> Database {
        Database::new(InMemoryDatabase::new())
    }

    /// Indexes declared on `collection`, if any.
    pub fn indexes(&self, collection: &str) -> Option<IndexSet> {
        self.inner
            .collections
            .get(collection)
            .and_then(|c| c.indexes())
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    pub(crate) fn check_opened(&self) -> NosqlResult<()> {
        if self.is_closed() {
            log::error!("In-memory database is already closed");
            return Err(NosqlError::new(
                "Database is already closed",
                ErrorKind::StoreAlreadyClosed,
            ));
        }
        Ok(())
    }
}

#[derive(Default)]
struct InMemoryDatabaseInner {
    closed: AtomicBool,
    collections: DashMap<String, InMemoryCollection>,
    lock_registry: LockRegistry,
}

impl InMemoryDatabaseInner {
    fn collection(&self, name: &str) -> Option<InMemoryCollection> {
        self.collections.get(name).map(|c| c.value().clone())
    }

    fn get_or_create(&self, name: &str) -> InMemoryCollection {
        self.collections
            .entry(name.to_string())
            .or_insert_with(|| {
                log::debug!("Creating in-memory collection {}", name);
                InMemoryCollection::new(name)
            })
            .value()
            .clone()
    }
}

impl DatabaseProvider for InMemoryDatabase {
    fn insert(
        &self,
        ctx: &Context,
        collection: &str,
        key: Option<Key>,
        doc: Document,
    ) -> NosqlResult<Key> {
        ctx.check()?;
        self.check_opened()?;

        let key = match key {
            Some(key) if key.is_empty() => {
                log::error!("Cannot insert into {} with an empty key", collection);
                return Err(NosqlError::new(
                    "Document key must not be empty",
                    ErrorKind::InvalidKey,
                ));
            }
            Some(key) => key,
            None => gen_key(),
        };

        let lock = self.inner.lock_registry.get_lock(collection);
        let _guard = lock.read();
        let target = self.inner.get_or_create(collection);
        if !target.insert_new(key.clone(), doc) {
            log::error!("Document with key {} already exists in {}", key, collection);
            return Err(NosqlError::new(
                &format!("Document with key {} already exists", key),
                ErrorKind::UniqueConstraintViolation,
            ));
        }
        Ok(key)
    }

    fn find_by_key(&self, ctx: &Context, collection: &str, key: &Key) -> NosqlResult<Document> {
        ctx.check()?;
        self.check_opened()?;

        self.inner
            .collection(collection)
            .and_then(|c| c.get(key))
            .ok_or_else(NosqlError::not_found)
    }

    fn iterate(&self, collection: &str, plan: &QueryPlan) -> DocIterator {
        if let Err(err) = self.check_opened() {
            return DocIterator::failed(err);
        }

        // a missing collection iterates as empty and is not created
        let target = self
            .inner
            .collection(collection)
            .unwrap_or_else(|| InMemoryCollection::new(collection));
        let cursor = InMemoryCursor::new(self.clone(), target);
        DocIterator::new(FilteredIterator::new(cursor, plan.clone()))
    }

    fn update(
        &self,
        ctx: &Context,
        collection: &str,
        key: &Key,
        plan: &UpdatePlan,
    ) -> NosqlResult<Document> {
        ctx.check()?;
        self.check_opened()?;

        let lock = self.inner.lock_registry.get_lock(collection);
        let _guard = lock.write();

        let existing = self.inner.collection(collection).and_then(|c| c.get(key));
        let updated = plan.apply(existing.as_ref())?;
        self.inner
            .get_or_create(collection)
            .put(key.clone(), updated.clone());
        Ok(updated)
    }

    fn delete(&self, ctx: &Context, collection: &str, plan: &DeletePlan) -> NosqlResult<u64> {
        ctx.check()?;
        self.check_opened()?;

        let target = match self.inner.collection(collection) {
            Some(target) => target,
            None => return Ok(0),
        };

        let lock = self.inner.lock_registry.get_lock(collection);
        let _guard = lock.write();

        let candidates: Vec<Key> = match plan.keys() {
            Some(keys) => keys.iter().cloned().collect(),
            None => {
                let mut keys = Vec::with_capacity(target.len());
                let mut last: Option<Key> = None;
                while let Some((key, _)) = target.higher_entry(last.as_ref()) {
                    keys.push(key.clone());
                    last = Some(key);
                }
                keys
            }
        };

        let mut removed = 0u64;
        for key in candidates {
            ctx.check()?;
            if let Some(doc) = target.get(&key) {
                if plan.matches(&key, &doc) && target.remove(&key) {
                    removed += 1;
                }
            }
        }
        log::debug!("Deleted {} documents from {}", removed, collection);
        Ok(removed)
    }

    fn ensure_index(
        &self,
        ctx: &Context,
        collection: &str,
        primary: &Index,
        secondary: &[Index],
    ) -> NosqlResult<()> {
        ctx.check()?;
        self.check_opened()?;
        primary.validate_primary()?;

        let target = self.inner.get_or_create(collection);
        target.set_indexes(primary, secondary);
        log::debug!(
            "Ensured indexes on {}: primary {}, {} secondary",
            collection,
            primary,
            secondary.len()
        );
        Ok(())
    }

    fn collection_names(&self) -> NosqlResult<Vec<String>> {
        self.check_opened()?;
        Ok(self
            .inner
            .collections
            .iter()
            .map(|entry| entry.key().clone())
            .sorted()
            .collect())
    }

    fn close(&self) -> NosqlResult<()> {
        if self.inner.closed.swap(true, Ordering::AcqRel) {
            log::warn!("In-memory database is already closed");
            return Ok(());
        }
        self.inner.collections.clear();
        log::debug!("In-memory database closed");
        Ok(())
    }
}
