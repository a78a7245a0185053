use crate::collection::{Document, EntryCursor};
use crate::common::{atomic, Atomic, Key, ReadExecutor, WriteExecutor};
use crate::errors::NosqlResult;
use crate::index::{Index, IndexSet};
use crossbeam_skiplist::SkipMap;
use std::ops::Bound::{Excluded, Unbounded};
use std::sync::Arc;

use super::InMemoryDatabase;

/// One in-memory collection: documents ordered by key in a concurrent skip list.
#[derive(Clone)]
pub struct InMemoryCollection {
    inner: Arc<InMemoryCollectionInner>,
}

struct InMemoryCollectionInner {
    name: String,
    backing_map: SkipMap<Key, Document>,
    indexes: Atomic<Option<IndexSet>>,
}

impl InMemoryCollection {
    pub(crate) fn new(name: &str) -> Self {
        InMemoryCollection {
            inner: Arc::new(InMemoryCollectionInner {
                name: name.to_string(),
                backing_map: SkipMap::new(),
                indexes: atomic(None),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn get(&self, key: &Key) -> Option<Document> {
        self.inner
            .backing_map
            .get(key)
            .map(|entry| entry.value().clone())
    }

    /// Inserts `doc` unless `key` is taken. Returns `false` if it was.
    pub(crate) fn insert_new(&self, key: Key, doc: Document) -> bool {
        let mut inserted = false;
        self.inner.backing_map.get_or_insert_with(key, || {
            inserted = true;
            doc
        });
        inserted
    }

    pub(crate) fn put(&self, key: Key, doc: Document) {
        self.inner.backing_map.insert(key, doc);
    }

    pub(crate) fn remove(&self, key: &Key) -> bool {
        self.inner.backing_map.remove(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.inner.backing_map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.backing_map.is_empty()
    }

    pub(crate) fn higher_entry(&self, after: Option<&Key>) -> Option<(Key, Document)> {
        let entry = match after {
            Some(after) => self
                .inner
                .backing_map
                .range::<Key, _>((Excluded(after), Unbounded))
                .next(),
            None => self.inner.backing_map.front(),
        };
        entry.map(|e| (e.key().clone(), e.value().clone()))
    }

    pub fn indexes(&self) -> Option<IndexSet> {
        self.inner.indexes.read_with(|indexes| indexes.clone())
    }

    pub(crate) fn set_indexes(&self, primary: &Index, secondary: &[Index]) {
        self.inner.indexes.write_with(|indexes| match indexes {
            Some(existing) => existing.redeclare(primary, secondary),
            None => *indexes = Some(IndexSet::new(primary, secondary)),
        });
    }
}

/// Seeks through an [InMemoryCollection], failing once the database closes.
pub(crate) struct InMemoryCursor {
    database: InMemoryDatabase,
    collection: InMemoryCollection,
}

impl InMemoryCursor {
    pub(crate) fn new(database: InMemoryDatabase, collection: InMemoryCollection) -> Self {
        InMemoryCursor {
            database,
            collection,
        }
    }
}

impl EntryCursor for InMemoryCursor {
    fn higher_entry(&self, after: Option<&Key>) -> NosqlResult<Option<(Key, Document)>> {
        self.database.check_opened()?;
        Ok(self.collection.higher_entry(after))
    }
}
