//! The backend boundary and the [Database] handle callers program against.

use crate::collection::{
    count_iterator, first_of_iterator, BatchInserter, Delete, DeletePlan, DocIterator, DocWriter,
    Document, Query, QueryPlan, SequentialWriter, Update, UpdatePlan,
};
use crate::common::Key;
use crate::context::Context;
use crate::errors::NosqlResult;
use crate::index::Index;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

/// Operations a storage backend implements.
///
/// Every method that touches storage takes a [Context] and must fail with
/// `Cancelled` or `DeadlineExceeded` once it is done. Collections are created
/// implicitly by the first insert or by [`ensure_index`](Self::ensure_index).
///
/// Callers use the [Database] wrapper rather than this trait directly.
pub trait DatabaseProvider: Send + Sync {
    /// Stores `doc` under `key`, generating a key when `None`. Returns the key used.
    fn insert(
        &self,
        ctx: &Context,
        collection: &str,
        key: Option<Key>,
        doc: Document,
    ) -> NosqlResult<Key>;

    /// Looks a document up by key, failing with `NotFound` if absent.
    fn find_by_key(&self, ctx: &Context, collection: &str, key: &Key) -> NosqlResult<Document>;

    /// Opens a lazy iterator over the documents matching `plan`.
    fn iterate(&self, collection: &str, plan: &QueryPlan) -> DocIterator;

    fn count(&self, ctx: &Context, collection: &str, plan: &QueryPlan) -> NosqlResult<u64> {
        count_iterator(ctx, self.iterate(collection, plan))
    }

    fn find_one(&self, ctx: &Context, collection: &str, plan: &QueryPlan) -> NosqlResult<Document> {
        first_of_iterator(ctx, self.iterate(collection, plan))
    }

    /// Applies `plan` to the document at `key` and returns the stored result.
    fn update(
        &self,
        ctx: &Context,
        collection: &str,
        key: &Key,
        plan: &UpdatePlan,
    ) -> NosqlResult<Document>;

    /// Removes the documents selected by `plan` and returns how many were removed.
    fn delete(&self, ctx: &Context, collection: &str, plan: &DeletePlan) -> NosqlResult<u64>;

    /// Creates the collection if needed and records its indexes.
    fn ensure_index(
        &self,
        ctx: &Context,
        collection: &str,
        primary: &Index,
        secondary: &[Index],
    ) -> NosqlResult<()>;

    fn collection_names(&self) -> NosqlResult<Vec<String>>;

    fn close(&self) -> NosqlResult<()>;

    /// Native batch insert support, if the backend has it.
    fn batch_inserter(&self) -> Option<&dyn BatchInserter> {
        None
    }
}

/// Handle to a document database.
///
/// `Database` is a cheap, cloneable wrapper over a [DatabaseProvider]. All
/// clones share the same backend.
///
/// ```rust
/// use nosql::context::Context;
/// use nosql::filter::field;
/// use nosql::store::memory::InMemoryDatabase;
/// use nosql::{doc, key};
///
/// let db = InMemoryDatabase::open();
/// let ctx = Context::background();
///
/// db.insert(&ctx, "users", Some(key!("alice")), doc! { age: 30 }).unwrap();
/// let count = db.query("users").with_fields([field("age").gt(18)]).count(&ctx).unwrap();
/// assert_eq!(count, 1);
/// db.close().unwrap();
/// ```
#[derive(Clone)]
pub struct Database {
    inner: Arc<dyn DatabaseProvider>,
}

impl Database {
    pub fn new<T: DatabaseProvider + 'static>(provider: T) -> Self {
        Database {
            inner: Arc::new(provider),
        }
    }

    pub(crate) fn provider(&self) -> Arc<dyn DatabaseProvider> {
        Arc::clone(&self.inner)
    }

    /// Inserts a document, generating a key when `key` is `None`.
    ///
    /// # Errors
    ///
    /// `UniqueConstraintViolation` if a document with the key already exists.
    pub fn insert(
        &self,
        ctx: &Context,
        collection: &str,
        key: Option<Key>,
        doc: Document,
    ) -> NosqlResult<Key> {
        self.inner.insert(ctx, collection, key, doc)
    }

    pub fn find_by_key(&self, ctx: &Context, collection: &str, key: &Key) -> NosqlResult<Document> {
        self.inner.find_by_key(ctx, collection, key)
    }

    pub fn query(&self, collection: &str) -> Query {
        Query::new(collection, self.provider())
    }

    pub fn update(&self, collection: &str, key: Key) -> Update {
        Update::new(collection, key, self.provider())
    }

    pub fn delete(&self, collection: &str) -> Delete {
        Delete::new(collection, self.provider())
    }

    /// Creates `collection` if absent and declares its indexes.
    ///
    /// # Errors
    ///
    /// `IndexError` if `primary` is not a valid primary index.
    pub fn ensure_index(
        &self,
        ctx: &Context,
        collection: &str,
        primary: &Index,
        secondary: &[Index],
    ) -> NosqlResult<()> {
        primary.validate_primary()?;
        ctx.check()?;
        self.inner.ensure_index(ctx, collection, primary, secondary)
    }

    /// Returns a streaming writer for `collection`: the backend's native batch
    /// writer when available, the sequential emulation otherwise.
    pub fn batch_insert(&self, collection: &str) -> Box<dyn DocWriter> {
        match self.inner.batch_inserter() {
            Some(inserter) => inserter.batch_insert(collection),
            None => Box::new(SequentialWriter::with_provider(self.provider(), collection)),
        }
    }

    pub fn supports_batch_insert(&self) -> bool {
        self.inner.batch_inserter().is_some()
    }

    pub fn collection_names(&self) -> NosqlResult<Vec<String>> {
        self.inner.collection_names()
    }

    pub fn close(&self) -> NosqlResult<()> {
        self.inner.close()
    }
}

impl Debug for Database {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("batch_insert", &self.supports_batch_insert())
            .finish()
    }
}
