use crate::builder::FjallDatabaseBuilder;
use crate::collection::{FjallCollection, FjallCursor};
use crate::config::FjallConfig;
use crate::version::fjall_version;
use crate::wrapper::{decode, decode_utf8, encode, to_nosql_error};
use dashmap::DashMap;
use fjall::{Keyspace, PartitionHandle, PersistMode};
use nosql::collection::{
    BatchInserter, DeletePlan, DocIterator, Document, FilteredIterator, QueryPlan, UpdatePlan,
};
use nosql::common::{gen_key, Key, LockHandle, LockRegistry};
use nosql::context::Context;
use nosql::database::{Database, DatabaseProvider};
use nosql::errors::{ErrorKind, NosqlError, NosqlResult};
use nosql::index::{Index, IndexSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

const CATALOG_PARTITION: &str = "$nosql_catalog";

// fjall rejects partition names longer than this
const MAX_PARTITION_NAME_LEN: usize = 255;

// catalog keys are collection names, and fjall keys are capped at u16::MAX bytes
const MAX_COLLECTION_NAME_LEN: usize = u16::MAX as usize;

/// What the catalog records about a collection.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
struct CatalogEntry {
    partition: String,
    indexes: Option<IndexSet>,
}

impl CatalogEntry {
    fn new(partition: String) -> Self {
        CatalogEntry {
            partition,
            indexes: None,
        }
    }
}

/// A [DatabaseProvider] persisting collections in a fjall keyspace.
///
/// Each collection lives in its own partition. A catalog partition maps
/// collection names to their partition and declared indexes, so collections
/// and indexes survive a reopen.
///
/// # Characteristics
/// - **Persistent**: backed by fjall's LSM-tree, the keyspace is persisted on
///   close and when the last handle is dropped (see
///   [`FjallConfig::commit_before_close`])
/// - **Serialized writes**: inserts, updates, deletes and index declarations
///   hold the collection's write lock, so duplicate checks and
///   read-modify-write cycles are not interleaved
/// - **Atomic deletes**: every document removed by one delete is removed in a
///   single write batch
/// - **Native batching**: [`Database::batch_insert`] returns a
///   [`FjallBatchWriter`](crate::FjallBatchWriter)
///
/// # Usage
/// ```rust,ignore
/// use nosql::context::Context;
/// use nosql_fjall_adapter::FjallDatabase;
///
/// let db = FjallDatabase::with_config()
///     .production_preset()
///     .db_path("/path/to/db")
///     .open()?;
/// let key = db.insert(&Context::background(), "notes", None, nosql::doc! { text: "hi" })?;
/// ```
#[derive(Clone)]
pub struct FjallDatabase {
    inner: Arc<FjallDatabaseInner>,
}

impl FjallDatabase {
    /// Starts configuring a new database.
    #[inline]
    pub fn with_config() -> FjallDatabaseBuilder {
        FjallDatabaseBuilder::new()
    }

    /// Opens or creates the keyspace at `config.db_path()`.
    ///
    /// # Errors
    ///
    /// `InvalidOperation` if no path is configured, a backend error if fjall
    /// cannot open the keyspace or its catalog.
    pub fn open(config: FjallConfig) -> NosqlResult<FjallDatabase> {
        if config.db_path().is_empty() {
            log::error!("Fjall database path is not set");
            return Err(NosqlError::new(
                "Fjall database path is not set",
                ErrorKind::InvalidOperation,
            ));
        }

        let keyspace = Keyspace::open(config.keyspace_config()).map_err(|err| {
            log::error!("Failed to open or create keyspace: {}", err);
            to_nosql_error(err)
        })?;

        let catalog = keyspace
            .open_partition(CATALOG_PARTITION, config.partition_config())
            .map_err(|err| {
                log::error!("Failed to open collection catalog: {}", err);
                to_nosql_error(err)
            })?;

        log::debug!("Opened fjall database at {}", config.db_path());
        Ok(FjallDatabase {
            inner: Arc::new(FjallDatabaseInner {
                keyspace,
                catalog,
                config,
                closed: AtomicBool::new(false),
                collections: DashMap::new(),
                lock_registry: LockRegistry::new(),
            }),
        })
    }

    pub fn config(&self) -> FjallConfig {
        self.inner.config.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    /// Persists the keyspace journal to disk.
    pub fn commit(&self) -> NosqlResult<()> {
        self.check_opened()?;
        self.inner.persist()
    }

    /// Indexes declared on `collection`, if any.
    pub fn indexes(&self, collection: &str) -> NosqlResult<Option<IndexSet>> {
        self.check_opened()?;
        Ok(self
            .inner
            .read_catalog(collection)?
            .and_then(|entry| entry.indexes))
    }

    /// Version of the fjall engine this adapter was built against.
    pub fn engine_version(&self) -> NosqlResult<String> {
        fjall_version()
            .map(|version| format!("fjall/{}", version))
            .map_err(|err| {
                log::error!("Failed to read fjall version: {}", err);
                NosqlError::new(&err, ErrorKind::InternalError)
            })
    }

    /// Encodes a collection name into fjall's partition name alphabet.
    ///
    /// ASCII letters, digits, `-` and `.` are kept. Every other byte,
    /// including `_`, becomes `_` followed by two hex digits, so distinct
    /// names never collide and never contain `$`.
    pub(crate) fn encode_name(name: &str) -> String {
        let mut encoded = String::with_capacity(name.len());
        for byte in name.bytes() {
            match byte {
                b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'-' | b'.' => {
                    encoded.push(byte as char)
                }
                _ => encoded.push_str(&format!("_{:02x}", byte)),
            }
        }
        encoded
    }

    /// Picks the partition for a new collection.
    ///
    /// Names whose encoding fits fjall's limit use it directly. Longer ones
    /// get a generated `_l<uuid>` id, which no encoded name can produce since
    /// encoding only ever emits `_` before two hex digits.
    pub(crate) fn partition_name(name: &str) -> String {
        let encoded = FjallDatabase::encode_name(name);
        if encoded.len() <= MAX_PARTITION_NAME_LEN {
            encoded
        } else {
            format!("_l{}", uuid::Uuid::new_v4().simple())
        }
    }

    pub(crate) fn check_opened(&self) -> NosqlResult<()> {
        if self.is_closed() {
            log::error!("Fjall database is already closed");
            return Err(NosqlError::new(
                "Database is already closed",
                ErrorKind::StoreAlreadyClosed,
            ));
        }
        Ok(())
    }

    pub(crate) fn keyspace(&self) -> &Keyspace {
        &self.inner.keyspace
    }

    pub(crate) fn collection_lock(&self, collection: &str) -> LockHandle {
        self.inner.lock_registry.get_lock(collection)
    }

    /// Returns the collection if it exists, without creating it.
    pub(crate) fn find_collection(&self, name: &str) -> NosqlResult<Option<FjallCollection>> {
        validate_collection_name(name)?;
        if let Some(collection) = self.inner.collections.get(name) {
            return Ok(Some(collection.value().clone()));
        }

        match self.inner.read_catalog(name)? {
            Some(entry) => self.inner.attach(name, &entry.partition).map(Some),
            None => Ok(None),
        }
    }

    /// Returns the collection, creating and registering it if needed.
    ///
    /// Callers must hold the collection's write lock.
    pub(crate) fn open_collection(&self, name: &str) -> NosqlResult<FjallCollection> {
        if let Some(collection) = self.find_collection(name)? {
            return Ok(collection);
        }

        let partition = FjallDatabase::partition_name(name);
        let collection = self.inner.attach(name, &partition)?;
        self.inner.write_catalog(name, &CatalogEntry::new(partition))?;
        log::debug!("Created fjall collection {}", name);
        Ok(collection)
    }
}

fn validate_collection_name(name: &str) -> NosqlResult<()> {
    if name.is_empty() {
        log::error!("Collection name must not be empty");
        return Err(NosqlError::new(
            "Collection name must not be empty",
            ErrorKind::InvalidOperation,
        ));
    }
    if name.len() > MAX_COLLECTION_NAME_LEN {
        log::error!("Collection name of {} bytes is too long", name.len());
        return Err(NosqlError::new(
            &format!(
                "Collection name must not exceed {} bytes",
                MAX_COLLECTION_NAME_LEN
            ),
            ErrorKind::InvalidOperation,
        ));
    }
    Ok(())
}

/// Validates a caller supplied key or generates a fresh one.
pub(crate) fn resolve_key(collection: &str, key: Option<Key>) -> NosqlResult<Key> {
    match key {
        Some(key) if key.is_empty() => {
            log::error!("Cannot insert into {} with an empty key", collection);
            Err(NosqlError::new(
                "Document key must not be empty",
                ErrorKind::InvalidKey,
            ))
        }
        Some(key) => Ok(key),
        None => Ok(gen_key()),
    }
}

pub(crate) fn duplicate_key_error(collection: &str, key: &Key) -> NosqlError {
    log::error!("Document with key {} already exists in {}", key, collection);
    NosqlError::new(
        &format!("Document with key {} already exists", key),
        ErrorKind::UniqueConstraintViolation,
    )
}

struct FjallDatabaseInner {
    keyspace: Keyspace,
    catalog: PartitionHandle,
    config: FjallConfig,
    closed: AtomicBool,
    collections: DashMap<String, FjallCollection>,
    lock_registry: LockRegistry,
}

impl FjallDatabaseInner {
    fn attach(&self, name: &str, partition: &str) -> NosqlResult<FjallCollection> {
        let partition = self
            .keyspace
            .open_partition(partition, self.config.partition_config())
            .map_err(|err| {
                log::error!("Failed to open partition for {}: {}", name, err);
                to_nosql_error(err)
            })?;

        let collection = self
            .collections
            .entry(name.to_string())
            .or_insert_with(|| FjallCollection::new(name, partition))
            .value()
            .clone();
        Ok(collection)
    }

    fn read_catalog(&self, name: &str) -> NosqlResult<Option<CatalogEntry>> {
        match self.catalog.get(name.as_bytes()) {
            Ok(Some(bytes)) => Ok(Some(decode(&bytes)?)),
            Ok(None) => Ok(None),
            Err(err) => {
                log::error!("Failed to read catalog entry for {}: {}", name, err);
                Err(to_nosql_error(err))
            }
        }
    }

    fn write_catalog(&self, name: &str, entry: &CatalogEntry) -> NosqlResult<()> {
        let bytes = encode(entry)?;
        self.catalog
            .insert(name.as_bytes(), bytes)
            .map_err(|err| {
                log::error!("Failed to write catalog entry for {}: {}", name, err);
                to_nosql_error(err)
            })
    }

    fn persist(&self) -> NosqlResult<()> {
        self.keyspace.persist(PersistMode::SyncAll).map_err(|err| {
            log::error!("Failed to commit keyspace: {}", err);
            to_nosql_error(err)
        })
    }
}

impl Drop for FjallDatabaseInner {
    fn drop(&mut self) {
        if !self.closed.load(Ordering::Acquire) && self.config.commit_before_close() {
            match self.persist() {
                Ok(_) => log::debug!("Committed keyspace during drop"),
                Err(err) => log::error!("Failed to commit keyspace during drop: {}", err),
            }
        }
    }
}

impl DatabaseProvider for FjallDatabase {
    fn insert(
        &self,
        ctx: &Context,
        collection: &str,
        key: Option<Key>,
        doc: Document,
    ) -> NosqlResult<Key> {
        ctx.check()?;
        self.check_opened()?;
        let key = resolve_key(collection, key)?;

        let lock = self.collection_lock(collection);
        let _guard = lock.write();
        let target = self.open_collection(collection)?;
        if target.contains_key(&key)? {
            return Err(duplicate_key_error(collection, &key));
        }
        target.put(&key, &doc)?;
        Ok(key)
    }

    fn find_by_key(&self, ctx: &Context, collection: &str, key: &Key) -> NosqlResult<Document> {
        ctx.check()?;
        self.check_opened()?;

        match self.find_collection(collection)? {
            Some(target) => target.get(key)?.ok_or_else(NosqlError::not_found),
            None => Err(NosqlError::not_found()),
        }
    }

    fn iterate(&self, collection: &str, plan: &QueryPlan) -> DocIterator {
        if let Err(err) = self.check_opened() {
            return DocIterator::failed(err);
        }

        match self.find_collection(collection) {
            Ok(target) => {
                let cursor = FjallCursor::new(self.clone(), target);
                DocIterator::new(FilteredIterator::new(cursor, plan.clone()))
            }
            Err(err) => DocIterator::failed(err),
        }
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

        let lock = self.collection_lock(collection);
        let _guard = lock.write();

        let existing = match self.find_collection(collection)? {
            Some(target) => target.get(key)?,
            None => None,
        };
        let updated = plan.apply(existing.as_ref())?;
        self.open_collection(collection)?.put(key, &updated)?;
        Ok(updated)
    }

    fn delete(&self, ctx: &Context, collection: &str, plan: &DeletePlan) -> NosqlResult<u64> {
        ctx.check()?;
        self.check_opened()?;

        let target = match self.find_collection(collection)? {
            Some(target) => target,
            None => return Ok(0),
        };

        let lock = self.collection_lock(collection);
        let _guard = lock.write();

        let mut matched = Vec::new();
        match plan.keys() {
            Some(keys) => {
                for key in keys {
                    ctx.check()?;
                    if let Some(doc) = target.get(key)? {
                        if plan.matches(key, &doc) {
                            matched.push(key.clone());
                        }
                    }
                }
            }
            None => {
                let mut last: Option<Key> = None;
                while let Some((key, doc)) = target.higher_entry(last.as_ref())? {
                    ctx.check()?;
                    if plan.matches(&key, &doc) {
                        matched.push(key.clone());
                    }
                    last = Some(key);
                }
            }
        }

        if matched.is_empty() {
            return Ok(0);
        }

        let mut batch = self.keyspace().batch();
        for key in &matched {
            batch.remove(target.partition(), encode(key)?);
        }
        batch.commit().map_err(|err| {
            log::error!("Failed to commit delete batch on {}: {}", collection, err);
            to_nosql_error(err)
        })?;

        log::debug!("Deleted {} documents from {}", matched.len(), collection);
        Ok(matched.len() as u64)
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

        let lock = self.collection_lock(collection);
        let _guard = lock.write();
        self.open_collection(collection)?;

        let mut entry = self.inner.read_catalog(collection)?.ok_or_else(|| {
            log::error!("Catalog entry for {} is missing", collection);
            NosqlError::new(
                &format!("Catalog entry for {} is missing", collection),
                ErrorKind::InternalError,
            )
        })?;
        match entry.indexes.as_mut() {
            Some(indexes) => indexes.redeclare(primary, secondary),
            None => entry.indexes = Some(IndexSet::new(primary, secondary)),
        }
        self.inner.write_catalog(collection, &entry)?;

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

        // catalog keys are raw UTF-8 names, so partition order is name order
        let mut names = Vec::new();
        for item in self.inner.catalog.iter() {
            let (name, _) = item.map_err(|err| {
                log::error!("Failed to read collection catalog: {}", err);
                to_nosql_error(err)
            })?;
            names.push(decode_utf8(&name)?);
        }
        Ok(names)
    }

    fn close(&self) -> NosqlResult<()> {
        if self.inner.closed.swap(true, Ordering::AcqRel) {
            log::warn!("Fjall database is already closed");
            return Ok(());
        }

        if self.inner.config.commit_before_close() {
            self.inner.persist()?;
        }
        self.inner.collections.clear();
        log::debug!("Closed fjall database at {}", self.inner.config.db_path());
        Ok(())
    }

    fn batch_inserter(&self) -> Option<&dyn BatchInserter> {
        Some(self)
    }
}

impl From<FjallDatabase> for Database {
    fn from(database: FjallDatabase) -> Self {
        Database::new(database)
    }
}
