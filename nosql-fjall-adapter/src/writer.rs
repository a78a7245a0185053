use crate::store::{duplicate_key_error, resolve_key, FjallDatabase};
use crate::wrapper::{encode, to_nosql_error};
use nosql::collection::{BatchInserter, DocWriter, Document};
use nosql::context::Context;
use nosql::errors::{ErrorKind, NosqlError, NosqlResult};
use nosql::Key;
use std::collections::HashSet;

impl BatchInserter for FjallDatabase {
    fn batch_insert(&self, collection: &str) -> Box<dyn DocWriter> {
        Box::new(FjallBatchWriter::new(self.clone(), collection))
    }
}

/// Native [DocWriter] of the fjall backend.
///
/// Documents are buffered by `write_doc` and written by `flush` in one fjall
/// write batch, so a flush stores either every buffered document or none of
/// them. Keys are reported only once their batch is committed. The first
/// error poisons the writer: the buffer is dropped and every later call
/// returns that error. `close` discards anything not yet flushed.
pub struct FjallBatchWriter {
    database: FjallDatabase,
    collection: String,
    pending: Vec<(Key, Document)>,
    pending_keys: HashSet<Key>,
    keys: Vec<Key>,
    error: Option<NosqlError>,
    closed: bool,
}

impl FjallBatchWriter {
    pub fn new(database: FjallDatabase, collection: &str) -> Self {
        FjallBatchWriter {
            database,
            collection: collection.to_string(),
            pending: Vec::new(),
            pending_keys: HashSet::new(),
            keys: Vec::new(),
            error: None,
            closed: false,
        }
    }

    /// Number of documents buffered since the last flush.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    pub fn error(&self) -> Option<&NosqlError> {
        self.error.as_ref()
    }

    fn check_usable(&self) -> NosqlResult<()> {
        if self.closed {
            log::error!("Cannot use a closed writer for {}", self.collection);
            return Err(NosqlError::new(
                "Writer is already closed",
                ErrorKind::InvalidOperation,
            ));
        }

        match &self.error {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn poison(&mut self, err: NosqlError) -> NosqlError {
        self.pending.clear();
        self.pending_keys.clear();
        self.error = Some(err.clone());
        err
    }

    fn commit_pending(&self, ctx: &Context) -> NosqlResult<()> {
        ctx.check()?;
        self.database.check_opened()?;

        let lock = self.database.collection_lock(&self.collection);
        let _guard = lock.write();
        let target = self.database.open_collection(&self.collection)?;

        let mut batch = self.database.keyspace().batch();
        for (key, doc) in &self.pending {
            if target.contains_key(key)? {
                return Err(duplicate_key_error(&self.collection, key));
            }
            batch.insert(target.partition(), encode(key)?, encode(doc)?);
        }

        // last chance to give up before anything becomes visible
        ctx.check()?;
        batch.commit().map_err(|err| {
            log::error!("Failed to commit batch on {}: {}", self.collection, err);
            to_nosql_error(err)
        })
    }
}

impl DocWriter for FjallBatchWriter {
    fn write_doc(&mut self, ctx: &Context, key: Option<Key>, doc: Document) -> NosqlResult<()> {
        self.check_usable()?;

        if let Err(err) = ctx.check() {
            return Err(self.poison(err));
        }

        let key = match resolve_key(&self.collection, key) {
            Ok(key) => key,
            Err(err) => return Err(self.poison(err)),
        };

        if !self.pending_keys.insert(key.clone()) {
            let err = duplicate_key_error(&self.collection, &key);
            return Err(self.poison(err));
        }
        self.pending.push((key, doc));
        Ok(())
    }

    fn flush(&mut self, ctx: &Context) -> NosqlResult<()> {
        self.check_usable()?;
        if self.pending.is_empty() {
            return ctx.check();
        }

        match self.commit_pending(ctx) {
            Ok(()) => {
                log::debug!(
                    "Flushed {} documents into {}",
                    self.pending.len(),
                    self.collection
                );
                self.keys
                    .extend(self.pending.drain(..).map(|(key, _)| key));
                self.pending_keys.clear();
                Ok(())
            }
            Err(err) => Err(self.poison(err)),
        }
    }

    fn keys(&self) -> &[Key] {
        &self.keys
    }

    fn close(&mut self) -> NosqlResult<()> {
        if !self.closed && !self.pending.is_empty() {
            log::debug!(
                "Discarding {} unflushed documents for {}",
                self.pending.len(),
                self.collection
            );
        }
        self.pending.clear();
        self.pending_keys.clear();
        self.closed = true;
        Ok(())
    }
}
