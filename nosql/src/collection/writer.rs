use crate::collection::Document;
use crate::common::Key;
use crate::context::Context;
use crate::database::{Database, DatabaseProvider};
use crate::errors::{ErrorKind, NosqlError, NosqlResult};
use std::sync::Arc;

/// Streaming multi-document insert.
///
/// Obtained from [`Database::batch_insert`](crate::database::Database::batch_insert).
/// A writer either inserts each document as it arrives (the sequential
/// emulation) or buffers documents and writes them on [`flush`](Self::flush)
/// (a backend's native batch writer). Callers should always flush before
/// reading [`keys`](Self::keys) and close when done.
pub trait DocWriter: Send {
    /// Hands a document to the writer. `None` lets the backend generate a key.
    fn write_doc(&mut self, ctx: &Context, key: Option<Key>, doc: Document) -> NosqlResult<()>;

    /// Makes every written document durable and reports the first failure.
    fn flush(&mut self, ctx: &Context) -> NosqlResult<()>;

    /// Keys of documents successfully written so far.
    fn keys(&self) -> &[Key];

    /// Releases the writer, discarding anything not flushed. Safe after an error.
    fn close(&mut self) -> NosqlResult<()>;
}

/// Optional backend capability: native batched inserts.
pub trait BatchInserter: Send + Sync {
    fn batch_insert(&self, collection: &str) -> Box<dyn DocWriter>;
}

/// [DocWriter] for backends without native batching.
///
/// Every `write_doc` is an immediate single insert. The first failure is
/// kept and returned by every later `write_doc` and `flush` without writing
/// anything further.
pub struct SequentialWriter {
    provider: Arc<dyn DatabaseProvider>,
    collection: String,
    keys: Vec<Key>,
    error: Option<NosqlError>,
    closed: bool,
}

impl SequentialWriter {
    pub fn new(db: &Database, collection: &str) -> Self {
        SequentialWriter::with_provider(db.provider(), collection)
    }

    pub(crate) fn with_provider(provider: Arc<dyn DatabaseProvider>, collection: &str) -> Self {
        SequentialWriter {
            provider,
            collection: collection.to_string(),
            keys: Vec::new(),
            error: None,
            closed: false,
        }
    }

    pub fn error(&self) -> Option<&NosqlError> {
        self.error.as_ref()
    }
}

impl DocWriter for SequentialWriter {
    fn write_doc(&mut self, ctx: &Context, key: Option<Key>, doc: Document) -> NosqlResult<()> {
        if self.closed {
            log::error!("Cannot write to a closed writer for {}", self.collection);
            return Err(NosqlError::new(
                "Writer is already closed",
                ErrorKind::InvalidOperation,
            ));
        }

        if let Some(err) = &self.error {
            return Err(err.clone());
        }

        match self.provider.insert(ctx, &self.collection, key, doc) {
            Ok(key) => {
                self.keys.push(key);
                Ok(())
            }
            Err(err) => {
                self.error = Some(err.clone());
                Err(err)
            }
        }
    }

    fn flush(&mut self, ctx: &Context) -> NosqlResult<()> {
        match &self.error {
            Some(err) => Err(err.clone()),
            None => ctx.check(),
        }
    }

    fn keys(&self) -> &[Key] {
        &self.keys
    }

    fn close(&mut self) -> NosqlResult<()> {
        self.closed = true;
        Ok(())
    }
}
