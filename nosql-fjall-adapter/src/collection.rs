use crate::store::FjallDatabase;
use crate::wrapper::{decode, encode, to_nosql_error};
use fjall::PartitionHandle;
use nosql::collection::{Document, EntryCursor};
use nosql::errors::{ErrorKind, NosqlError, NosqlResult};
use nosql::Key;
use std::collections::Bound::{Excluded, Unbounded};

/// One collection, stored in its own fjall partition.
///
/// Keys and documents are bincode encoded. Entries are ordered by the
/// encoded key bytes.
#[derive(Clone)]
pub(crate) struct FjallCollection {
    name: String,
    partition: PartitionHandle,
}

impl FjallCollection {
    pub(crate) fn new(name: &str, partition: PartitionHandle) -> Self {
        FjallCollection {
            name: name.to_string(),
            partition,
        }
    }

    pub(crate) fn partition(&self) -> &PartitionHandle {
        &self.partition
    }

    pub(crate) fn get(&self, key: &Key) -> NosqlResult<Option<Document>> {
        let encoded = encode(key)?;
        match self.partition.get(encoded) {
            Ok(Some(bytes)) => Ok(Some(self.decode_document(key, &bytes)?)),
            Ok(None) => Ok(None),
            Err(err) => {
                log::error!("Failed to read from collection {}: {}", self.name, err);
                Err(to_nosql_error(err))
            }
        }
    }

    pub(crate) fn contains_key(&self, key: &Key) -> NosqlResult<bool> {
        let encoded = encode(key)?;
        self.partition.contains_key(encoded).map_err(|err| {
            log::error!("Failed to check key in collection {}: {}", self.name, err);
            to_nosql_error(err)
        })
    }

    pub(crate) fn put(&self, key: &Key, doc: &Document) -> NosqlResult<()> {
        let encoded_key = encode(key)?;
        let encoded_doc = encode(doc)?;
        self.partition
            .insert(encoded_key, encoded_doc)
            .map_err(|err| {
                log::error!("Failed to write to collection {}: {}", self.name, err);
                to_nosql_error(err)
            })
    }

    fn decode_document(&self, key: &Key, bytes: &[u8]) -> NosqlResult<Document> {
        decode(bytes).map_err(|err| {
            log::error!("Document {} in collection {} is corrupt", key, self.name);
            NosqlError::new_with_cause(
                &format!("Failed to decode document {} in collection {}", key, self.name),
                ErrorKind::EncodingError,
                err.into(),
            )
        })
    }

    /// First entry strictly after `after` in partition order, or the first
    /// entry when `after` is `None`.
    pub(crate) fn higher_entry(&self, after: Option<&Key>) -> NosqlResult<Option<(Key, Document)>> {
        let entry = match after {
            Some(key) => {
                let encoded = encode(key)?;
                self.partition.range((Excluded(encoded), Unbounded)).next().transpose()
            }
            None => self.partition.first_key_value(),
        };

        match entry {
            Ok(Some((key, doc))) => {
                let key: Key = decode(&key)?;
                let doc = self.decode_document(&key, &doc)?;
                Ok(Some((key, doc)))
            }
            Ok(None) => Ok(None),
            Err(err) => {
                log::error!("Failed to seek in collection {}: {}", self.name, err);
                Err(to_nosql_error(err))
            }
        }
    }
}

/// Seeks a collection on behalf of a `FilteredIterator`.
///
/// A cursor over a collection that does not exist yet yields nothing.
pub(crate) struct FjallCursor {
    database: FjallDatabase,
    collection: Option<FjallCollection>,
}

impl FjallCursor {
    pub(crate) fn new(database: FjallDatabase, collection: Option<FjallCollection>) -> Self {
        FjallCursor {
            database,
            collection,
        }
    }
}

impl EntryCursor for FjallCursor {
    fn higher_entry(&self, after: Option<&Key>) -> NosqlResult<Option<(Key, Document)>> {
        self.database.check_opened()?;
        match &self.collection {
            Some(collection) => collection.higher_entry(after),
            None => Ok(None),
        }
    }
}
