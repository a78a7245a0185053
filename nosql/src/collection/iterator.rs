use crate::collection::{Document, QueryPlan};
use crate::common::Key;
use crate::context::Context;
use crate::errors::{NosqlError, NosqlResult};

/// Backend side of a [DocIterator].
///
/// Implementations advance lazily: nothing is read until [`next`](Self::next)
/// is called. `next` returns `false` both on exhaustion and on failure; in the
/// latter case [`err`](Self::err) reports the failure.
pub trait DocIteratorProvider: Send {
    /// Advances to the next matching document.
    fn next(&mut self, ctx: &Context) -> bool;

    /// The error that stopped iteration, if any.
    fn err(&self) -> Option<&NosqlError>;

    /// Key of the current document.
    fn key(&self) -> Option<&Key>;

    /// The current document.
    fn doc(&self) -> Option<&Document>;

    /// Releases backend resources.
    fn close(&mut self) -> NosqlResult<()>;
}

/// A forward-only, pull-based cursor over query results.
///
/// ```rust,ignore
/// let mut iter = db.query("users").with_fields([field("age").gt(18)]).iterate();
/// while iter.next(&ctx) {
///     println!("{} => {}", iter.key().unwrap(), iter.doc().unwrap());
/// }
/// if let Some(err) = iter.err() {
///     return Err(err.clone());
/// }
/// iter.close()?;
/// ```
///
/// An iterator is not restartable, a second pass needs a fresh
/// [`Query::iterate`](crate::collection::Query::iterate). Closing is
/// idempotent, and a dropped iterator closes itself.
pub struct DocIterator {
    provider: Box<dyn DocIteratorProvider>,
    closed: bool,
}

impl DocIterator {
    pub fn new<T: DocIteratorProvider + 'static>(provider: T) -> Self {
        DocIterator {
            provider: Box::new(provider),
            closed: false,
        }
    }

    /// An iterator that yields nothing and reports `err`.
    pub fn failed(err: NosqlError) -> Self {
        DocIterator::new(FailedIterator { error: err })
    }

    /// Advances to the next document. Returns `false` when exhausted, on
    /// error, or once the iterator is closed.
    pub fn next(&mut self, ctx: &Context) -> bool {
        if self.closed {
            return false;
        }
        self.provider.next(ctx)
    }

    pub fn err(&self) -> Option<&NosqlError> {
        self.provider.err()
    }

    pub fn key(&self) -> Option<&Key> {
        if self.closed {
            return None;
        }
        self.provider.key()
    }

    pub fn doc(&self) -> Option<&Document> {
        if self.closed {
            return None;
        }
        self.provider.doc()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn close(&mut self) -> NosqlResult<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.provider.close()
    }
}

impl Drop for DocIterator {
    fn drop(&mut self) {
        if !self.closed {
            if let Err(err) = self.close() {
                log::warn!("Failed to close document iterator on drop: {}", err);
            }
        }
    }
}

struct FailedIterator {
    error: NosqlError,
}

impl DocIteratorProvider for FailedIterator {
    fn next(&mut self, _ctx: &Context) -> bool {
        false
    }

    fn err(&self) -> Option<&NosqlError> {
        Some(&self.error)
    }

    fn key(&self) -> Option<&Key> {
        None
    }

    fn doc(&self) -> Option<&Document> {
        None
    }

    fn close(&mut self) -> NosqlResult<()> {
        Ok(())
    }
}

/// Ordered, seekable read access to one collection.
///
/// Backends expose their storage through this trait and get filtering,
/// limits, cancellation and the iterator contract from [FilteredIterator].
pub trait EntryCursor: Send {
    /// Returns the first entry whose key is strictly greater than `after`,
    /// or the first entry of the collection when `after` is `None`.
    fn higher_entry(&self, after: Option<&Key>) -> NosqlResult<Option<(Key, Document)>>;
}

/// Applies a [QueryPlan] to an [EntryCursor].
///
/// The cursor is seeked one entry at a time from the last visited key, so
/// the iterator holds no snapshot and observes concurrent writes past its
/// position. The context is checked before every seek. After the first
/// error the iterator is poisoned and keeps returning `false`.
pub struct FilteredIterator {
    cursor: Option<Box<dyn EntryCursor>>,
    plan: QueryPlan,
    last_key: Option<Key>,
    current: Option<(Key, Document)>,
    produced: usize,
    error: Option<NosqlError>,
}

impl FilteredIterator {
    pub fn new<C: EntryCursor + 'static>(cursor: C, plan: QueryPlan) -> Self {
        FilteredIterator {
            cursor: Some(Box::new(cursor)),
            plan,
            last_key: None,
            current: None,
            produced: 0,
            error: None,
        }
    }

    fn finish(&mut self, error: Option<NosqlError>) -> bool {
        self.current = None;
        self.cursor = None;
        if error.is_some() {
            self.error = error;
        }
        false
    }
}

impl DocIteratorProvider for FilteredIterator {
    fn next(&mut self, ctx: &Context) -> bool {
        if self.error.is_some() || self.cursor.is_none() {
            self.current = None;
            return false;
        }

        if self.plan.limit_reached(self.produced) {
            return self.finish(None);
        }

        loop {
            if let Err(err) = ctx.check() {
                return self.finish(Some(err));
            }

            let entry = match &self.cursor {
                Some(cursor) => cursor.higher_entry(self.last_key.as_ref()),
                None => return self.finish(None),
            };

            match entry {
                Ok(Some((key, doc))) => {
                    self.last_key = Some(key.clone());
                    if self.plan.matches(&doc) {
                        self.produced += 1;
                        self.current = Some((key, doc));
                        return true;
                    }
                }
                Ok(None) => return self.finish(None),
                Err(err) => return self.finish(Some(err)),
            }
        }
    }

    fn err(&self) -> Option<&NosqlError> {
        self.error.as_ref()
    }

    fn key(&self) -> Option<&Key> {
        self.current.as_ref().map(|(key, _)| key)
    }

    fn doc(&self) -> Option<&Document> {
        self.current.as_ref().map(|(_, doc)| doc)
    }

    fn close(&mut self) -> NosqlResult<()> {
        self.current = None;
        self.cursor = None;
        Ok(())
    }
}
