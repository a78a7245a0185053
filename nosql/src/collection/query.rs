use crate::collection::{DocIterator, Document};
use crate::context::Context;
use crate::database::DatabaseProvider;
use crate::errors::{NosqlError, NosqlResult};
use crate::filter::{matches_all, FieldFilter};
use std::sync::Arc;

/// The executable part of a [Query]: accumulated filters and the limit.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct QueryPlan {
    filters: Vec<FieldFilter>,
    limit: Option<usize>,
}

impl QueryPlan {
    pub fn filters(&self) -> &[FieldFilter] {
        &self.filters
    }

    /// Maximum number of documents to produce, `None` for unbounded.
    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    pub fn add_filters<I: IntoIterator<Item = FieldFilter>>(&mut self, filters: I) {
        self.filters.extend(filters);
    }

    /// Negative limits mean unbounded.
    pub fn set_limit(&mut self, n: i64) {
        self.limit = usize::try_from(n).ok();
    }

    pub fn matches(&self, doc: &Document) -> bool {
        matches_all(&self.filters, doc)
    }

    pub fn limit_reached(&self, produced: usize) -> bool {
        self.limit.map(|limit| produced >= limit).unwrap_or(false)
    }
}

/// Query builder handed out by [`Database::query`](crate::database::Database::query).
///
/// Configuration calls only accumulate state. Work happens in one of the
/// terminal calls [`count`](Query::count), [`one`](Query::one) or
/// [`iterate`](Query::iterate).
///
/// ```rust,ignore
/// let adults = db
///     .query("users")
///     .with_fields([field("age").gte(18)])
///     .with_fields([field("address.city").eq("Paris")])
///     .limit(10)
///     .count(&ctx)?;
/// ```
pub struct Query {
    collection: String,
    plan: QueryPlan,
    provider: Arc<dyn DatabaseProvider>,
}

impl Query {
    pub(crate) fn new(collection: &str, provider: Arc<dyn DatabaseProvider>) -> Self {
        Query {
            collection: collection.to_string(),
            plan: QueryPlan::default(),
            provider,
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn plan(&self) -> &QueryPlan {
        &self.plan
    }

    /// Adds filters. Filters accumulate and are AND-combined.
    pub fn with_fields<I: IntoIterator<Item = FieldFilter>>(&mut self, filters: I) -> &mut Self {
        self.plan.add_filters(filters);
        self
    }

    /// Caps the number of results. `n < 0` removes the cap.
    pub fn limit(&mut self, n: i64) -> &mut Self {
        self.plan.set_limit(n);
        self
    }

    /// Counts matching documents, capped by the limit.
    pub fn count(&self, ctx: &Context) -> NosqlResult<u64> {
        self.provider.count(ctx, &self.collection, &self.plan)
    }

    /// Returns the first matching document in backend order.
    ///
    /// # Errors
    ///
    /// `NotFound` if nothing matches.
    pub fn one(&self, ctx: &Context) -> NosqlResult<Document> {
        self.provider.find_one(ctx, &self.collection, &self.plan)
    }

    /// Starts iterating over matching documents.
    pub fn iterate(&self) -> DocIterator {
        self.provider.iterate(&self.collection, &self.plan)
    }
}

/// Counts what `iter` produces, closing it afterwards.
pub fn count_iterator(ctx: &Context, mut iter: DocIterator) -> NosqlResult<u64> {
    let mut count = 0u64;
    while iter.next(ctx) {
        count += 1;
    }

    let result = match iter.err() {
        Some(err) => Err(err.clone()),
        None => Ok(count),
    };
    iter.close()?;
    result
}

/// Takes the first document `iter` produces, closing it afterwards.
pub fn first_of_iterator(ctx: &Context, mut iter: DocIterator) -> NosqlResult<Document> {
    let result = if iter.next(ctx) {
        match iter.doc() {
            Some(doc) => Ok(doc.clone()),
            None => Err(NosqlError::not_found()),
        }
    } else {
        match iter.err() {
            Some(err) => Err(err.clone()),
            None => Err(NosqlError::not_found()),
        }
    };
    iter.close()?;
    result
}
