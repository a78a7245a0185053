use crate::collection::Document;
use crate::common::Key;
use crate::context::Context;
use crate::database::DatabaseProvider;
use crate::errors::NosqlResult;
use crate::filter::{matches_all, FieldFilter};
use std::collections::BTreeSet;
use std::sync::Arc;

/// The executable part of a [Delete].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DeletePlan {
    filters: Vec<FieldFilter>,
    keys: Option<BTreeSet<Key>>,
}

impl DeletePlan {
    pub fn filters(&self) -> &[FieldFilter] {
        &self.filters
    }

    /// Target keys, `None` when the delete is not restricted by key.
    pub fn keys(&self) -> Option<&BTreeSet<Key>> {
        self.keys.as_ref()
    }

    pub fn add_filters<I: IntoIterator<Item = FieldFilter>>(&mut self, filters: I) {
        self.filters.extend(filters);
    }

    pub fn add_keys<I: IntoIterator<Item = Key>>(&mut self, keys: I) {
        let mut keys = keys.into_iter().peekable();
        if keys.peek().is_none() {
            return;
        }
        self.keys.get_or_insert_with(BTreeSet::new).extend(keys);
    }

    /// Whether the document stored under `key` is selected for deletion.
    /// Keys narrow the selection, they never bypass the filters.
    pub fn matches(&self, key: &Key, doc: &Document) -> bool {
        let key_selected = match &self.keys {
            Some(keys) => keys.contains(key),
            None => true,
        };
        key_selected && matches_all(&self.filters, doc)
    }
}

/// Delete builder handed out by [`Database::delete`](crate::database::Database::delete).
///
/// ```rust,ignore
/// let removed = db
///     .delete("sessions")
///     .keys([key!("s1"), key!("s2")])
///     .with_fields([field("expired").eq(true)])
///     .execute(&ctx)?;
/// ```
pub struct Delete {
    collection: String,
    plan: DeletePlan,
    provider: Arc<dyn DatabaseProvider>,
}

impl Delete {
    pub(crate) fn new(collection: &str, provider: Arc<dyn DatabaseProvider>) -> Self {
        Delete {
            collection: collection.to_string(),
            plan: DeletePlan::default(),
            provider,
        }
    }

    pub fn plan(&self) -> &DeletePlan {
        &self.plan
    }

    pub fn with_fields<I: IntoIterator<Item = FieldFilter>>(&mut self, filters: I) -> &mut Self {
        self.plan.add_filters(filters);
        self
    }

    pub fn keys<I: IntoIterator<Item = Key>>(&mut self, keys: I) -> &mut Self {
        self.plan.add_keys(keys);
        self
    }

    /// Deletes every selected document and returns how many were removed.
    pub fn execute(&self, ctx: &Context) -> NosqlResult<u64> {
        self.provider.delete(ctx, &self.collection, &self.plan)
    }
}
