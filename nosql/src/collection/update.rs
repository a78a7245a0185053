use crate::collection::Document;
use crate::common::{Key, Value};
use crate::context::Context;
use crate::database::DatabaseProvider;
use crate::errors::{ErrorKind, NosqlError, NosqlResult};
use std::collections::BTreeMap;
use std::sync::Arc;

/// The executable part of an [Update]: per-field increments and an optional
/// upsert document.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UpdatePlan {
    increments: BTreeMap<String, i64>,
    upsert: Option<Document>,
}

impl UpdatePlan {
    pub fn increments(&self) -> &BTreeMap<String, i64> {
        &self.increments
    }

    pub fn upsert_doc(&self) -> Option<&Document> {
        self.upsert.as_ref()
    }

    /// Registers an increment. A second call for the same field replaces the delta.
    pub fn set_increment(&mut self, field: &str, delta: i64) {
        self.increments.insert(field.to_string(), delta);
    }

    pub fn set_upsert(&mut self, doc: Document) {
        self.upsert = Some(doc);
    }

    /// Computes the document to store given the current one.
    ///
    /// * No current document: the upsert document with every incremented
    ///   field set to its delta. Fails with `NotFound` without an upsert.
    /// * Current document: upsert fields not touched by an increment are
    ///   copied over it, then each increment is applied. An absent field
    ///   becomes the delta, `Int` adds with overflow checking and `Float`
    ///   adds the delta as a float.
    ///
    /// # Errors
    ///
    /// `InvalidDataType` if an incremented field holds a non-numeric value,
    /// `InvalidOperation` on integer overflow.
    pub fn apply(&self, existing: Option<&Document>) -> NosqlResult<Document> {
        let existing = match existing {
            Some(existing) => existing,
            None => return self.seed(),
        };

        let mut doc = existing.clone();
        if let Some(upsert) = &self.upsert {
            for (field, value) in upsert.iter() {
                if !self.increments.contains_key(field) {
                    doc.put(field.as_str(), value.clone())?;
                }
            }
        }

        for (field, delta) in &self.increments {
            let next = match doc.get(field) {
                None => Value::Int(*delta),
                Some(Value::Int(current)) => match current.checked_add(*delta) {
                    Some(sum) => Value::Int(sum),
                    None => {
                        log::error!("Increment of field {} by {} overflows", field, delta);
                        return Err(NosqlError::new(
                            &format!("Increment of field {} overflows", field),
                            ErrorKind::InvalidOperation,
                        ));
                    }
                },
                Some(Value::Float(current)) => Value::Float(current + *delta as f64),
                Some(other) => {
                    log::error!("Cannot increment field {} holding a {} value", field, other.kind());
                    return Err(NosqlError::new(
                        &format!("Cannot increment field {} holding a {} value", field, other.kind()),
                        ErrorKind::InvalidDataType,
                    ));
                }
            };
            doc.put(field.as_str(), next)?;
        }
        Ok(doc)
    }

    fn seed(&self) -> NosqlResult<Document> {
        match &self.upsert {
            Some(upsert) => {
                let mut doc = upsert.clone();
                for (field, delta) in &self.increments {
                    doc.put(field.as_str(), *delta)?;
                }
                Ok(doc)
            }
            None => Err(NosqlError::not_found()),
        }
    }
}

/// Update builder handed out by [`Database::update`](crate::database::Database::update).
///
/// ```rust,ignore
/// db.update("counters", key!("page-1"))
///     .inc("views", 1)
///     .upsert(doc! { path: "/index.html" })
///     .execute(&ctx)?;
/// ```
///
/// Executing twice applies the increments twice.
pub struct Update {
    collection: String,
    key: Key,
    plan: UpdatePlan,
    provider: Arc<dyn DatabaseProvider>,
}

impl Update {
    pub(crate) fn new(collection: &str, key: Key, provider: Arc<dyn DatabaseProvider>) -> Self {
        Update {
            collection: collection.to_string(),
            key,
            plan: UpdatePlan::default(),
            provider,
        }
    }

    pub fn key(&self) -> &Key {
        &self.key
    }

    pub fn plan(&self) -> &UpdatePlan {
        &self.plan
    }

    pub fn inc(&mut self, field: &str, delta: i64) -> &mut Self {
        self.plan.set_increment(field, delta);
        self
    }

    pub fn upsert(&mut self, doc: Document) -> &mut Self {
        self.plan.set_upsert(doc);
        self
    }

    /// Applies the update and returns the stored document.
    pub fn execute(&self, ctx: &Context) -> NosqlResult<Document> {
        self.provider
            .update(ctx, &self.collection, &self.key, &self.plan)
    }
}
