use crate::errors::{ErrorKind, NosqlError, NosqlResult};
use std::fmt::{Display, Formatter};

/// How a backend may index the values of an [Index].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum IndexType {
    /// Any value kind, the backend picks the representation.
    #[default]
    Any,
    /// Exact match on string values. Required for primary indexes.
    StringExact,
}

impl Display for IndexType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            IndexType::Any => write!(f, "any"),
            IndexType::StringExact => write!(f, "string-exact"),
        }
    }
}

/// Describes an index on a collection.
///
/// Every collection has exactly one primary index. Its fields are the ones
/// [`key_from`](crate::common::key_from) projects into document keys, so it
/// must be [`IndexType::StringExact`]. Secondary indexes are advisory: a
/// backend may use them to speed up queries but never changes results.
///
/// # Usage
///
/// ```rust
/// use nosql::index::{Index, IndexType};
///
/// let primary = Index::primary(["tenant", "id"]);
/// assert!(primary.validate_primary().is_ok());
///
/// let by_age = Index::secondary(["age"], IndexType::Any);
/// assert!(by_age.validate_primary().is_err());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Index {
    fields: Vec<String>,
    index_type: IndexType,
}

impl Index {
    pub fn new<I, S>(fields: I, index_type: IndexType) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Index {
            fields: fields.into_iter().map(Into::into).collect(),
            index_type,
        }
    }

    /// A `StringExact` index over `fields`, suitable as a primary index.
    pub fn primary<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Index::new(fields, IndexType::StringExact)
    }

    pub fn secondary<I, S>(fields: I, index_type: IndexType) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Index::new(fields, index_type)
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn index_type(&self) -> IndexType {
        self.index_type
    }

    pub fn is_compound(&self) -> bool {
        self.fields.len() > 1
    }

    /// Checks that this index can serve as a primary index.
    ///
    /// # Errors
    ///
    /// Returns `IndexError` if the index has no fields, contains an empty
    /// field name or is not `StringExact`.
    pub fn validate_primary(&self) -> NosqlResult<()> {
        if self.fields.is_empty() || self.fields.iter().any(String::is_empty) {
            log::error!("Primary index requires non-empty field names, found {}", self);
            return Err(NosqlError::new(
                "Primary index requires at least one non-empty field",
                ErrorKind::IndexError,
            ));
        }

        if self.index_type != IndexType::StringExact {
            log::error!("Primary index must be string-exact, found {}", self);
            return Err(NosqlError::new(
                &format!("Primary index must be string-exact, found {}", self.index_type),
                ErrorKind::IndexError,
            ));
        }
        Ok(())
    }
}

impl Display for Index {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}[{}]", self.index_type, self.fields.join(", "))
    }
}

/// The indexes declared for one collection.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct IndexSet {
    primary: Index,
    secondary: Vec<Index>,
}

impl IndexSet {
    pub fn new(primary: &Index, secondary: &[Index]) -> Self {
        let mut set = IndexSet {
            primary: primary.clone(),
            secondary: Vec::with_capacity(secondary.len()),
        };
        set.redeclare(primary, secondary);
        set
    }

    pub fn primary(&self) -> &Index {
        &self.primary
    }

    pub fn secondary(&self) -> &[Index] {
        &self.secondary
    }

    /// Replaces the declaration with a new one. Secondary indexes are
    /// deduplicated, keeping the first occurrence.
    pub fn redeclare(&mut self, primary: &Index, secondary: &[Index]) {
        self.primary = primary.clone();
        self.secondary.clear();
        for index in secondary {
            if !self.secondary.contains(index) {
                self.secondary.push(index.clone());
            }
        }
    }
}
