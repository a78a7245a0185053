use crate::common::Value;
use crate::errors::{ErrorKind, NosqlError, NosqlResult};
use im::OrdMap;
use std::borrow::Cow;
use std::fmt::{Debug, Display};

/// A schemaless record: a map from field name to [Value].
///
/// Field order carries no meaning, two documents with the same fields and
/// values are equal regardless of how they were built. A document is itself
/// a value ([`Value::Document`]), so documents nest.
///
/// Field names are taken literally. Nested fields are reached with
/// [`Document::get_path`], which walks one document level per component.
///
/// `Document` is backed by `im::OrdMap`, so clones are O(1) and share
/// structure until one side is mutated.
#[derive(Clone, Eq, PartialEq, Hash, Default, serde::Deserialize, serde::Serialize)]
pub struct Document {
    data: OrdMap<String, Value>,
}

impl Document {
    /// Creates a new empty document.
    pub fn new() -> Self {
        Document {
            data: OrdMap::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Associates `value` with the field `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns `InvalidOperation` if `key` is empty.
    pub fn put<'a, T: Into<Value>>(
        &mut self,
        key: impl Into<Cow<'a, str>>,
        value: T,
    ) -> NosqlResult<()> {
        let key = key.into();
        if key.is_empty() {
            log::error!("Document does not support empty field name");
            return Err(NosqlError::new(
                "Document does not support empty field name",
                ErrorKind::InvalidOperation,
            ));
        }

        self.data.insert(key.into_owned(), value.into());
        Ok(())
    }

    /// Returns the value of a top level field.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    /// Resolves a nested field, one document level per path component.
    ///
    /// Returns `None` if any component is missing or an intermediate value
    /// is not a document. An empty path resolves to nothing.
    pub fn get_path<S: AsRef<str>>(&self, path: &[S]) -> Option<&Value> {
        let (last, parents) = path.split_last()?;
        let mut current = self;
        for component in parents {
            current = current.get(component.as_ref())?.as_document()?;
        }
        current.get(last.as_ref())
    }

    /// Removes a top level field and returns its value.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.data.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    /// Field names in ascending order.
    pub fn fields(&self) -> Vec<String> {
        self.data.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.data.iter()
    }

    /// Copies every field of `other` into this document, overwriting fields
    /// that already exist.
    pub fn merge(&mut self, other: &Document) {
        for (key, value) in other.data.iter() {
            self.data.insert(key.clone(), value.clone());
        }
    }
}

impl Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self.data.iter()).finish()
    }
}

impl Display for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{")?;
        for (i, (key, value)) in self.data.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "\"{}\": {}", key, value)?;
        }
        write!(f, "}}")
    }
}

impl FromIterator<(String, Value)> for Document {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Document {
            data: iter.into_iter().filter(|(k, _)| !k.is_empty()).collect(),
        }
    }
}

/// Strips the quotes `stringify!` leaves around string literal field names.
pub fn normalize(value: &str) -> String {
    value.trim_matches('"').to_string()
}

/// Creates a [Document] with JSON-like syntax.
///
/// Nested `{ .. }` blocks become nested documents and `[ .. ]` lists become
/// [`Value::Strings`](crate::common::Value::Strings). Any other expression is
/// converted with `Value::from`.
///
/// # Examples
///
/// ```rust
/// use nosql::doc;
///
/// let empty = doc!{};
/// assert!(empty.is_empty());
///
/// let user = doc!{
///     name: "Alice",
///     age: 30,
///     address: {
///         city: "Paris",
///     },
///     tags: ["admin", "ops"],
/// };
/// assert_eq!(user.size(), 4);
/// ```
#[macro_export]
macro_rules! doc {
    ({}) => {
        $crate::collection::Document::new()
    };

    () => {
        $crate::collection::Document::new()
    };

    ({ $($key:tt : $value:tt),* $(,)? }) => {
        $crate::doc!($($key : $value),*)
    };

    ($($key:tt : $value:tt),* $(,)?) => {
        {
            #[allow(unused_imports)]
            use $crate::doc_value;

            let mut doc = $crate::collection::Document::new();
            $(
                doc.put($crate::collection::normalize(stringify!($key)), $crate::doc_value!($value))
                .expect(&format!("Failed to put value {} in document", stringify!($value)));
            )*
            doc
        }
    };
}

/// Converts a `doc!` value token into a [`Value`](crate::common::Value).
#[macro_export]
macro_rules! doc_value {
    ({ $($key:tt : $value:tt),* $(,)? }) => {
        $crate::common::Value::Document($crate::doc!{ $($key : $value),* })
    };

    ([ $($value:tt),* $(,)? ]) => {
        $crate::common::Value::Strings(vec![$(::std::string::String::from($value)),*])
    };

    ($value:expr) => {
        $crate::common::Value::from($value)
    };
}
