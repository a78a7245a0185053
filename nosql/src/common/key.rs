use crate::collection::Document;
use crate::common::Value;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Identity of a document inside a collection.
///
/// A key is an ordered list of string components. Keys compare and order
/// component by component, so `["a", "b"] < ["a", "c"]` and `["a"] < ["a", "b"]`.
///
/// Keys are produced by [gen_key] for fresh documents or derived from document
/// fields with [key_from].
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct Key(Vec<String>);

impl Key {
    pub fn new(components: Vec<String>) -> Self {
        Key(components)
    }

    pub fn components(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// An empty key means no key could be derived.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_value(&self) -> Value {
        Value::Strings(self.0.clone())
    }

    /// Reads a key back from a `Strings` or `String` value.
    pub fn from_value(value: &Value) -> Option<Key> {
        match value {
            Value::Strings(components) => Some(Key(components.clone())),
            Value::String(component) => Some(Key(vec![component.clone()])),
            _ => None,
        }
    }
}

impl Display for Key {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.0.join(", "))
    }
}

impl From<Vec<String>> for Key {
    fn from(components: Vec<String>) -> Self {
        Key(components)
    }
}

impl From<Vec<&str>> for Key {
    fn from(components: Vec<&str>) -> Self {
        Key(components.into_iter().map(String::from).collect())
    }
}

impl From<&str> for Key {
    fn from(component: &str) -> Self {
        Key(vec![component.to_string()])
    }
}

impl From<String> for Key {
    fn from(component: String) -> Self {
        Key(vec![component])
    }
}

impl From<Key> for Value {
    fn from(key: Key) -> Self {
        Value::Strings(key.0)
    }
}

/// Generates a single component key holding a random UUID v4.
pub fn gen_key() -> Key {
    Key(vec![Uuid::new_v4().to_string()])
}

/// Projects the named string fields of `doc` into a key.
///
/// Fields are visited in the given order. A field that is absent or does not
/// hold a `Value::String` is skipped, so the result may be shorter than
/// `fields` and is empty when none of them qualify.
pub fn key_from<S: AsRef<str>>(fields: &[S], doc: &Document) -> Key {
    let components = fields
        .iter()
        .filter_map(|field| doc.get(field.as_ref()).and_then(|v| v.as_string()))
        .map(String::from)
        .collect();
    Key(components)
}

/// Builds a [Key] from string components.
///
/// ```rust
/// use nosql::key;
///
/// let key = key!("users", "42");
/// assert_eq!(key.len(), 2);
/// assert!(key!().is_empty());
/// ```
#[macro_export]
macro_rules! key {
    () => {
        $crate::common::Key::default()
    };
    ($($component:expr),+ $(,)?) => {
        $crate::common::Key::new(vec![$(::std::string::String::from($component)),+])
    };
}
