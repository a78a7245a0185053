use crate::collection::Document;
use crate::common::Value;
use smallvec::SmallVec;
use std::cmp::Ordering;
use std::fmt::{Display, Formatter};

/// Comparison operator of a [FieldFilter].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum FilterOp {
    Equal,
    NotEqual,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl Display for FilterOp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let symbol = match self {
            FilterOp::Equal => "==",
            FilterOp::NotEqual => "!=",
            FilterOp::Gt => ">",
            FilterOp::Gte => ">=",
            FilterOp::Lt => "<",
            FilterOp::Lte => "<=",
        };
        write!(f, "{}", symbol)
    }
}

/// Field paths are rarely deeper than a few levels.
pub type FieldPath = SmallVec<[String; 4]>;

/// A single comparison predicate on a (possibly nested) document field.
///
/// A filter matches a document when the field at `path` exists and compares
/// to `value` under `op`:
///
/// * A missing field, or a path that runs through a non-document value, never
///   matches. This holds for `NotEqual` too.
/// * Values of incompatible kinds never match, again including `NotEqual`.
///   `Int` and `Float` are compatible and compare numerically under every
///   operator, so `Equal` agrees with `Gte` and `Lte` on a mixed pair.
/// * Documents only support `Equal` and `NotEqual` (structural equality).
///
/// A set of filters is combined with AND, see [matches_all].
#[derive(Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct FieldFilter {
    path: FieldPath,
    op: FilterOp,
    value: Value,
}

impl FieldFilter {
    pub fn new<I, S>(path: I, op: FilterOp, value: impl Into<Value>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FieldFilter {
            path: path.into_iter().map(Into::into).collect(),
            op,
            value: value.into(),
        }
    }

    pub fn path(&self) -> &[String] {
        &self.path
    }

    pub fn op(&self) -> FilterOp {
        self.op
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Evaluates this filter against `doc`.
    pub fn apply(&self, doc: &Document) -> bool {
        let field = match doc.get_path(self.path.as_slice()) {
            Some(field) => field,
            None => return false,
        };

        match self.op {
            FilterOp::Equal if self.mixed_numbers(field) => {
                self.ordered(field, |o| o == Ordering::Equal)
            }
            FilterOp::NotEqual if self.mixed_numbers(field) => {
                self.ordered(field, |o| o != Ordering::Equal)
            }
            FilterOp::Equal => field.kind() == self.value.kind() && *field == self.value,
            FilterOp::NotEqual => field.kind() == self.value.kind() && *field != self.value,
            FilterOp::Gt => self.ordered(field, |o| o == Ordering::Greater),
            FilterOp::Gte => self.ordered(field, |o| o != Ordering::Less),
            FilterOp::Lt => self.ordered(field, |o| o == Ordering::Less),
            FilterOp::Lte => self.ordered(field, |o| o != Ordering::Greater),
        }
    }

    // an Int field against a Float value, or the reverse
    #[inline]
    fn mixed_numbers(&self, field: &Value) -> bool {
        field.is_number() && self.value.is_number() && field.kind() != self.value.kind()
    }

    #[inline]
    fn ordered(&self, field: &Value, accept: impl FnOnce(Ordering) -> bool) -> bool {
        field.compare(&self.value).map(accept).unwrap_or(false)
    }
}

impl Display for FieldFilter {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "({} {} {})", self.path.join("."), self.op, self.value)
    }
}

/// Returns `true` if `doc` satisfies every filter. An empty set matches all.
pub fn matches_all(filters: &[FieldFilter], doc: &Document) -> bool {
    filters.iter().all(|filter| filter.apply(doc))
}
