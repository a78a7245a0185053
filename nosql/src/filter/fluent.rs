use crate::common::Value;

use super::{FieldFilter, FieldPath, FilterOp};

/// Starts a filter on a field, `.` separating nested components.
///
/// `field("address.city").eq("Paris")` matches documents whose `address`
/// sub-document has `city == "Paris"`. Use [path] when a field name itself
/// contains a dot.
pub fn field(field_name: &str) -> FluentFilter {
    FluentFilter {
        path: field_name.split('.').map(String::from).collect(),
    }
}

/// Starts a filter on an explicit list of path components.
pub fn path<I, S>(components: I) -> FluentFilter
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    FluentFilter {
        path: components.into_iter().map(Into::into).collect(),
    }
}

/// Builder returned by [field] and [path]. Each method yields a [FieldFilter].
pub struct FluentFilter {
    path: FieldPath,
}

impl FluentFilter {
    #[inline]
    fn build(self, op: FilterOp, value: Value) -> FieldFilter {
        FieldFilter::new(self.path, op, value)
    }

    #[inline]
    pub fn eq<T: Into<Value>>(self, value: T) -> FieldFilter {
        self.build(FilterOp::Equal, value.into())
    }

    #[inline]
    pub fn ne<T: Into<Value>>(self, value: T) -> FieldFilter {
        self.build(FilterOp::NotEqual, value.into())
    }

    #[inline]
    pub fn gt<T: Into<Value>>(self, value: T) -> FieldFilter {
        self.build(FilterOp::Gt, value.into())
    }

    #[inline]
    pub fn gte<T: Into<Value>>(self, value: T) -> FieldFilter {
        self.build(FilterOp::Gte, value.into())
    }

    #[inline]
    pub fn lt<T: Into<Value>>(self, value: T) -> FieldFilter {
        self.build(FilterOp::Lt, value.into())
    }

    #[inline]
    pub fn lte<T: Into<Value>>(self, value: T) -> FieldFilter {
        self.build(FilterOp::Lte, value.into())
    }
}
