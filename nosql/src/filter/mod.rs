//! Field filters for selecting documents.
//!
//! A [FieldFilter] compares the value at a field path against a constant.
//! Queries and deletes accumulate filters and AND them together.
//!
//! # Examples
//!
//! ```rust
//! use nosql::doc;
//! use nosql::filter::{field, matches_all};
//!
//! let doc = doc! { age: 42, address: { city: "Paris" } };
//! let filters = vec![field("age").gte(18), field("address.city").eq("Paris")];
//! assert!(matches_all(&filters, &doc));
//! ```
//!
//! # Supported Operators
//!
//! - **Equality**: `eq`, `ne`
//! - **Comparison**: `gt`, `gte`, `lt`, `lte`

mod filter;
mod fluent;

pub use filter::*;
pub use fluent::*;
