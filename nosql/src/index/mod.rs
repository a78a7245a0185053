//! Index declarations.
//!
//! Indexes are declared per collection through
//! [`Database::ensure_index`](crate::database::Database::ensure_index): one
//! primary [Index] (always [`IndexType::StringExact`]) and any number of
//! secondary ones.

mod descriptor;

pub use descriptor::*;
