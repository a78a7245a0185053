//! Documents and the builders that read and write them.
//!
//! # Documents
//!
//! A [Document] maps field names to [`Value`](crate::common::Value)s and may
//! nest other documents.
//!
//! ```rust
//! use nosql::doc;
//!
//! let doc = doc! { name: "Alice", address: { city: "Paris" } };
//! assert!(doc.get_path(&["address", "city"]).is_some());
//! ```
//!
//! # Builders
//!
//! [Query], [Update] and [Delete] are created by
//! [`Database`](crate::database::Database), configured with chained calls that
//! only accumulate state, and executed with a [`Context`](crate::context::Context).
//! Each builder carries a plan ([QueryPlan], [UpdatePlan], [DeletePlan]) that
//! backends execute.
//!
//! # Iteration and batch writes
//!
//! [DocIterator] is the pull-based cursor returned by [`Query::iterate`].
//! Backends feed it through an [EntryCursor] wrapped in a [FilteredIterator].
//! [DocWriter] is the streaming insert contract; [SequentialWriter] emulates it
//! for backends without native batching.

mod delete;
mod document;
pub(crate) mod iterator;
mod query;
mod update;
mod writer;

pub use delete::*;
pub use document::*;
pub use iterator::*;
pub use query::*;
pub use update::*;
pub use writer::*;
