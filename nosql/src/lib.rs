//! # nosql - backend-agnostic document storage
//!
//! `nosql` defines the contract between applications and document stores: a
//! closed value model, key derivation, query/update/delete builders, a
//! pull-based iterator and a streaming batch writer. Storage engines plug in
//! by implementing [`DatabaseProvider`](database::DatabaseProvider); callers
//! only ever see the [`Database`](database::Database) handle.
//!
//! ## Quick Start
//!
//! ```rust
//! use nosql::context::Context;
//! use nosql::filter::field;
//! use nosql::store::memory::InMemoryDatabase;
//! use nosql::{doc, key};
//!
//! # fn main() -> nosql::errors::NosqlResult<()> {
//! let db = InMemoryDatabase::open();
//! let ctx = Context::background();
//!
//! db.insert(&ctx, "users", Some(key!("alice")), doc! { age: 30, city: "Paris" })?;
//! db.insert(&ctx, "users", Some(key!("bob")), doc! { age: 17, city: "Paris" })?;
//!
//! let adults = db
//!     .query("users")
//!     .with_fields([field("age").gte(18)])
//!     .count(&ctx)?;
//! assert_eq!(adults, 1);
//!
//! db.update("users", key!("bob")).inc("age", 1).execute(&ctx)?;
//! db.close()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Design Pattern
//!
//! Handles such as [`Database`](database::Database) and
//! [`Context`](context::Context) wrap their state in an `Arc`, so clones are
//! cheap and share the same backend or cancellation scope.
//!
//! ## Module Organization
//!
//! - [`collection`] - Documents, builders, iterators and batch writers
//! - [`common`] - Values, keys and synchronization helpers
//! - [`context`] - Cancellation and deadlines
//! - [`database`] - The backend trait and the `Database` handle
//! - [`errors`] - Error types and result definitions
//! - [`filter`] - Field filters
//! - [`index`] - Index declarations
//! - [`store`] - Bundled in-memory backend

pub mod collection;
pub mod common;
pub mod context;
pub mod database;
pub mod errors;
pub mod filter;
pub mod index;
pub mod store;

pub use collection::Document;
pub use common::{gen_key, key_from, Key, Value, ValueKind};
pub use context::Context;
pub use database::{Database, DatabaseProvider};
pub use errors::{ErrorKind, NosqlError, NosqlResult};
