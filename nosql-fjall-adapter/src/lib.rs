//! # nosql_fjall_adapter - persistent backend for `nosql`
//!
//! Stores `nosql` collections in a [fjall](https://docs.rs/fjall) keyspace.
//! Each collection is a partition, keys and documents are bincode encoded,
//! and a catalog partition remembers collections and their declared indexes.
//! The backend supports native batch inserts through [FjallBatchWriter].
//!
//! ```rust,ignore
//! use nosql::context::Context;
//! use nosql_fjall_adapter::FjallDatabase;
//!
//! let db = FjallDatabase::with_config()
//!     .db_path("/path/to/db")
//!     .open()?;
//!
//! let ctx = Context::background();
//! let mut writer = db.batch_insert("events");
//! writer.write_doc(&ctx, None, nosql::doc! { kind: "login" })?;
//! writer.flush(&ctx)?;
//! writer.close()?;
//! db.close()?;
//! ```

mod builder;
mod collection;
mod config;
mod store;
mod version;
mod wrapper;
mod writer;

pub use builder::*;
pub use config::*;
pub use store::FjallDatabase;
pub use wrapper::{FjallValueError, FjallValueResult};
pub use writer::FjallBatchWriter;
