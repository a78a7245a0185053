//! Reference storage backends bundled with the core crate.
//!
//! Persistent backends live in their own crates and implement
//! [`DatabaseProvider`](crate::database::DatabaseProvider) the same way.

pub mod memory;
