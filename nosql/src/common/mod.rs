//! Shared building blocks: the value model, document keys, locking and
//! small synchronization helpers.

mod key;
mod lock;
mod util;
mod value;

pub use key::*;
pub use lock::*;
pub use util::*;
pub use value::*;
