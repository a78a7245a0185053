mod map;
mod store;

pub use map::InMemoryCollection;
pub use store::*;
