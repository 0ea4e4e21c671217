//! Process-local storage.

mod store;

pub use store::MemoryStore;
