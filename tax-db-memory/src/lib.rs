//! In-memory record store.
//!
//! Records live in a map behind a single async mutex, so at most one
//! request reads or writes the map at a time. Nothing survives a restart.

mod factory;
mod repository;

pub use factory::MemoryRepositoryFactory;
pub use repository::InMemoryRepository;
