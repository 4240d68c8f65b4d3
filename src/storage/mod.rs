//! User directory backends implementing the lookup collaborator

pub mod memory;

// Re-export the in-memory store
pub use memory::InMemoryUserStore;
