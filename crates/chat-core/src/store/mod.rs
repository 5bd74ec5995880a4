//! In-process store implementations

mod memory;

pub use memory::InMemoryConversationStore;
