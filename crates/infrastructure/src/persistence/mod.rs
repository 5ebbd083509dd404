//! `TokenStorage` adapters.

mod file_storage;
mod memory_storage;

pub use file_storage::FileTokenStorage;
pub use memory_storage::MemoryTokenStorage;
