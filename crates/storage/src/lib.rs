pub mod curriculum;
pub mod quiz_bank;
pub mod repository;
pub mod sqlite;

pub use repository::{InMemoryRepository, Storage, StorageError};
