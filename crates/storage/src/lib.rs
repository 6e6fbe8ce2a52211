#![forbid(unsafe_code)]

pub mod missed_set;
pub mod repository;
pub mod sqlite;

pub use missed_set::{MISSED_SET_KEY, MissedSetStore};
pub use repository::{InMemoryRepository, KeyValueStore, Storage, StorageError};
