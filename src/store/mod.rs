//! Persistence layer: key-value storage of message records by id.

pub mod json_dir;
pub mod memory;
pub mod traits;

pub use json_dir::JsonDirStore;
pub use memory::MemoryStore;
pub use traits::Store;
