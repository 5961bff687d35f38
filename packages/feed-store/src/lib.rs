//! In-memory collaborators over a JSON catalog snapshot.

mod collaborators;
mod error;
mod snapshot;
mod store;

pub use error::{Error, Result};
pub use snapshot::{ItemRecord, Snapshot, UserRecord};
pub use store::{MemoryStore, NEIGHBOR_ITEM_LIMIT};
