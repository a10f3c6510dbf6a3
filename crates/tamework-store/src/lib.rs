//! Tamework Store - durable creature ownership
//!
//! Keeps the creature → owner mapping in memory and mirrors every mutation
//! to a single JSON file in the plugin data directory.

mod error;
mod store;

pub use error::{Error, Result};
pub use store::{OwnershipStore, OWNERS_FILE_NAME};
