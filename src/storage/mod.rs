//! Storage module for vault persistence.
//!
//! ## Backends
//!
//! - **InMemoryStore**: ephemeral storage for tests and simulations
//! - **FileStore**: JSON file-based persistence
//!
//! ## Usage
//!
//! ```rust,ignore
//! use lien_vault::storage::{FileStore, VaultStore};
//!
//! let store = VaultStore::new(FileStore::open("/path/to/vault")?);
//! store.save_vault(&vault, env.block)?;
//! store.flush()?;
//! ```

pub mod backend;
pub mod state;

pub use backend::*;
pub use state::*;
