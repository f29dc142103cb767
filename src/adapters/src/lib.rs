//! # Warden Storage Adapters
//!
//! [`StorageAdapter`](warden_authz::StorageAdapter) implementations for the
//! Warden authorization engine.
//!
//! - [`FileAdapter`]: policy stored as a JSON or YAML document
//! - [`InMemoryAdapter`]: policy kept in process memory
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use warden_adapters::FileAdapter;
//! use warden_authz::{AccessManager, PolicyManager, PolicyManagerConfig};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let adapter = FileAdapter::from_path("policy.yaml")?;
//!     let policy = PolicyManager::new(Arc::new(adapter), PolicyManagerConfig::default())?;
//!     let access = AccessManager::new(Arc::new(policy));
//!     # let _ = access;
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod file;
pub mod memory;

pub use error::AdapterError;
pub use file::{FileAdapter, FileType, DEFAULT_FILE_MODE, DEFAULT_JSON_INDENT};
pub use memory::InMemoryAdapter;
