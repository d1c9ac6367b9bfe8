//! Durable key-value storage backends.
//!
//! This module provides:
//! - `KeyValueStore`: the storage seam the credential store is built on
//! - `FileStore`: one file per key in the application data directory
//! - `KeyringStore`: OS keychain storage via keyring
//! - `MemoryStore`: in-process map for ephemeral sessions
//!
//! Backends are synchronous; `CredentialStore` moves calls onto the
//! blocking pool so callers on the event loop never stall.

pub mod error;
pub mod file;
pub mod keychain;
pub mod memory;

pub use error::StorageError;
pub use file::FileStore;
pub use keychain::KeyringStore;
pub use memory::MemoryStore;

/// A string-valued key-value store.
///
/// The platform storage serializes concurrent access; implementations add
/// no locking of their own beyond what they need to be `Sync`.
pub trait KeyValueStore: Send + Sync {
    /// Read a value. A missing key is `Ok(None)`, never an error.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write a value, replacing any previous one.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove a key. Removing a key that does not exist succeeds.
    fn remove(&self, key: &str) -> Result<(), StorageError>;

    /// Short backend name for logs.
    fn name(&self) -> &'static str;
}
