//! Backend-agnostic object storage for Lockbox.
//!
//! The server persists [`Storable`](lbx_types::Storable) records through the
//! [`Storage`] contract: a plain object store keyed by `(kind, id)`. There is
//! no query language, no transactions and no schema migration; the whole
//! raw record is the unit of every write.
//!
//! # Storage Backends
//!
//! All backends implement the [`Storage`] trait:
//!
//! - [`VoidStorage`]: discards everything
//! - [`MemoryStorage`]: `HashMap`-based store for tests and ephemeral use
//! - [`LevelDbStorage`]: embedded ordered key-value store on local disk
//! - [`MongoDbStorage`]: document database behind a [`DocumentConnector`]
//!
//! # Design Rules
//!
//! 1. Each kind is an isolated namespace; ids never collide across kinds.
//! 2. Saves are full-record upserts, atomic per backend.
//! 3. Deleting a missing record succeeds.
//! 4. Missing records fail with `NotFound`; missing capabilities fail with
//!    `NotImplemented`.
//! 5. `init` is awaited once before any other call.
//! 6. No error is retried or swallowed here.

pub mod document;
pub mod error;
pub mod leveldb;
pub mod list;
pub mod memory;
pub mod mongodb;
pub mod traits;
pub mod void;

// Re-export primary types at crate root for ergonomic imports.
pub use document::{
    ConnectOptions, DocumentClient, DocumentConnector, MemoryDocumentClient,
    MemoryDocumentConnector, UnlinkedConnector,
};
pub use error::{StorageError, StorageResult};
pub use leveldb::{LevelDbStorage, LevelDbStorageConfig};
pub use list::{FieldFilter, ListOptions, SortDirection};
pub use memory::MemoryStorage;
pub use mongodb::{MongoDbStorage, MongoDbStorageConfig, DATA_DATABASE};
pub use traits::{StorableTarget, Storage, StorageExt};
pub use void::VoidStorage;
