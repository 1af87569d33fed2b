//! Foundation types for Lockbox.
//!
//! Every record the server persists implements [`Storable`]: it names its
//! [kind](Storable::kind), carries a unique [id](Storable::id) within that
//! kind, and converts losslessly to and from a [`RawObject`], the plain
//! JSON-shaped map that storage backends transport.
//!
//! # Key Types
//!
//! - [`Storable`]: kind/id identity plus raw conversion
//! - [`RawObject`]: backend-transportable representation (maps, arrays, scalars)
//! - [`Account`]: a user account
//! - [`Vault`] / [`VaultItem`]: a named collection of secret items
//! - [`LogEvent`]: an audit event written to the logging storage

pub mod account;
pub mod error;
pub mod event;
pub mod storable;
pub mod vault;

pub use account::Account;
pub use error::RawError;
pub use event::LogEvent;
pub use storable::{from_raw, to_raw, RawObject, Storable};
pub use vault::{FieldType, ItemField, Vault, VaultItem};
