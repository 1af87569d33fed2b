//! Declarative configuration for Lockbox.
//!
//! A configuration object is a plain struct implementing [`Config`]. Instead
//! of runtime annotations, each type returns a static declaration table from
//! [`Config::fields`]: one [`Field`] per parameter, naming it and saying how
//! it is loaded (scalar, array, nested config, optional nested config).
//!
//! The materializer walks that table against a flat [`Namespace`] of string
//! keys and values (normally the process environment). A field's key is the
//! prefix followed by the field names on its path joined with `_`, matched
//! ASCII-case-insensitively:
//!
//! ```text
//! LBX_DATA_BACKEND=leveldb        -> data.backend
//! LBX_DATA_LEVELDB_PATH=/var/lbx  -> data.leveldb.path
//! LBX_AUTH_TYPES=email,totp       -> auth.types
//! ```
//!
//! # Rules
//!
//! 1. Absent keys never fail: the declared default is kept.
//! 2. Keys that match no declared field are ignored.
//! 3. An optional nested config is created only when at least one of its
//!    declared leaves is present; otherwise it stays `None`.
//! 4. A value that cannot be coerced fails with [`ConfigError`] naming the
//!    dotted path of the field.
//! 5. Identical input always yields an identical config tree.

pub mod config;
pub mod error;
pub mod field;
pub mod namespace;
pub mod param;

pub use config::{Config, SchemaEntry};
pub use error::{ConfigError, ConfigResult};
pub use field::Field;
pub use namespace::{Key, Namespace};
pub use param::{Param, ParamKind, Scalar, ScalarKind};
