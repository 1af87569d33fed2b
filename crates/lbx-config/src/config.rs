//! The [`Config`] trait and schema description.

use std::fmt;

use tracing::debug;

use crate::error::ConfigResult;
use crate::field::Field;
use crate::namespace::{Key, Namespace};
use crate::param::ParamKind;

/// A declarative configuration object.
///
/// Implementors are plain data: a `Default` giving every field its static
/// default, and a declaration table from [`fields`](Config::fields). The
/// provided methods do the rest.
///
/// ```
/// use lbx_config::{Config, Field, Namespace};
///
/// #[derive(Clone, Debug, PartialEq)]
/// struct HttpConfig {
///     port: u16,
///     hosts: Vec<String>,
/// }
///
/// impl Default for HttpConfig {
///     fn default() -> Self {
///         Self { port: 8080, hosts: Vec::new() }
///     }
/// }
///
/// impl Config for HttpConfig {
///     const NAME: &'static str = "HttpConfig";
///
///     fn fields() -> Vec<Field<Self>> {
///         vec![
///             Field::scalar("port", |c: &mut Self| &mut c.port),
///             Field::scalar("hosts", |c: &mut Self| &mut c.hosts),
///         ]
///     }
/// }
///
/// let ns = Namespace::from_pairs([("APP_HOSTS", "a.test,b.test")]);
/// let config = HttpConfig::from_env(&ns, "APP_").unwrap();
/// assert_eq!(config.port, 8080);
/// assert_eq!(config.hosts, vec!["a.test", "b.test"]);
/// ```
pub trait Config: Default + Clone + fmt::Debug + PartialEq + Send + Sync + 'static {
    /// Type name used in schema output and error messages.
    const NAME: &'static str;

    /// The field declaration table, in materialization order.
    fn fields() -> Vec<Field<Self>>;

    /// Build a config from `ns`, starting from `Self::default()`.
    ///
    /// Fails on the first value that cannot be coerced; a partially loaded
    /// config is never returned.
    fn from_env(ns: &Namespace, prefix: &str) -> ConfigResult<Self> {
        let mut config = Self::default();
        let touched = config.materialize(ns, &Key::root(prefix))?;
        debug!(config = Self::NAME, prefix, touched, "configuration materialized");
        Ok(config)
    }

    /// Load every declared field below `key` into `self`.
    ///
    /// Returns `true` if at least one declared leaf was present.
    fn materialize(&mut self, ns: &Namespace, key: &Key) -> ConfigResult<bool> {
        let mut touched = false;
        for field in Self::fields() {
            touched |= field.load(self, ns, key)?;
        }
        Ok(touched)
    }

    /// Every leaf key this config understands under `prefix`.
    fn schema(prefix: &str) -> Vec<SchemaEntry> {
        describe::<Self>(&Key::root(prefix))
    }
}

pub(crate) fn describe<C: Config>(key: &Key) -> Vec<SchemaEntry> {
    C::fields()
        .iter()
        .flat_map(|field| field.describe(key))
        .collect()
}

/// One leaf parameter in a config schema.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SchemaEntry {
    /// Namespace key, upper-cased (`LBX_DATA_LEVELDB_PATH`).
    pub env_key: String,
    /// Dotted field path (`data.leveldb.path`).
    pub path: String,
    pub kind: ParamKind,
}

impl SchemaEntry {
    pub(crate) fn new(key: &Key, kind: ParamKind) -> Self {
        Self {
            env_key: key.env_name(),
            path: key.path().to_string(),
            kind,
        }
    }
}

impl fmt::Display for SchemaEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:<40} {}", self.env_key, self.kind)
    }
}
