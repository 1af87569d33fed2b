//! Flat string namespaces and the keys that address them.

use std::collections::BTreeMap;
use std::fmt;
use std::ops::Bound;

/// A flat mapping of string keys to string values.
///
/// Keys are stored lowercased so lookups are ASCII-case-insensitive. When
/// two source keys differ only by case, the one that sorts last wins, so the
/// result does not depend on input order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Namespace {
    vars: BTreeMap<String, String>,
}

impl Namespace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot the current process environment.
    ///
    /// Variables whose name or value is not valid unicode are skipped.
    pub fn from_env() -> Self {
        Self::from_pairs(std::env::vars_os().filter_map(|(k, v)| {
            Some((k.into_string().ok()?, v.into_string().ok()?))
        }))
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut pairs: Vec<(String, String)> = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        pairs.sort();

        let mut ns = Self::new();
        for (k, v) in pairs {
            ns.insert(k, v);
        }
        ns
    }

    pub fn insert(&mut self, key: impl AsRef<str>, value: impl Into<String>) {
        self.vars
            .insert(key.as_ref().to_ascii_lowercase(), value.into());
    }

    /// Look up a key, ignoring ASCII case.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars
            .get(&key.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Iterate over `(key, value)` pairs whose key starts with `prefix`.
    ///
    /// Returned keys are lowercased.
    pub fn with_prefix<'a>(&'a self, prefix: &str) -> impl Iterator<Item = (&'a str, &'a str)> + 'a {
        let prefix = prefix.to_ascii_lowercase();
        self.vars
            .range::<String, _>((Bound::Included(prefix.clone()), Bound::Unbounded))
            .take_while(move |(k, _)| k.starts_with(&prefix))
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Returns `true` if any key starts with `prefix`.
    pub fn has_prefix(&self, prefix: &str) -> bool {
        self.with_prefix(prefix).next().is_some()
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Namespace {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::from_pairs(iter)
    }
}

/// Address of a config field: its namespace key and its dotted path.
///
/// The root key carries only the prefix. Each [`child`](Key::child) appends a
/// field name, joined with `_` in the namespace key and `.` in the path.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Key {
    env: String,
    path: String,
}

impl Key {
    pub fn root(prefix: &str) -> Self {
        Self {
            env: prefix.to_string(),
            path: String::new(),
        }
    }

    pub fn child(&self, name: &str) -> Self {
        if self.path.is_empty() {
            Self {
                env: format!("{}{}", self.env, name),
                path: name.to_string(),
            }
        } else {
            Self {
                env: format!("{}_{}", self.env, name),
                path: format!("{}.{}", self.path, name),
            }
        }
    }

    /// Key for the `index`-th element of an array field (`KEY_0`, `KEY_1`, ...).
    pub fn index(&self, index: usize) -> Self {
        Self {
            env: format!("{}_{}", self.env, index),
            path: format!("{}[{}]", self.path, index),
        }
    }

    /// Namespace key, exactly as it is looked up.
    pub fn env(&self) -> &str {
        &self.env
    }

    /// Namespace key in the conventional upper-case spelling.
    pub fn env_name(&self) -> String {
        self.env.to_ascii_uppercase()
    }

    /// Dotted path, e.g. `data.leveldb.path`. Empty for the root.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Prefix shared by every key below this one.
    pub fn nested_prefix(&self) -> String {
        if self.path.is_empty() {
            self.env.clone()
        } else {
            format!("{}_", self.env)
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)
    }
}
