//! Field declarations: the static table each [`Config`] type publishes.

use std::fmt;

use crate::config::{describe, Config, SchemaEntry};
use crate::error::ConfigResult;
use crate::namespace::{Key, Namespace};
use crate::param::{Param, ParamKind};

type Loader<C> = Box<dyn Fn(&mut C, &Namespace, &Key) -> ConfigResult<bool> + Send + Sync>;

fn loader<C, F>(f: F) -> Loader<C>
where
    F: Fn(&mut C, &Namespace, &Key) -> ConfigResult<bool> + Send + Sync + 'static,
{
    Box::new(f)
}

/// One declared parameter of the config type `C`.
///
/// A field knows its name, its [`ParamKind`], and how to load itself into
/// a `C` through an accessor. Loaders report whether anything was read from
/// the namespace so that optional sections are only created on demand.
pub struct Field<C> {
    name: &'static str,
    kind: ParamKind,
    loader: Loader<C>,
    nested: Option<fn(&Key) -> Vec<SchemaEntry>>,
}

impl<C: 'static> Field<C> {
    /// A scalar or array parameter that always holds a value.
    ///
    /// When the key is absent the current (default) value is kept.
    pub fn scalar<T: Param>(name: &'static str, access: fn(&mut C) -> &mut T) -> Self {
        Self {
            name,
            kind: T::kind(),
            loader: loader(move |config, ns, key| match T::load(ns, key)? {
                Some(value) => {
                    *access(config) = value;
                    Ok(true)
                }
                None => Ok(false),
            }),
            nested: None,
        }
    }

    /// A scalar or array parameter with no default; stays `None` when absent.
    pub fn optional<T: Param>(name: &'static str, access: fn(&mut C) -> &mut Option<T>) -> Self {
        Self {
            name,
            kind: T::kind(),
            loader: loader(move |config, ns, key| match T::load(ns, key)? {
                Some(value) => {
                    *access(config) = Some(value);
                    Ok(true)
                }
                None => Ok(false),
            }),
            nested: None,
        }
    }

    /// A nested config that always exists (it has a default instance).
    ///
    /// The namespace is materialized into the existing instance, so values
    /// not present in the namespace keep the instance's defaults.
    pub fn nested<N: Config>(name: &'static str, access: fn(&mut C) -> &mut N) -> Self {
        Self {
            name,
            kind: ParamKind::Config(N::NAME),
            loader: loader(move |config, ns, key| access(config).materialize(ns, key)),
            nested: Some(describe::<N>),
        }
    }

    /// A nested config that is absent unless configured.
    ///
    /// A fresh `N::default()` is materialized and assigned only if at least
    /// one of its declared leaves is present. An instance that already
    /// exists (set by the parent's default) is always kept and updated.
    pub fn optional_nested<N: Config>(
        name: &'static str,
        access: fn(&mut C) -> &mut Option<N>,
    ) -> Self {
        Self {
            name,
            kind: ParamKind::Config(N::NAME),
            loader: loader(move |config, ns, key| {
                let slot = access(config);
                let existed = slot.is_some();
                let mut section = slot.take().unwrap_or_default();
                let touched = section.materialize(ns, key)?;
                if existed || touched {
                    *slot = Some(section);
                }
                Ok(touched)
            }),
            nested: Some(describe::<N>),
        }
    }
}

impl<C> Field<C> {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn kind(&self) -> ParamKind {
        self.kind
    }

    pub fn is_nested(&self) -> bool {
        self.nested.is_some()
    }

    /// Load this field of `config` from `ns`, addressing it below `parent`.
    pub fn load(&self, config: &mut C, ns: &Namespace, parent: &Key) -> ConfigResult<bool> {
        (self.loader)(config, ns, &parent.child(self.name))
    }

    pub(crate) fn describe(&self, parent: &Key) -> Vec<SchemaEntry> {
        let key = parent.child(self.name);
        match self.nested {
            Some(children) => children(&key),
            None => vec![SchemaEntry::new(&key, self.kind)],
        }
    }
}

impl<C> fmt::Debug for Field<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .finish()
    }
}
