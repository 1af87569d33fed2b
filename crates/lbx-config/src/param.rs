//! Coercion of namespace strings into typed parameter values.

use std::fmt;
use std::path::PathBuf;

use crate::error::{ConfigError, ConfigResult};
use crate::namespace::{Key, Namespace};

/// The shape of a single scalar value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScalarKind {
    String,
    Path,
    Boolean,
    Integer,
    Float,
    /// Closed string union; holds the allowed tags.
    Enum(&'static [&'static str]),
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String => f.write_str("a string"),
            Self::Path => f.write_str("a path"),
            Self::Boolean => f.write_str("a boolean"),
            Self::Integer => f.write_str("an integer"),
            Self::Float => f.write_str("a number"),
            Self::Enum(tags) => write!(f, "one of [{}]", tags.join(", ")),
        }
    }
}

/// The declared kind of a config field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParamKind {
    Scalar(ScalarKind),
    Array(ScalarKind),
    /// A nested config; holds the config type's name.
    Config(&'static str),
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(kind) => kind.fmt(f),
            Self::Array(kind) => write!(f, "a comma-separated list, each {kind}"),
            Self::Config(name) => write!(f, "a {name} section"),
        }
    }
}

/// A value that can be parsed from a single namespace string.
pub trait Scalar: Sized + Send + Sync + 'static {
    const KIND: ScalarKind;

    /// Parse a raw string. `None` means the string is not a valid value.
    fn parse(raw: &str) -> Option<Self>;
}

/// A value a config field can hold: a scalar or an array of scalars.
pub trait Param: Sized + Send + Sync + 'static {
    fn kind() -> ParamKind;

    /// Load the value stored at `key`.
    ///
    /// Returns `Ok(None)` when the namespace holds nothing for this key.
    fn load(ns: &Namespace, key: &Key) -> ConfigResult<Option<Self>>;
}

/// Load a scalar stored at exactly `key`.
pub fn load_scalar<T: Scalar>(ns: &Namespace, key: &Key) -> ConfigResult<Option<T>> {
    let Some(raw) = ns.get(key.env()) else {
        return Ok(None);
    };
    T::parse(raw)
        .map(Some)
        .ok_or_else(|| coerce_error(T::KIND, ParamKind::Scalar(T::KIND), key, raw))
}

fn coerce_error(scalar: ScalarKind, expected: ParamKind, key: &Key, raw: &str) -> ConfigError {
    match scalar {
        ScalarKind::Enum(tags) if matches!(expected, ParamKind::Scalar(_)) => {
            ConfigError::UnknownVariant {
                key: key.path().to_string(),
                env_key: key.env_name(),
                value: raw.to_string(),
                allowed: tags.iter().map(|t| t.to_string()).collect(),
            }
        }
        _ => ConfigError::Coerce {
            key: key.path().to_string(),
            env_key: key.env_name(),
            expected: expected.to_string(),
            value: raw.to_string(),
        },
    }
}

/// Implements [`Param`] for types that already implement [`Scalar`].
#[macro_export]
macro_rules! scalar_param {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::Param for $ty {
                fn kind() -> $crate::ParamKind {
                    $crate::ParamKind::Scalar(<$ty as $crate::Scalar>::KIND)
                }

                fn load(
                    ns: &$crate::Namespace,
                    key: &$crate::Key,
                ) -> $crate::ConfigResult<::std::option::Option<Self>> {
                    $crate::param::load_scalar::<$ty>(ns, key)
                }
            }
        )+
    };
}

impl Scalar for String {
    const KIND: ScalarKind = ScalarKind::String;

    fn parse(raw: &str) -> Option<Self> {
        Some(raw.to_string())
    }
}

impl Scalar for PathBuf {
    const KIND: ScalarKind = ScalarKind::Path;

    fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        (!raw.is_empty()).then(|| PathBuf::from(raw))
    }
}

impl Scalar for bool {
    const KIND: ScalarKind = ScalarKind::Boolean;

    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Some(true),
            "false" | "0" | "no" | "off" => Some(false),
            _ => None,
        }
    }
}

macro_rules! numeric_scalar {
    ($kind:ident: $($ty:ty),+) => {
        $(
            impl Scalar for $ty {
                const KIND: ScalarKind = ScalarKind::$kind;

                fn parse(raw: &str) -> Option<Self> {
                    raw.trim().parse().ok()
                }
            }
        )+
    };
}

numeric_scalar!(Integer: u8, u16, u32, u64, usize, i32, i64);
numeric_scalar!(Float: f64);

scalar_param!(String, PathBuf, bool, u8, u16, u32, u64, usize, i32, i64, f64);

/// Arrays load from a comma-separated value at the exact key, or, when that
/// key is absent, from consecutive indexed keys `KEY_0`, `KEY_1`, ...
///
/// An empty value yields an empty array.
impl<T: Scalar> Param for Vec<T> {
    fn kind() -> ParamKind {
        ParamKind::Array(T::KIND)
    }

    fn load(ns: &Namespace, key: &Key) -> ConfigResult<Option<Self>> {
        if let Some(raw) = ns.get(key.env()) {
            if raw.trim().is_empty() {
                return Ok(Some(Vec::new()));
            }
            return raw
                .split(',')
                .map(|part| {
                    T::parse(part.trim())
                        .ok_or_else(|| coerce_error(T::KIND, Self::kind(), key, raw))
                })
                .collect::<ConfigResult<Vec<T>>>()
                .map(Some);
        }

        let mut items = Vec::new();
        while let Some(item) = load_scalar::<T>(ns, &key.index(items.len()))? {
            items.push(item);
        }
        Ok((!items.is_empty()).then_some(items))
    }
}

/// Declare a closed string union usable as a config field.
///
/// Tags are matched ASCII-case-insensitively. Add `#[derive(Default)]` and a
/// `#[default]` variant to give the field a default.
///
/// ```
/// lbx_config::string_enum! {
///     #[derive(Default)]
///     pub enum Backend {
///         #[default]
///         Memory => "memory",
///         Disk => "disk",
///     }
/// }
///
/// assert_eq!(Backend::TAGS, &["memory", "disk"]);
/// assert_eq!(Backend::Disk.as_str(), "disk");
/// ```
#[macro_export]
macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $($(#[$vmeta:meta])* $variant:ident => $tag:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        $vis enum $name {
            $($(#[$vmeta])* $variant),+
        }

        impl $name {
            /// Every accepted tag, in declaration order.
            pub const TAGS: &'static [&'static str] = &[$($tag),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $tag),+
                }
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl $crate::Scalar for $name {
            const KIND: $crate::ScalarKind = $crate::ScalarKind::Enum(Self::TAGS);

            fn parse(raw: &str) -> ::std::option::Option<Self> {
                let raw = raw.trim();
                $(
                    if raw.eq_ignore_ascii_case($tag) {
                        return ::std::option::Option::Some(Self::$variant);
                    }
                )+
                ::std::option::Option::None
            }
        }

        $crate::scalar_param!($name);
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    string_enum! {
        enum Color {
            Red => "red",
            Green => "green",
        }
    }

    fn ns(pairs: &[(&str, &str)]) -> Namespace {
        Namespace::from_pairs(pairs.iter().copied())
    }

    fn key(name: &str) -> Key {
        Key::root("T_").child(name)
    }

    #[test]
    fn booleans_follow_fixed_lexicon() {
        for raw in ["true", "TRUE", "1", "yes", "on"] {
            assert_eq!(bool::parse(raw), Some(true), "{raw}");
        }
        for raw in ["false", "0", "No", "off"] {
            assert_eq!(bool::parse(raw), Some(false), "{raw}");
        }
        assert_eq!(bool::parse("maybe"), None);
        assert_eq!(bool::parse(""), None);
    }

    #[test]
    fn numbers_are_trimmed() {
        assert_eq!(u16::parse(" 8080 "), Some(8080));
        assert_eq!(u16::parse("70000"), None);
        assert_eq!(i64::parse("-3"), Some(-3));
        assert_eq!(f64::parse("0.5"), Some(0.5));
    }

    #[test]
    fn strings_are_verbatim() {
        assert_eq!(String::parse(" spaced "), Some(" spaced ".to_string()));
    }

    #[test]
    fn absent_scalar_is_none() {
        assert_eq!(u16::load(&ns(&[]), &key("port")).unwrap(), None);
    }

    #[test]
    fn bad_number_names_key() {
        let err = u16::load(&ns(&[("T_port", "abc")]), &key("port")).unwrap_err();
        assert_eq!(err.key(), "port");
        assert!(matches!(err, ConfigError::Coerce { ref expected, .. } if expected == "an integer"));
    }

    #[test]
    fn enum_tags_case_insensitive() {
        let value = Color::load(&ns(&[("T_color", "GREEN")]), &key("color")).unwrap();
        assert_eq!(value, Some(Color::Green));
        assert_eq!(Color::Red.to_string(), "red");
    }

    #[test]
    fn unknown_enum_tag_lists_allowed() {
        let err = Color::load(&ns(&[("T_color", "blue")]), &key("color")).unwrap_err();
        assert_eq!(
            err,
            ConfigError::UnknownVariant {
                key: "color".into(),
                env_key: "T_COLOR".into(),
                value: "blue".into(),
                allowed: vec!["red".into(), "green".into()],
            }
        );
    }

    #[test]
    fn array_from_delimited_value() {
        let value = Vec::<Color>::load(&ns(&[("T_colors", "red, green,red")]), &key("colors"))
            .unwrap()
            .unwrap();
        assert_eq!(value, vec![Color::Red, Color::Green, Color::Red]);
    }

    #[test]
    fn array_from_indexed_keys() {
        let value = Vec::<u32>::load(
            &ns(&[("T_ports_0", "1"), ("T_ports_1", "2"), ("T_ports_3", "4")]),
            &key("ports"),
        )
        .unwrap();
        assert_eq!(value, Some(vec![1, 2]));
    }

    #[test]
    fn array_empty_value_is_empty_list() {
        let value = Vec::<String>::load(&ns(&[("T_tags", "")]), &key("tags")).unwrap();
        assert_eq!(value, Some(Vec::new()));
    }

    #[test]
    fn array_element_failure_is_coerce_error() {
        let err = Vec::<u32>::load(&ns(&[("T_ports", "1,x")]), &key("ports")).unwrap_err();
        assert!(matches!(err, ConfigError::Coerce { ref value, .. } if value == "1,x"));
    }

    #[test]
    fn kinds_render_for_messages() {
        assert_eq!(Color::kind().to_string(), "one of [red, green]");
        assert_eq!(
            Vec::<u16>::kind().to_string(),
            "a comma-separated list, each an integer"
        );
    }
}
