use thiserror::Error;

/// Errors from materializing or validating configuration.
///
/// Every variant names the dotted path of the offending field
/// (e.g. `server.port`), available through [`ConfigError::key`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A value could not be coerced to the field's declared kind.
    #[error("invalid value for `{key}` ({env_key}): expected {expected}, got {value:?}")]
    Coerce {
        key: String,
        env_key: String,
        expected: String,
        value: String,
    },

    /// A value for a closed string union is not one of the allowed tags.
    #[error("invalid value for `{key}` ({env_key}): {value:?} is not one of {allowed:?}")]
    UnknownVariant {
        key: String,
        env_key: String,
        value: String,
        allowed: Vec<String>,
    },

    /// The selected backend needs a nested section that was not provided.
    #[error("`{key}` must be configured when backend `{backend}` is selected")]
    MissingSection { key: String, backend: String },

    #[error("`{key}` is required")]
    MissingField { key: String },

    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: String, reason: String },
}

impl ConfigError {
    /// Dotted path of the field this error is about.
    pub fn key(&self) -> &str {
        match self {
            Self::Coerce { key, .. }
            | Self::UnknownVariant { key, .. }
            | Self::MissingSection { key, .. }
            | Self::MissingField { key }
            | Self::Invalid { key, .. } => key,
        }
    }
}

/// Result alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
