use thiserror::Error;

/// Errors produced while converting a record to or from its raw form.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RawError {
    /// The value serialized to something other than a map.
    #[error("raw representation must be an object, got {found}")]
    NotAnObject { found: &'static str },

    #[error("serialization error: {0}")]
    Serialization(String),

    /// A raw map could not be turned back into the record.
    #[error("cannot decode {kind}: {reason}")]
    Decode { kind: String, reason: String },
}
