//! Lockbox server core.
//!
//! Reads the environment into a [`LockboxConfig`] tree and wires the
//! storage, logging and mail backends it selects into [`Services`].

pub mod auth;
pub mod config;
pub mod error;
pub mod logger;
pub mod mail;
pub mod wiring;

pub use auth::{AuthConfig, AuthType, OpenIdConfig, TotpAuthConfig, TotpHash, WebAuthnConfig};
pub use config::{
    load_config, AttachmentBackend, AttachmentStorageConfig, DataBackend, DataStorageConfig,
    FsAttachmentStorageConfig, LockboxConfig, LoggingConfig, QuotaConfig,
    S3AttachmentStorageConfig, ServerConfig, ENV_PREFIX,
};
pub use error::{ServerError, ServerResult};
pub use logger::EventLogger;
pub use mail::{
    build_mailer, ConsoleMailer, EmailBackend, EmailConfig, Mail, Mailer, SmtpConfig, SmtpMailer,
};
pub use wiring::{build_storage, Connectors, Services, StorageBackend};
