//! The server's configuration tree.
//!
//! Everything is read from environment variables under [`ENV_PREFIX`],
//! e.g. `LBX_SERVER_PORT` or `LBX_DATA_LEVELDB_PATH`. Run
//! `lockboxd --describe-config` for the full list.

use std::path::PathBuf;

use lbx_config::{string_enum, Config, ConfigResult, Field, Namespace};
use lbx_storage::{LevelDbStorageConfig, MongoDbStorageConfig};

use crate::auth::AuthConfig;
use crate::mail::EmailConfig;

pub const ENV_PREFIX: &str = "LBX_";

/// Limits applied to new accounts or organizations. Unset means unlimited.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QuotaConfig {
    pub vaults: Option<u64>,
    pub items: Option<u64>,
    pub members: Option<u64>,
    pub groups: Option<u64>,
    /// Attachment storage, in megabytes.
    pub storage: Option<u64>,
}

impl Config for QuotaConfig {
    const NAME: &'static str = "QuotaConfig";

    fn fields() -> Vec<Field<Self>> {
        vec![
            Field::optional("vaults", |c: &mut Self| &mut c.vaults),
            Field::optional("items", |c: &mut Self| &mut c.items),
            Field::optional("members", |c: &mut Self| &mut c.members),
            Field::optional("groups", |c: &mut Self| &mut c.groups),
            Field::optional("storage", |c: &mut Self| &mut c.storage),
        ]
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ServerConfig {
    /// Public URL of the web client, used in links sent by mail.
    pub client_url: String,
    pub port: u16,
    /// Mail unexpected errors to this address.
    pub report_errors: Option<String>,
    pub account_quota: Option<QuotaConfig>,
    pub org_quota: Option<QuotaConfig>,
    pub verify_email_on_signup: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            client_url: "http://localhost:8080".into(),
            port: 3000,
            report_errors: None,
            account_quota: None,
            org_quota: None,
            verify_email_on_signup: true,
        }
    }
}

impl Config for ServerConfig {
    const NAME: &'static str = "ServerConfig";

    fn fields() -> Vec<Field<Self>> {
        vec![
            Field::scalar("client_url", |c: &mut Self| &mut c.client_url),
            Field::scalar("port", |c: &mut Self| &mut c.port),
            Field::optional("report_errors", |c: &mut Self| &mut c.report_errors),
            Field::optional_nested("account_quota", |c: &mut Self| &mut c.account_quota),
            Field::optional_nested("org_quota", |c: &mut Self| &mut c.org_quota),
            Field::scalar("verify_email_on_signup", |c: &mut Self| {
                &mut c.verify_email_on_signup
            }),
        ]
    }
}

string_enum! {
    #[derive(Default)]
    pub enum DataBackend {
        Void => "void",
        Memory => "memory",
        #[default]
        LevelDb => "leveldb",
        MongoDb => "mongodb",
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct DataStorageConfig {
    pub backend: DataBackend,
    pub leveldb: Option<LevelDbStorageConfig>,
    pub mongodb: Option<MongoDbStorageConfig>,
}

impl DataStorageConfig {
    pub fn with_backend(backend: DataBackend) -> Self {
        Self {
            backend,
            ..Default::default()
        }
    }
}

impl Config for DataStorageConfig {
    const NAME: &'static str = "DataStorageConfig";

    fn fields() -> Vec<Field<Self>> {
        vec![
            Field::scalar("backend", |c: &mut Self| &mut c.backend),
            Field::optional_nested("leveldb", |c: &mut Self| &mut c.leveldb),
            Field::optional_nested("mongodb", |c: &mut Self| &mut c.mongodb),
        ]
    }
}

string_enum! {
    #[derive(Default)]
    pub enum AttachmentBackend {
        #[default]
        Memory => "memory",
        Fs => "fs",
        S3 => "s3",
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct FsAttachmentStorageConfig {
    pub dir: PathBuf,
}

impl Default for FsAttachmentStorageConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("attachments"),
        }
    }
}

impl Config for FsAttachmentStorageConfig {
    const NAME: &'static str = "FsAttachmentStorageConfig";

    fn fields() -> Vec<Field<Self>> {
        vec![Field::scalar("dir", |c: &mut Self| &mut c.dir)]
    }
}

#[derive(Clone, Default, PartialEq)]
pub struct S3AttachmentStorageConfig {
    pub region: Option<String>,
    pub endpoint: Option<String>,
    pub bucket: Option<String>,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
}

impl Config for S3AttachmentStorageConfig {
    const NAME: &'static str = "S3AttachmentStorageConfig";

    fn fields() -> Vec<Field<Self>> {
        vec![
            Field::optional("region", |c: &mut Self| &mut c.region),
            Field::optional("endpoint", |c: &mut Self| &mut c.endpoint),
            Field::optional("bucket", |c: &mut Self| &mut c.bucket),
            Field::optional("access_key_id", |c: &mut Self| &mut c.access_key_id),
            Field::optional("secret_access_key", |c: &mut Self| &mut c.secret_access_key),
        ]
    }
}

impl std::fmt::Debug for S3AttachmentStorageConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3AttachmentStorageConfig")
            .field("region", &self.region)
            .field("endpoint", &self.endpoint)
            .field("bucket", &self.bucket)
            .field("access_key_id", &self.access_key_id)
            .field(
                "secret_access_key",
                &self.secret_access_key.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct AttachmentStorageConfig {
    pub backend: AttachmentBackend,
    pub fs: Option<FsAttachmentStorageConfig>,
    pub s3: Option<S3AttachmentStorageConfig>,
}

impl Config for AttachmentStorageConfig {
    const NAME: &'static str = "AttachmentStorageConfig";

    fn fields() -> Vec<Field<Self>> {
        vec![
            Field::scalar("backend", |c: &mut Self| &mut c.backend),
            Field::optional_nested("fs", |c: &mut Self| &mut c.fs),
            Field::optional_nested("s3", |c: &mut Self| &mut c.s3),
        ]
    }
}

/// Where the event log goes. Off unless a backend is chosen.
#[derive(Clone, Debug, PartialEq)]
pub struct LoggingConfig {
    pub storage: DataStorageConfig,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            storage: DataStorageConfig::with_backend(DataBackend::Void),
        }
    }
}

impl Config for LoggingConfig {
    const NAME: &'static str = "LoggingConfig";

    fn fields() -> Vec<Field<Self>> {
        vec![Field::nested("storage", |c: &mut Self| &mut c.storage)]
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct LockboxConfig {
    pub server: ServerConfig,
    pub email: EmailConfig,
    pub data: DataStorageConfig,
    pub attachments: AttachmentStorageConfig,
    pub logging: LoggingConfig,
    pub auth: AuthConfig,
}

impl Config for LockboxConfig {
    const NAME: &'static str = "LockboxConfig";

    fn fields() -> Vec<Field<Self>> {
        vec![
            Field::nested("server", |c: &mut Self| &mut c.server),
            Field::nested("email", |c: &mut Self| &mut c.email),
            Field::nested("data", |c: &mut Self| &mut c.data),
            Field::nested("attachments", |c: &mut Self| &mut c.attachments),
            Field::nested("logging", |c: &mut Self| &mut c.logging),
            Field::nested("auth", |c: &mut Self| &mut c.auth),
        ]
    }
}

/// Materialize the configuration from the process environment.
pub fn load_config(prefix: &str) -> ConfigResult<LockboxConfig> {
    LockboxConfig::from_env(&Namespace::from_env(), prefix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lbx_config::ConfigError;

    fn load(pairs: &[(&str, &str)]) -> ConfigResult<LockboxConfig> {
        LockboxConfig::from_env(&Namespace::from_pairs(pairs.iter().copied()), ENV_PREFIX)
    }

    #[test]
    fn defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config, LockboxConfig::default());
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.data.backend, DataBackend::LevelDb);
        assert_eq!(config.logging.storage.backend, DataBackend::Void);
        assert_eq!(config.attachments.backend, AttachmentBackend::Memory);
    }

    #[test]
    fn backend_tag_alone_leaves_sections_unset() {
        let config = load(&[("LBX_data_backend", "memory")]).unwrap();
        assert_eq!(config.data.backend, DataBackend::Memory);
        assert!(config.data.leveldb.is_none());
        assert!(config.data.mongodb.is_none());
    }

    #[test]
    fn non_numeric_port() {
        let err = load(&[("LBX_SERVER_PORT", "notanumber")]).unwrap_err();
        assert_eq!(err.key(), "server.port");
        let ConfigError::Coerce { env_key, expected, .. } = err else {
            panic!("expected a coercion error, got {err:?}");
        };
        assert_eq!(env_key, "LBX_SERVER_PORT");
        assert_eq!(expected, "an integer");
    }

    #[test]
    fn mongodb_section() {
        let config = load(&[
            ("LBX_DATA_BACKEND", "mongodb"),
            ("LBX_DATA_MONGODB_HOST", "db.internal"),
            ("LBX_DATA_MONGODB_PORT", "27017"),
            ("LBX_DATA_MONGODB_TLS", "yes"),
        ])
        .unwrap();
        let mongo = config.data.mongodb.unwrap();
        assert_eq!(mongo.host.as_deref(), Some("db.internal"));
        assert_eq!(mongo.port, Some(27017));
        assert!(mongo.tls);
        assert!(mongo.username.is_none());
    }

    #[test]
    fn logging_storage_keeps_void_until_set() {
        let config = load(&[("LBX_LOGGING_STORAGE_LEVELDB_PATH", "/var/log/lbx")]).unwrap();
        assert_eq!(config.logging.storage.backend, DataBackend::Void);
        assert_eq!(
            config.logging.storage.leveldb.unwrap().path,
            PathBuf::from("/var/log/lbx")
        );

        let config = load(&[("LBX_LOGGING_STORAGE_BACKEND", "memory")]).unwrap();
        assert_eq!(config.logging.storage.backend, DataBackend::Memory);
    }

    #[test]
    fn quotas_and_flags() {
        let config = load(&[
            ("LBX_SERVER_ACCOUNT_QUOTA_VAULTS", "5"),
            ("LBX_SERVER_VERIFY_EMAIL_ON_SIGNUP", "off"),
            ("LBX_SERVER_REPORT_ERRORS", "ops@example.com"),
        ])
        .unwrap();
        assert_eq!(config.server.account_quota.unwrap().vaults, Some(5));
        assert!(config.server.org_quota.is_none());
        assert!(!config.server.verify_email_on_signup);
        assert_eq!(config.server.report_errors.as_deref(), Some("ops@example.com"));
    }

    #[test]
    fn schema_lists_nested_keys() {
        let schema = LockboxConfig::schema(ENV_PREFIX);
        let keys: Vec<&str> = schema.iter().map(|e| e.env_key.as_str()).collect();
        assert!(keys.contains(&"LBX_SERVER_PORT"));
        assert!(keys.contains(&"LBX_DATA_LEVELDB_PATH"));
        assert!(keys.contains(&"LBX_LOGGING_STORAGE_MONGODB_HOST"));
        assert!(keys.contains(&"LBX_AUTH_TOTP_DIGITS"));
    }
}
