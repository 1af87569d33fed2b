use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use lbx_config::{Config, Field};
use lbx_types::RawObject;
use serde_json::Value;
use tracing::{debug, info};

use crate::document::{ConnectOptions, DocumentClient, DocumentConnector};
use crate::error::{lock_poisoned, StorageError, StorageResult};
use crate::list::ListOptions;
use crate::traits::Storage;

/// Database holding one collection per record kind.
pub const DATA_DATABASE: &str = "lockbox_data";

/// Settings for [`MongoDbStorage`].
///
/// `host`, `username` and `password` are required; the rest are optional.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct MongoDbStorageConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Authentication database, appended to the connection string.
    pub database: Option<String>,
    /// URI scheme; `mongodb` when unset.
    pub protocol: Option<String>,
    pub tls: bool,
    /// CA bundle, relative paths resolve against the working directory.
    pub tls_ca_file: Option<PathBuf>,
}

impl MongoDbStorageConfig {
    /// Names of the required fields that are unset, in declaration order.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("host", &self.host),
            ("username", &self.username),
            ("password", &self.password),
        ]
        .into_iter()
        .filter(|(_, value)| value.as_deref().map_or(true, str::is_empty))
        .map(|(name, _)| name)
        .collect()
    }

    /// Connection string without credentials:
    /// `{protocol}://{host}[:{port}][/{database}]`.
    pub fn connection_uri(&self) -> String {
        let protocol = self.protocol.as_deref().unwrap_or("mongodb");
        let host = self.host.as_deref().unwrap_or_default();
        let mut uri = format!("{protocol}://{host}");
        if let Some(port) = self.port {
            uri.push_str(&format!(":{port}"));
        }
        if let Some(database) = self.database.as_deref().filter(|d| !d.is_empty()) {
            uri.push('/');
            uri.push_str(database);
        }
        uri
    }

    fn connect_options(&self) -> StorageResult<ConnectOptions> {
        if let Some(field) = self.missing_fields().first() {
            return Err(StorageError::Connection(format!(
                "mongodb {field} is not configured"
            )));
        }
        let tls_ca_file = self
            .tls_ca_file
            .as_deref()
            .map(std::path::absolute)
            .transpose()
            .map_err(|e| StorageError::Connection(format!("cannot resolve TLS CA file: {e}")))?;

        Ok(ConnectOptions {
            uri: self.connection_uri(),
            username: self.username.clone().unwrap_or_default(),
            password: self.password.clone().unwrap_or_default(),
            tls: self.tls,
            tls_ca_file,
        })
    }
}

impl std::fmt::Debug for MongoDbStorageConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MongoDbStorageConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("database", &self.database)
            .field("protocol", &self.protocol)
            .field("tls", &self.tls)
            .field("tls_ca_file", &self.tls_ca_file)
            .finish()
    }
}

impl Config for MongoDbStorageConfig {
    const NAME: &'static str = "MongoDbStorageConfig";

    fn fields() -> Vec<Field<Self>> {
        vec![
            Field::optional("host", |c: &mut Self| &mut c.host),
            Field::optional("port", |c: &mut Self| &mut c.port),
            Field::optional("username", |c: &mut Self| &mut c.username),
            Field::optional("password", |c: &mut Self| &mut c.password),
            Field::optional("database", |c: &mut Self| &mut c.database),
            Field::optional("protocol", |c: &mut Self| &mut c.protocol),
            Field::scalar("tls", |c: &mut Self| &mut c.tls),
            Field::optional("tls_ca_file", |c: &mut Self| &mut c.tls_ca_file),
        ]
    }
}

/// Document-database [`Storage`] backend.
///
/// Each kind maps to a collection in [`DATA_DATABASE`]; each record is a
/// document whose `_id` is the record id. Saves are upserting replaces.
/// `clear` is refused: wiping a shared database is not something this
/// backend will do.
pub struct MongoDbStorage {
    config: MongoDbStorageConfig,
    connector: Arc<dyn DocumentConnector>,
    client: RwLock<Option<Arc<dyn DocumentClient>>>,
}

impl MongoDbStorage {
    pub fn new(config: MongoDbStorageConfig, connector: Arc<dyn DocumentConnector>) -> Self {
        Self {
            config,
            connector,
            client: RwLock::new(None),
        }
    }

    pub fn config(&self) -> &MongoDbStorageConfig {
        &self.config
    }

    fn client(&self) -> StorageResult<Arc<dyn DocumentClient>> {
        self.client
            .read()
            .map_err(lock_poisoned)?
            .clone()
            .ok_or(StorageError::NotInitialized { backend: "mongodb" })
    }
}

#[async_trait]
impl Storage for MongoDbStorage {
    fn backend_name(&self) -> &'static str {
        "mongodb"
    }

    async fn init(&self) -> StorageResult<()> {
        let options = self.config.connect_options()?;
        let client = self.connector.connect(&options).await?;
        *self.client.write().map_err(lock_poisoned)? = Some(client);
        info!(uri = %options.uri, database = DATA_DATABASE, "mongodb storage connected");
        Ok(())
    }

    async fn get_raw(&self, kind: &str, id: &str) -> StorageResult<RawObject> {
        self.client()?
            .find_one(DATA_DATABASE, kind, id)
            .await?
            .ok_or_else(|| StorageError::not_found(kind, id))
    }

    async fn save_raw(&self, kind: &str, id: &str, mut raw: RawObject) -> StorageResult<()> {
        raw.insert("_id".to_string(), Value::String(id.to_string()));
        self.client()?
            .replace_one(DATA_DATABASE, kind, id, raw)
            .await?;
        debug!(kind, id, "document replaced");
        Ok(())
    }

    async fn delete_raw(&self, kind: &str, id: &str) -> StorageResult<()> {
        self.client()?.delete_one(DATA_DATABASE, kind, id).await
    }

    async fn list_raw(&self, kind: &str, options: &ListOptions) -> StorageResult<Vec<RawObject>> {
        self.client()?.find(DATA_DATABASE, kind, options).await
    }

    async fn clear(&self) -> StorageResult<()> {
        Err(StorageError::NotImplemented {
            backend: "mongodb",
            operation: "clear",
        })
    }
}

impl std::fmt::Debug for MongoDbStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MongoDbStorage")
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{MemoryDocumentConnector, UnlinkedConnector};
    use crate::traits::StorageExt;
    use lbx_types::Account;

    fn config() -> MongoDbStorageConfig {
        MongoDbStorageConfig {
            host: Some("db.local".into()),
            username: Some("lockbox".into()),
            password: Some("secret".into()),
            ..Default::default()
        }
    }

    #[test]
    fn uri_composition() {
        assert_eq!(config().connection_uri(), "mongodb://db.local");

        let full = MongoDbStorageConfig {
            port: Some(27017),
            database: Some("admin".into()),
            protocol: Some("mongodb+srv".into()),
            ..config()
        };
        assert_eq!(full.connection_uri(), "mongodb+srv://db.local:27017/admin");
    }

    #[test]
    fn missing_required_fields() {
        assert!(config().missing_fields().is_empty());
        let partial = MongoDbStorageConfig {
            host: Some("db.local".into()),
            password: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(partial.missing_fields(), vec!["username", "password"]);
    }

    #[test]
    fn debug_redacts_password() {
        let rendered = format!("{:?}", config());
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("<redacted>"));
    }

    #[tokio::test]
    async fn documents_carry_id_and_strip_on_load() {
        let connector = MemoryDocumentConnector::new();
        let storage = MongoDbStorage::new(config(), Arc::new(connector.clone()));
        storage.init().await.unwrap();

        let account = Account::new("a@example.com", "A");
        storage.save(&account).await.unwrap();

        let doc = connector
            .client()
            .find_one(DATA_DATABASE, "account", &account.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(doc["_id"], Value::String(account.id.clone()));

        let loaded: Account = storage.get(Account::default(), &account.id).await.unwrap();
        assert_eq!(loaded, account);
        assert_eq!(connector.client().collection_names(DATA_DATABASE), vec!["account"]);
    }

    #[tokio::test]
    async fn rejected_credentials_fail_init() {
        let connector = MemoryDocumentConnector::with_credentials("lockbox", "other");
        let storage = MongoDbStorage::new(config(), Arc::new(connector));
        let err = storage.init().await.unwrap_err();
        assert!(matches!(err, StorageError::Connection(_)));
    }

    #[tokio::test]
    async fn unlinked_driver_fails_init() {
        let storage = MongoDbStorage::new(config(), Arc::new(UnlinkedConnector));
        let err = storage.init().await.unwrap_err();
        assert!(matches!(err, StorageError::Connection(ref msg) if msg.contains("mongodb://db.local")));
    }

    #[tokio::test]
    async fn clear_is_refused() {
        let storage = MongoDbStorage::new(config(), Arc::new(MemoryDocumentConnector::new()));
        storage.init().await.unwrap();
        let err = storage.clear().await.unwrap_err();
        assert!(err.is_not_implemented());
    }

    #[tokio::test]
    async fn use_before_init_is_rejected() {
        let storage = MongoDbStorage::new(config(), Arc::new(MemoryDocumentConnector::new()));
        let err = storage.delete_raw("account", "1").await.unwrap_err();
        assert!(matches!(err, StorageError::NotInitialized { .. }));
    }
}
