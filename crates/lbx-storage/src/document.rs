//! The boundary to document-database drivers.
//!
//! [`MongoDbStorage`](crate::MongoDbStorage) never speaks a wire protocol
//! itself. It asks a [`DocumentConnector`] for a [`DocumentClient`] and
//! issues collection-level calls through it. A network driver plugs in by
//! implementing these two traits.

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use lbx_types::RawObject;

use crate::error::{lock_poisoned, StorageError, StorageResult};
use crate::list::ListOptions;

/// Everything a driver needs to open a connection.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectOptions {
    /// Connection string without credentials, e.g. `mongodb://db.local:27017/admin`.
    pub uri: String,
    pub username: String,
    pub password: String,
    pub tls: bool,
    /// CA bundle, already resolved to an absolute path.
    pub tls_ca_file: Option<PathBuf>,
}

impl std::fmt::Debug for ConnectOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectOptions")
            .field("uri", &self.uri)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("tls", &self.tls)
            .field("tls_ca_file", &self.tls_ca_file)
            .finish()
    }
}

/// Opens client sessions to a document database.
#[async_trait]
pub trait DocumentConnector: Send + Sync {
    /// Connect and authenticate. Unreachable hosts and rejected credentials
    /// fail with [`StorageError::Connection`].
    async fn connect(&self, options: &ConnectOptions) -> StorageResult<Arc<dyn DocumentClient>>;
}

/// Collection-level operations on a connected document database.
///
/// Documents are addressed by their `_id` string.
#[async_trait]
pub trait DocumentClient: Send + Sync {
    async fn find_one(&self, database: &str, collection: &str, id: &str) -> StorageResult<Option<RawObject>>;

    /// Replace the document with `id`, inserting it if absent.
    async fn replace_one(
        &self,
        database: &str,
        collection: &str,
        id: &str,
        document: RawObject,
    ) -> StorageResult<()>;

    async fn delete_one(&self, database: &str, collection: &str, id: &str) -> StorageResult<()>;

    /// Query a collection with filter, sort, skip and limit taken from `options`.
    async fn find(
        &self,
        database: &str,
        collection: &str,
        options: &ListOptions,
    ) -> StorageResult<Vec<RawObject>>;
}

/// Connector used when no network driver is linked into the binary.
///
/// Every connection attempt fails, so selecting the document backend
/// without a driver surfaces as a connection error at `init`.
#[derive(Clone, Copy, Debug, Default)]
pub struct UnlinkedConnector;

#[async_trait]
impl DocumentConnector for UnlinkedConnector {
    async fn connect(&self, options: &ConnectOptions) -> StorageResult<Arc<dyn DocumentClient>> {
        Err(StorageError::Connection(format!(
            "no document database driver is linked; cannot reach {}",
            options.uri
        )))
    }
}

/// In-process document database for tests and single-node setups.
///
/// Optionally enforces a username/password pair on connect.
#[derive(Clone, Default)]
pub struct MemoryDocumentConnector {
    client: Arc<MemoryDocumentClient>,
    credentials: Option<(String, String)>,
}

impl MemoryDocumentConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only accept connections presenting these credentials.
    pub fn with_credentials(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            client: Arc::default(),
            credentials: Some((username.into(), password.into())),
        }
    }

    /// The shared client every successful connection receives.
    pub fn client(&self) -> Arc<MemoryDocumentClient> {
        Arc::clone(&self.client)
    }
}

#[async_trait]
impl DocumentConnector for MemoryDocumentConnector {
    async fn connect(&self, options: &ConnectOptions) -> StorageResult<Arc<dyn DocumentClient>> {
        if let Some((username, password)) = &self.credentials {
            if *username != options.username || *password != options.password {
                return Err(StorageError::Connection(format!(
                    "authentication failed for user {:?}",
                    options.username
                )));
            }
        }
        let client: Arc<dyn DocumentClient> = self.client.clone();
        Ok(client)
    }
}

type CollectionKey = (String, String);

/// Collections of documents held in memory, keyed by `(database, collection)`.
#[derive(Default)]
pub struct MemoryDocumentClient {
    collections: RwLock<HashMap<CollectionKey, BTreeMap<String, RawObject>>>,
}

impl MemoryDocumentClient {
    /// Sorted names of the non-empty collections in `database`.
    pub fn collection_names(&self, database: &str) -> Vec<String> {
        let Ok(collections) = self.collections.read() else {
            return Vec::new();
        };
        let mut names: Vec<String> = collections
            .iter()
            .filter(|((db, _), docs)| db == database && !docs.is_empty())
            .map(|((_, name), _)| name.clone())
            .collect();
        names.sort();
        names
    }
}

#[async_trait]
impl DocumentClient for MemoryDocumentClient {
    async fn find_one(&self, database: &str, collection: &str, id: &str) -> StorageResult<Option<RawObject>> {
        let collections = self.collections.read().map_err(lock_poisoned)?;
        Ok(collections
            .get(&(database.to_string(), collection.to_string()))
            .and_then(|docs| docs.get(id))
            .cloned())
    }

    async fn replace_one(
        &self,
        database: &str,
        collection: &str,
        id: &str,
        document: RawObject,
    ) -> StorageResult<()> {
        let mut collections = self.collections.write().map_err(lock_poisoned)?;
        collections
            .entry((database.to_string(), collection.to_string()))
            .or_default()
            .insert(id.to_string(), document);
        Ok(())
    }

    async fn delete_one(&self, database: &str, collection: &str, id: &str) -> StorageResult<()> {
        let mut collections = self.collections.write().map_err(lock_poisoned)?;
        if let Some(docs) = collections.get_mut(&(database.to_string(), collection.to_string())) {
            docs.remove(id);
        }
        Ok(())
    }

    async fn find(
        &self,
        database: &str,
        collection: &str,
        options: &ListOptions,
    ) -> StorageResult<Vec<RawObject>> {
        let collections = self.collections.read().map_err(lock_poisoned)?;
        let Some(docs) = collections.get(&(database.to_string(), collection.to_string())) else {
            return Ok(Vec::new());
        };
        Ok(options.apply(docs.iter().map(|(id, doc)| (id.clone(), doc.clone()))))
    }
}
