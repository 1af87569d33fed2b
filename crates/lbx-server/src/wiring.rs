//! Turning a materialized [`LockboxConfig`] into running services.
//!
//! Each discriminator (`data.backend`, `email.backend`, ...) picks exactly
//! one implementation, which receives the sibling section of the same name.
//! A missing section means "use the backend's defaults" unless the backend
//! has required settings, in which case wiring fails with a
//! [`ConfigError`].

use std::sync::Arc;

use lbx_config::ConfigError;
use lbx_storage::{
    DocumentConnector, LevelDbStorage, MemoryStorage, MongoDbStorage, Storage, UnlinkedConnector,
    VoidStorage,
};
use tracing::info;

use crate::config::{DataBackend, DataStorageConfig, LockboxConfig};
use crate::error::ServerResult;
use crate::logger::EventLogger;
use crate::mail::{build_mailer, Mailer};

/// Drivers for backends that talk to external services.
#[derive(Clone)]
pub struct Connectors {
    pub document: Arc<dyn DocumentConnector>,
}

impl Default for Connectors {
    fn default() -> Self {
        Self {
            document: Arc::new(UnlinkedConnector),
        }
    }
}

impl std::fmt::Debug for Connectors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connectors").finish_non_exhaustive()
    }
}

/// A storage backend chosen by a [`DataStorageConfig`], not yet initialized.
#[derive(Debug)]
pub enum StorageBackend {
    Void(VoidStorage),
    Memory(MemoryStorage),
    LevelDb(LevelDbStorage),
    MongoDb(MongoDbStorage),
}

impl StorageBackend {
    /// Construct the backend `config.backend` names. `section` is the dotted
    /// path of `config`, used in error messages.
    pub fn select(
        config: &DataStorageConfig,
        section: &str,
        connectors: &Connectors,
    ) -> ServerResult<Self> {
        let backend = match config.backend {
            DataBackend::Void => Self::Void(VoidStorage),
            DataBackend::Memory => Self::Memory(MemoryStorage::new()),
            DataBackend::LevelDb => {
                Self::LevelDb(LevelDbStorage::new(config.leveldb.clone().unwrap_or_default()))
            }
            DataBackend::MongoDb => {
                let mongodb = config.mongodb.as_ref().ok_or_else(|| ConfigError::MissingSection {
                    key: format!("{section}.mongodb"),
                    backend: DataBackend::MongoDb.to_string(),
                })?;
                if let Some(field) = mongodb.missing_fields().first() {
                    return Err(ConfigError::MissingField {
                        key: format!("{section}.mongodb.{field}"),
                    }
                    .into());
                }
                Self::MongoDb(MongoDbStorage::new(
                    mongodb.clone(),
                    Arc::clone(&connectors.document),
                ))
            }
        };
        Ok(backend)
    }

    pub fn into_storage(self) -> Arc<dyn Storage> {
        match self {
            Self::Void(s) => Arc::new(s),
            Self::Memory(s) => Arc::new(s),
            Self::LevelDb(s) => Arc::new(s),
            Self::MongoDb(s) => Arc::new(s),
        }
    }
}

/// Construct the data storage `config` selects.
pub fn build_storage(
    config: &DataStorageConfig,
    connectors: &Connectors,
) -> ServerResult<Arc<dyn Storage>> {
    StorageBackend::select(config, "data", connectors).map(StorageBackend::into_storage)
}

/// Everything the request layer needs, connected and ready.
pub struct Services {
    pub storage: Arc<dyn Storage>,
    pub logger: EventLogger,
    pub mailer: Arc<dyn Mailer>,
}

impl Services {
    /// Build and initialize every service. A backend that cannot connect
    /// fails startup, including the logging storage.
    pub async fn from_config(config: &LockboxConfig, connectors: &Connectors) -> ServerResult<Self> {
        config.auth.check()?;

        let storage = build_storage(&config.data, connectors)?;
        let log_storage =
            StorageBackend::select(&config.logging.storage, "logging.storage", connectors)?
                .into_storage();
        let mailer = build_mailer(&config.email)?;

        storage.init().await?;
        log_storage.init().await?;
        info!(
            data = storage.backend_name(),
            logging = log_storage.backend_name(),
            mail = mailer.backend_name(),
            "services ready"
        );

        Ok(Self {
            storage,
            logger: EventLogger::new(log_storage),
            mailer,
        })
    }
}

impl std::fmt::Debug for Services {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Services")
            .field("storage", &self.storage.backend_name())
            .field("logger", &self.logger)
            .field("mailer", &self.mailer.backend_name())
            .finish()
    }
}
