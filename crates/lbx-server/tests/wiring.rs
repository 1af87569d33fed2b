use std::path::Path;
use std::sync::Arc;

use lbx_config::{Config, ConfigError, Namespace};
use lbx_server::{
    build_storage, Connectors, DataBackend, DataStorageConfig, LockboxConfig, ServerError,
    Services, StorageBackend, ENV_PREFIX,
};
use lbx_storage::{
    ListOptions, MemoryDocumentConnector, MongoDbStorageConfig, StorableTarget, StorageExt,
};
use lbx_types::{Account, LogEvent};

fn load(pairs: &[(&str, &str)]) -> LockboxConfig {
    LockboxConfig::from_env(&Namespace::from_pairs(pairs.iter().copied()), "PREFIX_").unwrap()
}

fn config_error(err: ServerError) -> ConfigError {
    match err {
        ServerError::Config(err) => err,
        other => panic!("expected a configuration error, got {other:?}"),
    }
}

#[test]
fn leveldb_section_selects_embedded_store() {
    let config = load(&[
        ("PREFIX_data_backend", "leveldb"),
        ("PREFIX_data_leveldb_path", "/tmp/x"),
    ]);
    let backend = StorageBackend::select(&config.data, "data", &Connectors::default()).unwrap();
    match backend {
        StorageBackend::LevelDb(storage) => assert_eq!(storage.path(), Path::new("/tmp/x")),
        other => panic!("expected the leveldb backend, got {other:?}"),
    }
}

#[test]
fn leveldb_without_section_uses_default_path() {
    let config = DataStorageConfig::with_backend(DataBackend::LevelDb);
    let backend = StorageBackend::select(&config, "data", &Connectors::default()).unwrap();
    match backend {
        StorageBackend::LevelDb(storage) => assert_eq!(storage.path(), Path::new("data")),
        other => panic!("expected the leveldb backend, got {other:?}"),
    }
}

#[test]
fn void_and_memory_need_no_section() {
    let connectors = Connectors::default();
    for (backend, name) in [(DataBackend::Void, "void"), (DataBackend::Memory, "memory")] {
        let storage = build_storage(&DataStorageConfig::with_backend(backend), &connectors).unwrap();
        assert_eq!(storage.backend_name(), name);
    }
}

#[test]
fn mongodb_without_section_fails() {
    let config = load(&[("PREFIX_data_backend", "mongodb")]);
    let Err(err) = build_storage(&config.data, &Connectors::default()) else {
        panic!("mongodb storage built without its section");
    };
    let err = config_error(err);
    assert!(matches!(err, ConfigError::MissingSection { .. }), "{err:?}");
    assert_eq!(err.key(), "data.mongodb");
}

#[test]
fn mongodb_without_credentials_fails() {
    let config = load(&[
        ("PREFIX_data_backend", "mongodb"),
        ("PREFIX_data_mongodb_host", "db.internal"),
    ]);
    let Err(err) = build_storage(&config.data, &Connectors::default()) else {
        panic!("mongodb storage built without credentials");
    };
    let err = config_error(err);
    assert_eq!(err, ConfigError::MissingField { key: "data.mongodb.username".into() });
}

#[tokio::test]
async fn mongodb_without_driver_fails_at_init() {
    let config = load(&[
        ("PREFIX_data_backend", "mongodb"),
        ("PREFIX_data_mongodb_host", "db.internal"),
        ("PREFIX_data_mongodb_username", "lockbox"),
        ("PREFIX_data_mongodb_password", "secret"),
    ]);
    let storage = build_storage(&config.data, &Connectors::default()).unwrap();
    let err = storage.init().await.unwrap_err();
    assert!(matches!(err, lbx_storage::StorageError::Connection(_)), "{err:?}");
}

#[tokio::test]
async fn services_from_memory_config() {
    let config = load(&[
        ("PREFIX_data_backend", "memory"),
        ("PREFIX_logging_storage_backend", "memory"),
    ]);
    let services = Services::from_config(&config, &Connectors::default()).await.unwrap();
    assert_eq!(services.storage.backend_name(), "memory");
    assert_eq!(services.mailer.backend_name(), "console");

    let account = Account::new("alice@example.com", "Alice");
    services.storage.save(&account).await.unwrap();
    let loaded = services
        .storage
        .get(StorableTarget::<Account>::of(), &account.id)
        .await
        .unwrap();
    assert_eq!(loaded, account);

    services
        .logger
        .log("account.create", [("account", account.id.as_str())])
        .await
        .unwrap();
    let events: Vec<LogEvent> = services.logger.storage().list(&ListOptions::new()).await.unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event_type, "account.create");
}

#[tokio::test]
async fn services_with_leveldb_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("db");
    let path_str = path.to_str().unwrap();
    let config = load(&[("PREFIX_data_leveldb_path", path_str)]);
    assert_eq!(config.data.backend, DataBackend::LevelDb);

    let services = Services::from_config(&config, &Connectors::default()).await.unwrap();
    assert_eq!(services.storage.backend_name(), "leveldb");
    assert!(path.join("data.log").exists());
}

#[tokio::test]
async fn services_with_document_connector() {
    let connectors = Connectors {
        document: Arc::new(MemoryDocumentConnector::new()),
    };
    let mut config = LockboxConfig::default();
    config.data = DataStorageConfig {
        backend: DataBackend::MongoDb,
        mongodb: Some(MongoDbStorageConfig {
            host: Some("localhost".into()),
            username: Some("lockbox".into()),
            password: Some("lockbox".into()),
            ..Default::default()
        }),
        ..Default::default()
    };
    let services = Services::from_config(&config, &connectors).await.unwrap();
    assert_eq!(services.storage.backend_name(), "mongodb");
}

#[tokio::test]
async fn logging_storage_errors_name_their_section() {
    let config = load(&[
        ("PREFIX_data_backend", "memory"),
        ("PREFIX_logging_storage_backend", "mongodb"),
    ]);
    let err = Services::from_config(&config, &Connectors::default()).await.unwrap_err();
    assert_eq!(config_error(err).key(), "logging.storage.mongodb");
}

#[test]
fn default_prefix_reads_lbx_keys() {
    let config = LockboxConfig::from_env(
        &Namespace::from_pairs([("LBX_SERVER_PORT", "8443")]),
        ENV_PREFIX,
    )
    .unwrap();
    assert_eq!(config.server.port, 8443);
}
