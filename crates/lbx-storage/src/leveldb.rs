//! Embedded, ordered key-value storage on the local filesystem.
//!
//! Records live in an ordered in-memory index backed by an append-only log
//! file, `data.log`, inside the configured directory. Every save or delete
//! appends one framed entry:
//!
//! ```text
//! [4 bytes: payload length (little-endian u32)]
//! [4 bytes: CRC32 of payload (little-endian u32)]
//! [N bytes: payload (JSON-encoded put/delete record)]
//! ```
//!
//! `init` replays the log into the index. Entries failing the CRC check are
//! skipped; a torn tail (short header or payload) ends replay and is cut off
//! so later appends stay readable. A bad length header followed by intact
//! entries is not a torn tail: `init` fails with `Corrupt` and leaves the
//! file untouched. Superseded entries are reclaimed by
//! [`LevelDbStorage::compact`], which also runs on `init` once they
//! outnumber live records.

use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use lbx_config::{Config, Field};
use lbx_types::RawObject;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{lock_poisoned, StorageError, StorageResult};
use crate::list::ListOptions;
use crate::traits::Storage;

const LOG_FILE: &str = "data.log";
const COMPACT_FILE: &str = "data.log.compact";

/// Header size: 4 bytes length + 4 bytes CRC.
const HEADER_SIZE: usize = 8;

/// Settings for [`LevelDbStorage`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LevelDbStorageConfig {
    /// Directory holding the data files. Created on `init` if missing.
    pub path: PathBuf,
    /// `fsync` after every write instead of relying on the page cache.
    pub sync: bool,
}

impl Default for LevelDbStorageConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data"),
            sync: false,
        }
    }
}

impl Config for LevelDbStorageConfig {
    const NAME: &'static str = "LevelDbStorageConfig";

    fn fields() -> Vec<Field<Self>> {
        vec![
            Field::scalar("path", |c: &mut Self| &mut c.path),
            Field::scalar("sync", |c: &mut Self| &mut c.sync),
        ]
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
enum LogRecord {
    Put {
        kind: String,
        id: String,
        raw: RawObject,
    },
    Delete {
        kind: String,
        id: String,
    },
}

type RecordKey = (String, String);

/// Open database state; present only after `init`.
struct Db {
    writer: BufWriter<File>,
    /// End of the last valid entry in the log.
    offset: u64,
    records: BTreeMap<RecordKey, RawObject>,
    /// Log entries no longer reflected in `records`.
    dead: usize,
}

/// Embedded key-value [`Storage`] backend.
pub struct LevelDbStorage {
    config: LevelDbStorageConfig,
    db: Mutex<Option<Db>>,
}

impl LevelDbStorage {
    pub fn new(config: LevelDbStorageConfig) -> Self {
        Self {
            config,
            db: Mutex::new(None),
        }
    }

    /// Directory this storage reads and writes.
    pub fn path(&self) -> &Path {
        &self.config.path
    }

    pub fn config(&self) -> &LevelDbStorageConfig {
        &self.config
    }

    fn log_path(&self) -> PathBuf {
        self.config.path.join(LOG_FILE)
    }

    /// Rewrite the log so it holds exactly one entry per live record.
    pub fn compact(&self) -> StorageResult<()> {
        let mut guard = self.db.lock().map_err(lock_poisoned)?;
        let db = guard.as_mut().ok_or(StorageError::NotInitialized {
            backend: "leveldb",
        })?;
        self.compact_db(db)
    }

    fn compact_db(&self, db: &mut Db) -> StorageResult<()> {
        let tmp_path = self.config.path.join(COMPACT_FILE);
        let mut tmp = BufWriter::new(File::create(&tmp_path)?);
        let mut offset = 0u64;
        for ((kind, id), raw) in &db.records {
            let frame = encode(&LogRecord::Put {
                kind: kind.clone(),
                id: id.clone(),
                raw: raw.clone(),
            })?;
            tmp.write_all(&frame)?;
            offset += frame.len() as u64;
        }
        tmp.flush()?;
        tmp.get_ref().sync_all()?;
        drop(tmp);

        fs::rename(&tmp_path, self.log_path())?;
        db.writer = BufWriter::new(open_log(&self.log_path())?);
        db.offset = offset;
        let reclaimed = std::mem::take(&mut db.dead);
        info!(path = %self.config.path.display(), live = db.records.len(), reclaimed, "log compacted");
        Ok(())
    }

    fn with_db<R>(&self, f: impl FnOnce(&mut Db) -> StorageResult<R>) -> StorageResult<R> {
        let mut guard = self.db.lock().map_err(lock_poisoned)?;
        let db = guard.as_mut().ok_or(StorageError::NotInitialized {
            backend: "leveldb",
        })?;
        f(db)
    }

    fn append(&self, db: &mut Db, record: &LogRecord) -> StorageResult<()> {
        let frame = encode(record)?;
        if let Err(e) = write_frame(&mut db.writer, &frame, self.config.sync) {
            if let Err(rollback) = self.rollback(db) {
                warn!(offset = db.offset, error = %rollback, "log rollback failed");
            }
            return Err(e.into());
        }
        db.offset += frame.len() as u64;
        Ok(())
    }

    /// Cut the log back to the last complete entry and drop any buffered,
    /// unflushed bytes so a failed append never reaches disk later.
    fn rollback(&self, db: &mut Db) -> StorageResult<()> {
        let file = open_log(&self.log_path())?;
        file.set_len(db.offset)?;
        let stale = std::mem::replace(&mut db.writer, BufWriter::new(file));
        // into_parts hands back the buffer instead of flushing it on drop.
        let (_, _discarded) = stale.into_parts();
        Ok(())
    }
}

fn write_frame(writer: &mut BufWriter<File>, frame: &[u8], sync: bool) -> std::io::Result<()> {
    writer.write_all(frame)?;
    writer.flush()?;
    if sync {
        writer.get_ref().sync_data()?;
    }
    Ok(())
}

#[async_trait]
impl Storage for LevelDbStorage {
    fn backend_name(&self) -> &'static str {
        "leveldb"
    }

    async fn init(&self) -> StorageResult<()> {
        let unavailable = |e: std::io::Error| {
            StorageError::Connection(format!(
                "cannot open {}: {e}",
                self.config.path.display()
            ))
        };

        fs::create_dir_all(&self.config.path).map_err(unavailable)?;
        let log_path = self.log_path();
        let file = open_log(&log_path).map_err(unavailable)?;
        let replayed = replay(&log_path).map_err(|e| match e {
            StorageError::Io(e) => unavailable(e),
            other => other,
        })?;
        if replayed.valid_len < file.metadata().map_err(unavailable)?.len() {
            warn!(valid_len = replayed.valid_len, "discarding torn log tail");
            file.set_len(replayed.valid_len).map_err(unavailable)?;
        }

        let mut db = Db {
            writer: BufWriter::new(file),
            offset: replayed.valid_len,
            records: replayed.records,
            dead: replayed.dead,
        };
        if db.dead > db.records.len() {
            self.compact_db(&mut db)?;
        }
        info!(
            path = %self.config.path.display(),
            records = db.records.len(),
            "leveldb storage opened"
        );

        *self.db.lock().map_err(lock_poisoned)? = Some(db);
        Ok(())
    }

    async fn get_raw(&self, kind: &str, id: &str) -> StorageResult<RawObject> {
        self.with_db(|db| {
            db.records
                .get(&(kind.to_string(), id.to_string()))
                .cloned()
                .ok_or_else(|| StorageError::not_found(kind, id))
        })
    }

    async fn save_raw(&self, kind: &str, id: &str, raw: RawObject) -> StorageResult<()> {
        self.with_db(|db| {
            let record = LogRecord::Put {
                kind: kind.to_string(),
                id: id.to_string(),
                raw,
            };
            self.append(db, &record)?;
            if let LogRecord::Put { kind, id, raw } = record {
                if db.records.insert((kind, id), raw).is_some() {
                    db.dead += 1;
                }
            }
            debug!(offset = db.offset, "record saved");
            Ok(())
        })
    }

    async fn delete_raw(&self, kind: &str, id: &str) -> StorageResult<()> {
        self.with_db(|db| {
            let key = (kind.to_string(), id.to_string());
            if !db.records.contains_key(&key) {
                return Ok(());
            }
            self.append(
                db,
                &LogRecord::Delete {
                    kind: key.0.clone(),
                    id: key.1.clone(),
                },
            )?;
            db.records.remove(&key);
            db.dead += 2;
            debug!(kind, id, "record deleted");
            Ok(())
        })
    }

    async fn list_raw(&self, kind: &str, options: &ListOptions) -> StorageResult<Vec<RawObject>> {
        self.with_db(|db| {
            let start = (kind.to_string(), String::new());
            Ok(options.apply(
                db.records
                    .range(start..)
                    .take_while(|((k, _), _)| k == kind)
                    .map(|((_, id), raw)| (id.clone(), raw.clone())),
            ))
        })
    }

    async fn clear(&self) -> StorageResult<()> {
        self.with_db(|db| {
            db.writer.flush()?;
            db.writer.get_ref().set_len(0)?;
            db.writer = BufWriter::new(open_log(&self.log_path())?);
            db.offset = 0;
            db.records.clear();
            db.dead = 0;
            info!(path = %self.config.path.display(), "leveldb storage cleared");
            Ok(())
        })
    }
}

impl std::fmt::Debug for LevelDbStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LevelDbStorage")
            .field("path", &self.config.path)
            .finish()
    }
}

fn open_log(path: &Path) -> std::io::Result<File> {
    OpenOptions::new()
        .create(true)
        .read(true)
        .append(true)
        .open(path)
}

fn encode(record: &LogRecord) -> StorageResult<Vec<u8>> {
    let payload = serde_json::to_vec(record)
        .map_err(|e| StorageError::Backend(format!("cannot encode log record: {e}")))?;
    let mut frame = Vec::with_capacity(HEADER_SIZE + payload.len());
    frame.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    frame.extend_from_slice(&crc32fast::hash(&payload).to_le_bytes());
    frame.extend_from_slice(&payload);
    Ok(frame)
}

struct Replayed {
    records: BTreeMap<RecordKey, RawObject>,
    valid_len: u64,
    dead: usize,
}

fn replay(path: &Path) -> StorageResult<Replayed> {
    let mut bytes = Vec::new();
    File::open(path)?.read_to_end(&mut bytes)?;

    let mut records = BTreeMap::new();
    let mut dead = 0usize;
    let mut offset = 0usize;

    while offset + HEADER_SIZE <= bytes.len() {
        let header = &bytes[offset..offset + HEADER_SIZE];
        let length = u32::from_le_bytes([header[0], header[1], header[2], header[3]]) as usize;
        let expected_crc = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);

        let end = offset + HEADER_SIZE + length;
        if length == 0 || end > bytes.len() {
            if let Some(next) = next_intact_frame(&bytes, offset + 1) {
                return Err(StorageError::Corrupt {
                    offset: offset as u64,
                    reason: format!(
                        "bad entry length {length} with intact entries following at offset {next}"
                    ),
                });
            }
            warn!(offset, length, "truncated log entry; stopping replay");
            break;
        }

        let payload = &bytes[offset + HEADER_SIZE..end];
        let actual_crc = crc32fast::hash(payload);
        if actual_crc != expected_crc {
            warn!(
                offset,
                expected = expected_crc,
                actual = actual_crc,
                "CRC mismatch; skipping entry"
            );
            dead += 1;
            offset = end;
            continue;
        }

        match serde_json::from_slice::<LogRecord>(payload) {
            Ok(LogRecord::Put { kind, id, raw }) => {
                if records.insert((kind, id), raw).is_some() {
                    dead += 1;
                }
            }
            Ok(LogRecord::Delete { kind, id }) => {
                records.remove(&(kind, id));
                dead += 2;
            }
            Err(e) => {
                warn!(offset, error = %e, "undecodable log entry; skipping");
                dead += 1;
            }
        }
        offset = end;
    }

    debug!(records = records.len(), dead, "log replay complete");
    Ok(Replayed {
        records,
        valid_len: offset as u64,
        dead,
    })
}

/// Offset of the first frame at or after `from` whose length fits the log
/// and whose CRC matches its payload.
fn next_intact_frame(bytes: &[u8], from: usize) -> Option<usize> {
    (from..=bytes.len().saturating_sub(HEADER_SIZE)).find(|&offset| {
        let header = &bytes[offset..offset + HEADER_SIZE];
        let length = u32::from_le_bytes([header[0], header[1], header[2], header[3]]) as usize;
        let expected_crc = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);
        let start = offset + HEADER_SIZE;
        length > 0
            && length <= bytes.len() - start
            && crc32fast::hash(&bytes[start..start + length]) == expected_crc
    })
}
