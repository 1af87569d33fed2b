use async_trait::async_trait;
use lbx_types::RawObject;

use crate::error::{StorageError, StorageResult};
use crate::list::ListOptions;
use crate::traits::Storage;

/// Storage that keeps nothing.
///
/// Writes and deletes succeed and are discarded, reads fail with
/// `NotFound`, lists are empty. Used where persistence is switched off,
/// such as the default logging sink.
#[derive(Clone, Copy, Debug, Default)]
pub struct VoidStorage;

impl VoidStorage {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Storage for VoidStorage {
    fn backend_name(&self) -> &'static str {
        "void"
    }

    async fn init(&self) -> StorageResult<()> {
        Ok(())
    }

    async fn get_raw(&self, kind: &str, id: &str) -> StorageResult<RawObject> {
        Err(StorageError::not_found(kind, id))
    }

    async fn save_raw(&self, _kind: &str, _id: &str, _raw: RawObject) -> StorageResult<()> {
        Ok(())
    }

    async fn delete_raw(&self, _kind: &str, _id: &str) -> StorageResult<()> {
        Ok(())
    }

    async fn list_raw(&self, _kind: &str, _options: &ListOptions) -> StorageResult<Vec<RawObject>> {
        Ok(Vec::new())
    }

    async fn clear(&self) -> StorageResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::{StorableTarget, StorageExt};
    use lbx_types::Account;

    #[tokio::test]
    async fn discards_writes() {
        let storage = VoidStorage::new();
        storage.init().await.unwrap();

        let account = Account::new("a@example.com", "A");
        storage.save(&account).await.unwrap();

        let err = storage
            .get::<Account>(StorableTarget::of(), &account.id)
            .await
            .unwrap_err();
        assert!(err.is_not_found());

        let listed: Vec<Account> = storage.list(&ListOptions::new()).await.unwrap();
        assert!(listed.is_empty());

        storage.delete(&account).await.unwrap();
        storage.clear().await.unwrap();
    }
}
