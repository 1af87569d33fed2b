//! The [`Storage`] contract and its typed extension [`StorageExt`].

use std::future::Future;

use async_trait::async_trait;
use lbx_types::{RawObject, Storable};

use crate::error::StorageResult;
use crate::list::ListOptions;

/// Backend-agnostic object store keyed by `(kind, id)`.
///
/// All implementations must satisfy these invariants:
/// - Each kind maps to an isolated namespace: records of different kinds
///   never collide on id.
/// - `save_raw` is an upsert that replaces the whole record atomically with
///   respect to the backend itself. There are no partial updates.
/// - `delete_raw` of a missing record succeeds.
/// - `get_raw` of a missing record fails with `NotFound`.
/// - Capabilities a backend lacks fail with `NotImplemented`, never with an
///   empty result.
///
/// Callers must await [`init`](Storage::init) once before any other call.
/// The trait works on raw data so it stays object-safe; typed access goes
/// through [`StorageExt`].
#[async_trait]
pub trait Storage: Send + Sync {
    /// Short backend tag, e.g. `"memory"`.
    fn backend_name(&self) -> &'static str;

    /// Establish the backend connection or open its files.
    async fn init(&self) -> StorageResult<()>;

    async fn get_raw(&self, kind: &str, id: &str) -> StorageResult<RawObject>;

    async fn save_raw(&self, kind: &str, id: &str, raw: RawObject) -> StorageResult<()>;

    async fn delete_raw(&self, kind: &str, id: &str) -> StorageResult<()>;

    async fn list_raw(&self, kind: &str, options: &ListOptions) -> StorageResult<Vec<RawObject>>;

    /// Remove every record of every kind. Backends may refuse.
    async fn clear(&self) -> StorageResult<()>;
}

/// What to load a record into: an existing instance, or a factory for one.
///
/// [`StorageExt::get`] normalizes either form to an instance before the
/// backend is consulted, so the instance supplies the kind.
pub enum StorableTarget<T> {
    Instance(T),
    Factory(fn() -> T),
}

impl<T: Default> StorableTarget<T> {
    /// Target a fresh `T::default()`.
    pub fn of() -> Self {
        Self::Factory(T::default)
    }
}

impl<T> StorableTarget<T> {
    pub fn into_instance(self) -> T {
        match self {
            Self::Instance(obj) => obj,
            Self::Factory(make) => make(),
        }
    }
}

impl<T: Storable> From<T> for StorableTarget<T> {
    fn from(obj: T) -> Self {
        Self::Instance(obj)
    }
}

/// Typed operations over any [`Storage`], including `dyn Storage`.
pub trait StorageExt: Storage {
    /// Load the record with `id` into the target's instance.
    fn get<T>(
        &self,
        target: impl Into<StorableTarget<T>>,
        id: &str,
    ) -> impl Future<Output = StorageResult<T>> + Send
    where
        T: Storable;

    /// Insert or fully replace `obj`.
    fn save<T>(&self, obj: &T) -> impl Future<Output = StorageResult<()>> + Send
    where
        T: Storable + ?Sized;

    /// Remove `obj`'s record. Removing a missing record succeeds.
    fn delete<T>(&self, obj: &T) -> impl Future<Output = StorageResult<()>> + Send
    where
        T: Storable + ?Sized;

    /// List records of `T`'s kind.
    fn list<T>(&self, options: &ListOptions) -> impl Future<Output = StorageResult<Vec<T>>> + Send
    where
        T: Storable + Default;
}

impl<S: Storage + ?Sized> StorageExt for S {
    fn get<T>(
        &self,
        target: impl Into<StorableTarget<T>>,
        id: &str,
    ) -> impl Future<Output = StorageResult<T>> + Send
    where
        T: Storable,
    {
        let mut obj = target.into().into_instance();
        async move {
            let raw = self.get_raw(obj.kind(), id).await?;
            obj.from_raw(raw)?;
            StorageResult::Ok(obj)
        }
    }

    fn save<T>(&self, obj: &T) -> impl Future<Output = StorageResult<()>> + Send
    where
        T: Storable + ?Sized,
    {
        let raw = obj.to_raw();
        async move { self.save_raw(obj.kind(), obj.id(), raw?).await }
    }

    fn delete<T>(&self, obj: &T) -> impl Future<Output = StorageResult<()>> + Send
    where
        T: Storable + ?Sized,
    {
        async move { self.delete_raw(obj.kind(), obj.id()).await }
    }

    fn list<T>(&self, options: &ListOptions) -> impl Future<Output = StorageResult<Vec<T>>> + Send
    where
        T: Storable + Default,
    {
        async move {
            let kind = T::default().kind().to_string();
            let raws = self.list_raw(&kind, options).await?;
            raws.into_iter()
                .map(|raw| -> StorageResult<T> {
                    let mut obj = T::default();
                    obj.from_raw(raw)?;
                    Ok(obj)
                })
                .collect::<StorageResult<Vec<T>>>()
        }
    }
}
