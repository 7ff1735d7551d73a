use async_trait::async_trait;
use shard_core::ResourceDescriptor;

use crate::error::Result;

/// Shared key/value store holding fulfillment status records.
///
/// The coordinator only ever calls [`StatusStore::get`]; `put` exists for
/// the fulfillment side that owns the records.
#[async_trait]
pub trait StatusStore: Send + Sync {
    /// Raw stored value for `key`, or `None` if nothing was written yet.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Insert or overwrite the value for `key`.
    async fn put(&self, key: &str, value: &str) -> Result<()>;

    /// Remove the value for `key`. Returns whether anything was removed.
    async fn delete(&self, key: &str) -> Result<bool>;
}

/// Catalog of resources that already exist in the cluster.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Descriptor of `name`, or `None` if no such resource exists.
    async fn describe(&self, name: &str) -> Result<Option<ResourceDescriptor>>;

    /// Register a new resource. Returns `false`, leaving the existing entry
    /// untouched, when the name is already taken.
    async fn register(&self, descriptor: &ResourceDescriptor) -> Result<bool>;

    async fn list(&self) -> Result<Vec<ResourceDescriptor>>;
}
