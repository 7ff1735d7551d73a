//! In-process implementations of the store traits, for single-node runs and tests.

use async_trait::async_trait;
use shard_core::ResourceDescriptor;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::Result;
use crate::traits::{Catalog, StatusStore};

#[derive(Clone, Default)]
pub struct MemoryStatusStore {
    values: Arc<RwLock<HashMap<String, String>>>,
    reads: Arc<AtomicUsize>,
}

impl MemoryStatusStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `get` calls served so far.
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StatusStore for MemoryStatusStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(self.values.read().await.get(key).cloned())
    }

    async fn put(&self, key: &str, value: &str) -> Result<()> {
        self.values
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        Ok(self.values.write().await.remove(key).is_some())
    }
}

#[derive(Clone, Default)]
pub struct MemoryCatalog {
    resources: Arc<RwLock<HashMap<String, ResourceDescriptor>>>,
    lookups: Arc<AtomicUsize>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `describe` calls served so far.
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Catalog for MemoryCatalog {
    async fn describe(&self, name: &str) -> Result<Option<ResourceDescriptor>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self.resources.read().await.get(name).cloned())
    }

    async fn register(&self, descriptor: &ResourceDescriptor) -> Result<bool> {
        let mut resources = self.resources.write().await;
        if resources.contains_key(&descriptor.name) {
            return Ok(false);
        }
        resources.insert(descriptor.name.clone(), descriptor.clone());
        Ok(true)
    }

    async fn list(&self) -> Result<Vec<ResourceDescriptor>> {
        let mut all: Vec<_> = self.resources.read().await.values().cloned().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(all)
    }
}
