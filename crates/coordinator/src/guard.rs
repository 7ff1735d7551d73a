use db::Catalog;
use shard_core::ResourceDescriptor;
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::{CoordinatorError, Result};

/// Result of a duplicate check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardVerdict {
    pub exists: bool,
    pub descriptor: Option<ResourceDescriptor>,
}

/// Refuses creates for resources the catalog already knows about.
///
/// This narrows the window for duplicate creates but can not close it: two
/// requests may both pass the check before either resource is registered.
/// The fulfillment side has the final word.
#[derive(Clone)]
pub struct DuplicateGuard {
    catalog: Arc<dyn Catalog>,
}

impl DuplicateGuard {
    pub fn new(catalog: Arc<dyn Catalog>) -> Self {
        Self { catalog }
    }

    pub async fn check(&self, resource_name: &str) -> Result<GuardVerdict> {
        let descriptor = self.catalog.describe(resource_name).await?;
        debug!(
            resource = %resource_name,
            exists = descriptor.is_some(),
            "Duplicate check"
        );

        Ok(GuardVerdict {
            exists: descriptor.is_some(),
            descriptor,
        })
    }

    /// Err([`CoordinatorError::DuplicateResource`]) if the resource exists.
    pub async fn ensure_absent(&self, resource_name: &str) -> Result<()> {
        if self.check(resource_name).await?.exists {
            info!(resource = %resource_name, "Create rejected, resource already exists");
            return Err(CoordinatorError::duplicate(resource_name));
        }
        Ok(())
    }
}
