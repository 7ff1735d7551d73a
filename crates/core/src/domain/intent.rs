use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// A validated request to create a sharded resource across the cluster.
///
/// Built once (usually by [`crate::parse_create`]) and never mutated. The
/// constructor rejects combinations the cluster can not satisfy, so any
/// `CreateIntent` that exists is safe to hand to the coordinator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateIntent {
    cluster: Option<String>,
    resource_name: String,
    structure: Option<String>,
    extra_options: String,
    shard_count: u32,
    replication_factor: u32,
}

impl CreateIntent {
    pub fn new(
        cluster: Option<String>,
        resource_name: impl Into<String>,
        structure: Option<String>,
        extra_options: impl Into<String>,
        shard_count: u32,
        replication_factor: u32,
    ) -> Result<Self> {
        let resource_name = resource_name.into();
        let cluster = cluster.filter(|c| !c.trim().is_empty());
        let structure = structure.filter(|s| !s.trim().is_empty());

        if resource_name.trim().is_empty() {
            return Err(CoreError::validation("resource name cannot be empty"));
        }
        if shard_count == 0 {
            return Err(CoreError::validation("shard count must be at least 1"));
        }
        if replication_factor == 0 {
            return Err(CoreError::validation(
                "replication factor must be at least 1",
            ));
        }
        if cluster.is_none() && replication_factor > 1 {
            return Err(CoreError::validation(format!(
                "resource '{}' has no cluster, replication factor must be 1 (got {})",
                resource_name, replication_factor
            )));
        }

        Ok(Self {
            cluster,
            resource_name,
            structure,
            extra_options: extra_options.into(),
            shard_count,
            replication_factor,
        })
    }

    /// Shorthand for a single-node resource with one shard and no replication.
    pub fn local(resource_name: impl Into<String>) -> Result<Self> {
        Self::new(None, resource_name, None, "", 1, 1)
    }

    pub fn cluster(&self) -> Option<&str> {
        self.cluster.as_deref()
    }

    pub fn resource_name(&self) -> &str {
        &self.resource_name
    }

    pub fn structure(&self) -> Option<&str> {
        self.structure.as_deref()
    }

    pub fn extra_options(&self) -> &str {
        &self.extra_options
    }

    pub fn shard_count(&self) -> u32 {
        self.shard_count
    }

    pub fn replication_factor(&self) -> u32 {
        self.replication_factor
    }

    pub fn is_clustered(&self) -> bool {
        self.cluster.is_some()
    }

    /// Arguments handed to the fulfillment hook.
    pub fn to_args(&self) -> ShardArgs {
        ShardArgs::from(self)
    }
}

/// Payload of the `shard` hook event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShardArgs {
    pub resource: ResourceArgs,
    pub replication_factor: u32,
    pub shard_count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceArgs {
    pub cluster: String,
    pub name: String,
    pub structure: String,
    pub extra: String,
}

impl From<&CreateIntent> for ShardArgs {
    fn from(intent: &CreateIntent) -> Self {
        Self {
            resource: ResourceArgs {
                cluster: intent.cluster.clone().unwrap_or_default(),
                name: intent.resource_name.clone(),
                structure: intent.structure.clone().unwrap_or_default(),
                extra: intent.extra_options.clone(),
            },
            replication_factor: intent.replication_factor,
            shard_count: intent.shard_count,
        }
    }
}

impl TryFrom<ShardArgs> for CreateIntent {
    type Error = CoreError;

    fn try_from(args: ShardArgs) -> Result<Self> {
        CreateIntent::new(
            Some(args.resource.cluster),
            args.resource.name,
            Some(args.resource.structure),
            args.resource.extra,
            args.shard_count,
            args.replication_factor,
        )
    }
}
