use chrono::{DateTime, TimeZone, Utc};
use shard_core::ResourceDescriptor;

use crate::error::DbError;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ResourceRow {
    pub name: String,
    pub cluster: Option<String>,
    pub structure: Option<String>,
    pub extra: String,
    pub shard_count: i64,
    pub replication_factor: i64,
    pub created_at: i64,
}

impl ResourceRow {
    pub fn into_domain(self) -> Result<ResourceDescriptor, DbError> {
        let shard_count = to_count(&self.name, "shard_count", self.shard_count)?;
        let replication_factor =
            to_count(&self.name, "replication_factor", self.replication_factor)?;

        Ok(ResourceDescriptor {
            name: self.name,
            cluster: self.cluster,
            structure: self.structure,
            extra: self.extra,
            shard_count,
            replication_factor,
            created_at: timestamp_to_datetime(self.created_at),
        })
    }
}

impl From<&ResourceDescriptor> for ResourceRow {
    fn from(descriptor: &ResourceDescriptor) -> Self {
        Self {
            name: descriptor.name.clone(),
            cluster: descriptor.cluster.clone(),
            structure: descriptor.structure.clone(),
            extra: descriptor.extra.clone(),
            shard_count: i64::from(descriptor.shard_count),
            replication_factor: i64::from(descriptor.replication_factor),
            created_at: descriptor.created_at.timestamp(),
        }
    }
}

fn to_count(name: &str, column: &str, value: i64) -> Result<u32, DbError> {
    u32::try_from(value).map_err(|_| DbError::CorruptRow {
        key: name.to_string(),
        reason: format!("{} out of range: {}", column, value),
    })
}

fn timestamp_to_datetime(ts: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(ts, 0).single().unwrap_or_default()
}
