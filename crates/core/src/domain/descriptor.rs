use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::intent::CreateIntent;

/// Catalog entry describing a resource that already exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceDescriptor {
    pub name: String,
    pub cluster: Option<String>,
    pub structure: Option<String>,
    pub extra: String,
    pub shard_count: u32,
    pub replication_factor: u32,
    pub created_at: DateTime<Utc>,
}

impl ResourceDescriptor {
    pub fn from_intent(intent: &CreateIntent) -> Self {
        Self {
            name: intent.resource_name().to_string(),
            cluster: intent.cluster().map(str::to_string),
            structure: intent.structure().map(str::to_string),
            extra: intent.extra_options().to_string(),
            shard_count: intent.shard_count(),
            replication_factor: intent.replication_factor(),
            created_at: Utc::now(),
        }
    }

    /// Human readable definition, in the shape the upstream daemon prints for
    /// `SHOW CREATE TABLE`.
    pub fn definition(&self) -> String {
        let name = match &self.cluster {
            Some(cluster) => format!("{}:{}", cluster, self.name),
            None => self.name.clone(),
        };
        let mut out = format!("CREATE TABLE {}", name);
        if let Some(structure) = &self.structure {
            out.push_str(&format!(" ({})", structure));
        }
        out.push_str(&format!(
            " shards={} rf={}",
            self.shard_count, self.replication_factor
        ));
        if !self.extra.is_empty() {
            out.push(' ');
            out.push_str(&self.extra);
        }
        out
    }
}
