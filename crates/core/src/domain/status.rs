use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

/// Prefix of every status record key in the shared store.
pub const STATUS_KEY_PREFIX: &str = "resource:";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ResourceStatus {
    #[default]
    Processing,
    Succeeded,
    Failed,
}

impl ResourceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Processing => "processing",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        }
    }

    /// Anything that is not `processing` is terminal, and any terminal value
    /// other than `succeeded` counts as a failure.
    pub fn parse(s: &str) -> Self {
        match s {
            "processing" => Self::Processing,
            "succeeded" => Self::Succeeded,
            _ => Self::Failed,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Processing)
    }
}

/// Completion state published by the fulfillment hook under `resource:<name>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusRecord {
    pub status: ResourceStatus,
    pub result: String,
    /// Wait task the record was written for, when the writer knows it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
}

#[derive(Deserialize)]
struct RawStatusRecord {
    status: Option<String>,
    result: Option<serde_json::Value>,
    owner: Option<serde_json::Value>,
}

impl StatusRecord {
    pub fn processing() -> Self {
        Self {
            status: ResourceStatus::Processing,
            result: String::new(),
            owner: None,
        }
    }

    pub fn succeeded(result: impl Into<String>) -> Self {
        Self {
            status: ResourceStatus::Succeeded,
            result: result.into(),
            owner: None,
        }
    }

    pub fn failed(result: impl Into<String>) -> Self {
        Self {
            status: ResourceStatus::Failed,
            result: result.into(),
            owner: None,
        }
    }

    pub fn owned_by(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    /// True when the record names an owner other than `owner`.
    ///
    /// Records without an owner belong to everyone.
    pub fn is_foreign_to(&self, owner: &str) -> bool {
        self.owner.as_deref().is_some_and(|o| o != owner)
    }

    /// Decode a stored value.
    ///
    /// A missing `status` field means the writer has not reached a verdict
    /// yet, and a value that is not JSON at all is treated the same way.
    /// Neither case is an error for the reader: it just keeps waiting.
    pub fn decode(raw: &str) -> Self {
        let parsed: RawStatusRecord = match serde_json::from_str(raw) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(error = %e, "Undecodable status record, treating as processing");
                return Self::processing();
            }
        };

        let status = parsed
            .status
            .as_deref()
            .map(ResourceStatus::parse)
            .unwrap_or_default();
        let result = match parsed.result {
            None | Some(serde_json::Value::Null) => String::new(),
            Some(serde_json::Value::String(s)) => s,
            Some(other) => other.to_string(),
        };

        let owner = parsed
            .owner
            .as_ref()
            .and_then(|v| v.as_str())
            .map(str::to_string);

        Self {
            status,
            result,
            owner,
        }
    }

    /// Decode an optional stored value, absent meaning still processing.
    pub fn from_stored(raw: Option<&str>) -> Self {
        raw.map(Self::decode).unwrap_or_else(Self::processing)
    }

    pub fn encode(&self) -> String {
        let mut value = serde_json::json!({
            "status": self.status.as_str(),
            "result": self.result,
        });
        if let Some(owner) = &self.owner {
            value["owner"] = serde_json::Value::String(owner.clone());
        }
        value.to_string()
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

/// Store key of a resource's status record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StatusKey(String);

impl StatusKey {
    pub fn for_resource(resource_name: &str) -> Self {
        Self(format!("{}{}", STATUS_KEY_PREFIX, resource_name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn resource_name(&self) -> &str {
        self.0.strip_prefix(STATUS_KEY_PREFIX).unwrap_or(&self.0)
    }
}

impl fmt::Display for StatusKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
