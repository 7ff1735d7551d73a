//! Event types published on the coordinator's bus

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Envelope wrapping all events with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    /// Unique event ID
    pub id: Uuid,
    /// When the event occurred
    pub timestamp: DateTime<Utc>,
    /// The actual event
    pub event: Event,
}

impl EventEnvelope {
    /// Create a new event envelope with auto-generated ID and timestamp
    pub fn new(event: Event) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            event,
        }
    }
}

/// All possible events in the system
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// A fulfillment hook was triggered; `name` is the hook (e.g. `shard`)
    /// and `payload` its arguments.
    #[serde(rename = "hook.invoked")]
    Hook {
        task_id: Uuid,
        name: String,
        payload: serde_json::Value,
    },

    /// A wait task was accepted by the runtime
    #[serde(rename = "task.scheduled")]
    TaskScheduled { task_id: Uuid, resource: String },

    /// A wait task reached a terminal outcome
    #[serde(rename = "task.finished")]
    TaskFinished {
        task_id: Uuid,
        resource: String,
        success: bool,
        message: String,
    },

    /// A create was refused because the resource already exists
    #[serde(rename = "resource.duplicate")]
    DuplicateRejected { resource: String },
}

impl Event {
    /// Get the task ID associated with this event, if any
    pub fn task_id(&self) -> Option<Uuid> {
        match self {
            Event::Hook { task_id, .. } => Some(*task_id),
            Event::TaskScheduled { task_id, .. } => Some(*task_id),
            Event::TaskFinished { task_id, .. } => Some(*task_id),
            Event::DuplicateRejected { .. } => None,
        }
    }

    /// Resource name the event is about, if any
    pub fn resource(&self) -> Option<&str> {
        match self {
            Event::TaskScheduled { resource, .. }
            | Event::TaskFinished { resource, .. }
            | Event::DuplicateRejected { resource } => Some(resource),
            Event::Hook { .. } => None,
        }
    }
}
