//! Sink for fulfillment hook invocations.

use events::{Event, EventBus};
use serde::Serialize;
use serde_json::Value;
use tracing::warn;
use uuid::Uuid;

use crate::error::Result;

/// Name of the hook that performs sharding and replication of a new resource.
pub const SHARD_HOOK: &str = "shard";

/// One invocation of a named hook.
#[derive(Debug, Clone, PartialEq)]
pub struct HookEvent {
    /// Wait task the invocation belongs to.
    pub task_id: Uuid,
    pub name: String,
    pub payload: Value,
}

impl HookEvent {
    /// Serialize `args` into the invocation payload.
    pub fn new<T: Serialize>(task_id: Uuid, name: impl Into<String>, args: &T) -> Result<Self> {
        Ok(Self::with_payload(task_id, name, serde_json::to_value(args)?))
    }

    pub fn with_payload(task_id: Uuid, name: impl Into<String>, payload: Value) -> Self {
        Self {
            task_id,
            name: name.into(),
            payload,
        }
    }
}

/// Consumer of hook invocations.
///
/// Calls are fire-and-forget: the implementation must return promptly and
/// report the real outcome through the status store, never through the call.
pub trait FulfillmentHook: Send + Sync {
    fn process(&self, event: HookEvent);
}

impl FulfillmentHook for EventBus {
    fn process(&self, event: HookEvent) {
        let delivered = self.emit(Event::Hook {
            task_id: event.task_id,
            name: event.name.clone(),
            payload: event.payload,
        });
        if delivered == 0 {
            warn!(
                hook = %event.name,
                task_id = %event.task_id,
                "Hook event published with no subscribers"
            );
        }
    }
}
