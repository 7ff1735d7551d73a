//! Single-node stand-in for the cluster's `shard` hook consumer.
//!
//! Listens for hook events on the [`EventBus`] and plays the fulfillment
//! side of the protocol against the same catalog and status store the
//! coordinator reads. The resource is registered first; only the task that
//! registers it writes `processing` and then `succeeded`, each record
//! stamped with the task id. A losing task leaves the record alone and its
//! waiter learns about the duplicate from the winner's record.

use coordinator::{CoordinatorError, SHARD_HOOK};
use db::{Catalog, StatusStore};
use events::{Event, EventBus};
use serde_json::Value;
use shard_core::{CreateIntent, ResourceDescriptor, ShardArgs, StatusKey, StatusRecord};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

#[derive(Clone)]
pub struct LocalFulfiller {
    catalog: Arc<dyn Catalog>,
    store: Arc<dyn StatusStore>,
    delay: Duration,
}

impl LocalFulfiller {
    pub fn new(catalog: Arc<dyn Catalog>, store: Arc<dyn StatusStore>) -> Self {
        Self {
            catalog,
            store,
            delay: Duration::ZERO,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Subscribe to `bus` and fulfill every `shard` hook event in its own task.
    ///
    /// The subscription is taken before this returns, so hook events
    /// published afterwards are never missed.
    pub fn spawn(self, bus: &EventBus) -> JoinHandle<()> {
        let mut rx = bus.subscribe();

        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(envelope) => {
                        if let Event::Hook {
                            task_id,
                            name,
                            payload,
                        } = envelope.event
                        {
                            if name != SHARD_HOOK {
                                debug!(hook = %name, "Ignoring hook");
                                continue;
                            }
                            let this = self.clone();
                            tokio::spawn(async move {
                                this.fulfill(task_id, payload).await;
                            });
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Fulfiller lagged behind the event bus");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
            debug!("Fulfiller stopped");
        })
    }

    /// Handle one `shard` hook invocation and return its verdict.
    ///
    /// `None` when the payload can not be decoded or a status write fails.
    pub async fn fulfill(&self, task_id: Uuid, payload: Value) -> Option<StatusRecord> {
        let args: ShardArgs = match serde_json::from_value(payload) {
            Ok(args) => args,
            Err(e) => {
                warn!(task_id = %task_id, error = %e, "Undecodable shard arguments");
                return None;
            }
        };

        let key = StatusKey::for_resource(&args.resource.name);
        let owner = task_id.to_string();

        let intent = match CreateIntent::try_from(args) {
            Ok(intent) => intent,
            Err(e) => {
                let record = StatusRecord::failed(e.to_string()).owned_by(owner);
                return self.finish(task_id, &key, record).await;
            }
        };

        let descriptor = ResourceDescriptor::from_intent(&intent);
        match self.catalog.register(&descriptor).await {
            Ok(true) => {}
            Ok(false) => {
                info!(
                    task_id = %task_id,
                    key = %key,
                    "Resource already registered, status record left untouched"
                );
                let message = CoordinatorError::duplicate(&descriptor.name).to_string();
                return Some(StatusRecord::failed(message).owned_by(owner));
            }
            Err(e) => {
                error!(resource = %descriptor.name, error = %e, "Catalog registration failed");
                let record = StatusRecord::failed(e.to_string()).owned_by(owner);
                return self.finish(task_id, &key, record).await;
            }
        }

        let processing = StatusRecord::processing().owned_by(owner.as_str());
        if !self.write(&key, &processing).await {
            return None;
        }

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let record = StatusRecord::succeeded(descriptor.definition()).owned_by(owner);
        self.finish(task_id, &key, record).await
    }

    async fn finish(
        &self,
        task_id: Uuid,
        key: &StatusKey,
        record: StatusRecord,
    ) -> Option<StatusRecord> {
        info!(
            task_id = %task_id,
            key = %key,
            status = record.status.as_str(),
            "Shard hook fulfilled"
        );
        self.write(key, &record).await.then_some(record)
    }

    async fn write(&self, key: &StatusKey, record: &StatusRecord) -> bool {
        match self.store.put(key.as_str(), &record.encode()).await {
            Ok(()) => true,
            Err(e) => {
                error!(key = %key, error = %e, "Status write failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coordinator::{FulfillmentHook, HookEvent};
    use db::{MemoryCatalog, MemoryStatusStore};
    use shard_core::{parse_create, ResourceStatus};

    fn fulfiller() -> (LocalFulfiller, MemoryCatalog, MemoryStatusStore) {
        let catalog = MemoryCatalog::new();
        let store = MemoryStatusStore::new();
        let fulfiller = LocalFulfiller::new(Arc::new(catalog.clone()), Arc::new(store.clone()));
        (fulfiller, catalog, store)
    }

    fn payload(query: &str) -> Value {
        serde_json::to_value(parse_create(query).unwrap().to_args()).unwrap()
    }

    #[tokio::test]
    async fn test_fulfill_registers_resource() {
        let (fulfiller, catalog, store) = fulfiller();

        let record = fulfiller
            .fulfill(Uuid::new_v4(), payload("CREATE TABLE c1:t1 shards=2 rf=2"))
            .await
            .unwrap();

        assert_eq!(record.status, ResourceStatus::Succeeded);
        assert_eq!(record.result, "CREATE TABLE c1:t1 shards=2 rf=2");
        assert!(catalog.describe("t1").await.unwrap().is_some());

        let stored = store.get("resource:t1").await.unwrap();
        assert_eq!(StatusRecord::from_stored(stored.as_deref()), record);
    }

    #[tokio::test]
    async fn test_fulfill_rejects_duplicate() {
        let (fulfiller, _catalog, store) = fulfiller();
        let args = payload("CREATE TABLE c1:t1 shards=2 rf=2");
        let winner = Uuid::new_v4();
        let loser = Uuid::new_v4();

        let won = fulfiller.fulfill(winner, args.clone()).await.unwrap();
        let record = fulfiller.fulfill(loser, args).await.unwrap();

        assert_eq!(record.status, ResourceStatus::Failed);
        assert_eq!(record.result, "resource 't1' already exists");
        assert_eq!(record.owner, Some(loser.to_string()));

        let stored = store.get("resource:t1").await.unwrap();
        assert_eq!(StatusRecord::from_stored(stored.as_deref()), won);
        assert_eq!(won.owner, Some(winner.to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_losing_fulfill_during_delay_keeps_winner_record() {
        let (fulfiller, _catalog, store) = fulfiller();
        let fulfiller = fulfiller.with_delay(Duration::from_secs(2));
        let args = payload("CREATE TABLE t1 shards=1 rf=1");
        let winner = Uuid::new_v4();

        let first = fulfiller.clone();
        let first_args = args.clone();
        let task = tokio::spawn(async move { first.fulfill(winner, first_args).await });
        tokio::time::sleep(Duration::from_millis(500)).await;

        let lost = fulfiller.fulfill(Uuid::new_v4(), args).await.unwrap();
        assert_eq!(lost.status, ResourceStatus::Failed);

        let stored = store.get("resource:t1").await.unwrap();
        let current = StatusRecord::from_stored(stored.as_deref());
        assert_eq!(current.status, ResourceStatus::Processing);
        assert_eq!(current.owner, Some(winner.to_string()));

        let won = task.await.unwrap().unwrap();
        assert_eq!(won.status, ResourceStatus::Succeeded);
        let stored = store.get("resource:t1").await.unwrap();
        assert_eq!(StatusRecord::from_stored(stored.as_deref()), won);
    }

    #[tokio::test]
    async fn test_invalid_intent_writes_failure() {
        let (fulfiller, catalog, store) = fulfiller();
        let mut args = payload("CREATE TABLE t1 shards=1 rf=1");
        args["replicationFactor"] = serde_json::json!(3);

        let record = fulfiller.fulfill(Uuid::new_v4(), args).await.unwrap();

        assert_eq!(record.status, ResourceStatus::Failed);
        assert!(catalog.describe("t1").await.unwrap().is_none());
        let stored = store.get("resource:t1").await.unwrap();
        assert_eq!(StatusRecord::from_stored(stored.as_deref()), record);
    }

    #[tokio::test]
    async fn test_fulfill_ignores_garbage_payload() {
        let (fulfiller, _catalog, store) = fulfiller();

        let record = fulfiller
            .fulfill(Uuid::new_v4(), serde_json::json!({"nope": true}))
            .await;

        assert!(record.is_none());
        assert_eq!(store.reads(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_processing_visible_during_delay() {
        let (fulfiller, _catalog, store) = fulfiller();
        let fulfiller = fulfiller.with_delay(Duration::from_secs(3));

        let task = tokio::spawn(async move {
            fulfiller
                .fulfill(Uuid::new_v4(), payload("CREATE TABLE t1 shards=1 rf=1"))
                .await
        });

        tokio::time::sleep(Duration::from_secs(1)).await;
        let stored = store.get("resource:t1").await.unwrap();
        assert_eq!(
            StatusRecord::from_stored(stored.as_deref()).status,
            ResourceStatus::Processing
        );

        let record = task.await.unwrap().unwrap();
        assert_eq!(record.status, ResourceStatus::Succeeded);
    }

    #[tokio::test]
    async fn test_spawned_fulfiller_reacts_to_hook_events() {
        let (fulfiller, catalog, store) = fulfiller();
        let bus = EventBus::new();
        let _task = fulfiller.spawn(&bus);

        let args = parse_create("CREATE TABLE c1:t1 shards=2 rf=2").unwrap().to_args();
        bus.process(HookEvent::new(Uuid::new_v4(), "other", &args).unwrap());
        bus.process(HookEvent::new(Uuid::new_v4(), SHARD_HOOK, &args).unwrap());

        for _ in 0..100 {
            if catalog.describe("t1").await.unwrap().is_some() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert!(catalog.describe("t1").await.unwrap().is_some());

        for _ in 0..100 {
            let stored = store.get("resource:t1").await.unwrap();
            if StatusRecord::from_stored(stored.as_deref()).is_terminal() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("status record never turned terminal");
    }
}
