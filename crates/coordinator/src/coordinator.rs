use db::{Catalog, StatusStore};
use events::{Event, EventBus};
use shard_core::CreateIntent;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::CoordinatorConfig;
use crate::dispatcher::{TaskContext, TaskDispatcher, TaskHandle};
use crate::error::{CoordinatorError, Result};
use crate::guard::DuplicateGuard;
use crate::hook::{FulfillmentHook, HookEvent, SHARD_HOOK};
use crate::outcome::CoordinatorResult;
use crate::poller::CompletionPoller;

/// Coordinates creation of sharded resources.
///
/// Capabilities depend on what is attached: without a catalog the duplicate
/// check is skipped, and without a status store ([`Self::client_provided`]
/// is false) the dispatched work can not observe completion and resolves
/// right away with an empty success once the hook has been fired.
pub struct ResourceCoordinator {
    config: CoordinatorConfig,
    hook: Arc<dyn FulfillmentHook>,
    dispatcher: TaskDispatcher,
    guard: Option<DuplicateGuard>,
    status_store: Option<Arc<dyn StatusStore>>,
    event_bus: Option<EventBus>,
}

impl ResourceCoordinator {
    /// New coordinator dispatching onto the current tokio runtime.
    pub fn new(config: CoordinatorConfig, hook: Arc<dyn FulfillmentHook>) -> Self {
        Self {
            config,
            hook,
            dispatcher: TaskDispatcher::current(),
            guard: None,
            status_store: None,
            event_bus: None,
        }
    }

    pub fn with_catalog(mut self, catalog: Arc<dyn Catalog>) -> Self {
        self.guard = Some(DuplicateGuard::new(catalog));
        self
    }

    pub fn with_status_store(mut self, store: Arc<dyn StatusStore>) -> Self {
        self.status_store = Some(store);
        self
    }

    pub fn with_dispatcher(mut self, dispatcher: TaskDispatcher) -> Self {
        self.dispatcher = dispatcher;
        self
    }

    /// Publish task lifecycle events on `bus`.
    pub fn with_event_bus(mut self, bus: EventBus) -> Self {
        self.event_bus = Some(bus);
        self
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    pub fn dispatcher(&self) -> &TaskDispatcher {
        &self.dispatcher
    }

    pub fn client_provided(&self) -> bool {
        self.status_store.is_some()
    }

    pub fn duplicate_check_enabled(&self) -> bool {
        self.config.duplicate_check && self.guard.is_some()
    }

    /// Check for duplicates, dispatch the completion wait and fire the
    /// `shard` hook. Returns as soon as the wait is scheduled.
    pub async fn submit(&self, intent: CreateIntent) -> Result<TaskHandle> {
        let resource = intent.resource_name().to_string();
        info!(
            resource = %resource,
            cluster = intent.cluster().unwrap_or(""),
            shards = intent.shard_count(),
            rf = intent.replication_factor(),
            "Create requested"
        );

        match &self.guard {
            Some(guard) if self.config.duplicate_check => {
                if let Err(e) = guard.ensure_absent(&resource).await {
                    if matches!(e, CoordinatorError::DuplicateResource { .. }) {
                        self.emit(Event::DuplicateRejected {
                            resource: resource.clone(),
                        });
                    }
                    return Err(e);
                }
            }
            Some(_) => debug!(resource = %resource, "Duplicate check disabled"),
            None => debug!(resource = %resource, "No catalog attached, skipping duplicate check"),
        }

        let payload = serde_json::to_value(intent.to_args())?;
        let store = self.status_store.clone();
        let config = self.config.clone();
        let finished_bus = self.event_bus.clone();
        let work_resource = resource.clone();

        let work = move |ctx: TaskContext| async move {
            let result = match store {
                Some(store) => {
                    let poller = CompletionPoller::new(
                        store,
                        &work_resource,
                        config.timeout,
                        config.poll_interval,
                    )
                    .with_cancellation(ctx.cancel)
                    .with_owner(ctx.id.to_string());
                    match poller.run().await {
                        Ok(poll) => CoordinatorResult::from_poll(poll),
                        Err(e) => CoordinatorResult::from(e),
                    }
                }
                None => CoordinatorResult::success(""),
            };

            if result.is_success() {
                info!(task_id = %ctx.id, resource = %work_resource, "Create completed");
            } else {
                warn!(
                    task_id = %ctx.id,
                    resource = %work_resource,
                    reason = %result.message(),
                    "Create failed"
                );
            }
            if let Some(bus) = finished_bus {
                bus.emit(Event::TaskFinished {
                    task_id: ctx.id,
                    resource: work_resource,
                    success: result.is_success(),
                    message: result.message().to_string(),
                });
            }
            result
        };

        let hook = Arc::clone(&self.hook);
        let scheduled_bus = self.event_bus.clone();
        let scheduled_resource = resource.clone();
        let handle = self.dispatcher.dispatch(&resource, work, move |task_id| {
            if let Some(bus) = scheduled_bus {
                bus.emit(Event::TaskScheduled {
                    task_id,
                    resource: scheduled_resource,
                });
            }
            hook.process(HookEvent::with_payload(task_id, SHARD_HOOK, payload));
        });

        Ok(handle)
    }

    /// Submit and wait, folding every error into a failure result.
    pub async fn execute(&self, intent: CreateIntent) -> CoordinatorResult {
        match self.submit(intent).await {
            Ok(handle) => handle.wait().await,
            Err(e) => e.into(),
        }
    }

    fn emit(&self, event: Event) {
        if let Some(bus) = &self.event_bus {
            bus.emit(event);
        }
    }
}
