//! Background execution of completion waits.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::CoordinatorError;
use crate::outcome::CoordinatorResult;

/// Spawns units of work onto a tokio runtime and hands back a [`TaskHandle`]
/// without waiting for them.
///
/// Bind it to a dedicated runtime with [`TaskDispatcher::new`] to keep long
/// waits away from the runtime serving requests.
#[derive(Clone)]
pub struct TaskDispatcher {
    runtime: Handle,
    active: Arc<AtomicUsize>,
}

impl TaskDispatcher {
    pub fn new(runtime: Handle) -> Self {
        Self {
            runtime,
            active: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Dispatcher on the runtime of the calling task.
    ///
    /// # Panics
    ///
    /// Panics when called outside of a tokio runtime.
    pub fn current() -> Self {
        Self::new(Handle::current())
    }

    /// Units of work spawned and not yet finished.
    pub fn active_tasks(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    /// Spawn `work` and return immediately.
    ///
    /// `on_scheduled` runs exactly once, on the caller's side, after the
    /// runtime has accepted the unit of work and before this returns. The
    /// work gets a [`TaskContext`] and must observe its cancellation token.
    pub fn dispatch<W, Fut, S>(&self, resource: &str, work: W, on_scheduled: S) -> TaskHandle
    where
        W: FnOnce(TaskContext) -> Fut,
        Fut: Future<Output = CoordinatorResult> + Send + 'static,
        S: FnOnce(Uuid),
    {
        let id = Uuid::new_v4();
        let cancel = CancellationToken::new();
        let fut = work(TaskContext {
            id,
            cancel: cancel.clone(),
        });

        self.active.fetch_add(1, Ordering::SeqCst);
        let active = ActiveTask(Arc::clone(&self.active));
        let join = self.runtime.spawn(async move {
            let _active = active;
            fut.await
        });

        debug!(task_id = %id, resource = %resource, "Wait task spawned");
        on_scheduled(id);

        TaskHandle {
            id,
            resource: resource.to_string(),
            join,
            cancel,
        }
    }
}

impl std::fmt::Debug for TaskDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskDispatcher")
            .field("active_tasks", &self.active_tasks())
            .finish()
    }
}

/// What a unit of work gets to know about itself.
#[derive(Debug, Clone)]
pub struct TaskContext {
    pub id: Uuid,
    pub cancel: CancellationToken,
}

/// Decrements the active counter when the spawned future completes or is dropped.
struct ActiveTask(Arc<AtomicUsize>);

impl Drop for ActiveTask {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Handle to a dispatched wait.
///
/// Dropping the handle detaches the task: it keeps running until its own
/// timeout. Awaiting [`TaskHandle::wait`] and then dropping that future
/// cancels it instead.
pub struct TaskHandle {
    id: Uuid,
    resource: String,
    join: JoinHandle<CoordinatorResult>,
    cancel: CancellationToken,
}

impl TaskHandle {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Ask the wait to stop at its next check.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Wait for the unit of work to deliver its result.
    pub async fn wait(self) -> CoordinatorResult {
        let TaskHandle {
            id,
            resource,
            join,
            cancel,
        } = self;
        let guard = cancel.drop_guard();

        let result = match join.await {
            Ok(result) => result,
            Err(e) if e.is_cancelled() => CoordinatorError::Cancelled.into(),
            Err(e) => {
                warn!(task_id = %id, resource = %resource, error = %e, "Wait task panicked");
                CoordinatorError::TaskJoin(e.to_string()).into()
            }
        };

        guard.disarm();
        result
    }
}

impl std::fmt::Debug for TaskHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskHandle")
            .field("id", &self.id)
            .field("resource", &self.resource)
            .field("finished", &self.is_finished())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;
    use std::sync::Mutex;
    use std::time::Duration;

    #[tokio::test]
    async fn test_dispatch_returns_before_work_completes() {
        let dispatcher = TaskDispatcher::current();
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();

        let handle = dispatcher.dispatch(
            "t1",
            |_ctx| async move {
                let _ = rx.await;
                CoordinatorResult::success("done")
            },
            |_| {},
        );

        assert!(!handle.is_finished());
        assert_eq!(dispatcher.active_tasks(), 1);

        tx.send(()).unwrap();
        assert_eq!(handle.wait().await, CoordinatorResult::success("done"));

        tokio::task::yield_now().await;
        assert_eq!(dispatcher.active_tasks(), 0);
    }

    #[tokio::test]
    async fn test_on_scheduled_runs_once_after_spawn() {
        let dispatcher = TaskDispatcher::current();
        let observed = Arc::new(Mutex::new(Vec::new()));

        let probe = dispatcher.clone();
        let seen = Arc::clone(&observed);
        let handle = dispatcher.dispatch(
            "t1",
            |_ctx| async { CoordinatorResult::success("") },
            move |id| seen.lock().unwrap().push((id, probe.active_tasks())),
        );

        let calls = observed.lock().unwrap().clone();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, handle.id());
        assert_eq!(calls[0].1, 1, "hook ran before the unit of work existed");
        handle.wait().await;
    }

    #[tokio::test]
    async fn test_dropping_wait_cancels_work() {
        let dispatcher = TaskDispatcher::current();
        let cancelled = Arc::new(AtomicBool::new(false));

        let flag = Arc::clone(&cancelled);
        let handle = dispatcher.dispatch(
            "t1",
            move |ctx| async move {
                ctx.cancel.cancelled().await;
                flag.store(true, Ordering::SeqCst);
                CoordinatorResult::from(CoordinatorError::Cancelled)
            },
            |_| {},
        );

        let abandoned = tokio::time::timeout(Duration::from_millis(20), handle.wait()).await;
        assert!(abandoned.is_err());

        for _ in 0..100 {
            if cancelled.load(Ordering::SeqCst) {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert!(cancelled.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_panicking_work_is_reported() {
        let dispatcher = TaskDispatcher::current();

        let handle = dispatcher.dispatch(
            "t1",
            |_ctx| async {
                if true {
                    panic!("boom");
                }
                CoordinatorResult::success("")
            },
            |_| {},
        );

        let result = handle.wait().await;
        assert!(!result.is_success());
        assert!(result.message().starts_with("Wait task failed"));

        tokio::task::yield_now().await;
        assert_eq!(dispatcher.active_tasks(), 0);
    }

    #[tokio::test]
    async fn test_dispatch_on_dedicated_runtime() {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()
            .unwrap();
        let dispatcher = TaskDispatcher::new(runtime.handle().clone());

        let handle = dispatcher.dispatch(
            "t1",
            |_ctx| async { CoordinatorResult::success("elsewhere") },
            |_| {},
        );

        assert_eq!(handle.wait().await, CoordinatorResult::success("elsewhere"));
        runtime.shutdown_background();
    }
}
