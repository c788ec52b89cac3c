use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use engine_logging::{engine_debug, engine_trace};
use scout_core::Status;
use tokio::runtime::Handle;
use tokio::sync::watch;
use url::Url;

use crate::EngineError;

/// Receiver of a task's statuses.
///
/// `progress` may be called any number of times with non-terminal statuses;
/// `complete` consumes the sink, so a task reports its terminal status once.
pub trait StatusSink: Send {
    fn progress(&self, _status: Status) {}
    fn complete(self: Box<Self>, status: Status);
}

impl<F> StatusSink for F
where
    F: FnOnce(Status) + Send,
{
    fn complete(self: Box<Self>, status: Status) {
        (*self)(status)
    }
}

/// A candidate address together with the sink its result goes to.
pub struct Task {
    address: Url,
    sink: Box<dyn StatusSink>,
}

impl Task {
    pub fn new(address: Url, sink: impl StatusSink + 'static) -> Self {
        Self {
            address,
            sink: Box::new(sink),
        }
    }

    pub fn address(&self) -> &Url {
        &self.address
    }

    pub fn into_parts(self) -> (Url, Box<dyn StatusSink>) {
        (self.address, self.sink)
    }
}

impl std::fmt::Debug for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Task").field("address", &self.address.as_str()).finish()
    }
}

/// Runs one dispatched task to completion.
#[async_trait::async_trait]
pub trait TaskRunner: Send + Sync {
    async fn run(&self, task: Task);
}

struct QueueState {
    max_concurrent: usize,
    pending: VecDeque<Task>,
    active_count: usize,
}

struct QueueInner {
    state: Mutex<QueueState>,
    runner: Arc<dyn TaskRunner>,
    runtime: Handle,
    outstanding: watch::Sender<usize>,
}

impl QueueInner {
    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, state: &QueueState) {
        self.outstanding
            .send_replace(state.pending.len() + state.active_count);
    }
}

/// FIFO work queue running at most `max_concurrent` tasks at a time.
///
/// Submission never blocks and the backlog is unbounded. A finished task
/// frees its slot and the oldest pending task is started right away.
#[derive(Clone)]
pub struct WorkQueue {
    inner: Arc<QueueInner>,
}

impl WorkQueue {
    /// Must be called from within a Tokio runtime; tasks are spawned onto it.
    pub fn new(runner: Arc<dyn TaskRunner>, max_concurrent: usize) -> Result<Self, EngineError> {
        let runtime = Handle::try_current().map_err(|err| EngineError::NoRuntime(err.to_string()))?;
        Self::with_runtime(runner, max_concurrent, runtime)
    }

    pub fn with_runtime(
        runner: Arc<dyn TaskRunner>,
        max_concurrent: usize,
        runtime: Handle,
    ) -> Result<Self, EngineError> {
        if max_concurrent == 0 {
            return Err(EngineError::ZeroConcurrency);
        }
        let (outstanding, _) = watch::channel(0);
        Ok(Self {
            inner: Arc::new(QueueInner {
                state: Mutex::new(QueueState {
                    max_concurrent,
                    pending: VecDeque::new(),
                    active_count: 0,
                }),
                runner,
                runtime,
                outstanding,
            }),
        })
    }

    pub fn submit(&self, task: Task) {
        {
            let mut state = self.inner.lock();
            engine_debug!(
                "Queueing {} ({} pending, {} active)",
                task.address(),
                state.pending.len(),
                state.active_count
            );
            state.pending.push_back(task);
            self.inner.publish(&state);
        }
        admit(&self.inner);
    }

    pub fn active_count(&self) -> usize {
        self.inner.lock().active_count
    }

    pub fn pending_len(&self) -> usize {
        self.inner.lock().pending.len()
    }

    /// Resolves once no task is pending or running.
    pub async fn wait_idle(&self) {
        let mut rx = self.inner.outstanding.subscribe();
        // The sender lives in `inner`, which `self` keeps alive.
        let _ = rx.wait_for(|outstanding| *outstanding == 0).await;
    }
}

/// Starts pending tasks while slots are free.
fn admit(inner: &Arc<QueueInner>) {
    loop {
        let task = {
            let mut state = inner.lock();
            if state.active_count >= state.max_concurrent {
                return;
            }
            let Some(task) = state.pending.pop_front() else {
                return;
            };
            state.active_count += 1;
            engine_trace!(
                "Dispatching {} ({} of {} slots in use)",
                task.address(),
                state.active_count,
                state.max_concurrent
            );
            task
        };

        let slot = Slot {
            inner: inner.clone(),
        };
        let runner = inner.runner.clone();
        inner.runtime.spawn(async move {
            runner.run(task).await;
            drop(slot);
        });
    }
}

/// An occupied slot; dropping it frees the slot and admits the next task,
/// even if the runner panicked.
struct Slot {
    inner: Arc<QueueInner>,
}

impl Drop for Slot {
    fn drop(&mut self) {
        {
            let mut state = self.inner.lock();
            state.active_count -= 1;
            self.inner.publish(&state);
        }
        admit(&self.inner);
    }
}
