//! Task manager for remote calls
//!
//! Provides lifecycle management for async tasks with support for:
//! - De-duplicated requests: at most one in-flight call per key
//! - Replace-latest spawning and debounced execution
//! - Suppression of late results once the surface is unmounted
//!
//! # Example
//!
//! ```ignore
//! use surface_dispatch::tasks::{TaskManager, TaskKey};
//!
//! let (action_tx, mut action_rx) = tokio::sync::mpsc::unbounded_channel();
//! let mut tasks = TaskManager::new(action_tx, mounted.clone());
//!
//! // Two identical requests while the first is in flight: one remote call
//! let key = TaskKey::with_params("get_balance", &address);
//! tasks.request(key.clone(), fetch_balance(remote.clone(), address.clone()));
//! tasks.request(key, fetch_balance(remote, address)); // Dedup::Joined
//!
//! // Latest wins: the previous search is cancelled
//! tasks.spawn("search", async move { Action::SearchDidLoad(search(query).await) });
//! ```

use std::collections::HashMap;
use std::fmt::Debug;
use std::future::Future;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::AbortHandle;
use tokio_util::sync::CancellationToken;

use crate::Action;

/// Identifies a request by operation name and parameters.
///
/// Requests with the same key are never in flight twice at the same time.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct TaskKey(String);

impl TaskKey {
    /// Key for an operation without parameters.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Key for an operation with parameters, e.g. `get_balance("0xabc", "0x1")`.
    pub fn with_params(operation: &str, params: impl Debug) -> Self {
        Self(format!("{operation}({params:?})"))
    }

    /// Get the key name.
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl From<&'static str> for TaskKey {
    fn from(s: &'static str) -> Self {
        Self::new(s)
    }
}

impl From<String> for TaskKey {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Outcome of [`TaskManager::request`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Dedup {
    /// A new remote call was issued.
    Issued,
    /// An identical call is already in flight; its result will be applied.
    Joined,
    /// The surface is unmounted; nothing was issued.
    Unmounted,
}

/// Manages async task lifecycle for one surface.
///
/// Every task sends exactly one action back on completion, unless it was
/// cancelled or the surface's `mounted` token was cancelled first.
pub struct TaskManager<A> {
    tasks: HashMap<TaskKey, AbortHandle>,
    action_tx: mpsc::UnboundedSender<A>,
    mounted: CancellationToken,
}

impl<A> TaskManager<A>
where
    A: Action,
{
    /// Create a new task manager.
    ///
    /// Completed tasks send their action on `action_tx` as long as `mounted`
    /// has not been cancelled.
    pub fn new(action_tx: mpsc::UnboundedSender<A>, mounted: CancellationToken) -> Self {
        Self {
            tasks: HashMap::new(),
            action_tx,
            mounted,
        }
    }

    fn launch<F>(&self, delay: Option<Duration>, future: F) -> AbortHandle
    where
        F: Future<Output = A> + Send + 'static,
    {
        let tx = self.action_tx.clone();
        let mounted = self.mounted.clone();
        tokio::spawn(async move {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            let action = future.await;
            if mounted.is_cancelled() {
                tracing::debug!(action = %action.name(), "Dropping result for unmounted surface");
                return;
            }
            let _ = tx.send(action);
        })
        .abort_handle()
    }

    /// Issue a request unless an identical one is already in flight.
    ///
    /// The future should return the result action (success or error). When a
    /// call with the same key is still running the new future is dropped
    /// without being polled and [`Dedup::Joined`] is returned.
    pub fn request<F>(&mut self, key: impl Into<TaskKey>, future: F) -> Dedup
    where
        F: Future<Output = A> + Send + 'static,
    {
        let key = key.into();
        if self.mounted.is_cancelled() {
            return Dedup::Unmounted;
        }
        if self.is_running(&key) {
            tracing::trace!(key = %key.name(), "Joining in-flight request");
            return Dedup::Joined;
        }

        let handle = self.launch(None, future);
        self.tasks.insert(key, handle);
        Dedup::Issued
    }

    /// Spawn a task, cancelling any existing task with the same key.
    pub fn spawn<F>(&mut self, key: impl Into<TaskKey>, future: F) -> &mut Self
    where
        F: Future<Output = A> + Send + 'static,
    {
        let key = key.into();
        self.cancel(&key);
        if !self.mounted.is_cancelled() {
            let handle = self.launch(None, future);
            self.tasks.insert(key, handle);
        }
        self
    }

    /// Spawn a task with debounce - waits for duration before executing.
    ///
    /// If called again with the same key before the duration expires,
    /// the previous task is cancelled and the timer resets.
    pub fn debounce<F>(
        &mut self,
        key: impl Into<TaskKey>,
        duration: Duration,
        future: F,
    ) -> &mut Self
    where
        F: Future<Output = A> + Send + 'static,
    {
        let key = key.into();
        self.cancel(&key);
        if !self.mounted.is_cancelled() {
            let handle = self.launch(Some(duration), future);
            self.tasks.insert(key, handle);
        }
        self
    }

    /// Cancel a task by key.
    ///
    /// If no task exists with the given key, this is a no-op.
    pub fn cancel(&mut self, key: &TaskKey) {
        if let Some(handle) = self.tasks.remove(key) {
            handle.abort();
        }
    }

    /// Abort all running tasks.
    pub fn cancel_all(&mut self) {
        for (_, handle) in self.tasks.drain() {
            handle.abort();
        }
    }

    /// Forget all tasks without aborting them.
    ///
    /// Used at teardown: remote calls already issued run to completion, but
    /// their results are dropped because the `mounted` token is cancelled.
    pub fn release(&mut self) {
        let released = self.tasks.len();
        self.tasks.clear();
        if released > 0 {
            tracing::debug!(released, "Released in-flight requests");
        }
    }

    /// Check if a task with the given key is currently running.
    pub fn is_running(&self, key: &TaskKey) -> bool {
        self.tasks
            .get(key)
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Drop bookkeeping for finished tasks.
    pub fn prune(&mut self) {
        self.tasks.retain(|_, handle| !handle.is_finished());
    }

    /// Get the number of running tasks.
    pub fn len(&self) -> usize {
        self.tasks.values().filter(|h| !h.is_finished()).count()
    }

    /// Check if there are no running tasks.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get the keys of all running tasks.
    pub fn running_keys(&self) -> impl Iterator<Item = &TaskKey> {
        self.tasks
            .iter()
            .filter(|(_, handle)| !handle.is_finished())
            .map(|(key, _)| key)
    }
}
