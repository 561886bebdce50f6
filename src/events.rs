use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, SchedulerError};
use crate::types::{BatchCompletionSummary, TaskResult};

/// Notification names emitted and consumed by the scheduler.
pub mod names {
    pub const SCHEDULER_INITIALIZED: &str = "scheduler.initialized";
    pub const SCHEDULER_SHUTDOWN: &str = "scheduler.shutdown";

    pub const BATCH_CREATED: &str = "batch.created";
    pub const BATCH_STARTED: &str = "batch.started";
    pub const BATCH_PROGRESS: &str = "batch.progress";
    pub const TASK_COMPLETED: &str = "task.completed";
    pub const BATCH_ERROR: &str = "batch.error";
    pub const BATCH_COMPLETED: &str = "batch.completed";
    pub const BATCH_PAUSED: &str = "batch.paused";
    pub const BATCH_RESUMED: &str = "batch.resumed";
    pub const BATCH_CANCELLED: &str = "batch.cancelled";

    // Inbound control requests
    pub const PAUSE_REQUESTED: &str = "batch.pauseRequested";
    pub const RESUME_REQUESTED: &str = "batch.resumeRequested";
    pub const CANCEL_REQUESTED: &str = "batch.cancelRequested";
}

/// Callback invoked with the JSON payload of a notification.
pub type EventHandler = Arc<dyn Fn(&Value) + Send + Sync>;

/// Handle returned by [`NotificationSink::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

/// Publish/subscribe capability the scheduler reports to and is controlled through.
///
/// Implementations must tolerate handlers that call back into the sink
/// (or into the scheduler) while a notification is being delivered.
pub trait NotificationSink: Send + Sync {
    fn emit(&self, event: &str, payload: Value);

    fn subscribe(&self, event: &str, handler: EventHandler) -> SubscriptionId;

    /// Returns `false` if the subscription was not found.
    fn unsubscribe(&self, event: &str, id: SubscriptionId) -> bool;
}

/// Serialize `payload` and hand it to the sink.
pub fn emit_event<E: Serialize>(sink: &dyn NotificationSink, event: &str, payload: &E) -> Result<()> {
    let value = serde_json::to_value(payload)
        .map_err(|e| SchedulerError::Event(format!("{}: {}", event, e)))?;
    sink.emit(event, value);
    Ok(())
}

/// In-process [`NotificationSink`].
///
/// Handlers are snapshotted under the lock and invoked after it is
/// released, in subscription order.
#[derive(Default)]
pub struct EventBus {
    handlers: Mutex<HashMap<String, Vec<(SubscriptionId, EventHandler)>>>,
    next_id: AtomicU64,
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let events: Vec<String> = self
            .handlers
            .lock()
            .map(|h| h.keys().cloned().collect())
            .unwrap_or_default();
        f.debug_struct("EventBus").field("events", &events).finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live subscriptions for an event name.
    pub fn subscriber_count(&self, event: &str) -> usize {
        self.handlers
            .lock()
            .map(|h| h.get(event).map_or(0, Vec::len))
            .unwrap_or(0)
    }
}

impl NotificationSink for EventBus {
    fn emit(&self, event: &str, payload: Value) {
        let handlers: Vec<EventHandler> = match self.handlers.lock() {
            Ok(map) => map
                .get(event)
                .map(|subs| subs.iter().map(|(_, h)| Arc::clone(h)).collect())
                .unwrap_or_default(),
            Err(e) => {
                tracing::warn!(event, "event bus mutex poisoned: {}", e);
                return;
            }
        };
        for handler in handlers {
            handler(&payload);
        }
    }

    fn subscribe(&self, event: &str, handler: EventHandler) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        match self.handlers.lock() {
            Ok(mut map) => map.entry(event.to_string()).or_default().push((id, handler)),
            Err(e) => tracing::warn!(event, "event bus mutex poisoned: {}", e),
        }
        id
    }

    fn unsubscribe(&self, event: &str, id: SubscriptionId) -> bool {
        let Ok(mut map) = self.handlers.lock() else {
            return false;
        };
        let Some(subs) = map.get_mut(event) else {
            return false;
        };
        let before = subs.len();
        subs.retain(|(sub_id, _)| *sub_id != id);
        let removed = subs.len() != before;
        if subs.is_empty() {
            map.remove(event);
        }
        removed
    }
}

/// Payload of `scheduler.initialized` and `scheduler.shutdown`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulerLifecycleEvent {
    pub queued_batches: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchCreatedEvent {
    pub batch_id: String,
    pub name: String,
    pub total_pages: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchStartedEvent {
    pub batch_id: String,
    pub name: String,
    pub total_items: usize,
    /// Milliseconds.
    pub estimated_time: u64,
}

/// Emitted as each task starts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchProgressEvent {
    pub batch_id: String,
    pub progress: f64,
    /// 1-based position of the task that just started.
    pub current_item: usize,
    pub total_items: usize,
    /// Milliseconds.
    pub remaining_time: u64,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskCompletedEvent<P>
where
    P: Clone + Send + Sync + Serialize,
{
    pub batch_id: String,
    pub task_id: String,
    pub result: TaskResult<P>,
}

/// A stage failure. Never fatal to the batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchErrorEvent {
    pub batch_id: String,
    pub task_id: String,
    /// `recognition` or `translation`.
    pub stage: String,
    pub error: String,
    pub is_fatal: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchCompletedEvent {
    pub batch_id: String,
    pub results: BatchCompletionSummary,
}

/// Payload of `batch.paused` and `batch.resumed`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchControlEvent {
    pub batch_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchCancelledEvent {
    pub batch_id: String,
    pub reason: String,
}

/// Inbound pause/resume/cancel request payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlRequest {
    pub batch_id: String,
}
