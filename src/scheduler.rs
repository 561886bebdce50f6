use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Instant;

use serde::Serialize;
use tokio::runtime::Handle;
use tracing::{debug, error, info, warn, Instrument};

use crate::config::SchedulerConfig;
use crate::error::{Result, SchedulerError};
use crate::events::{
    self, names, BatchCancelledEvent, BatchCompletedEvent, BatchControlEvent, BatchCreatedEvent,
    BatchErrorEvent, BatchProgressEvent, BatchStartedEvent, ControlRequest, EventHandler,
    NotificationSink, SchedulerLifecycleEvent, SubscriptionId, TaskCompletedEvent,
};
use crate::queue::BatchQueue;
use crate::stats::{EtaEstimator, ProcessingStats};
use crate::types::*;
use crate::{RecognitionStage, TranslationStage};

const CANCEL_REASON_USER: &str = "User cancelled";
const CANCEL_REASON_CLEARED: &str = "Queue cleared";
const CANCEL_REASON_SHUTDOWN: &str = "Scheduler shutdown";

/// Task loop bookkeeping. Lives only in memory.
#[derive(Debug, Default)]
struct RunState {
    active_id: Option<String>,
    /// Task the loop is on; `None` before the first task starts.
    active_index: Option<usize>,
    paused: bool,
    /// Set by a cancellation and kept until the next batch starts.
    cancelled: bool,
    /// Bumped by every `process_batch`. A loop only touches state while its
    /// generation is current.
    generation: u64,
    /// A loop for `generation` is alive, either running or awaiting a stage.
    loop_running: bool,
}

impl RunState {
    fn begin(&mut self, batch_id: &str) -> u64 {
        self.generation += 1;
        self.active_id = Some(batch_id.to_string());
        self.active_index = None;
        self.paused = false;
        self.cancelled = false;
        self.loop_running = true;
        self.generation
    }

    fn clear(&mut self) {
        self.active_id = None;
        self.active_index = None;
        self.paused = false;
        self.loop_running = false;
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation == generation && self.active_id.is_some() && !self.cancelled
    }
}

struct SchedulerState<P>
where
    P: Clone + Send + Sync + Serialize,
{
    initialized: bool,
    runtime: Option<Handle>,
    queue: BatchQueue<P>,
    run: RunState,
    stats: ProcessingStats,
    subscriptions: Vec<(&'static str, SubscriptionId)>,
}

#[derive(Debug, Clone, Copy)]
enum ControlAction {
    Pause,
    Resume,
    Cancel,
}

struct RecognizeWork<P> {
    batch_id: String,
    index: usize,
    task_id: String,
    page: P,
    options: StageOptions,
}

struct TranslateWork {
    batch_id: String,
    index: usize,
    task_id: String,
    text: String,
    options: StageOptions,
}

enum Step<P> {
    Recognize(RecognizeWork<P>),
    Translate(TranslateWork),
    Finished {
        summary: BatchCompletionSummary,
        next: Option<String>,
    },
    Halt,
}

/// Drives at most one batch at a time through recognition and translation.
///
/// Tasks run strictly in order: a task's two stages are awaited before the
/// next task starts. Pause and cancel are cooperative and only observed
/// between stages; an in-flight stage call is never aborted. A cancelled
/// batch's late stage results are discarded.
///
/// The task loop runs as a tokio task on the runtime captured by
/// [`start()`](Self::start). Notifications are emitted without holding the
/// scheduler's lock, so sink handlers may call back into the scheduler.
///
/// # Example
///
/// ```ignore
/// let bus = Arc::new(EventBus::new());
/// let scheduler = Scheduler::new(SchedulerConfig::default(), Ocr, Translator, bus.clone());
/// scheduler.start()?;
///
/// let batch_id = scheduler.create_batch(
///     BatchRequest::new(pages).with_name("Chapter 3").auto_start(true),
/// )?;
/// ```
pub struct Scheduler<P, R, T>
where
    P: Clone + Send + Sync + Serialize + 'static,
    R: RecognitionStage<P>,
    T: TranslationStage,
{
    config: SchedulerConfig,
    recognizer: R,
    translator: T,
    sink: Arc<dyn NotificationSink>,
    state: Mutex<SchedulerState<P>>,
}

impl<P, R, T> fmt::Debug for Scheduler<P, R, T>
where
    P: Clone + Send + Sync + Serialize + 'static,
    R: RecognitionStage<P>,
    T: TranslationStage,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock_state();
        f.debug_struct("Scheduler")
            .field("initialized", &state.initialized)
            .field("queued_batches", &state.queue.len())
            .field("run", &state.run)
            .finish()
    }
}

impl<P, R, T> Scheduler<P, R, T>
where
    P: Clone + Send + Sync + Serialize + 'static,
    R: RecognitionStage<P>,
    T: TranslationStage,
{
    pub fn new(
        config: SchedulerConfig,
        recognizer: R,
        translator: T,
        sink: Arc<dyn NotificationSink>,
    ) -> Arc<Self> {
        Arc::new(Self {
            config,
            recognizer,
            translator,
            sink,
            state: Mutex::new(SchedulerState {
                initialized: false,
                runtime: None,
                queue: BatchQueue::new(),
                run: RunState::default(),
                stats: ProcessingStats::default(),
                subscriptions: Vec::new(),
            }),
        })
    }

    fn lock_state(&self) -> MutexGuard<'_, SchedulerState<P>> {
        self.state.lock().unwrap_or_else(|poisoned| {
            warn!("scheduler state mutex poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn estimator(&self) -> EtaEstimator {
        EtaEstimator::new(
            self.config.default_page_estimate_ms,
            self.config.remaining_estimate_min_samples,
        )
    }

    fn emit<E: Serialize>(&self, event: &str, payload: &E) {
        if let Err(e) = events::emit_event(self.sink.as_ref(), event, payload) {
            warn!("failed to emit {}: {}", event, e);
        }
    }

    /// Initialize the scheduler: capture the current tokio runtime and
    /// subscribe to inbound pause/resume/cancel requests.
    ///
    /// Must be called from within a tokio runtime. Calling it again is a no-op.
    pub fn start(self: &Arc<Self>) -> Result<()> {
        let runtime = Handle::try_current().map_err(|e| SchedulerError::Runtime(e.to_string()))?;
        {
            let mut state = self.lock_state();
            if state.initialized {
                warn!("batch scheduler already initialized");
                return Ok(());
            }
            state.initialized = true;
            state.runtime = Some(runtime);
        }

        let subscriptions: Vec<(&'static str, SubscriptionId)> = [
            (names::PAUSE_REQUESTED, ControlAction::Pause),
            (names::RESUME_REQUESTED, ControlAction::Resume),
            (names::CANCEL_REQUESTED, ControlAction::Cancel),
        ]
        .into_iter()
        .map(|(event, action)| {
            let scheduler: Weak<Self> = Arc::downgrade(self);
            let handler: EventHandler = Arc::new(move |payload: &serde_json::Value| {
                if let Some(scheduler) = scheduler.upgrade() {
                    scheduler.handle_control(action, payload);
                }
            });
            (event, self.sink.subscribe(event, handler))
        })
        .collect();

        let queued_batches = {
            let mut state = self.lock_state();
            state.subscriptions = subscriptions;
            state.queue.len()
        };

        info!("batch scheduler initialized");
        self.emit(
            names::SCHEDULER_INITIALIZED,
            &SchedulerLifecycleEvent { queued_batches },
        );
        Ok(())
    }

    /// Cancel the active batch, drop every queued batch and unsubscribe from
    /// control requests. The scheduler can be started again afterwards.
    pub fn shutdown(&self) {
        info!("shutting down batch scheduler");
        self.cancel_active(CANCEL_REASON_SHUTDOWN);

        let subscriptions = {
            let mut state = self.lock_state();
            state.queue.clear_except(None);
            state.run.clear();
            // Strands any loop still awaiting a stage.
            state.run.generation += 1;
            state.initialized = false;
            state.runtime = None;
            std::mem::take(&mut state.subscriptions)
        };
        for (event, id) in subscriptions {
            self.sink.unsubscribe(event, id);
        }

        self.emit(
            names::SCHEDULER_SHUTDOWN,
            &SchedulerLifecycleEvent { queued_batches: 0 },
        );
    }

    fn handle_control(self: &Arc<Self>, action: ControlAction, payload: &serde_json::Value) {
        let request: ControlRequest = match serde_json::from_value(payload.clone()) {
            Ok(request) => request,
            Err(e) => {
                warn!(?action, "ignoring malformed control request: {}", e);
                return;
            }
        };

        if self.active_batch_id().as_deref() != Some(request.batch_id.as_str()) {
            debug!(batch_id = %request.batch_id, ?action, "control request is not for the active batch");
            return;
        }

        match action {
            ControlAction::Pause => {
                self.pause_current_batch();
            }
            ControlAction::Resume => {
                self.resume_current_batch();
            }
            ControlAction::Cancel => {
                self.cancel_current_batch();
            }
        }
    }

    /// Queue a new batch with one task per page. Returns the batch id.
    ///
    /// Task options are the configured defaults overridden by the request's
    /// options. With `auto_start`, processing begins immediately unless
    /// another batch is active.
    pub fn create_batch(self: &Arc<Self>, request: BatchRequest<P>) -> Result<String> {
        let BatchRequest {
            name,
            pages,
            recognition_options,
            translation_options,
            auto_start,
        } = request;

        let created = {
            let mut state = self.lock_state();
            if !state.initialized {
                error!("create_batch called on an uninitialized scheduler");
                return Err(SchedulerError::NotInitialized);
            }
            if pages.is_empty() {
                return Err(SchedulerError::InvalidArgument(
                    "pages must not be empty".to_string(),
                ));
            }

            let batch_id = format!("batch-{}", uuid::Uuid::new_v4());
            let name = name
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| format!("Batch {}", state.stats.total_batches + 1));
            let recognition_options =
                merge_options(&self.config.default_recognition_options, &recognition_options);
            let translation_options =
                merge_options(&self.config.default_translation_options, &translation_options);

            let tasks: Vec<Task<P>> = pages
                .into_iter()
                .enumerate()
                .map(|(index, page)| {
                    Task::new(
                        format!("task-{}-{}", batch_id, index),
                        page,
                        recognition_options.clone(),
                        translation_options.clone(),
                    )
                })
                .collect();

            let created = BatchCreatedEvent {
                batch_id: batch_id.clone(),
                name: name.clone(),
                total_pages: tasks.len(),
            };
            state.stats.record_batch_created(tasks.len());
            state.queue.push(Batch::new(batch_id, name, tasks));
            created
        };

        info!(batch_id = %created.batch_id, pages = created.total_pages, "created batch");
        self.emit(names::BATCH_CREATED, &created);

        if auto_start && !self.is_processing() {
            self.process_batch(&created.batch_id)?;
        }
        Ok(created.batch_id)
    }

    /// Start processing a queued batch.
    ///
    /// Returns `Ok(false)` without touching anything if another batch is
    /// active or the target already completed or was cancelled.
    pub fn process_batch(self: &Arc<Self>, batch_id: &str) -> Result<bool> {
        let (started, runtime, generation) = {
            let mut guard = self.lock_state();
            let state = &mut *guard;
            if !state.initialized {
                error!(batch_id, "process_batch called on an uninitialized scheduler");
                return Err(SchedulerError::NotInitialized);
            }
            if let Some(active) = &state.run.active_id {
                warn!(batch_id, active = %active, "another batch is already processing");
                return Ok(false);
            }
            let Some(runtime) = state.runtime.clone() else {
                return Err(SchedulerError::Runtime(
                    "scheduler has no runtime handle".to_string(),
                ));
            };
            let Some(batch) = state.queue.get_mut(batch_id) else {
                error!(batch_id, "batch not found");
                return Err(SchedulerError::NotFound(batch_id.to_string()));
            };
            if batch.status.is_terminal() {
                warn!(batch_id, status = batch.status.as_str(), "batch already finished");
                return Ok(false);
            }

            let estimated_time = self.estimator().estimate_batch(&state.stats, batch.tasks.len());
            batch.begin();
            let generation = state.run.begin(batch_id);

            let started = BatchStartedEvent {
                batch_id: batch_id.to_string(),
                name: batch.name.clone(),
                total_items: batch.tasks.len(),
                estimated_time,
            };
            (started, runtime, generation)
        };

        info!(
            batch_id,
            pages = started.total_items,
            estimated_ms = started.estimated_time,
            "starting batch"
        );
        self.emit(names::BATCH_STARTED, &started);
        self.spawn_loop(&runtime, generation, batch_id);
        Ok(true)
    }

    /// Stop the active batch before its next stage. An in-flight stage call
    /// finishes and its result is kept.
    pub fn pause_current_batch(&self) -> bool {
        let batch_id = {
            let mut guard = self.lock_state();
            let state = &mut *guard;
            let Some(batch_id) = state.run.active_id.clone() else {
                warn!("no batch is currently processing");
                return false;
            };
            if state.run.paused {
                warn!(batch_id = %batch_id, "batch already paused");
                return false;
            }
            let Some(batch) = state.queue.get_mut(&batch_id) else {
                return false;
            };
            state.run.paused = true;
            batch.status = BatchStatus::Paused;
            batch_id
        };

        info!(batch_id = %batch_id, "paused batch");
        self.emit(names::BATCH_PAUSED, &BatchControlEvent { batch_id });
        true
    }

    /// Continue a paused batch where it stopped: the pending translation of
    /// the current task if recognition already finished, else the next task.
    pub fn resume_current_batch(self: &Arc<Self>) -> bool {
        let (batch_id, respawn) = {
            let mut guard = self.lock_state();
            let state = &mut *guard;
            let Some(batch_id) = state.run.active_id.clone() else {
                warn!("no batch is currently processing");
                return false;
            };
            if !state.run.paused {
                warn!(batch_id = %batch_id, "batch is not paused");
                return false;
            }
            state.run.paused = false;
            if let Some(batch) = state.queue.get_mut(&batch_id) {
                batch.status = BatchStatus::Processing;
            }

            // A loop still awaiting its stage picks the work up by itself.
            let respawn = if state.run.loop_running {
                None
            } else {
                match state.runtime.clone() {
                    Some(runtime) => {
                        state.run.loop_running = true;
                        Some((runtime, state.run.generation))
                    }
                    None => {
                        error!(batch_id = %batch_id, "no runtime to resume the task loop on");
                        None
                    }
                }
            };
            (batch_id, respawn)
        };

        info!(batch_id = %batch_id, "resumed batch");
        self.emit(
            names::BATCH_RESUMED,
            &BatchControlEvent {
                batch_id: batch_id.clone(),
            },
        );
        if let Some((runtime, generation)) = respawn {
            self.spawn_loop(&runtime, generation, &batch_id);
        }
        true
    }

    /// Cancel the active batch and free the active slot immediately.
    pub fn cancel_current_batch(&self) -> bool {
        self.cancel_active(CANCEL_REASON_USER)
    }

    fn cancel_active(&self, reason: &str) -> bool {
        let batch_id = {
            let mut guard = self.lock_state();
            let state = &mut *guard;
            let Some(batch_id) = state.run.active_id.clone() else {
                warn!("no batch is currently processing");
                return false;
            };
            let Some(batch) = state.queue.get_mut(&batch_id) else {
                return false;
            };
            if batch.unfinished_count() == 0 {
                warn!(batch_id = %batch_id, "all tasks finished, letting the batch complete");
                return false;
            }
            batch.close(BatchStatus::Cancelled);
            state.stats.record_batch_cancelled();
            state.run.clear();
            state.run.cancelled = true;
            batch_id
        };

        info!(batch_id = %batch_id, reason, "cancelled batch");
        self.emit(
            names::BATCH_CANCELLED,
            &BatchCancelledEvent {
                batch_id,
                reason: reason.to_string(),
            },
        );
        true
    }

    /// Remove every batch except the active one. With `include_active`, the
    /// active batch is cancelled first and removed as well.
    ///
    /// An active batch whose tasks have all finished cannot be cancelled; it is
    /// dropped without a completion and its loop is stranded.
    pub fn clear_queue(&self, include_active: bool) -> usize {
        if include_active {
            self.cancel_active(CANCEL_REASON_CLEARED);
        }
        let removed = {
            let mut state = self.lock_state();
            if include_active {
                if let Some(active) = state.run.active_id.take() {
                    debug!(batch_id = %active, "dropping finished active batch before completion");
                    state.run.clear();
                    state.run.generation += 1;
                }
            }
            let active = state.run.active_id.clone();
            state.queue.clear_except(active.as_deref())
        };
        info!(removed, include_active, "cleared batch queue");
        removed
    }

    /// Remove one batch. The active batch cannot be removed (`Ok(false)`).
    pub fn remove_batch(&self, batch_id: &str) -> Result<bool> {
        let mut state = self.lock_state();
        if !state.queue.contains(batch_id) {
            return Err(SchedulerError::NotFound(batch_id.to_string()));
        }
        if state.run.active_id.as_deref() == Some(batch_id) {
            warn!(batch_id, "cannot remove the active batch");
            return Ok(false);
        }
        state.queue.remove(batch_id);
        debug!(batch_id, "removed batch");
        Ok(true)
    }

    fn spawn_loop(self: &Arc<Self>, runtime: &Handle, generation: u64, batch_id: &str) {
        let span = tracing::info_span!("batch_loop", batch_id, generation);
        runtime.spawn(Arc::clone(self).run_loop(generation).instrument(span));
    }

    async fn run_loop(self: Arc<Self>, generation: u64) {
        loop {
            match self.next_step(generation) {
                Step::Recognize(work) => self.run_recognition(generation, work).await,
                Step::Translate(work) => self.run_translation(generation, work).await,
                Step::Finished { summary, next } => {
                    info!(
                        batch_id = %summary.batch_id,
                        completed = summary.completed_pages,
                        failed = summary.failed_pages,
                        duration_ms = summary.total_duration,
                        "batch completed"
                    );
                    self.emit(
                        names::BATCH_COMPLETED,
                        &BatchCompletedEvent {
                            batch_id: summary.batch_id.clone(),
                            results: summary,
                        },
                    );
                    if let Some(next_id) = next {
                        match self.process_batch(&next_id) {
                            Ok(true) => {}
                            Ok(false) => debug!(batch_id = %next_id, "queued batch not started"),
                            Err(e) => warn!(batch_id = %next_id, "failed to start queued batch: {}", e),
                        }
                    }
                    return;
                }
                Step::Halt => return,
            }
        }
    }

    /// Checkpoint, then pick the loop's next piece of work.
    fn next_step(&self, generation: u64) -> Step<P> {
        let (work, progress) = {
            let mut guard = self.lock_state();
            let state = &mut *guard;
            if !state.run.is_current(generation) {
                debug!(generation, "run is stale or cancelled, stopping task loop");
                return Step::Halt;
            }
            let Some(batch_id) = state.run.active_id.clone() else {
                return Step::Halt;
            };
            let Some(batch) = state.queue.get_mut(&batch_id) else {
                error!(batch_id = %batch_id, "active batch disappeared from the queue");
                state.run.clear();
                return Step::Halt;
            };

            let current = state.run.active_index;
            let pending_translation = current.filter(|&i| batch.tasks[i].awaiting_translation());
            let next_index = current.map_or(0, |i| i + 1);

            // A paused batch stays frozen, even with every task finished;
            // resume finalizes it.
            if state.run.paused {
                state.run.loop_running = false;
                debug!(batch_id = %batch_id, "paused, task loop halted");
                return Step::Halt;
            }

            if let Some(index) = pending_translation {
                let task = &batch.tasks[index];
                return Step::Translate(TranslateWork {
                    batch_id,
                    index,
                    task_id: task.id.clone(),
                    text: task
                        .recognition_result
                        .as_ref()
                        .map(|r| r.text.clone())
                        .unwrap_or_default(),
                    options: task.translation_options.clone(),
                });
            }

            state.run.active_index = Some(next_index);
            if next_index >= batch.tasks.len() {
                batch.close(BatchStatus::Completed);
                batch.progress = 100.0;
                state.stats.record_batch_completed();
                let summary = batch.completion_summary();
                state.run.clear();
                let next = if self.config.auto_process_queue {
                    state.queue.first_pending().map(|b| b.id.clone())
                } else {
                    None
                };
                return Step::Finished { summary, next };
            }

            let total = batch.tasks.len();
            let task = &mut batch.tasks[next_index];
            task.start();
            let work = RecognizeWork {
                batch_id: batch_id.clone(),
                index: next_index,
                task_id: task.id.clone(),
                page: task.page.clone(),
                options: task.recognition_options.clone(),
            };

            batch.progress = next_index as f64 / total as f64 * 100.0;
            let remaining_time = self.estimator().estimate_remaining(
                &state.stats,
                batch.unfinished_count(),
                batch.elapsed_ms(),
                batch.finished_count(),
            );
            let progress = BatchProgressEvent {
                batch_id,
                progress: batch.progress,
                current_item: next_index + 1,
                total_items: total,
                remaining_time,
                message: format!("Processing page {} of {}", next_index + 1, total),
            };
            (work, progress)
        };

        debug!(
            batch_id = %progress.batch_id,
            task_id = %work.task_id,
            "processing task {}/{}",
            progress.current_item,
            progress.total_items
        );
        self.emit(names::BATCH_PROGRESS, &progress);
        Step::Recognize(work)
    }

    async fn run_recognition(&self, generation: u64, work: RecognizeWork<P>) {
        let started = Instant::now();
        let outcome = self.recognizer.process(&work.page, &work.options).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        let failure = {
            let mut guard = self.lock_state();
            let state = &mut *guard;
            if !state.run.is_current(generation) {
                debug!(task_id = %work.task_id, "discarding recognition result of a cancelled run");
                return;
            }
            let Some(batch) = state.queue.get_mut(&work.batch_id) else {
                return;
            };
            batch.total_recognition_ms += elapsed_ms;
            state.stats.record_recognition(elapsed_ms);

            let task = &mut batch.tasks[work.index];
            task.recognition_duration_ms = Some(elapsed_ms);
            match outcome {
                Ok(result) => {
                    task.recognition_result = Some(result);
                    None
                }
                Err(e) => {
                    let message = format!("{:#}", e);
                    task.fail(message.clone());
                    state.stats.record_page_failed();
                    Some(message)
                }
            }
        };

        match failure {
            None => debug!(task_id = %work.task_id, elapsed_ms, "recognition finished"),
            Some(error) => {
                self.report_stage_failure("recognition", &work.batch_id, &work.task_id, error)
            }
        }
    }

    async fn run_translation(&self, generation: u64, work: TranslateWork) {
        let started = Instant::now();
        let outcome = self.translator.translate(&work.text, &work.options).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        let finished = {
            let mut guard = self.lock_state();
            let state = &mut *guard;
            if !state.run.is_current(generation) {
                debug!(task_id = %work.task_id, "discarding translation result of a cancelled run");
                return;
            }
            let Some(batch) = state.queue.get_mut(&work.batch_id) else {
                return;
            };
            batch.total_translation_ms += elapsed_ms;
            state.stats.record_translation(elapsed_ms);

            let task = &mut batch.tasks[work.index];
            task.translation_duration_ms = Some(elapsed_ms);
            match outcome {
                Ok(result) => {
                    task.complete(result);
                    state.stats.record_page_completed();
                    Ok(task.result())
                }
                Err(e) => {
                    let message = format!("{:#}", e);
                    task.fail(message.clone());
                    state.stats.record_page_failed();
                    Err(message)
                }
            }
        };

        match finished {
            Ok(result) => {
                debug!(task_id = %work.task_id, elapsed_ms, "task completed");
                self.emit(
                    names::TASK_COMPLETED,
                    &TaskCompletedEvent {
                        batch_id: work.batch_id,
                        task_id: work.task_id,
                        result,
                    },
                );
            }
            Err(error) => {
                self.report_stage_failure("translation", &work.batch_id, &work.task_id, error)
            }
        }
    }

    fn report_stage_failure(&self, stage: &str, batch_id: &str, task_id: &str, error: String) {
        error!(batch_id, task_id, stage, "stage failed: {}", error);
        self.emit(
            names::BATCH_ERROR,
            &BatchErrorEvent {
                batch_id: batch_id.to_string(),
                task_id: task_id.to_string(),
                stage: stage.to_string(),
                error,
                is_fatal: false,
            },
        );
    }

    pub fn get_batch_info(&self, batch_id: &str) -> Option<BatchInfo> {
        self.lock_state().queue.get(batch_id).map(Batch::info)
    }

    /// Every queued batch, in creation order.
    pub fn get_all_batches(&self) -> Vec<BatchInfo> {
        self.lock_state().queue.infos()
    }

    /// Full snapshot of a batch, tasks and results included.
    pub fn get_batch(&self, batch_id: &str) -> Option<Batch<P>> {
        self.lock_state().queue.get(batch_id).cloned()
    }

    pub fn get_task(&self, batch_id: &str, task_id: &str) -> Option<Task<P>> {
        self.lock_state()
            .queue
            .get(batch_id)?
            .tasks
            .iter()
            .find(|t| t.id == task_id)
            .cloned()
    }

    pub fn get_stats(&self) -> ProcessingStats {
        self.lock_state().stats.clone()
    }

    pub fn active_batch_id(&self) -> Option<String> {
        self.lock_state().run.active_id.clone()
    }

    /// `true` while a batch holds the active slot, paused or not.
    pub fn is_processing(&self) -> bool {
        self.lock_state().run.active_id.is_some()
    }

    pub fn is_paused(&self) -> bool {
        self.lock_state().run.paused
    }

    pub fn is_initialized(&self) -> bool {
        self.lock_state().initialized
    }

    /// Estimated milliseconds to run the whole batch from scratch.
    pub fn estimate_batch_time(&self, batch_id: &str) -> Option<u64> {
        let state = self.lock_state();
        let batch = state.queue.get(batch_id)?;
        Some(self.estimator().estimate_batch(&state.stats, batch.tasks.len()))
    }

    /// Estimated milliseconds until the batch's unfinished tasks are done.
    pub fn estimate_remaining_time(&self, batch_id: &str) -> Option<u64> {
        let state = self.lock_state();
        let batch = state.queue.get(batch_id)?;
        Some(self.estimator().estimate_remaining(
            &state.stats,
            batch.unfinished_count(),
            batch.elapsed_ms(),
            batch.finished_count(),
        ))
    }
}
