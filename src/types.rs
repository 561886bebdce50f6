use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Free-form per-stage configuration handed to a recognition or translation stage.
pub type StageOptions = serde_json::Map<String, serde_json::Value>;

/// Shallow merge of stage options. Keys in `overrides` win over `defaults`.
pub fn merge_options(defaults: &StageOptions, overrides: &StageOptions) -> StageOptions {
    let mut merged = defaults.clone();
    for (key, value) in overrides {
        merged.insert(key.clone(), value.clone());
    }
    merged
}

/// Per-task status: Pending -> Processing -> Completed/Error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TaskStatus {
    Pending,
    Processing,
    Completed,
    Error,
}

impl TaskStatus {
    pub fn as_str(&self) -> &str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Processing => "processing",
            TaskStatus::Completed => "completed",
            TaskStatus::Error => "error",
        }
    }

    /// `true` once the task has left the pipeline, successfully or not.
    pub fn is_finished(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Error)
    }
}

/// Batch status lifecycle: Pending -> Processing <-> Paused -> Completed/Cancelled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BatchStatus {
    Pending,
    Processing,
    Paused,
    Completed,
    Cancelled,
}

impl BatchStatus {
    pub fn as_str(&self) -> &str {
        match self {
            BatchStatus::Pending => "pending",
            BatchStatus::Processing => "processing",
            BatchStatus::Paused => "paused",
            BatchStatus::Completed => "completed",
            BatchStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, BatchStatus::Completed | BatchStatus::Cancelled)
    }
}

/// Output of the recognition stage.
///
/// `extra` carries whatever else the engine reports (regions, confidence, ...)
/// and is flattened next to `text` when serialized.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecognitionResult {
    pub text: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl RecognitionResult {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            extra: serde_json::Map::new(),
        }
    }
}

/// Output of the translation stage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationResult {
    pub translated_text: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl TranslationResult {
    pub fn new(translated_text: impl Into<String>) -> Self {
        Self {
            translated_text: translated_text.into(),
            extra: serde_json::Map::new(),
        }
    }
}

/// A single page's trip through the recognition and translation stages.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Task<P>
where
    P: Clone + Send + Sync + Serialize,
{
    /// Stable identifier, `task-<batch id>-<index>`.
    pub id: String,
    /// Opaque page payload handed to the recognition stage unmodified.
    pub page: P,
    pub recognition_options: StageOptions,
    pub translation_options: StageOptions,
    pub status: TaskStatus,
    pub recognition_result: Option<RecognitionResult>,
    pub translation_result: Option<TranslationResult>,
    /// Failure message of whichever stage failed.
    pub error: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    /// Recognition stage duration in milliseconds, recorded even on failure.
    pub recognition_duration_ms: Option<u64>,
    /// Translation stage duration in milliseconds, recorded even on failure.
    pub translation_duration_ms: Option<u64>,
}

impl<P> Task<P>
where
    P: Clone + Send + Sync + Serialize,
{
    pub fn new(
        id: String,
        page: P,
        recognition_options: StageOptions,
        translation_options: StageOptions,
    ) -> Self {
        Self {
            id,
            page,
            recognition_options,
            translation_options,
            status: TaskStatus::Pending,
            recognition_result: None,
            translation_result: None,
            error: None,
            start_time: None,
            end_time: None,
            recognition_duration_ms: None,
            translation_duration_ms: None,
        }
    }

    /// Recognition finished but translation has not run yet (e.g. a pause
    /// landed between the two stages).
    pub fn awaiting_translation(&self) -> bool {
        self.status == TaskStatus::Processing
            && self.recognition_result.is_some()
            && self.translation_result.is_none()
    }

    pub(crate) fn start(&mut self) {
        self.status = TaskStatus::Processing;
        self.start_time = Some(Utc::now());
    }

    pub(crate) fn complete(&mut self, result: TranslationResult) {
        self.translation_result = Some(result);
        self.status = TaskStatus::Completed;
        self.end_time = Some(Utc::now());
    }

    pub(crate) fn fail(&mut self, error: String) {
        self.status = TaskStatus::Error;
        self.error = Some(error);
        self.end_time = Some(Utc::now());
    }

    /// Wall-clock time between start and end, if both are set.
    pub fn total_time_ms(&self) -> Option<u64> {
        match (self.start_time, self.end_time) {
            (Some(start), Some(end)) => Some(elapsed_ms(start, end)),
            _ => None,
        }
    }

    pub fn summary(&self) -> TaskSummary {
        TaskSummary {
            id: self.id.clone(),
            status: self.status,
            recognition_time: self.recognition_duration_ms,
            translation_time: self.translation_duration_ms,
            total_time: self.total_time_ms(),
            error: self.error.clone(),
        }
    }

    pub fn result(&self) -> TaskResult<P> {
        TaskResult {
            id: self.id.clone(),
            page: self.page.clone(),
            recognition_result: self.recognition_result.clone(),
            translation_result: self.translation_result.clone(),
            recognition_time: self.recognition_duration_ms,
            translation_time: self.translation_duration_ms,
            total_time: self.total_time_ms(),
        }
    }
}

/// An ordered, fixed-length set of tasks processed one after another.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Batch<P>
where
    P: Clone + Send + Sync + Serialize,
{
    pub id: String,
    pub name: String,
    pub tasks: Vec<Task<P>>,
    pub status: BatchStatus,
    /// Percentage in `[0, 100]`.
    pub progress: f64,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub total_duration_ms: Option<u64>,
    pub total_recognition_ms: u64,
    pub total_translation_ms: u64,
    pub created_at: DateTime<Utc>,
}

impl<P> Batch<P>
where
    P: Clone + Send + Sync + Serialize,
{
    pub fn new(id: String, name: String, tasks: Vec<Task<P>>) -> Self {
        Self {
            id,
            name,
            tasks,
            status: BatchStatus::Pending,
            progress: 0.0,
            start_time: None,
            end_time: None,
            total_duration_ms: None,
            total_recognition_ms: 0,
            total_translation_ms: 0,
            created_at: Utc::now(),
        }
    }

    pub fn count(&self, status: TaskStatus) -> usize {
        self.tasks.iter().filter(|t| t.status == status).count()
    }

    /// Tasks that have completed or failed.
    pub fn finished_count(&self) -> usize {
        self.tasks.iter().filter(|t| t.status.is_finished()).count()
    }

    /// Tasks still pending or processing.
    pub fn unfinished_count(&self) -> usize {
        self.tasks.len() - self.finished_count()
    }

    /// Milliseconds since the batch started, or zero if it never started.
    pub fn elapsed_ms(&self) -> u64 {
        self.start_time
            .map(|start| elapsed_ms(start, self.end_time.unwrap_or_else(Utc::now)))
            .unwrap_or(0)
    }

    pub(crate) fn begin(&mut self) {
        self.status = BatchStatus::Processing;
        self.start_time = Some(Utc::now());
    }

    /// Move to a terminal status, stamping end time and total duration.
    pub(crate) fn close(&mut self, status: BatchStatus) {
        let now = Utc::now();
        self.status = status;
        self.end_time = Some(now);
        self.total_duration_ms = self.start_time.map(|start| elapsed_ms(start, now));
    }

    pub fn info(&self) -> BatchInfo {
        BatchInfo {
            id: self.id.clone(),
            name: self.name.clone(),
            status: self.status,
            progress: self.progress,
            total_tasks: self.tasks.len(),
            completed_tasks: self.count(TaskStatus::Completed),
            failed_tasks: self.count(TaskStatus::Error),
            pending_tasks: self.count(TaskStatus::Pending),
            processing_tasks: self.count(TaskStatus::Processing),
            start_time: self.start_time,
            end_time: self.end_time,
            total_duration_ms: self.total_duration_ms,
            created_at: self.created_at,
        }
    }

    pub fn completion_summary(&self) -> BatchCompletionSummary {
        BatchCompletionSummary {
            batch_id: self.id.clone(),
            name: self.name.clone(),
            total_pages: self.tasks.len(),
            completed_pages: self.count(TaskStatus::Completed),
            failed_pages: self.count(TaskStatus::Error),
            total_duration: self.total_duration_ms.unwrap_or(0),
            total_recognition_time: self.total_recognition_ms,
            total_translation_time: self.total_translation_ms,
            tasks: self.tasks.iter().map(Task::summary).collect(),
        }
    }
}

/// Read-only view of a batch with task counts by status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchInfo {
    pub id: String,
    pub name: String,
    pub status: BatchStatus,
    pub progress: f64,
    pub total_tasks: usize,
    pub completed_tasks: usize,
    pub failed_tasks: usize,
    pub pending_tasks: usize,
    pub processing_tasks: usize,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub total_duration_ms: Option<u64>,
    pub created_at: DateTime<Utc>,
}

/// Per-task line of a completion summary. Times are in milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskSummary {
    pub id: String,
    pub status: TaskStatus,
    pub recognition_time: Option<u64>,
    pub translation_time: Option<u64>,
    pub total_time: Option<u64>,
    pub error: Option<String>,
}

/// Summary of a completed batch. Times are in milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchCompletionSummary {
    pub batch_id: String,
    pub name: String,
    pub total_pages: usize,
    pub completed_pages: usize,
    pub failed_pages: usize,
    pub total_duration: u64,
    pub total_recognition_time: u64,
    pub total_translation_time: u64,
    pub tasks: Vec<TaskSummary>,
}

/// Result of a successfully translated page, carried by `task.completed`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskResult<P>
where
    P: Clone + Send + Sync + Serialize,
{
    pub id: String,
    pub page: P,
    pub recognition_result: Option<RecognitionResult>,
    pub translation_result: Option<TranslationResult>,
    pub recognition_time: Option<u64>,
    pub translation_time: Option<u64>,
    pub total_time: Option<u64>,
}

/// Parameters for creating a batch.
///
/// # Example
///
/// ```
/// use page_batch_queue::BatchRequest;
///
/// let request = BatchRequest::new(vec!["page-1.png".to_string(), "page-2.png".to_string()])
///     .with_name("Chapter 1")
///     .auto_start(true);
///
/// assert_eq!(request.pages.len(), 2);
/// assert!(request.auto_start);
/// ```
#[derive(Debug, Clone)]
pub struct BatchRequest<P> {
    /// Display label; defaults to `Batch N` when absent or blank.
    pub name: Option<String>,
    pub pages: Vec<P>,
    /// Overrides for the configured default recognition options.
    pub recognition_options: StageOptions,
    /// Overrides for the configured default translation options.
    pub translation_options: StageOptions,
    /// Start processing right away if nothing else is running.
    pub auto_start: bool,
}

impl<P> BatchRequest<P> {
    pub fn new(pages: Vec<P>) -> Self {
        Self {
            name: None,
            pages,
            recognition_options: StageOptions::new(),
            translation_options: StageOptions::new(),
            auto_start: false,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_recognition_options(mut self, options: StageOptions) -> Self {
        self.recognition_options = options;
        self
    }

    pub fn with_translation_options(mut self, options: StageOptions) -> Self {
        self.translation_options = options;
        self
    }

    pub fn auto_start(mut self, auto_start: bool) -> Self {
        self.auto_start = auto_start;
        self
    }
}

fn elapsed_ms(start: DateTime<Utc>, end: DateTime<Utc>) -> u64 {
    (end - start).num_milliseconds().max(0) as u64
}
