//! # Page Batch Queue
//!
//! Sequential batch scheduler for comic pages. Each page runs through two
//! external stages, text recognition and then translation, one page at a time.
//!
//! ## Features
//!
//! - One active batch at a time, tasks processed strictly in order
//! - Stage failures isolated per page; the batch always runs to completion
//! - Cooperative pause/resume/cancel, checked between stages
//! - Progress and ETA notifications through a pluggable [`NotificationSink`]
//! - Running statistics with measured per-page averages
//!
//! ## Quick Start
//!
//! 1. Implement [`RecognitionStage`] and [`TranslationStage`] for your engines
//! 2. Create a [`Scheduler`] with a [`SchedulerConfig`] and an [`EventBus`]
//! 3. Call [`Scheduler::start()`] inside a tokio runtime
//! 4. Queue pages with [`Scheduler::create_batch()`] and start them with
//!    [`Scheduler::process_batch()`] (or `auto_start`)

pub mod config;
pub mod error;
pub mod events;
pub mod logging;
pub mod queue;
pub mod scheduler;
pub mod stats;
pub mod types;

pub use config::{SchedulerConfig, SchedulerConfigBuilder};
pub use error::{Result, SchedulerError};
pub use events::{EventBus, EventHandler, NotificationSink, SubscriptionId};
pub use queue::BatchQueue;
pub use scheduler::Scheduler;
pub use stats::{EtaEstimator, ProcessingStats};
pub use types::{
    merge_options, Batch, BatchCompletionSummary, BatchInfo, BatchRequest, BatchStatus,
    RecognitionResult, StageOptions, Task, TaskResult, TaskStatus, TaskSummary,
    TranslationResult,
};

/// First pipeline stage: extract text from a page.
///
/// `P` is the page payload type (a path, an image buffer, a document id, ...).
///
/// # Example
///
/// ```ignore
/// use page_batch_queue::*;
///
/// struct Ocr;
///
/// impl RecognitionStage<String> for Ocr {
///     async fn process(
///         &self,
///         page: &String,
///         options: &StageOptions,
///     ) -> anyhow::Result<RecognitionResult> {
///         let text = run_ocr(page, options).await?;
///         Ok(RecognitionResult::new(text))
///     }
/// }
/// ```
pub trait RecognitionStage<P>: Send + Sync + 'static {
    /// Recognize the text on `page`. An `Err` marks the page as failed.
    fn process(
        &self,
        page: &P,
        options: &StageOptions,
    ) -> impl std::future::Future<Output = anyhow::Result<RecognitionResult>> + Send;
}

/// Second pipeline stage: translate the recognized text.
pub trait TranslationStage: Send + Sync + 'static {
    /// Translate `text`. An `Err` marks the page as failed.
    fn translate(
        &self,
        text: &str,
        options: &StageOptions,
    ) -> impl std::future::Future<Output = anyhow::Result<TranslationResult>> + Send;
}
