use serde::{Deserialize, Serialize};

/// Running counters across every batch the scheduler has handled.
///
/// Stage durations accumulate as each stage finishes (failed stages
/// included), so averages and estimates move while a batch is running.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingStats {
    pub total_batches: u64,
    pub completed_batches: u64,
    /// Batches that ended by cancellation.
    pub failed_batches: u64,
    pub total_pages: u64,
    pub completed_pages: u64,
    pub failed_pages: u64,
    pub total_recognition_ms: u64,
    pub total_translation_ms: u64,
    pub average_recognition_ms_per_page: f64,
    pub average_translation_ms_per_page: f64,
}

impl ProcessingStats {
    pub fn record_batch_created(&mut self, pages: usize) {
        self.total_batches += 1;
        self.total_pages += pages as u64;
    }

    pub fn record_recognition(&mut self, duration_ms: u64) {
        self.total_recognition_ms += duration_ms;
    }

    pub fn record_translation(&mut self, duration_ms: u64) {
        self.total_translation_ms += duration_ms;
    }

    pub fn record_page_completed(&mut self) {
        self.completed_pages += 1;
        self.recompute_averages();
    }

    pub fn record_page_failed(&mut self) {
        self.failed_pages += 1;
        self.recompute_averages();
    }

    pub fn record_batch_completed(&mut self) {
        self.completed_batches += 1;
        self.recompute_averages();
    }

    pub fn record_batch_cancelled(&mut self) {
        self.failed_batches += 1;
    }

    /// Pages that left the pipeline, successfully or not.
    pub fn finished_pages(&self) -> u64 {
        self.completed_pages + self.failed_pages
    }

    fn recompute_averages(&mut self) {
        let finished = self.finished_pages();
        if finished > 0 {
            self.average_recognition_ms_per_page =
                self.total_recognition_ms as f64 / finished as f64;
            self.average_translation_ms_per_page =
                self.total_translation_ms as f64 / finished as f64;
        }
    }

    /// Measured time per page, available once at least one page has completed.
    pub fn average_page_ms(&self) -> Option<f64> {
        if self.completed_pages == 0 {
            return None;
        }
        Some(self.average_recognition_ms_per_page + self.average_translation_ms_per_page)
    }
}

/// Time estimates for whole batches and for the rest of a running batch.
///
/// Falls back to a fixed per-page constant until a page has completed
/// anywhere, then switches to the measured average.
#[derive(Debug, Clone, Copy)]
pub struct EtaEstimator {
    fallback_page_ms: u64,
    min_batch_samples: usize,
}

impl EtaEstimator {
    pub fn new(fallback_page_ms: u64, min_batch_samples: usize) -> Self {
        Self {
            fallback_page_ms,
            min_batch_samples,
        }
    }

    fn page_ms(&self, stats: &ProcessingStats) -> f64 {
        stats
            .average_page_ms()
            .unwrap_or(self.fallback_page_ms as f64)
    }

    /// Estimated milliseconds to process `task_count` pages from scratch.
    pub fn estimate_batch(&self, stats: &ProcessingStats, task_count: usize) -> u64 {
        (task_count as f64 * self.page_ms(stats)).round() as u64
    }

    /// Estimated milliseconds left for a running batch.
    ///
    /// Once the batch has finished `min_batch_samples` tasks its own pace
    /// (`elapsed_ms / finished`) is used; before that the system-wide average.
    pub fn estimate_remaining(
        &self,
        stats: &ProcessingStats,
        remaining: usize,
        elapsed_ms: u64,
        finished: usize,
    ) -> u64 {
        if remaining == 0 {
            return 0;
        }
        let per_task = if stats.completed_pages > 0
            && finished > 0
            && finished >= self.min_batch_samples
        {
            elapsed_ms as f64 / finished as f64
        } else {
            self.page_ms(stats)
        };
        (remaining as f64 * per_task).round() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats_with(recognition: &[u64], translation: &[u64], failed: u64) -> ProcessingStats {
        let mut stats = ProcessingStats::default();
        stats.record_batch_created(recognition.len());
        for &ms in recognition {
            stats.record_recognition(ms);
        }
        for &ms in translation {
            stats.record_translation(ms);
        }
        for _ in 0..(recognition.len() as u64 - failed) {
            stats.record_page_completed();
        }
        for _ in 0..failed {
            stats.record_page_failed();
        }
        stats
    }

    #[test]
    fn test_fallback_before_any_completion() {
        let estimator = EtaEstimator::new(3000, 2);
        let stats = ProcessingStats::default();
        assert_eq!(estimator.estimate_batch(&stats, 4), 12_000);
    }

    #[test]
    fn test_measured_average_after_completion() {
        let estimator = EtaEstimator::new(3000, 2);
        let stats = stats_with(&[400], &[100], 0);

        assert_eq!(stats.average_page_ms(), Some(500.0));
        assert_eq!(estimator.estimate_batch(&stats, 4), 2000);
    }

    #[test]
    fn test_failures_alone_keep_fallback() {
        let estimator = EtaEstimator::new(3000, 2);
        let stats = stats_with(&[50], &[], 1);

        assert_eq!(stats.finished_pages(), 1);
        assert!(stats.average_page_ms().is_none());
        assert_eq!(estimator.estimate_batch(&stats, 2), 6000);
    }

    #[test]
    fn test_averages_include_failed_pages() {
        let stats = stats_with(&[1000, 3000], &[500], 1);
        assert_eq!(stats.average_recognition_ms_per_page, 2000.0);
        assert_eq!(stats.average_translation_ms_per_page, 250.0);
    }

    #[test]
    fn test_remaining_uses_batch_pace_after_min_samples() {
        let estimator = EtaEstimator::new(3000, 2);
        let stats = stats_with(&[100], &[100], 0);

        // One finished task in this batch: system average (200ms/page)
        assert_eq!(estimator.estimate_remaining(&stats, 3, 900, 1), 600);
        // Two finished: batch pace 900ms / 2 = 450ms per task
        assert_eq!(estimator.estimate_remaining(&stats, 3, 900, 2), 1350);
        assert_eq!(estimator.estimate_remaining(&stats, 0, 900, 2), 0);
    }

    #[test]
    fn test_batch_counters() {
        let mut stats = ProcessingStats::default();
        stats.record_batch_created(3);
        stats.record_batch_created(2);
        stats.record_batch_completed();
        stats.record_batch_cancelled();

        assert_eq!(stats.total_batches, 2);
        assert_eq!(stats.total_pages, 5);
        assert_eq!(stats.completed_batches, 1);
        assert_eq!(stats.failed_batches, 1);
    }
}
