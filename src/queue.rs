use serde::Serialize;

use crate::types::{Batch, BatchInfo, BatchStatus};

/// Ordered batch storage owned by the scheduler.
///
/// Batches are appended on creation and keep their insertion order. The
/// queue itself has no notion of which batch is active; the scheduler
/// checks that before removing anything.
#[derive(Debug)]
pub struct BatchQueue<P>
where
    P: Clone + Send + Sync + Serialize,
{
    batches: Vec<Batch<P>>,
}

impl<P> Default for BatchQueue<P>
where
    P: Clone + Send + Sync + Serialize,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<P> BatchQueue<P>
where
    P: Clone + Send + Sync + Serialize,
{
    pub fn new() -> Self {
        Self {
            batches: Vec::new(),
        }
    }

    pub fn push(&mut self, batch: Batch<P>) {
        self.batches.push(batch);
    }

    pub fn get(&self, batch_id: &str) -> Option<&Batch<P>> {
        self.batches.iter().find(|b| b.id == batch_id)
    }

    pub fn get_mut(&mut self, batch_id: &str) -> Option<&mut Batch<P>> {
        self.batches.iter_mut().find(|b| b.id == batch_id)
    }

    pub fn contains(&self, batch_id: &str) -> bool {
        self.get(batch_id).is_some()
    }

    /// Remove a batch by id, returning it if present.
    pub fn remove(&mut self, batch_id: &str) -> Option<Batch<P>> {
        let index = self.batches.iter().position(|b| b.id == batch_id)?;
        Some(self.batches.remove(index))
    }

    /// Drop every batch except `keep` (if given). Returns how many were removed.
    pub fn clear_except(&mut self, keep: Option<&str>) -> usize {
        let before = self.batches.len();
        self.batches.retain(|b| Some(b.id.as_str()) == keep);
        before - self.batches.len()
    }

    /// The oldest batch still waiting to run.
    pub fn first_pending(&self) -> Option<&Batch<P>> {
        self.batches
            .iter()
            .find(|b| b.status == BatchStatus::Pending)
    }

    pub fn infos(&self) -> Vec<BatchInfo> {
        self.batches.iter().map(Batch::info).collect()
    }

    pub fn len(&self) -> usize {
        self.batches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }
}
