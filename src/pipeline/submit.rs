// src/pipeline/submit.rs
// =============================================================================
// Turns a submitted batch of URLs into queue entries.
//
// - Duplicates inside one batch are queued once (first occurrence wins)
// - URLs the DedupStore already marks completed are not queued at all
// - URLs too long for the store are not queued either
// - Everything else is pushed in submission order
//
// Duplicates ACROSS batches are fine to queue: the workers' claim step is
// what guarantees a single fetch.
// =============================================================================

use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::dedup::DedupStore;
use super::queue::{QueueClosed, QueueSender};
use crate::store::MAX_FIELD_CHARS;

// Counts reported back to the caller of /load_urls
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SubmitSummary {
    pub queued: usize,
    pub duplicates: usize,
    pub already_completed: usize,
    pub too_long: usize,
}

#[derive(Debug, Clone)]
pub struct Submitter {
    queue: QueueSender,
    dedup: Arc<DedupStore>,
}

impl Submitter {
    pub fn new(queue: QueueSender, dedup: Arc<DedupStore>) -> Self {
        Self { queue, dedup }
    }

    /// URLs waiting in the queue
    pub fn queue_depth(&self) -> usize {
        self.queue.depth()
    }

    // Queues a batch, or nothing at all when the queue is already closed
    pub fn submit<I>(&self, urls: I) -> Result<SubmitSummary, QueueClosed>
    where
        I: IntoIterator<Item = String>,
    {
        // Receivers only go away at shutdown, so checking once up front is
        // enough to keep a batch from being half-queued
        if self.queue.is_closed() {
            return Err(QueueClosed);
        }

        let mut seen = HashSet::new();
        let mut summary = SubmitSummary::default();

        for url in urls {
            if !seen.insert(url.clone()) {
                summary.duplicates += 1;
                continue;
            }
            if self.dedup.is_completed(&url) {
                debug!(url = %url, "already completed, not queued");
                summary.already_completed += 1;
                continue;
            }
            if url.chars().count() > MAX_FIELD_CHARS {
                warn!(url = %url, limit = MAX_FIELD_CHARS, "url is too long to store, not queued");
                summary.too_long += 1;
                continue;
            }

            if self.dedup.is_in_flight(&url) {
                debug!(url = %url, "already being fetched, queued anyway");
            }
            info!(url = %url, "queued {}", url);
            self.queue.push(url)?;
            summary.queued += 1;
        }

        Ok(summary)
    }
}
