// src/pipeline/worker.rs
// =============================================================================
// The worker pool: N tasks that turn queued URLs into stored titles.
//
// Each worker loops forever:
// 1. Wait for the next URL from the queue
// 2. Claim it in the DedupStore (skip it if someone else has it, or if it
//    is too long to ever be stored)
// 3. Fetch the page and extract the title
// 4. Failure -> release the claim, log a warning, move on (no retry)
// 5. Success -> mark completed, then write the record to the store
//
// Errors never escape the loop: a bad page or a failed write is logged and
// the worker picks up the next URL.
//
// Rust concepts:
// - Arc<dyn Trait>: shared, type-erased fetcher and store
// - tokio::spawn: each worker is an independent task
// - tracing spans: every log line carries the worker id
// =============================================================================

use futures::future::join_all;
use std::sync::Arc;
use tokio::task::{JoinError, JoinHandle};
use tracing::{error, info, info_span, warn, Instrument};

use super::dedup::{Claim, DedupStore};
use super::queue::QueueReceiver;
use crate::fetcher::{FetchError, TitleFetcher};
use crate::store::{FetchRecord, StoreError, TitleSink, MAX_FIELD_CHARS};

// What to do with the completed marking when the store write fails
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StoreFailurePolicy {
    /// Keep the URL marked completed; it will not be fetched again
    #[default]
    KeepCompleted,
    /// Un-mark it so a later submission fetches it again
    Release,
}

// Everything a worker needs, shared by the whole pool
#[derive(Clone)]
pub struct WorkerContext {
    pub dedup: Arc<DedupStore>,
    pub fetcher: Arc<dyn TitleFetcher>,
    pub sink: Arc<dyn TitleSink>,
    pub on_store_failure: StoreFailurePolicy,
}

// What happened to one dequeued URL
#[derive(Debug)]
pub enum Outcome {
    /// Longer than the store accepts; never claimed or fetched
    TooLong(usize),
    /// Claim refused: another worker has it, or it's already done
    Skipped(Claim),
    /// Fetch-and-extract failed; the claim was released
    FetchFailed(FetchError),
    /// Title fetched and stored
    Stored(FetchRecord),
    /// Title fetched but the store write failed
    StoreFailed(FetchRecord, StoreError),
}

// Runs the full claim -> fetch -> store sequence for one URL
//
// All dedup bookkeeping happens here; logging is left to log_outcome.
pub async fn process_url(ctx: &WorkerContext, url: &str) -> Outcome {
    let chars = url.chars().count();
    if chars > MAX_FIELD_CHARS {
        return Outcome::TooLong(chars);
    }

    if !ctx.dedup.try_claim(url) {
        // Only used for the log line, so a second lookup is fine
        let state = if ctx.dedup.is_completed(url) {
            Claim::Completed
        } else {
            Claim::InFlight
        };
        return Outcome::Skipped(state);
    }

    info!(url = %url, "fetching {}", url);
    let title = match ctx.fetcher.fetch_title(url).await {
        Ok(title) => title,
        Err(e) => {
            ctx.dedup.release(url);
            return Outcome::FetchFailed(e);
        }
    };

    ctx.dedup.mark_completed(url);
    let record = FetchRecord::now(url, title);

    match ctx.sink.upsert(&record).await {
        Ok(()) => Outcome::Stored(record),
        Err(e) => {
            if ctx.on_store_failure == StoreFailurePolicy::Release {
                ctx.dedup.forget(url);
            }
            Outcome::StoreFailed(record, e)
        }
    }
}

fn log_outcome(url: &str, outcome: &Outcome) {
    match outcome {
        Outcome::TooLong(chars) => {
            warn!(
                url = %url,
                chars,
                limit = MAX_FIELD_CHARS,
                "url is too long to store, not fetched"
            );
        }
        Outcome::Skipped(claim) => {
            info!(url = %url, state = ?claim, "'{}' is already fetched or being fetched", url);
        }
        Outcome::FetchFailed(e) => {
            warn!(
                url = %url,
                error = %e,
                transport = e.is_transport(),
                "title for '{}' wasn't fetched",
                url
            );
        }
        Outcome::Stored(record) => {
            info!("{} {} {}", record.url, record.title, display_time(record));
        }
        Outcome::StoreFailed(record, e) => {
            error!(
                url = %record.url,
                title = %record.title,
                error = %e,
                "fetched title could not be stored"
            );
        }
    }
}

// "YYYY-MM-DD HH:MM:SS" in UTC
fn display_time(record: &FetchRecord) -> String {
    record
        .fetched_at()
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_default()
}

// One worker: pop, process, repeat until the queue closes
async fn run_worker(queue: QueueReceiver, ctx: WorkerContext) {
    while let Some(url) = queue.pop().await {
        let outcome = process_url(&ctx, &url).await;
        log_outcome(&url, &outcome);
    }
    info!("queue closed, worker exiting");
}

// Handle to the running pool
pub struct WorkerPool {
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    // Starts `size` workers on the current tokio runtime
    //
    // A size of 0 is bumped to 1 so the queue always has a consumer.
    pub fn spawn(size: usize, queue: QueueReceiver, ctx: WorkerContext) -> Self {
        let size = size.max(1);
        let handles = (0..size)
            .map(|id| {
                let worker = run_worker(queue.clone(), ctx.clone());
                tokio::spawn(worker.instrument(info_span!("worker", id)))
            })
            .collect();

        info!(workers = size, "worker pool started");
        Self { handles }
    }

    pub fn size(&self) -> usize {
        self.handles.len()
    }

    /// Waits for every worker to exit (they do once the queue is closed and drained)
    pub async fn join(self) -> Vec<Result<(), JoinError>> {
        join_all(self.handles).await
    }

    /// Stops every worker immediately; in-flight fetches are dropped
    pub fn abort(&self) {
        for handle in &self.handles {
            handle.abort();
        }
    }

    /// Aborts the workers and waits until they are gone
    pub async fn shutdown(self) {
        self.abort();
        let cancelled = self
            .join()
            .await
            .into_iter()
            .filter(|r| matches!(r, Err(e) if e.is_cancelled()))
            .count();
        info!(cancelled, "worker pool stopped");
    }
}
