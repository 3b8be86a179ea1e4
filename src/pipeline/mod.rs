// src/pipeline/mod.rs
// =============================================================================
// This module is the ingestion pipeline.
//
// Submodules:
// - queue: Unbounded FIFO of submitted URLs (many producers, many consumers)
// - dedup: In-flight / completed sets with an atomic claim operation
// - worker: The pool of tasks that fetch, extract and store
// - submit: Batch intake that feeds the queue
//
// Data flow:
//   Submitter -> queue -> WorkerPool -> (DedupStore, TitleFetcher, TitleSink)
//
// Nothing in here is global: main() builds one queue and one DedupStore and
// passes them to whoever needs them.
// =============================================================================

mod dedup;
mod queue;
mod submit;
mod worker;

pub use dedup::DedupStore;
pub use queue::{unbounded, QueueClosed, QueueReceiver};
pub use submit::{SubmitSummary, Submitter};
pub use worker::{StoreFailurePolicy, WorkerContext, WorkerPool};
