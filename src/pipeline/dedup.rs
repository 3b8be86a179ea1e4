// src/pipeline/dedup.rs
// =============================================================================
// This module remembers which URLs are being fetched and which are done.
//
// Two sets:
// - in_flight: claimed by a worker, fetch not finished yet
// - completed: fetched successfully
//
// The important part is claim(): checking the sets and inserting into
// in_flight happen under ONE lock acquisition. Two workers racing on the
// same URL can never both win.
//
// Rust concepts:
// - Mutex<T>: the data lives INSIDE the lock, so it can't be touched unlocked
// - HashSet: O(1) membership checks
// - Enums as return values: Claim says why a claim was refused
// =============================================================================

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

// Result of trying to claim a URL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Claim {
    /// The caller now owns the fetch of this URL
    Claimed,
    /// Another worker is fetching it right now
    InFlight,
    /// It was already fetched successfully
    Completed,
}

impl Claim {
    pub fn is_claimed(self) -> bool {
        self == Claim::Claimed
    }
}

// Snapshot of the set sizes (for the health endpoint)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DedupCounts {
    pub in_flight: usize,
    pub completed: usize,
}

#[derive(Debug, Default)]
struct DedupState {
    in_flight: HashSet<String>,
    completed: HashSet<String>,
}

// Shared claim registry
//
// Wrap it in an Arc and hand clones to every worker and to the submitter.
#[derive(Debug, Default)]
pub struct DedupStore {
    state: Mutex<DedupState>,
}

impl DedupStore {
    pub fn new() -> Self {
        Self::default()
    }

    // A panic while holding the lock can't leave the sets half-updated
    // (every mutation is a single insert/remove), so a poisoned lock is safe
    // to keep using.
    fn lock(&self) -> MutexGuard<'_, DedupState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // Atomically claims `url` for fetching
    //
    // Succeeds only if the URL is neither in flight nor completed; on
    // success the URL is in_flight when this returns.
    pub fn claim(&self, url: &str) -> Claim {
        let mut state = self.lock();
        if state.in_flight.contains(url) {
            Claim::InFlight
        } else if state.completed.contains(url) {
            Claim::Completed
        } else {
            state.in_flight.insert(url.to_string());
            Claim::Claimed
        }
    }

    /// Boolean form of [`DedupStore::claim`]
    pub fn try_claim(&self, url: &str) -> bool {
        self.claim(url).is_claimed()
    }

    /// Fetch succeeded: in_flight -> completed
    pub fn mark_completed(&self, url: &str) {
        let mut state = self.lock();
        state.in_flight.remove(url);
        state.completed.insert(url.to_string());
    }

    /// Fetch failed: drop the claim so the URL can be submitted again
    pub fn release(&self, url: &str) {
        self.lock().in_flight.remove(url);
    }

    /// Removes `url` from completed, making it claimable again
    pub fn forget(&self, url: &str) {
        self.lock().completed.remove(url);
    }

    pub fn is_completed(&self, url: &str) -> bool {
        self.lock().completed.contains(url)
    }

    pub fn is_in_flight(&self, url: &str) -> bool {
        self.lock().in_flight.contains(url)
    }

    pub fn counts(&self) -> DedupCounts {
        let state = self.lock();
        DedupCounts {
            in_flight: state.in_flight.len(),
            completed: state.completed.len(),
        }
    }

    // Forgets every completed URL and returns how many there were
    //
    // In-flight claims are left alone: their workers still own them and
    // will mark or release them when the fetch ends.
    pub fn reset(&self) -> usize {
        let mut state = self.lock();
        let forgotten = state.completed.len();
        state.completed.clear();
        forgotten
    }
}
