// src/pipeline/queue.rs
// =============================================================================
// The work queue: an unbounded FIFO of URLs shared by every worker.
//
// How it works:
// - tokio's unbounded mpsc channel does the buffering
// - The single receiver sits behind an async Mutex so N workers can share it;
//   whoever holds the lock waits for the next item, the rest wait their turn
// - When every QueueSender is dropped the channel closes and pop() returns
//   None once the backlog is drained
//
// No backpressure: push() never waits and the backlog can grow without
// limit. Under a flood of submissions memory is the ceiling.
//
// Rust concepts:
// - Channels: message passing between tasks
// - Arc<AtomicUsize>: a counter shared by senders and receivers
// =============================================================================

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, Mutex};

#[derive(Debug, Error, PartialEq, Eq)]
#[error("work queue is closed")]
pub struct QueueClosed;

// Creates a connected sender/receiver pair
pub fn unbounded() -> (QueueSender, QueueReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    let depth = Arc::new(AtomicUsize::new(0));

    (
        QueueSender {
            tx,
            depth: Arc::clone(&depth),
        },
        QueueReceiver {
            rx: Arc::new(Mutex::new(rx)),
            depth,
        },
    )
}

// Producer half, cloned into every submission handler
#[derive(Debug, Clone)]
pub struct QueueSender {
    tx: mpsc::UnboundedSender<String>,
    depth: Arc<AtomicUsize>,
}

impl QueueSender {
    /// Appends a URL; fails only if every receiver is gone
    pub fn push(&self, url: String) -> Result<(), QueueClosed> {
        // Count first so a fast consumer can't decrement below zero
        self.depth.fetch_add(1, Ordering::SeqCst);
        self.tx.send(url).map_err(|_| {
            self.depth.fetch_sub(1, Ordering::SeqCst);
            QueueClosed
        })
    }

    /// True once every receiver has been dropped
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    /// Items pushed but not yet popped
    pub fn depth(&self) -> usize {
        self.depth.load(Ordering::SeqCst)
    }
}

// Consumer half, cloned into every worker
#[derive(Debug, Clone)]
pub struct QueueReceiver {
    rx: Arc<Mutex<mpsc::UnboundedReceiver<String>>>,
    depth: Arc<AtomicUsize>,
}

impl QueueReceiver {
    /// Waits for the next URL; None once the queue is closed and empty
    pub async fn pop(&self) -> Option<String> {
        let item = self.rx.lock().await.recv().await;
        if item.is_some() {
            self.depth.fetch_sub(1, Ordering::SeqCst);
        }
        item
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[tokio::test]
    async fn test_fifo_order() {
        let (tx, rx) = unbounded();
        for url in ["http://1.test", "http://2.test", "http://3.test"] {
            tx.push(url.to_string()).unwrap();
        }
        assert_eq!(tx.depth(), 3);

        assert_eq!(rx.pop().await.as_deref(), Some("http://1.test"));
        assert_eq!(rx.pop().await.as_deref(), Some("http://2.test"));
        assert_eq!(rx.pop().await.as_deref(), Some("http://3.test"));
        assert_eq!(tx.depth(), 0);
    }

    #[tokio::test]
    async fn test_duplicates_are_kept() {
        let (tx, rx) = unbounded();
        tx.push("http://a.test".to_string()).unwrap();
        tx.push("http://a.test".to_string()).unwrap();
        drop(tx);

        assert_eq!(rx.pop().await.as_deref(), Some("http://a.test"));
        assert_eq!(rx.pop().await.as_deref(), Some("http://a.test"));
        assert_eq!(rx.pop().await, None);
    }

    #[tokio::test]
    async fn test_closed_queue_drains_then_ends() {
        let (tx, rx) = unbounded();
        tx.push("http://a.test".to_string()).unwrap();
        drop(tx);

        assert_eq!(rx.pop().await.as_deref(), Some("http://a.test"));
        assert_eq!(rx.pop().await, None);
    }

    #[tokio::test]
    async fn test_push_after_receivers_dropped() {
        let (tx, rx) = unbounded();
        assert!(!tx.is_closed());
        drop(rx);
        assert!(tx.is_closed());
        assert_eq!(tx.push("http://a.test".to_string()), Err(QueueClosed));
        assert_eq!(tx.depth(), 0);
    }

    #[tokio::test]
    async fn test_many_consumers_each_item_once() {
        let (tx, rx) = unbounded();
        for i in 0..200 {
            tx.push(format!("http://{i}.test")).unwrap();
        }
        drop(tx);

        let mut handles = Vec::new();
        for _ in 0..8 {
            let rx = rx.clone();
            handles.push(tokio::spawn(async move {
                let mut got = Vec::new();
                while let Some(url) = rx.pop().await {
                    got.push(url);
                }
                got
            }));
        }

        let mut all = Vec::new();
        for handle in handles {
            all.extend(handle.await.unwrap());
        }

        assert_eq!(all.len(), 200);
        let unique: HashSet<_> = all.into_iter().collect();
        assert_eq!(unique.len(), 200);
    }
}
