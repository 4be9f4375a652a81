//! Shared directory work queue
//!
//! Workers pop directories, list them, and push any subdirectories back, so
//! nobody knows the total up front. Termination is an outstanding-work
//! counter: every push increments it, every fully listed directory decrements
//! it, and at zero the sender is dropped so blocked pops drain out and then
//! observe disconnect. No polling heuristics, no count oracle.

use crossbeam::channel::{Receiver, RecvTimeoutError, Sender, unbounded};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

#[derive(Debug, PartialEq, Eq)]
pub enum PopResult {
    Directory(PathBuf),
    /// Queue momentarily empty but directories are still being listed.
    TimedOut,
    /// All pushed directories have been completed; no more work will appear.
    Drained,
}

#[derive(Debug)]
pub struct DirectoryFrontier {
    tx: Mutex<Option<Sender<PathBuf>>>,
    rx: Receiver<PathBuf>,
    outstanding: AtomicUsize,
}

impl DirectoryFrontier {
    /// Frontier seeded with the scan root.
    pub fn new(root: PathBuf) -> Self {
        let (tx, rx) = unbounded();
        let frontier = Self {
            tx: Mutex::new(Some(tx)),
            rx,
            outstanding: AtomicUsize::new(0),
        };
        frontier.push(root);
        frontier
    }

    /// Queue a directory. Counted before it is sent so the frontier can never
    /// look drained while a push is in flight.
    pub fn push(&self, dir: PathBuf) {
        self.outstanding.fetch_add(1, Ordering::SeqCst);
        let guard = self.tx.lock().unwrap_or_else(PoisonError::into_inner);
        // A pusher always holds its own uncompleted directory, so the sender
        // is alive whenever this runs; the fallback only rebalances the count.
        match guard.as_ref() {
            Some(tx) if tx.send(dir).is_ok() => {}
            _ => {
                self.outstanding.fetch_sub(1, Ordering::SeqCst);
            }
        }
    }

    /// Bounded wait for the next directory; the timeout keeps workers
    /// responsive to cancellation.
    pub fn pop(&self, timeout: Duration) -> PopResult {
        match self.rx.recv_timeout(timeout) {
            Ok(dir) => PopResult::Directory(dir),
            Err(RecvTimeoutError::Timeout) => PopResult::TimedOut,
            Err(RecvTimeoutError::Disconnected) => PopResult::Drained,
        }
    }

    /// Mark one popped directory as fully listed. The last completion closes
    /// the queue.
    pub fn complete_one(&self) {
        if self.outstanding.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.tx
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .take();
        }
    }

    pub fn outstanding(&self) -> usize {
        self.outstanding.load(Ordering::SeqCst)
    }
}
