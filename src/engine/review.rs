//! Review queue consumer
//!
//! Ambiguous pairs flow through an unbounded channel into a single-threaded
//! resolver. The resolver stages one candidate at a time and blocks its own
//! loop (never a discovery worker) on the collaborator's decision, so at most
//! one pair is ever awaiting a verdict. The queue disconnects once discovery
//! is complete and every queued candidate has been drained.
//!
//! Between queuing and staging the world may have moved: the left file can be
//! deleted by an exact-duplicate resolution, or the map entry re-pointed. A
//! staged candidate is therefore re-validated against the map before the
//! collaborator sees it.

use anyhow::Result;
use crossbeam::channel::{Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, info};

use super::identity::IdentityMap;
use super::types::{Disposition, ImageFacts, ReviewCandidate, ReviewRequest, ScanStats};
use super::{apply_size_policy, delete_file};

/// The collaborator boundary. `decide` blocks until a disposition is chosen;
/// an error means the collaborator went away (closed prompt, EOF) and cancels
/// the scan.
pub trait ReviewHandler {
    fn decide(&mut self, request: &ReviewRequest) -> Result<Disposition>;
}

/// Non-interactive collaborator applying one fixed disposition to every pair.
pub struct AutoReviewer {
    disposition: Disposition,
}

impl AutoReviewer {
    /// An unconfirmed `DeleteBoth` re-stages the same pair and there is
    /// nobody here to confirm it, so it is stored as `KeepBoth`.
    pub fn new(disposition: Disposition) -> Self {
        let disposition = match disposition {
            Disposition::DeleteBoth { confirmed: false } => Disposition::KeepBoth,
            other => other,
        };
        Self { disposition }
    }
}

impl ReviewHandler for AutoReviewer {
    fn decide(&mut self, _request: &ReviewRequest) -> Result<Disposition> {
        Ok(self.disposition)
    }
}

pub struct ReviewResolver {
    rx: Receiver<ReviewCandidate>,
    map: Arc<IdentityMap>,
    stats: Arc<ScanStats>,
    cancel: Arc<AtomicBool>,
    poll: Duration,
}

impl ReviewResolver {
    pub fn new(
        rx: Receiver<ReviewCandidate>,
        map: Arc<IdentityMap>,
        stats: Arc<ScanStats>,
        cancel: Arc<AtomicBool>,
        poll: Duration,
    ) -> Self {
        Self {
            rx,
            map,
            stats,
            cancel,
            poll,
        }
    }

    /// Drain candidates until the queue disconnects or the scan is cancelled.
    pub fn run<H: ReviewHandler>(mut self, handler: &mut H) {
        loop {
            if self.cancel.load(Ordering::Relaxed) {
                break;
            }
            match self.rx.recv_timeout(self.poll) {
                Ok(candidate) => self.stage(candidate, handler),
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        debug!("review resolver finished");
    }

    fn stage<H: ReviewHandler>(&mut self, mut candidate: ReviewCandidate, handler: &mut H) {
        if !candidate.left.exists() {
            match self.map.get(&candidate.identity_key) {
                None => {
                    // Both earlier images are gone; the right file takes over
                    // the key and there is nothing to ask.
                    debug!(right = %candidate.right.display(), "left vanished, re-claiming right");
                    self.map.update(
                        &candidate.identity_key,
                        &candidate.right,
                        &candidate.right_content_key,
                    );
                    return;
                }
                Some(entry) if entry.content_key == candidate.right_content_key => {
                    // The key is now held by a byte-identical copy; resolve
                    // automatically like any exact duplicate.
                    apply_size_policy(
                        &self.map,
                        &self.stats,
                        &candidate.identity_key,
                        &entry.path,
                        &candidate.right,
                        None,
                        &candidate.right_content_key,
                    );
                    return;
                }
                Some(entry) => {
                    // Still ambiguous, but against the current holder.
                    candidate.left = entry.path;
                }
            }
        }

        let request = ReviewRequest {
            left: ImageFacts::probe(&candidate.left),
            right: ImageFacts::probe(&candidate.right),
        };

        loop {
            match handler.decide(&request) {
                Ok(disposition) => {
                    if self.apply(&candidate, disposition) {
                        self.stats
                            .candidates_reviewed
                            .fetch_add(1, Ordering::Relaxed);
                        return;
                    }
                    // Unconfirmed DeleteBoth: the pair stays staged.
                }
                Err(err) => {
                    info!(error = %err, "review handler closed, cancelling scan");
                    self.cancel.store(true, Ordering::Relaxed);
                    return;
                }
            }
        }
    }

    /// Apply one disposition. Returns false when the slot must stay occupied.
    fn apply(&self, candidate: &ReviewCandidate, disposition: Disposition) -> bool {
        match disposition {
            Disposition::KeepLeft => {
                delete_file(&candidate.right, &self.stats);
                true
            }
            Disposition::KeepRight => {
                if delete_file(&candidate.left, &self.stats) {
                    self.map.update(
                        &candidate.identity_key,
                        &candidate.right,
                        &candidate.right_content_key,
                    );
                }
                true
            }
            Disposition::KeepBoth => true,
            Disposition::DeleteBoth { confirmed: false } => false,
            Disposition::DeleteBoth { confirmed: true } => {
                let left_deleted = delete_file(&candidate.left, &self.stats);
                delete_file(&candidate.right, &self.stats);
                // Keep the entry when the left file survived so the map never
                // names a path we failed to remove.
                if left_deleted {
                    self.map.remove(&candidate.identity_key);
                }
                true
            }
        }
    }
}
