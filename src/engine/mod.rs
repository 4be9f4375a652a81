//! Concurrent duplicate discovery engine
//!
//! A pool of discovery workers walks the directory frontier, hashes every
//! image it finds, and claims identity keys in a shared map. Byte-identical
//! duplicates are resolved on the spot by pixel area; visually-identical
//! pairs with differing bytes are queued for a single-threaded review
//! resolver, which asks a collaborator for a disposition one pair at a time.
//! A monitor thread joins the pool and then closes the review queue, so a
//! run ends exactly when discovery is complete and the queue is drained.

pub mod frontier;
pub mod identity;
pub mod review;
pub mod types;
pub mod worker;

pub use frontier::{DirectoryFrontier, PopResult};
pub use identity::IdentityMap;
pub use review::{AutoReviewer, ReviewHandler, ReviewResolver};
pub use types::{
    ClaimOutcome, Disposition, ImageFacts, MapEntry, ReviewCandidate, ReviewRequest, ScanReport,
    ScanStats,
};
pub use worker::DiscoveryWorker;

use crossbeam::channel::unbounded;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::SUPPORTED_EXTENSIONS;
use crate::hash::HashConfig;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("root directory not found: {}", .0.display())]
    RootNotFound(PathBuf),
    #[error("root path is not a directory: {}", .0.display())]
    RootNotDirectory(PathBuf),
    #[error("discovery thread panicked")]
    WorkerPanic,
}

/// Run-scoped engine settings, resolved from config and CLI flags by the
/// caller.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Worker pool size; 0 sizes the pool from available cores.
    pub workers: usize,
    /// Cores left free when the pool is auto-sized.
    pub reserved_cores: usize,
    /// Upper bound on every blocking wait, so cancellation is noticed
    /// promptly.
    pub poll_interval: Duration,
    /// File extensions treated as images, with or without leading dots.
    pub extensions: Vec<String>,
    pub hash: HashConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            workers: 0,
            reserved_cores: 2,
            poll_interval: Duration::from_millis(200),
            extensions: SUPPORTED_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            hash: HashConfig::default(),
        }
    }
}

pub struct Engine {
    config: EngineConfig,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Pool size: the configured count, or all cores minus the reserve.
    pub fn worker_count(&self) -> usize {
        if self.config.workers > 0 {
            self.config.workers
        } else {
            num_cpus::get()
                .saturating_sub(self.config.reserved_cores)
                .max(1)
        }
    }

    /// Walk `root`, resolve every duplicate, and report the final counts.
    ///
    /// Blocks until discovery is complete and the review queue is drained,
    /// or until cancellation (a handler error) has been acknowledged by all
    /// threads.
    pub fn run<H: ReviewHandler>(
        &self,
        root: &Path,
        handler: &mut H,
    ) -> Result<ScanReport, EngineError> {
        let metadata =
            fs::metadata(root).map_err(|_| EngineError::RootNotFound(root.to_path_buf()))?;
        if !metadata.is_dir() {
            return Err(EngineError::RootNotDirectory(root.to_path_buf()));
        }

        let started = Instant::now();
        let worker_count = self.worker_count();
        info!(root = %root.display(), workers = worker_count, "starting duplicate scan");

        let frontier = Arc::new(DirectoryFrontier::new(root.to_path_buf()));
        let map = Arc::new(IdentityMap::new());
        let stats = Arc::new(ScanStats::default());
        let cancel = Arc::new(AtomicBool::new(false));
        let worker_panic = Arc::new(AtomicBool::new(false));

        let (review_tx, review_rx) = unbounded();

        let workers: Vec<DiscoveryWorker> = (0..worker_count)
            .map(|id| {
                DiscoveryWorker::new(
                    id,
                    Arc::clone(&frontier),
                    Arc::clone(&map),
                    review_tx.clone(),
                    Arc::clone(&stats),
                    Arc::clone(&cancel),
                    &self.config,
                )
            })
            .collect();

        let resolver = ReviewResolver::new(
            review_rx,
            Arc::clone(&map),
            Arc::clone(&stats),
            Arc::clone(&cancel),
            self.config.poll_interval,
        );

        let panic_flag = Arc::clone(&worker_panic);
        crossbeam::thread::scope(|s| {
            // Monitor thread: holds the engine's copy of the review sender,
            // joins every worker, then drops it. The resolver observes the
            // queue disconnect only after the last worker has exited, even
            // under cancellation.
            s.spawn(move |s| {
                let handles: Vec<_> = workers
                    .into_iter()
                    .map(|worker| s.spawn(move |_| worker.run()))
                    .collect();
                for handle in handles {
                    if handle.join().is_err() {
                        panic_flag.store(true, Ordering::Relaxed);
                    }
                }
                debug!("discovery complete, closing review queue");
                drop(review_tx);
            });

            resolver.run(handler);
        })
        .map_err(|_| EngineError::WorkerPanic)?;

        if worker_panic.load(Ordering::Relaxed) {
            return Err(EngineError::WorkerPanic);
        }

        let report = stats.snapshot(map.len(), started.elapsed(), cancel.load(Ordering::Relaxed));
        info!(
            images = report.images_hashed,
            unique = report.unique_images,
            deleted = report.files_deleted,
            duration_ms = report.duration_ms,
            "scan finished"
        );
        Ok(report)
    }
}

/// Remove one file, counting it. Returns false when the delete fails, so
/// callers keep map entries pointing at files that still exist.
pub(crate) fn delete_file(path: &Path, stats: &ScanStats) -> bool {
    match fs::remove_file(path) {
        Ok(()) => {
            stats.files_deleted.fetch_add(1, Ordering::Relaxed);
            debug!(path = %path.display(), "deleted duplicate file");
            true
        }
        Err(err) => {
            warn!(path = %path.display(), error = %err, "failed to delete file");
            false
        }
    }
}

/// Resolve a byte-identical pair: keep whichever file has the larger pixel
/// area, with the recorded holder winning ties. The entry moves to the
/// candidate only once the recorded file is actually gone.
pub(crate) fn apply_size_policy(
    map: &IdentityMap,
    stats: &ScanStats,
    key: &str,
    existing: &Path,
    candidate: &Path,
    candidate_dims: Option<(u32, u32)>,
    candidate_content_key: &str,
) {
    // Re-scanning a tree can pair a file with itself; never delete it.
    if existing == candidate {
        return;
    }
    let (cw, ch) = match candidate_dims.or_else(|| image::image_dimensions(candidate).ok()) {
        Some(dims) => dims,
        None => return,
    };
    match image::image_dimensions(existing) {
        Ok((ew, eh)) => {
            if u64::from(ew) * u64::from(eh) >= u64::from(cw) * u64::from(ch) {
                delete_file(candidate, stats);
            } else if delete_file(existing, stats) {
                map.update(key, candidate, candidate_content_key);
            }
        }
        Err(_) => {
            // The recorded file is gone or unreadable; the candidate takes
            // over the key.
            map.update(key, candidate, candidate_content_key);
        }
    }
    stats.exact_duplicates.fetch_add(1, Ordering::Relaxed);
}
