use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// What the identity map keeps per perceptual key: the path currently chosen
/// to represent that key and its content key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapEntry {
    pub path: PathBuf,
    pub content_key: String,
}

/// Result of an atomic check-and-claim against the identity map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimOutcome {
    /// The key was free; the candidate now owns it.
    Claimed,
    /// Same perceptual key, same content key: byte-identical duplicate.
    ExactDuplicate { existing: PathBuf },
    /// Same perceptual key, different content key: needs a human decision.
    AmbiguousDuplicate {
        existing: PathBuf,
        existing_content_key: String,
    },
}

/// An ambiguous pair queued for review. `left` is the mapped path at discovery
/// time, `right` the newly found file that collided with it.
#[derive(Debug, Clone)]
pub struct ReviewCandidate {
    pub identity_key: String,
    pub left: PathBuf,
    pub right: PathBuf,
    pub right_content_key: String,
}

/// What the review collaborator gets to see about one file.
#[derive(Debug, Clone)]
pub struct ImageFacts {
    pub path: PathBuf,
    /// Pixel dimensions, read lazily from the file header; None when the file
    /// is gone or unreadable at staging time.
    pub dimensions: Option<(u32, u32)>,
}

impl ImageFacts {
    pub fn probe(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            dimensions: image::image_dimensions(path).ok(),
        }
    }
}

/// A staged pair presented to the review collaborator.
#[derive(Debug, Clone)]
pub struct ReviewRequest {
    pub left: ImageFacts,
    pub right: ImageFacts,
}

/// Exactly one disposition is applied per staged pair. `DeleteBoth` only takes
/// effect with `confirmed` set; unconfirmed it re-stages the same pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    KeepLeft,
    KeepRight,
    KeepBoth,
    DeleteBoth { confirmed: bool },
}

/// Shared counters bumped by workers and the resolver while a scan runs.
#[derive(Debug, Default)]
pub struct ScanStats {
    pub directories_walked: AtomicUsize,
    pub images_hashed: AtomicUsize,
    pub exact_duplicates: AtomicUsize,
    pub candidates_queued: AtomicUsize,
    pub candidates_reviewed: AtomicUsize,
    pub files_deleted: AtomicUsize,
    pub files_skipped: AtomicUsize,
}

impl ScanStats {
    pub fn snapshot(&self, unique_images: usize, duration: Duration, cancelled: bool) -> ScanReport {
        ScanReport {
            directories_walked: self.directories_walked.load(Ordering::Relaxed),
            images_hashed: self.images_hashed.load(Ordering::Relaxed),
            exact_duplicates: self.exact_duplicates.load(Ordering::Relaxed),
            candidates_queued: self.candidates_queued.load(Ordering::Relaxed),
            candidates_reviewed: self.candidates_reviewed.load(Ordering::Relaxed),
            files_deleted: self.files_deleted.load(Ordering::Relaxed),
            files_skipped: self.files_skipped.load(Ordering::Relaxed),
            unique_images,
            duration_ms: duration.as_millis() as u64,
            cancelled,
        }
    }
}

/// Final numbers from one scan run.
#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    pub directories_walked: usize,
    pub images_hashed: usize,
    pub exact_duplicates: usize,
    pub candidates_queued: usize,
    pub candidates_reviewed: usize,
    pub files_deleted: usize,
    pub files_skipped: usize,
    /// Identity map size at the end of the run.
    pub unique_images: usize,
    pub duration_ms: u64,
    pub cancelled: bool,
}
