//! Discovery worker
//!
//! Each worker loops over the directory frontier: pop with a bounded wait,
//! list the directory (feeding subdirectories back), and run every supported
//! image file through the hash/claim pipeline. Bad files and unreadable
//! directories are skipped; only frontier drain or cancellation ends the loop.

use crossbeam::channel::Sender;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, warn};

use crate::hash::{HashConfig, HashService, ImageSignature};

use super::frontier::{DirectoryFrontier, PopResult};
use super::identity::IdentityMap;
use super::types::{ClaimOutcome, ReviewCandidate, ScanStats};
use super::{EngineConfig, apply_size_policy};

pub struct DiscoveryWorker {
    id: usize,
    frontier: Arc<DirectoryFrontier>,
    map: Arc<IdentityMap>,
    review: Sender<ReviewCandidate>,
    stats: Arc<ScanStats>,
    cancel: Arc<AtomicBool>,
    hash: HashConfig,
    extensions: Vec<String>,
    poll: Duration,
}

impl DiscoveryWorker {
    pub fn new(
        id: usize,
        frontier: Arc<DirectoryFrontier>,
        map: Arc<IdentityMap>,
        review: Sender<ReviewCandidate>,
        stats: Arc<ScanStats>,
        cancel: Arc<AtomicBool>,
        config: &EngineConfig,
    ) -> Self {
        Self {
            id,
            frontier,
            map,
            review,
            stats,
            cancel,
            hash: config.hash.clone(),
            extensions: normalize_extensions(&config.extensions),
            poll: config.poll_interval,
        }
    }

    /// Worker loop; returns only on frontier drain or cancellation. Dropping
    /// `self` releases this worker's review-queue sender.
    pub fn run(self) {
        let hasher = HashService::new(&self.hash);
        loop {
            if self.cancel.load(Ordering::Relaxed) {
                debug!(worker = self.id, "cancelled");
                break;
            }
            match self.frontier.pop(self.poll) {
                PopResult::Directory(dir) => {
                    self.process_directory(&dir, &hasher);
                    self.frontier.complete_one();
                }
                PopResult::TimedOut => {}
                PopResult::Drained => break,
            }
        }
        debug!(worker = self.id, "discovery worker exiting");
    }

    fn process_directory(&self, dir: &Path, hasher: &HashService) {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(err) => {
                // Unreadable directory (typically permissions): skip it and
                // let siblings carry on.
                warn!(dir = %dir.display(), error = %err, "skipping unreadable directory");
                return;
            }
        };

        for entry in entries {
            if self.cancel.load(Ordering::Relaxed) {
                return;
            }
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    debug!(dir = %dir.display(), error = %err, "skipping unreadable entry");
                    continue;
                }
            };
            let path = entry.path();
            let file_type = match entry.file_type() {
                Ok(file_type) => file_type,
                Err(_) => continue,
            };
            if file_type.is_dir() {
                self.frontier.push(path);
            } else if file_type.is_file() && has_supported_extension(&path, &self.extensions) {
                self.process_image(&path, hasher);
            }
        }
        self.stats.directories_walked.fetch_add(1, Ordering::Relaxed);
    }

    fn process_image(&self, path: &Path, hasher: &HashService) {
        let signature = match hasher.signature(path) {
            Ok(signature) => signature,
            Err(err) => {
                debug!(path = %path.display(), error = %err, "skipping undecodable file");
                self.stats.files_skipped.fetch_add(1, Ordering::Relaxed);
                return;
            }
        };
        self.stats.images_hashed.fetch_add(1, Ordering::Relaxed);

        match self
            .map
            .get_or_claim(&signature.perceptual, path, &signature.content)
        {
            ClaimOutcome::Claimed => {}
            ClaimOutcome::ExactDuplicate { existing } => {
                self.resolve_exact(&existing, path, &signature);
            }
            ClaimOutcome::AmbiguousDuplicate {
                existing,
                existing_content_key,
            } => {
                debug!(
                    path = %path.display(),
                    existing = %existing.display(),
                    %existing_content_key,
                    "perceptual collision, queuing for review"
                );
                let candidate = ReviewCandidate {
                    identity_key: signature.perceptual,
                    left: existing,
                    right: path.to_path_buf(),
                    right_content_key: signature.content,
                };
                if self.review.send(candidate).is_ok() {
                    self.stats.candidates_queued.fetch_add(1, Ordering::Relaxed);
                }
            }
        }
    }

    fn resolve_exact(&self, existing: &Path, candidate: &Path, signature: &ImageSignature) {
        apply_size_policy(
            &self.map,
            &self.stats,
            &signature.perceptual,
            existing,
            candidate,
            Some((signature.width, signature.height)),
            &signature.content,
        );
    }
}

/// Lowercase the configured extensions and strip any leading dots.
pub(crate) fn normalize_extensions(raw: &[String]) -> Vec<String> {
    raw.iter()
        .map(|ext| ext.trim_start_matches('.').to_ascii_lowercase())
        .collect()
}

/// Case-insensitive extension membership check.
pub(crate) fn has_supported_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .is_some_and(|ext| extensions.iter().any(|supported| *supported == ext))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extensions() -> Vec<String> {
        normalize_extensions(&[".JPG".to_string(), "png".to_string(), "Webp".to_string()])
    }

    #[test]
    fn normalization_lowercases_and_strips_dots() {
        assert_eq!(extensions(), vec!["jpg", "png", "webp"]);
    }

    #[test]
    fn extension_match_ignores_case() {
        let extensions = extensions();
        assert!(has_supported_extension(Path::new("/x/photo.JPG"), &extensions));
        assert!(has_supported_extension(Path::new("/x/photo.png"), &extensions));
        assert!(has_supported_extension(Path::new("/x/PHOTO.WEBP"), &extensions));
        assert!(!has_supported_extension(Path::new("/x/notes.txt"), &extensions));
        assert!(!has_supported_extension(Path::new("/x/no_extension"), &extensions));
    }

    #[test]
    fn dotfiles_have_no_extension() {
        // Path::extension() treats ".png" as a stem, not an extension.
        let extensions = extensions();
        assert!(!has_supported_extension(Path::new("/x/.png"), &extensions));
    }
}
