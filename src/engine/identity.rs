//! First-seen identity map
//!
//! One entry per perceptual key. The check-key/claim-key transition is a
//! single call under one lock, so two workers racing on a fresh key can never
//! both see it as free. The lock is never held across filesystem I/O; callers
//! hash before claiming and delete after.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::types::{ClaimOutcome, MapEntry};

#[derive(Debug, Default)]
pub struct IdentityMap {
    entries: Mutex<HashMap<String, MapEntry>>,
}

impl IdentityMap {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, MapEntry>> {
        // A poisoned map is still structurally sound; keep going.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Atomically claim `key` for the candidate, or report how the candidate
    /// relates to the image already holding it.
    pub fn get_or_claim(&self, key: &str, path: &Path, content_key: &str) -> ClaimOutcome {
        let mut entries = self.lock();
        match entries.get(key) {
            None => {
                entries.insert(
                    key.to_string(),
                    MapEntry {
                        path: path.to_path_buf(),
                        content_key: content_key.to_string(),
                    },
                );
                ClaimOutcome::Claimed
            }
            Some(existing) if existing.content_key == content_key => ClaimOutcome::ExactDuplicate {
                existing: existing.path.clone(),
            },
            Some(existing) => ClaimOutcome::AmbiguousDuplicate {
                existing: existing.path.clone(),
                existing_content_key: existing.content_key.clone(),
            },
        }
    }

    pub fn get(&self, key: &str) -> Option<MapEntry> {
        self.lock().get(key).cloned()
    }

    /// Point `key` at a different kept image (insert if absent).
    pub fn update(&self, key: &str, path: &Path, content_key: &str) {
        self.lock().insert(
            key.to_string(),
            MapEntry {
                path: path.to_path_buf(),
                content_key: content_key.to_string(),
            },
        );
    }

    pub fn remove(&self, key: &str) {
        self.lock().remove(key);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn first_sighting_claims_the_key() {
        let map = IdentityMap::new();
        let outcome = map.get_or_claim("key", Path::new("/a.png"), "ck1");
        assert_eq!(outcome, ClaimOutcome::Claimed);
        assert_eq!(map.len(), 1);

        let entry = map.get("key").unwrap();
        assert_eq!(entry.path, PathBuf::from("/a.png"));
        assert_eq!(entry.content_key, "ck1");
    }

    #[test]
    fn matching_content_key_is_exact() {
        let map = IdentityMap::new();
        map.get_or_claim("key", Path::new("/a.png"), "ck1");

        let outcome = map.get_or_claim("key", Path::new("/b.png"), "ck1");
        assert_eq!(
            outcome,
            ClaimOutcome::ExactDuplicate {
                existing: PathBuf::from("/a.png")
            }
        );
        // The claim itself never mutates the entry.
        assert_eq!(map.get("key").unwrap().path, PathBuf::from("/a.png"));
    }

    #[test]
    fn differing_content_key_is_ambiguous() {
        let map = IdentityMap::new();
        map.get_or_claim("key", Path::new("/a.png"), "ck1");

        let outcome = map.get_or_claim("key", Path::new("/b.png"), "ck2");
        assert_eq!(
            outcome,
            ClaimOutcome::AmbiguousDuplicate {
                existing: PathBuf::from("/a.png"),
                existing_content_key: "ck1".to_string(),
            }
        );
    }

    #[test]
    fn reclaiming_the_same_file_is_exact() {
        let map = IdentityMap::new();
        map.get_or_claim("key", Path::new("/a.png"), "ck1");

        let outcome = map.get_or_claim("key", Path::new("/a.png"), "ck1");
        assert_eq!(
            outcome,
            ClaimOutcome::ExactDuplicate {
                existing: PathBuf::from("/a.png")
            }
        );
    }

    #[test]
    fn update_and_remove_mutate_the_entry() {
        let map = IdentityMap::new();
        map.get_or_claim("key", Path::new("/a.png"), "ck1");

        map.update("key", Path::new("/b.png"), "ck2");
        let entry = map.get("key").unwrap();
        assert_eq!(entry.path, PathBuf::from("/b.png"));
        assert_eq!(entry.content_key, "ck2");

        map.remove("key");
        assert!(map.get("key").is_none());
        assert!(map.is_empty());
    }

    #[test]
    fn racing_claims_produce_exactly_one_winner() {
        // Repeat to shake out interleavings.
        for trial in 0..20 {
            let map = Arc::new(IdentityMap::new());
            let claims = Arc::new(AtomicUsize::new(0));
            let key = format!("key-{trial}");

            crossbeam::thread::scope(|s| {
                for i in 0..8 {
                    let map = Arc::clone(&map);
                    let claims = Arc::clone(&claims);
                    let key = key.clone();
                    s.spawn(move |_| {
                        let path = PathBuf::from(format!("/img-{i}.png"));
                        if map.get_or_claim(&key, &path, "shared-ck") == ClaimOutcome::Claimed {
                            claims.fetch_add(1, Ordering::SeqCst);
                        }
                    });
                }
            })
            .unwrap();

            assert_eq!(claims.load(Ordering::SeqCst), 1);
            assert_eq!(map.len(), 1);
        }
    }
}
