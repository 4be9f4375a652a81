//! Two-tier image identity hashing
//!
//! Every image gets a perceptual key (approximate, bucket-forming) and a
//! content key (exact, byte-level). Two files sharing a perceptual key are
//! visually alike; only matching content keys make them the same file.

use image::GenericImageView;
use image_hasher::{HashAlg, Hasher, HasherConfig};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HashError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image decode failed: {0}")]
    Decode(#[from] image::ImageError),
}

/// Perceptual hash algorithm selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HashAlgorithm {
    Mean,
    Gradient,
    VertGradient,
    DoubleGradient,
    Blockhash,
}

impl HashAlgorithm {
    fn hash_alg(self) -> HashAlg {
        match self {
            HashAlgorithm::Mean => HashAlg::Mean,
            HashAlgorithm::Gradient => HashAlg::Gradient,
            HashAlgorithm::VertGradient => HashAlg::VertGradient,
            HashAlgorithm::DoubleGradient => HashAlg::DoubleGradient,
            HashAlgorithm::Blockhash => HashAlg::Blockhash,
        }
    }
}

/// Perceptual hashing parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HashConfig {
    pub algorithm: HashAlgorithm,
    /// Width and height of the hash grid.
    pub size: u32,
}

impl Default for HashConfig {
    fn default() -> Self {
        Self {
            algorithm: HashAlgorithm::Mean,
            size: 8,
        }
    }
}

/// Both identity keys plus the pixel dimensions of one image file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageSignature {
    /// Base64 rendering of the perceptual hash bits.
    pub perceptual: String,
    /// Lowercase hex SHA-256 of the raw file bytes.
    pub content: String,
    pub width: u32,
    pub height: u32,
}

/// Computes image signatures. Construction is cheap, so each worker thread
/// builds its own service from the shared [`HashConfig`].
pub struct HashService {
    hasher: Hasher,
}

impl HashService {
    pub fn new(config: &HashConfig) -> Self {
        let hasher = HasherConfig::new()
            .hash_size(config.size, config.size)
            .hash_alg(config.algorithm.hash_alg())
            .to_hasher();
        Self { hasher }
    }

    /// Read and decode a file, producing its full signature.
    ///
    /// The file is read once; the content key is computed over the same bytes
    /// the decoder sees. Decode and read failures surface as [`HashError`] and
    /// the caller decides whether that is fatal (for discovery it never is).
    pub fn signature(&self, path: &Path) -> Result<ImageSignature, HashError> {
        let bytes = fs::read(path)?;
        let image = image::load_from_memory(&bytes)?;
        let (width, height) = image.dimensions();
        let perceptual = self.hasher.hash_image(&image).to_base64();
        let content = content_key(&bytes);
        Ok(ImageSignature {
            perceptual,
            content,
            width,
            height,
        })
    }
}

impl Default for HashService {
    fn default() -> Self {
        Self::new(&HashConfig::default())
    }
}

/// SHA-256 of raw bytes as lowercase hex.
fn content_key(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use tempfile::TempDir;

    fn vertical_split(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, _| {
            if x < width / 2 {
                Rgb([0, 0, 0])
            } else {
                Rgb([255, 255, 255])
            }
        })
    }

    fn horizontal_split(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |_, y| {
            if y < height / 2 {
                Rgb([0, 0, 0])
            } else {
                Rgb([255, 255, 255])
            }
        })
    }

    #[test]
    fn signature_is_deterministic() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.png");
        vertical_split(64, 64).save(&path).unwrap();

        let service = HashService::default();
        let first = service.signature(&path).unwrap();
        let second = service.signature(&path).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.content.len(), 64);
        assert_eq!((first.width, first.height), (64, 64));
    }

    #[test]
    fn same_pixels_share_perceptual_key_but_not_content_key() {
        let dir = TempDir::new().unwrap();
        let png = dir.path().join("a.png");
        let bmp = dir.path().join("a.bmp");
        let img = vertical_split(64, 64);
        img.save(&png).unwrap();
        img.save(&bmp).unwrap();

        let service = HashService::default();
        let png_sig = service.signature(&png).unwrap();
        let bmp_sig = service.signature(&bmp).unwrap();
        assert_eq!(png_sig.perceptual, bmp_sig.perceptual);
        assert_ne!(png_sig.content, bmp_sig.content);
    }

    #[test]
    fn different_images_get_different_perceptual_keys() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a.png");
        let b = dir.path().join("b.png");
        vertical_split(64, 64).save(&a).unwrap();
        horizontal_split(64, 64).save(&b).unwrap();

        let service = HashService::default();
        let sig_a = service.signature(&a).unwrap();
        let sig_b = service.signature(&b).unwrap();
        assert_ne!(sig_a.perceptual, sig_b.perceptual);
    }

    #[test]
    fn undecodable_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("junk.jpg");
        std::fs::write(&path, b"definitely not a jpeg").unwrap();

        let service = HashService::default();
        assert!(matches!(
            service.signature(&path),
            Err(HashError::Decode(_))
        ));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let service = HashService::default();
        let missing = Path::new("/nonexistent/image.png");
        assert!(matches!(service.signature(missing), Err(HashError::Io(_))));
    }
}
