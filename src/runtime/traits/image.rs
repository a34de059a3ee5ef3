// ABOUTME: Image service trait for the backend under test.
// ABOUTME: Pull, status, remove, and list container images.

use super::sealed::Sealed;
use super::shared_types::{Image, ImageFilter, PodSandboxConfig};
use crate::types::{ImageId, ImageRef};
use async_trait::async_trait;

/// Image service operations: pull, status, remove, list.
///
/// `image_status` models absence as `Ok(None)`; only transport or backend
/// failures are errors. `remove_image` is idempotent: removing an image that
/// is already absent succeeds, so any error it does return indicates backend
/// inconsistency rather than a stale reference.
#[async_trait]
pub trait ImageOps: Sealed + Send + Sync {
    /// Pull an image, optionally on behalf of a sandbox, returning its ID.
    async fn pull_image(
        &self,
        reference: &ImageRef,
        sandbox: Option<&PodSandboxConfig>,
    ) -> Result<ImageId, ImageError>;

    /// Look up the image record for a reference (tag, digest, or ID).
    async fn image_status(&self, reference: &ImageRef) -> Result<Option<Image>, ImageError>;

    /// Remove an image by reference (tag, digest, or ID). Removing an
    /// already-absent image succeeds.
    async fn remove_image(&self, reference: &ImageRef) -> Result<(), ImageError>;

    /// List images matching the filter.
    async fn list_images(&self, filter: &ImageFilter) -> Result<Vec<Image>, ImageError>;
}

/// Errors from image service operations.
#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    /// The registry does not serve this reference.
    #[error("image not found: {0}")]
    NotFound(String),

    #[error("pull failed: {0}")]
    PullFailed(String),

    #[error("image in use, cannot remove: {0}")]
    InUse(String),

    #[error("backend error: {0}")]
    Backend(String),
}
