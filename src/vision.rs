//! Vision-annotation collaborator for image elements.

use crate::element::ImageAnnotations;
use crate::error::VisionError;
use async_trait::async_trait;

/// Annotates encoded image bytes with labels, faces, search hits and safety flags
///
/// Only called for image elements that missed the dedup store.
#[async_trait]
pub trait VisionAnnotator: Send + Sync {
    async fn annotate(&self, image: &[u8]) -> Result<ImageAnnotations, VisionError>;
}
