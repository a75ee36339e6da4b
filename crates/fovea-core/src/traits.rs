//! Collaborator traits at the pipeline's external seams.
//!
//! Real implementations bind to a system photo library, an on-device OCR
//! engine, and a remote vision endpoint; tests inject fakes.

use async_trait::async_trait;
use std::collections::HashSet;

use crate::models::{Photo, TextObservation};
use crate::Result;

/// Source of candidate photos (a system photo library scoped to an album,
/// or the whole library).
///
/// Implementations may pre-filter by `exclude_ids`, but the orchestrator
/// filters defensively as well; the vault scan is the authoritative dedup
/// source either way.
#[async_trait]
pub trait PhotoSource: Send + Sync {
    /// List candidate photos whose IDs are not in `exclude_ids`.
    async fn list_candidates(&self, exclude_ids: &HashSet<String>) -> Result<Vec<Photo>>;
}

/// On-device text recognition over raw image bytes.
///
/// Returns one observation per recognized text line with a normalized
/// bounding box. Must be deterministic for identical input.
pub trait TextRecognizer: Send + Sync {
    fn recognize(&self, image_bytes: &[u8]) -> Result<Vec<TextObservation>>;
}

/// Remote vision-capable completion endpoint.
///
/// Treated strictly as `(prompts, image) -> text`; all structure in the
/// response is parsed and re-validated by the caller.
#[async_trait]
pub trait VisionBackend: Send + Sync {
    /// Run one completion with a system prompt, user prompt, and a base64
    /// image payload with its declared media type.
    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        image_base64: &str,
        media_type: &str,
    ) -> Result<String>;

    /// Check if the backend is reachable.
    async fn health_check(&self) -> Result<bool>;

    /// The model identifier in use.
    fn model_name(&self) -> &str;
}
