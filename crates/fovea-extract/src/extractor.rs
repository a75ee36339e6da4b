//! The policy-driven extractor with its bounded-concurrency gate.

use base64::Engine;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tracing::{debug, instrument, warn};

use fovea_core::defaults;
use fovea_core::models::{CategoryRule, ClassificationResult, ExtractionResult};
use fovea_core::{Error, Result, VisionBackend};

use crate::parse;
use crate::preprocess;
use crate::prompt;

/// Configuration for the extractor.
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    /// Maximum API calls in flight at once.
    pub max_concurrent: usize,
    /// Longest image edge before transmission.
    pub max_image_dimension: u32,
    /// User-declared category rules.
    pub categories: Vec<CategoryRule>,
    /// Extraction rules for the `"default"` category.
    pub default_rule: String,
    /// Global rules (may instruct skipping).
    pub global_rules: Vec<String>,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            max_concurrent: defaults::MAX_CONCURRENT_API_CALLS,
            max_image_dimension: defaults::MAX_IMAGE_DIMENSION,
            categories: Vec::new(),
            default_rule: String::new(),
            global_rules: Vec::new(),
        }
    }
}

/// Compiles the extraction policy into prompts and drives the vision
/// backend under a counting-semaphore concurrency gate.
pub struct PolicyExtractor {
    backend: Arc<dyn VisionBackend>,
    gate: Arc<Semaphore>,
    system_prompt: String,
    config: ExtractorConfig,
}

impl PolicyExtractor {
    pub fn new(backend: Arc<dyn VisionBackend>, config: ExtractorConfig) -> Self {
        let system_prompt = prompt::build_system_prompt(
            &config.categories,
            &config.default_rule,
            &config.global_rules,
        );
        let gate = Arc::new(Semaphore::new(config.max_concurrent.max(1)));
        Self {
            backend,
            gate,
            system_prompt,
            config,
        }
    }

    /// Extract one photo.
    ///
    /// Preprocessing runs before a concurrency permit is taken; only the
    /// network call holds a slot. Transport failures propagate without
    /// internal retry; the photo stays eligible for the next scan cycle.
    #[instrument(skip(self, image_bytes, classification, asset_id, captured), fields(asset_id = %asset_id))]
    pub async fn extract(
        &self,
        image_bytes: &[u8],
        classification: &ClassificationResult,
        asset_id: &str,
        captured: DateTime<Utc>,
    ) -> Result<ExtractionResult> {
        let prepared = preprocess::prepare_image(image_bytes, self.config.max_image_dimension)?;
        let image_b64 = base64::engine::general_purpose::STANDARD.encode(&prepared.bytes);
        let user_prompt = prompt::build_user_prompt(asset_id, captured, classification);

        let _permit = self
            .gate
            .acquire()
            .await
            .map_err(|_| Error::Internal("extraction gate closed".to_string()))?;

        let start = Instant::now();
        let raw = self
            .backend
            .complete(
                &self.system_prompt,
                &user_prompt,
                &image_b64,
                prepared.media_type,
            )
            .await?;
        debug!(
            model = self.backend.model_name(),
            duration_ms = start.elapsed().as_millis() as u64,
            response_len = raw.len(),
            "vision completion finished"
        );

        let result = parse::parse_response(&raw, &self.config.categories, asset_id);
        if let Err(e) = &result {
            warn!(error = %e, "extraction response rejected");
        }
        result
    }

    /// Number of free extraction slots (for diagnostics and tests).
    pub fn available_slots(&self) -> usize {
        self.gate.available_permits()
    }
}
