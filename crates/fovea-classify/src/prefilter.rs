//! The local pre-filter: text-density and keyword heuristics over OCR output.
//!
//! `classify` never fails: an undecodable image or an OCR error degrades to
//! a zero-confidence `unknown` result so the pipeline can continue. The
//! decision is deterministic and carries a human-readable `reason`.

use std::io::Cursor;
use std::sync::Arc;
use tracing::{debug, trace};

use fovea_core::defaults;
use fovea_core::models::{CategoryHint, ClassificationResult, TextObservation};
use fovea_core::TextRecognizer;

use crate::keywords;

/// Tunable thresholds for the generic acceptance check.
#[derive(Debug, Clone)]
pub struct PreFilterConfig {
    pub min_text_density: f32,
    pub min_line_count: usize,
}

impl Default for PreFilterConfig {
    fn default() -> Self {
        Self {
            min_text_density: defaults::MIN_TEXT_DENSITY,
            min_line_count: defaults::MIN_LINE_COUNT,
        }
    }
}

/// Cheap on-device screen applied before the extraction call.
pub struct PreFilter {
    recognizer: Arc<dyn TextRecognizer>,
    config: PreFilterConfig,
}

impl PreFilter {
    pub fn new(recognizer: Arc<dyn TextRecognizer>, config: PreFilterConfig) -> Self {
        Self { recognizer, config }
    }

    /// Classify one photo from its raw encoded bytes.
    pub fn classify(&self, image_bytes: &[u8]) -> ClassificationResult {
        let (img_w, img_h) = match image_dimensions(image_bytes) {
            Ok(dims) => dims,
            Err(e) => {
                debug!(error = %e, "image decode failed, returning unknown");
                return ClassificationResult::unknown(format!("image decode failed: {}", e));
            }
        };

        let observations = match self.recognizer.recognize(image_bytes) {
            Ok(obs) => obs,
            Err(e) => {
                debug!(error = %e, "text recognition failed, returning unknown");
                return ClassificationResult::unknown(format!("text recognition failed: {}", e));
            }
        };

        let result = self.decide(&observations, img_w, img_h);
        trace!(
            line_count = result.line_count,
            confidence = result.confidence,
            hint = %result.category_hint,
            reason = %result.reason,
            "classified photo"
        );
        result
    }

    fn decide(&self, observations: &[TextObservation], img_w: u32, img_h: u32) -> ClassificationResult {
        let line_count = observations.len();
        let ocr_text = observations
            .iter()
            .map(|o| o.text.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        let lower = ocr_text.to_lowercase();

        let text_density = text_density(observations, img_w, img_h);
        let matched_keywords = keywords::collect_matches(&lower, keywords::LEARNING_KEYWORDS);

        let duolingo = keywords::count_matches(&lower, keywords::DUOLINGO_KEYWORDS);
        let code = keywords::count_matches(&lower, keywords::CODE_TOKENS);
        let article = keywords::count_matches(&lower, keywords::ARTICLE_PATTERNS);
        let notes = keywords::count_matches(&lower, keywords::NOTE_TRIGGERS);

        // Most specific hint first.
        let category_hint = if duolingo >= 2 {
            CategoryHint::Duolingo
        } else if code >= 3 {
            CategoryHint::CodeSnippet
        } else if article >= 2 {
            CategoryHint::Article
        } else if line_count > 8 && has_consistent_left_margin(observations) {
            CategoryHint::BookPage
        } else if notes > 0 {
            CategoryHint::Notes
        } else {
            CategoryHint::Unknown
        };

        let density_ok = text_density >= self.config.min_text_density;
        let lines_ok = line_count >= self.config.min_line_count;

        let (accept, confidence, reason) = match category_hint {
            CategoryHint::Duolingo => (
                true,
                0.95,
                format!("{} duolingo exercise phrases matched", duolingo),
            ),
            CategoryHint::BookPage if density_ok && lines_ok => (
                true,
                0.9,
                format!(
                    "book-like page: {} lines with consistent left margin, density {:.2}",
                    line_count, text_density
                ),
            ),
            CategoryHint::CodeSnippet => (
                true,
                0.85,
                format!("{} code-syntax tokens matched", code),
            ),
            CategoryHint::Article if lines_ok => (
                true,
                0.8,
                format!("{} article patterns matched over {} lines", article, line_count),
            ),
            _ if density_ok && lines_ok => (
                true,
                0.7,
                format!(
                    "text density {:.2} and {} lines meet thresholds",
                    text_density, line_count
                ),
            ),
            _ if matched_keywords.len() >= 2 && line_count > 3 => (
                true,
                0.6,
                format!(
                    "learning keywords matched: {}",
                    matched_keywords.join(", ")
                ),
            ),
            _ => {
                let reason = if !lines_ok {
                    format!(
                        "line count {} below threshold {}",
                        line_count, self.config.min_line_count
                    )
                } else if !density_ok {
                    format!(
                        "text density {:.2} below threshold {:.2}",
                        text_density, self.config.min_text_density
                    )
                } else {
                    "no learning signals found".to_string()
                };
                // Rejections stay strictly below the acceptance band.
                (false, (text_density * 2.0).min(0.5), reason)
            }
        };

        ClassificationResult {
            is_learning_content: accept,
            category_hint,
            confidence,
            ocr_text,
            line_count,
            text_density,
            matched_keywords,
            reason,
        }
    }
}

/// Decode only the image header to obtain pixel dimensions.
fn image_dimensions(bytes: &[u8]) -> Result<(u32, u32), String> {
    image::io::Reader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| e.to_string())?
        .into_dimensions()
        .map_err(|e| e.to_string())
}

/// Sum of observation areas over image area, computed in image-space units:
/// normalized box edges are scaled by the actual width/height first.
fn text_density(observations: &[TextObservation], img_w: u32, img_h: u32) -> f32 {
    let image_area = img_w as f32 * img_h as f32;
    if image_area <= 0.0 {
        return 0.0;
    }
    let text_area: f32 = observations
        .iter()
        .map(|o| (o.width * img_w as f32) * (o.height * img_h as f32))
        .sum();
    (text_area / image_area).clamp(0.0, 1.0)
}

/// True when at least 60% of lines start within 5% of the median left edge.
/// Requires more than 5 lines; fewer can't establish a margin.
fn has_consistent_left_margin(observations: &[TextObservation]) -> bool {
    if observations.len() <= 5 {
        return false;
    }
    let mut lefts: Vec<f32> = observations.iter().map(|o| o.x).collect();
    lefts.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let median = lefts[lefts.len() / 2];
    let within = observations
        .iter()
        .filter(|o| (o.x - median).abs() <= 0.05)
        .count();
    within as f32 >= 0.6 * observations.len() as f32
}
