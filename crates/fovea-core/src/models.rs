//! Data model for the fovea capture pipeline.
//!
//! These types flow between the pre-filter, extractor, writer, and
//! orchestrator. Everything here is plain data; behavior lives in the
//! component crates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A candidate photo from the photo source. Read-only to the pipeline.
#[derive(Debug, Clone)]
pub struct Photo {
    /// Stable opaque identifier assigned by the photo source.
    pub id: String,
    /// When the photo was taken.
    pub created_at: DateTime<Utc>,
    /// Raw encoded image bytes (JPEG/PNG/...).
    pub bytes: Vec<u8>,
}

/// A single recognized text line with its normalized bounding box.
///
/// Coordinates are in normalized image space (`[0, 1]` on both axes, origin
/// top-left); the pre-filter scales them by the actual image dimensions
/// before computing areas.
#[derive(Debug, Clone, PartialEq)]
pub struct TextObservation {
    pub text: String,
    /// Left edge, normalized.
    pub x: f32,
    /// Top edge, normalized.
    pub y: f32,
    /// Width, normalized.
    pub width: f32,
    /// Height, normalized.
    pub height: f32,
}

impl TextObservation {
    pub fn new(text: impl Into<String>, x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            text: text.into(),
            x,
            y,
            width,
            height,
        }
    }
}

/// Category hint produced by the local pre-filter.
///
/// This is a *hint*, never authoritative for placement: the extraction
/// capability declares the final category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CategoryHint {
    BookPage,
    Article,
    Duolingo,
    CodeSnippet,
    Flashcard,
    Notes,
    #[default]
    Unknown,
}

impl fmt::Display for CategoryHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::BookPage => "book_page",
            Self::Article => "article",
            Self::Duolingo => "duolingo",
            Self::CodeSnippet => "code_snippet",
            Self::Flashcard => "flashcard",
            Self::Notes => "notes",
            Self::Unknown => "unknown",
        };
        write!(f, "{}", s)
    }
}

/// Result of the local pre-filter over one photo. Immutable once produced.
#[derive(Debug, Clone, Serialize)]
pub struct ClassificationResult {
    /// Whether the photo looks like learning content worth extracting.
    pub is_learning_content: bool,
    /// Best-effort category hint.
    pub category_hint: CategoryHint,
    /// Confidence in `[0, 1]`.
    pub confidence: f32,
    /// Concatenated OCR text (newline-separated lines).
    pub ocr_text: String,
    /// Number of recognized text lines.
    pub line_count: usize,
    /// Sum of text bounding-box areas divided by image area, in `[0, 1]`.
    pub text_density: f32,
    /// Matched learning keywords, in keyword-table order, no duplicates.
    pub matched_keywords: Vec<String>,
    /// Human-readable explanation of the decision. Part of the contract;
    /// surfaced by diagnostics and tests.
    pub reason: String,
}

impl ClassificationResult {
    /// Zero-confidence rejection used when the image cannot be decoded or
    /// text recognition fails. Best-effort: the pipeline continues.
    pub fn unknown(reason: impl Into<String>) -> Self {
        Self {
            is_learning_content: false,
            category_hint: CategoryHint::Unknown,
            confidence: 0.0,
            ocr_text: String::new(),
            line_count: 0,
            text_density: 0.0,
            matched_keywords: Vec::new(),
            reason: reason.into(),
        }
    }
}

/// A user-declared extraction category rule. Read-only to the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryRule {
    /// Unique name; matched case-insensitively against extraction responses.
    pub name: String,
    /// Optional short description shown to the extraction capability.
    #[serde(default)]
    pub hint: Option<String>,
    /// Natural-language rules for what to extract.
    pub extraction_rules: String,
    /// Natural-language rules for where and how to write the result.
    pub write_rule: String,
}

/// How extracted content is persisted into the vault.
///
/// Closed sum type: unrecognized wire strings are a parse error for that
/// candidate, never silently coerced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum WriteMode {
    #[default]
    Create,
    Append,
    Upsert,
    Skip,
}

impl fmt::Display for WriteMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Create => "create",
            Self::Append => "append",
            Self::Upsert => "upsert",
            Self::Skip => "skip",
        };
        write!(f, "{}", s)
    }
}

/// Structured write instruction produced by the extraction capability.
///
/// The path is untrusted input; the write planner re-validates and
/// re-sanitizes it before any filesystem mutation.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct WritePlan {
    #[serde(default)]
    pub mode: WriteMode,
    /// Vault-relative path. Empty means "synthesize a default".
    #[serde(default)]
    pub path: String,
    /// Anchor line (typically a heading) to insert after when appending.
    #[serde(default)]
    pub append_to: Option<String>,
}

/// Structured extraction for one photo. Immutable once produced.
///
/// Invariant: if `write_plan.mode != Skip` then `content` is non-empty.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionResult {
    /// A configured rule name or the literal `"default"`.
    pub category: String,
    pub title: String,
    /// Markdown body, no frontmatter.
    pub content: String,
    pub write_plan: WritePlan,
}

/// Six counters persisted across scan cycles.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScanStats {
    #[serde(default)]
    pub scanned: u64,
    #[serde(default)]
    pub classified: u64,
    #[serde(default)]
    pub extracted: u64,
    #[serde(default)]
    pub written: u64,
    #[serde(default)]
    pub skipped: u64,
    #[serde(default)]
    pub errors: u64,
}

/// Terminal status of one scan cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanStatus {
    /// Cycle ran to the end; individual items may still have failed.
    Completed,
    /// Batch-level setup failed (e.g. photo source unavailable).
    Failed,
    /// A scan was already running; nothing was done.
    Skipped,
}

/// Aggregate outcome of one scan cycle.
#[derive(Debug, Clone, Serialize)]
pub struct ScanResult {
    pub status: ScanStatus,
    /// Candidates found after dedup filtering.
    pub found: usize,
    /// Candidates that ran through the pipeline (including skip outcomes).
    pub processed: usize,
    /// Candidates for which extraction succeeded.
    pub extracted: usize,
    /// Candidates that produced a vault write.
    pub written: usize,
    /// Per-item failures.
    pub errors: usize,
    /// Batch-level failure message, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl ScanResult {
    /// Result for a cycle that was skipped because one was already running.
    pub fn skipped() -> Self {
        let now = Utc::now();
        Self {
            status: ScanStatus::Skipped,
            found: 0,
            processed: 0,
            extracted: 0,
            written: 0,
            errors: 0,
            message: None,
            started_at: now,
            finished_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_mode_wire_names() {
        assert_eq!(serde_json::to_string(&WriteMode::Create).unwrap(), "\"create\"");
        assert_eq!(serde_json::to_string(&WriteMode::Upsert).unwrap(), "\"upsert\"");
        let m: WriteMode = serde_json::from_str("\"append\"").unwrap();
        assert_eq!(m, WriteMode::Append);
    }

    #[test]
    fn test_write_mode_unknown_string_is_error() {
        let r = serde_json::from_str::<WriteMode>("\"overwrite\"");
        assert!(r.is_err());
    }

    #[test]
    fn test_write_plan_defaults() {
        let plan: WritePlan = serde_json::from_str("{}").unwrap();
        assert_eq!(plan.mode, WriteMode::Create);
        assert!(plan.path.is_empty());
        assert!(plan.append_to.is_none());
    }

    #[test]
    fn test_category_hint_display() {
        assert_eq!(CategoryHint::BookPage.to_string(), "book_page");
        assert_eq!(CategoryHint::Unknown.to_string(), "unknown");
    }

    #[test]
    fn test_classification_unknown_is_zero_confidence() {
        let c = ClassificationResult::unknown("image decode failed");
        assert!(!c.is_learning_content);
        assert_eq!(c.confidence, 0.0);
        assert_eq!(c.category_hint, CategoryHint::Unknown);
        assert_eq!(c.reason, "image decode failed");
    }

    #[test]
    fn test_scan_result_skipped() {
        let r = ScanResult::skipped();
        assert_eq!(r.status, ScanStatus::Skipped);
        assert_eq!(r.found, 0);
        assert_eq!(r.errors, 0);
    }

    #[test]
    fn test_scan_stats_default_is_zero() {
        let s = ScanStats::default();
        assert_eq!(s.scanned, 0);
        assert_eq!(s.errors, 0);
    }

    #[test]
    fn test_category_rule_deserialize_without_hint() {
        let json = r#"{"name":"BookNote","extraction_rules":"extract quotes","write_rule":"one file per book"}"#;
        let rule: CategoryRule = serde_json::from_str(json).unwrap();
        assert_eq!(rule.name, "BookNote");
        assert!(rule.hint.is_none());
    }
}
