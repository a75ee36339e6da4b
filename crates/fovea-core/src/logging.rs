//! Structured logging schema and field name constants for fovea.
//!
//! All crates use these constants for consistent structured logging fields,
//! so log aggregation tools can query by standardized names across every
//! subsystem.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Recoverable issue, automatic fallback applied |
//! | INFO  | Lifecycle events (scan start/finish), operation completions |
//! | DEBUG | Decision points, intermediate values, config choices |
//! | TRACE | Per-item iteration, high-volume data (OCR lines, keywords) |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Scan cycle correlation ID (UUIDv7, time-ordered).
pub const SCAN_ID: &str = "scan_id";

/// Subsystem originating the log event.
/// Values: "classify", "extract", "vault", "pipeline"
pub const SUBSYSTEM: &str = "subsystem";

/// Logical operation name.
/// Examples: "classify", "extract", "write", "dedup_scan"
pub const OPERATION: &str = "op";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// Source photo asset ID being operated on.
pub const ASSET_ID: &str = "asset_id";

/// Extraction-declared category.
pub const CATEGORY: &str = "category";

/// Vault-relative path of a written note.
pub const PATH: &str = "path";

/// Write mode applied (create/append/upsert/skip).
pub const WRITE_MODE: &str = "write_mode";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of candidates found or results returned.
pub const RESULT_COUNT: &str = "result_count";

/// Pre-filter confidence value.
pub const CONFIDENCE: &str = "confidence";

/// Recognized text line count.
pub const LINE_COUNT: &str = "line_count";

/// Byte length of a model response.
pub const RESPONSE_LEN: &str = "response_len";

// ─── Inference fields ──────────────────────────────────────────────────────

/// Model name used for extraction.
pub const MODEL: &str = "model";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Boolean success/failure indicator.
pub const SUCCESS: &str = "success";

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";

/// Initialize the global tracing subscriber with an `EnvFilter`.
///
/// Reads `RUST_LOG` for filtering; defaults to `info` when unset. Safe to
/// call once per process; subsequent calls are no-ops.
pub fn init_tracing() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}
