//! Centralized default constants for the fovea capture pipeline.
//!
//! **This module is the single source of truth** for all shared default
//! values. Crates reference these constants instead of defining their own
//! magic numbers.

// =============================================================================
// PRE-FILTER
// =============================================================================

/// Minimum text density (text bounding-box area / image area) for a photo to
/// be considered learning content by the generic threshold check.
pub const MIN_TEXT_DENSITY: f32 = 0.10;

/// Minimum number of recognized text lines for the generic threshold check.
pub const MIN_LINE_COUNT: usize = 5;

// =============================================================================
// EXTRACTION
// =============================================================================

/// Maximum extraction API calls in flight at once.
pub const MAX_CONCURRENT_API_CALLS: usize = 3;

/// Longest edge (pixels) an image is downscaled to before transmission.
pub const MAX_IMAGE_DIMENSION: u32 = 2048;

/// JPEG re-encode quality for transmitted images.
pub const JPEG_QUALITY: u8 = 85;

/// Timeout for a single vision completion request, in seconds. Vision-capable
/// model responses are slow; this is deliberately generous.
pub const VISION_TIMEOUT_SECS: u64 = 120;

/// Timeout for backend health checks, in seconds.
pub const HEALTH_CHECK_TIMEOUT_SECS: u64 = 5;

/// The literal category name used when no configured rule matches.
pub const DEFAULT_CATEGORY: &str = "default";

/// Default vision endpoint (OpenAI-compatible).
pub const VISION_BASE_URL: &str = "https://api.openai.com/v1";

/// Default vision model identifier.
pub const VISION_MODEL: &str = "gpt-4o-mini";

/// Maximum tokens requested per completion.
pub const VISION_MAX_TOKENS: u32 = 4096;

// =============================================================================
// VAULT
// =============================================================================

/// Subdirectory of the vault where generated notes are written.
pub const CAPTURE_ROOT: &str = "captures";

/// Directory under the vault root holding pipeline-private files.
pub const STATE_DIR: &str = ".fovea";

/// File name of the persisted dedup/stats state inside [`STATE_DIR`].
pub const STATE_FILE: &str = "state.json";

// =============================================================================
// ORCHESTRATION
// =============================================================================

/// Seconds between scan cycles in watch mode.
pub const SCAN_INTERVAL_SECS: u64 = 300;

/// Event bus broadcast channel capacity.
pub const EVENT_BUS_CAPACITY: usize = 256;

// =============================================================================
// ENVIRONMENT VARIABLES
// =============================================================================

/// API key for the vision endpoint.
pub const ENV_API_KEY: &str = "FOVEA_API_KEY";

/// Base URL override for the vision endpoint.
pub const ENV_BASE_URL: &str = "FOVEA_BASE_URL";

/// Vision model override.
pub const ENV_MODEL: &str = "FOVEA_MODEL";

/// Vault root path.
pub const ENV_VAULT: &str = "FOVEA_VAULT";

/// Album name (empty or unset selects whole-library mode).
pub const ENV_ALBUM: &str = "FOVEA_ALBUM";

/// Scan interval override, in seconds.
pub const ENV_SCAN_INTERVAL: &str = "FOVEA_SCAN_INTERVAL_SECS";
