//! Capture pipeline configuration.
//!
//! Configuration can be loaded from:
//! - TOML files (category rules are declared here)
//! - Environment variables (`FOVEA_*` prefixed, overriding file values)
//!
//! # Example
//!
//! ```rust,no_run
//! use fovea_core::CaptureConfig;
//!
//! let config = CaptureConfig::from_file(std::path::Path::new("fovea.toml"))
//!     .expect("Failed to load config");
//! config.validate().expect("Invalid config");
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use crate::defaults;
use crate::models::CategoryRule;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Vision endpoint configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the OpenAI-compatible endpoint.
    pub base_url: String,
    /// Bearer credential (optional for local endpoints).
    pub api_key: Option<String>,
    /// Vision-capable model identifier.
    pub model: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::VISION_BASE_URL.to_string(),
            api_key: None,
            model: defaults::VISION_MODEL.to_string(),
            timeout_secs: defaults::VISION_TIMEOUT_SECS,
        }
    }
}

/// Top-level pipeline configuration.
///
/// CLI parsing and launch-agent scheduling live outside the core; this
/// struct is the surface they hand in.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Root of the markdown vault. Must exist and be a valid vault; the
    /// caller enforces the marker-directory precondition.
    pub vault_root: PathBuf,
    /// Album to scan. Empty selects whole-library mode, which turns the
    /// pre-filter from a hint into a hard gate.
    pub album: String,
    /// Seconds between scan cycles in watch mode.
    pub scan_interval_secs: u64,
    /// Maximum extraction API calls in flight at once.
    pub max_concurrent_api_calls: usize,
    /// Longest image edge in pixels before transmission.
    pub max_image_dimension: u32,
    /// Pre-filter text-density acceptance threshold.
    pub min_text_density: f32,
    /// Pre-filter line-count acceptance threshold.
    pub min_line_count: usize,
    /// Vision endpoint settings.
    pub api: ApiConfig,
    /// User-declared category rules.
    pub categories: Vec<CategoryRule>,
    /// Natural-language extraction rules for the `"default"` category.
    pub default_rule: String,
    /// Global rules prepended to every prompt (may instruct skipping).
    pub global_rules: Vec<String>,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            vault_root: PathBuf::new(),
            album: String::new(),
            scan_interval_secs: defaults::SCAN_INTERVAL_SECS,
            max_concurrent_api_calls: defaults::MAX_CONCURRENT_API_CALLS,
            max_image_dimension: defaults::MAX_IMAGE_DIMENSION,
            min_text_density: defaults::MIN_TEXT_DENSITY,
            min_line_count: defaults::MIN_LINE_COUNT,
            api: ApiConfig::default(),
            categories: Vec::new(),
            default_rule: String::new(),
            global_rules: Vec::new(),
        }
    }
}

impl CaptureConfig {
    /// Load from a TOML file, then apply environment overrides.
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&contents)?;
        config.apply_env();
        debug!(path = %path.display(), "Loaded capture config");
        Ok(config)
    }

    /// Build from environment variables alone (defaults elsewhere).
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let mut config = Self::default();
        config.apply_env();
        config
    }

    /// Apply `FOVEA_*` environment overrides in place.
    fn apply_env(&mut self) {
        if let Ok(v) = std::env::var(defaults::ENV_VAULT) {
            if !v.is_empty() {
                self.vault_root = PathBuf::from(v);
            }
        }
        if let Ok(v) = std::env::var(defaults::ENV_ALBUM) {
            self.album = v;
        }
        if let Ok(v) = std::env::var(defaults::ENV_API_KEY) {
            if !v.is_empty() {
                self.api.api_key = Some(v);
            }
        }
        if let Ok(v) = std::env::var(defaults::ENV_BASE_URL) {
            if !v.is_empty() {
                self.api.base_url = v;
            }
        }
        if let Ok(v) = std::env::var(defaults::ENV_MODEL) {
            if !v.is_empty() {
                self.api.model = v;
            }
        }
        if let Some(v) = std::env::var(defaults::ENV_SCAN_INTERVAL)
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
        {
            self.scan_interval_secs = v;
        }
    }

    /// Whether scanning is scoped to a curated album. When true, the
    /// pre-filter result is a hint only and never blocks extraction.
    pub fn is_album_scoped(&self) -> bool {
        !self.album.is_empty()
    }

    /// Path of the persisted dedup/stats state file.
    pub fn state_path(&self) -> PathBuf {
        self.vault_root
            .join(defaults::STATE_DIR)
            .join(defaults::STATE_FILE)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.vault_root.as_os_str().is_empty() {
            return Err(ConfigError::Validation(
                "vault_root cannot be empty".to_string(),
            ));
        }
        if !self.api.base_url.starts_with("http://") && !self.api.base_url.starts_with("https://") {
            return Err(ConfigError::Validation(format!(
                "api.base_url must start with http:// or https://, got: {}",
                self.api.base_url
            )));
        }
        if self.api.model.is_empty() {
            return Err(ConfigError::Validation(
                "api.model cannot be empty".to_string(),
            ));
        }
        if self.max_concurrent_api_calls == 0 {
            return Err(ConfigError::Validation(
                "max_concurrent_api_calls must be at least 1".to_string(),
            ));
        }
        if self.max_image_dimension == 0 {
            return Err(ConfigError::Validation(
                "max_image_dimension must be positive".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.min_text_density) {
            return Err(ConfigError::Validation(format!(
                "min_text_density must be in [0, 1], got: {}",
                self.min_text_density
            )));
        }
        let mut seen = HashSet::new();
        for rule in &self.categories {
            if rule.name.trim().is_empty() {
                return Err(ConfigError::Validation(
                    "category name cannot be empty".to_string(),
                ));
            }
            if !seen.insert(rule.name.to_lowercase()) {
                return Err(ConfigError::Validation(format!(
                    "duplicate category name (case-insensitive): {}",
                    rule.name
                )));
            }
        }
        Ok(())
    }

    /// Set the vault root.
    pub fn with_vault_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.vault_root = root.into();
        self
    }

    /// Set the album name (empty selects whole-library mode).
    pub fn with_album(mut self, album: impl Into<String>) -> Self {
        self.album = album.into();
        self
    }

    /// Set the extraction concurrency cap.
    pub fn with_max_concurrent(mut self, max: usize) -> Self {
        self.max_concurrent_api_calls = max;
        self
    }

    /// Add a category rule.
    pub fn with_category(mut self, rule: CategoryRule) -> Self {
        self.categories.push(rule);
        self
    }

    /// Add a global rule.
    pub fn with_global_rule(mut self, rule: impl Into<String>) -> Self {
        self.global_rules.push(rule.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(name: &str) -> CategoryRule {
        CategoryRule {
            name: name.to_string(),
            hint: None,
            extraction_rules: "extract the text".to_string(),
            write_rule: "one note per item".to_string(),
        }
    }

    #[test]
    fn test_default_config_values() {
        let config = CaptureConfig::default();
        assert_eq!(config.scan_interval_secs, defaults::SCAN_INTERVAL_SECS);
        assert_eq!(
            config.max_concurrent_api_calls,
            defaults::MAX_CONCURRENT_API_CALLS
        );
        assert_eq!(config.min_text_density, defaults::MIN_TEXT_DENSITY);
        assert_eq!(config.min_line_count, defaults::MIN_LINE_COUNT);
        assert!(!config.is_album_scoped());
    }

    #[test]
    fn test_validate_rejects_empty_vault() {
        let config = CaptureConfig::default();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_validate_accepts_minimal_config() {
        let config = CaptureConfig::default().with_vault_root("/tmp/vault");
        config.validate().unwrap();
    }

    #[test]
    fn test_validate_rejects_duplicate_category_names() {
        let config = CaptureConfig::default()
            .with_vault_root("/tmp/vault")
            .with_category(rule("BookNote"))
            .with_category(rule("booknote"));
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("duplicate category"));
    }

    #[test]
    fn test_validate_rejects_zero_concurrency() {
        let config = CaptureConfig::default()
            .with_vault_root("/tmp/vault")
            .with_max_concurrent(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_base_url() {
        let mut config = CaptureConfig::default().with_vault_root("/tmp/vault");
        config.api.base_url = "localhost:1234".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_album_scoping() {
        let config = CaptureConfig::default().with_album("Learning");
        assert!(config.is_album_scoped());
        let config = config.with_album("");
        assert!(!config.is_album_scoped());
    }

    #[test]
    fn test_state_path_under_vault() {
        let config = CaptureConfig::default().with_vault_root("/tmp/vault");
        assert_eq!(
            config.state_path(),
            PathBuf::from("/tmp/vault/.fovea/state.json")
        );
    }

    #[test]
    fn test_from_toml() {
        let toml_str = r#"
            vault_root = "/tmp/vault"
            album = "Learning"
            max_concurrent_api_calls = 2
            default_rule = "capture the gist"
            global_rules = ["only extract book notes"]

            [api]
            model = "vision-large"

            [[categories]]
            name = "BookNote"
            hint = "a photographed book page"
            extraction_rules = "extract quotes and headings"
            write_rule = "one file per book under captures/book_notes"
        "#;
        let config: CaptureConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.album, "Learning");
        assert_eq!(config.max_concurrent_api_calls, 2);
        assert_eq!(config.categories.len(), 1);
        assert_eq!(config.categories[0].name, "BookNote");
        assert_eq!(config.api.model, "vision-large");
        assert_eq!(config.global_rules.len(), 1);
        config.validate().unwrap();
    }
}
