//! Extraction response parsing.
//!
//! The remote capability returns a text completion expected to hold one
//! JSON object. Models like to wrap JSON in markdown fences; those are
//! stripped first. Unknown or missing fields degrade to safe defaults,
//! category names are resolved case-insensitively against the configured
//! rules (never fabricating a new category), and empty content for a
//! non-skip plan is an error rather than a silent empty note.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

use fovea_core::defaults;
use fovea_core::models::{CategoryRule, ExtractionResult, WriteMode, WritePlan};
use fovea_core::{Error, Result};

static FENCE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^```(?:json)?\s*(.*?)\s*```$").expect("fence regex")
});

#[derive(Debug, Deserialize)]
struct WireResponse {
    #[serde(default)]
    category: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    write: WritePlan,
}

/// Strip an optional markdown code fence wrapping the whole response.
fn strip_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    match FENCE_RE.captures(trimmed) {
        Some(caps) => caps.get(1).map(|m| m.as_str()).unwrap_or(trimmed),
        None => trimmed,
    }
}

/// Resolve a wire category string against the configured rule names,
/// case-insensitively, falling back to `"default"`.
fn resolve_category(wire: &str, categories: &[CategoryRule]) -> String {
    let trimmed = wire.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case(defaults::DEFAULT_CATEGORY) {
        return defaults::DEFAULT_CATEGORY.to_string();
    }
    categories
        .iter()
        .find(|r| r.name.eq_ignore_ascii_case(trimmed))
        .map(|r| r.name.clone())
        .unwrap_or_else(|| defaults::DEFAULT_CATEGORY.to_string())
}

/// Parse one raw completion into an [`ExtractionResult`].
pub fn parse_response(
    raw: &str,
    categories: &[CategoryRule],
    asset_id: &str,
) -> Result<ExtractionResult> {
    let body = strip_fences(raw);
    let wire: WireResponse = serde_json::from_str(body)
        .map_err(|e| Error::InvalidResponse(format!("{} (asset {})", e, asset_id)))?;

    let category = resolve_category(&wire.category, categories);

    if wire.write.mode != WriteMode::Skip && wire.content.trim().is_empty() {
        return Err(Error::NoContent(asset_id.to_string()));
    }

    Ok(ExtractionResult {
        category,
        title: wire.title,
        content: wire.content,
        write_plan: wire.write,
    })
}
