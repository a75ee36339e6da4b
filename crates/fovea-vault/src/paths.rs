//! Path resolution and sanitization for write plans.
//!
//! Paths arriving in a write plan come from a remote model and are
//! untrusted. Violations (traversal, absolute paths, home-relative paths)
//! do not fail the candidate; they fall back to a synthesized default that
//! always stays inside the capture root.

use fovea_core::defaults;

/// Characters stripped from path segments and file names.
const FORBIDDEN: &[char] = &[':', '/', '\\', '?', '"', '<', '>', '|', '*'];

/// Sanitize one path segment. Returns `None` when the segment is unusable
/// (empty after stripping, or a traversal attempt).
pub fn sanitize_segment(segment: &str) -> Option<String> {
    let cleaned: String = segment
        .chars()
        .filter(|c| !FORBIDDEN.contains(c) && !c.is_control())
        .collect();
    let cleaned = cleaned.trim().to_string();
    if cleaned.is_empty() || cleaned == ".." || cleaned == "." {
        return None;
    }
    Some(cleaned)
}

/// Sanitize an asset ID for use as a file name. Asset IDs may contain
/// slashes and other separator characters; these become underscores.
pub fn sanitize_asset_id(asset_id: &str) -> String {
    let cleaned: String = asset_id
        .chars()
        .map(|c| {
            if FORBIDDEN.contains(&c) || c.is_control() || c.is_whitespace() {
                '_'
            } else {
                c
            }
        })
        .collect();
    if cleaned.is_empty() {
        "unnamed".to_string()
    } else {
        cleaned
    }
}

/// Synthesize the default path for an extraction with no usable plan path.
pub fn default_path(category: &str, asset_id: &str) -> String {
    let file = format!("{}.md", sanitize_asset_id(asset_id));
    let category = category.trim();
    if category.is_empty() || category.eq_ignore_ascii_case(defaults::DEFAULT_CATEGORY) {
        return format!("{}/notes/unknown/{}", defaults::CAPTURE_ROOT, file);
    }
    match sanitize_segment(category) {
        Some(seg) => format!("{}/{}/{}", defaults::CAPTURE_ROOT, seg, file),
        None => format!("{}/notes/unknown/{}", defaults::CAPTURE_ROOT, file),
    }
}

/// Resolve a write-plan path into a safe vault-relative path.
///
/// Returns the resolved path and whether the synthesized default was used
/// as a fallback.
pub fn resolve(plan_path: &str, category: &str, asset_id: &str) -> (String, bool) {
    let trimmed = plan_path.trim();
    if trimmed.is_empty() {
        return (default_path(category, asset_id), true);
    }
    // Absolute and home-relative paths never resolve inside the vault.
    if trimmed.starts_with('/') || trimmed.starts_with('~') || trimmed.starts_with('\\') {
        return (default_path(category, asset_id), true);
    }

    let mut segments = Vec::new();
    for raw in trimmed.split('/') {
        if raw == ".." {
            return (default_path(category, asset_id), true);
        }
        match sanitize_segment(raw) {
            Some(seg) => segments.push(seg),
            None => return (default_path(category, asset_id), true),
        }
    }
    if segments.is_empty() {
        return (default_path(category, asset_id), true);
    }

    let mut path = segments.join("/");
    if !path.to_lowercase().ends_with(".md") {
        path.push_str(".md");
    }
    (path, false)
}
