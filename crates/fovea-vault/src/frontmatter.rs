//! Note frontmatter: parse, merge, render.
//!
//! Notes carry a YAML frontmatter block delimited by `---` lines with the
//! keys `title`, `category`, `captured` (ISO-8601), and `asset_ids` (list).
//! Parsing is tolerant: older notes with a singular scalar `asset_id` are
//! accepted, unknown keys are ignored, and a malformed block is treated as
//! body text rather than an error.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use fovea_core::{Error, Result};

/// Parsed note metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Frontmatter {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub title: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub captured: Option<String>,
    pub asset_ids: Vec<String>,
}

/// Accepts both `asset_ids: [..]` and a bare scalar.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

#[derive(Debug, Default, Deserialize)]
struct RawFrontmatter {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    captured: Option<String>,
    #[serde(default)]
    asset_ids: Option<OneOrMany>,
    /// Legacy singular key.
    #[serde(default)]
    asset_id: Option<String>,
}

impl Frontmatter {
    /// Synthesize frontmatter for a freshly created note.
    pub fn new(
        title: &str,
        category: &str,
        captured: DateTime<Utc>,
        asset_id: &str,
    ) -> Self {
        Self {
            title: title.to_string(),
            category: category.to_string(),
            captured: Some(captured.to_rfc3339()),
            asset_ids: vec![asset_id.to_string()],
        }
    }

    /// Add an asset ID if not already present (order-preserving union).
    /// Returns true when the set grew.
    pub fn add_asset_id(&mut self, asset_id: &str) -> bool {
        if self.asset_ids.iter().any(|id| id == asset_id) {
            return false;
        }
        self.asset_ids.push(asset_id.to_string());
        true
    }
}

impl From<RawFrontmatter> for Frontmatter {
    fn from(raw: RawFrontmatter) -> Self {
        let mut asset_ids = Vec::new();
        match raw.asset_ids {
            Some(OneOrMany::Many(ids)) => {
                for id in ids {
                    if !asset_ids.contains(&id) {
                        asset_ids.push(id);
                    }
                }
            }
            Some(OneOrMany::One(id)) => asset_ids.push(id),
            None => {}
        }
        if let Some(id) = raw.asset_id {
            if !asset_ids.contains(&id) {
                asset_ids.push(id);
            }
        }
        Self {
            title: raw.title.unwrap_or_default(),
            category: raw.category.unwrap_or_default(),
            captured: raw.captured,
            asset_ids,
        }
    }
}

/// Split a document into its raw frontmatter block and body, if the
/// delimiter pair is present.
fn split(content: &str) -> Option<(&str, &str)> {
    let rest = content.strip_prefix("---\n")?;
    if let Some(i) = rest.find("\n---\n") {
        Some((&rest[..i], &rest[i + 5..]))
    } else {
        rest.strip_suffix("\n---").map(|block| (block, ""))
    }
}

/// Parse a document into optional frontmatter and its body.
///
/// A missing or malformed block yields `(None, whole document)`.
pub fn parse(content: &str) -> (Option<Frontmatter>, &str) {
    match split(content) {
        Some((block, body)) => match serde_yaml::from_str::<RawFrontmatter>(block) {
            Ok(raw) => (Some(raw.into()), body),
            Err(_) => (None, content),
        },
        None => (None, content),
    }
}

/// Extract every asset ID referenced by a document's frontmatter.
pub fn parse_asset_ids(content: &str) -> Vec<String> {
    match parse(content) {
        (Some(fm), _) => fm.asset_ids,
        (None, _) => Vec::new(),
    }
}

/// Render frontmatter and body into a complete document.
pub fn compose(fm: &Frontmatter, body: &str) -> Result<String> {
    let yaml = serde_yaml::to_string(fm)
        .map_err(|e| Error::Serialization(format!("frontmatter render failed: {}", e)))?;
    let body = body.trim_start_matches('\n');
    let mut doc = format!("---\n{}---\n\n{}", yaml, body);
    if !doc.ends_with('\n') {
        doc.push('\n');
    }
    Ok(doc)
}
