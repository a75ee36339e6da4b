//! The write planner / merger.
//!
//! Turns an extraction's write plan into a filesystem mutation against the
//! vault. Every write is a whole-file atomic replace (write-to-temp then
//! rename) so external sync agents never observe a partially written note.

use chrono::{DateTime, Utc};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use fovea_core::models::{ExtractionResult, WriteMode};
use fovea_core::{Error, Result};

use crate::frontmatter::{self, Frontmatter};
use crate::paths;

/// Writes and merges notes under a vault root.
pub struct VaultWriter {
    vault_root: PathBuf,
}

impl VaultWriter {
    pub fn new(vault_root: impl Into<PathBuf>) -> Self {
        Self {
            vault_root: vault_root.into(),
        }
    }

    pub fn vault_root(&self) -> &Path {
        &self.vault_root
    }

    /// Apply one extraction to the vault.
    ///
    /// Returns the vault-relative path written, or `None` for a skip plan.
    /// The resulting file always carries a frontmatter block whose
    /// `asset_ids` is the union of its prior value and `asset_id`.
    pub fn write(
        &self,
        extraction: &ExtractionResult,
        captured: DateTime<Utc>,
        asset_id: &str,
    ) -> Result<Option<String>> {
        let plan = &extraction.write_plan;
        if plan.mode == WriteMode::Skip {
            debug!(asset_id, "write plan is skip, no mutation");
            return Ok(None);
        }

        let (rel, fell_back) = paths::resolve(&plan.path, &extraction.category, asset_id);
        if fell_back && !plan.path.trim().is_empty() {
            // Misbehaving plan paths degrade to the synthesized default
            // instead of failing the candidate.
            warn!(asset_id, plan_path = %plan.path, fallback = %rel, "unsafe plan path, using default");
        }

        let abs = self.vault_root.join(&rel);
        if let Some(parent) = abs.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let written_rel = match plan.mode {
            WriteMode::Create => self.create(&abs, &rel, extraction, captured, asset_id)?,
            WriteMode::Append | WriteMode::Upsert => {
                self.merge(&abs, &rel, extraction, captured, asset_id)?
            }
            WriteMode::Skip => unreachable!("skip handled above"),
        };

        debug!(asset_id, path = %written_rel, mode = %plan.mode, "note written");
        Ok(Some(written_rel))
    }

    /// Create a fresh note, never overwriting: an existing target shifts
    /// the new file to the next free numeric suffix.
    fn create(
        &self,
        abs: &Path,
        rel: &str,
        extraction: &ExtractionResult,
        captured: DateTime<Utc>,
        asset_id: &str,
    ) -> Result<String> {
        let (target_abs, target_rel) = if abs.exists() {
            next_available(abs, rel)?
        } else {
            (abs.to_path_buf(), rel.to_string())
        };
        let fm = Frontmatter::new(&extraction.title, &extraction.category, captured, asset_id);
        let doc = frontmatter::compose(&fm, &extraction.content)?;
        self.write_atomic(&target_abs, &doc)?;
        Ok(target_rel)
    }

    /// Append/upsert: merge into an existing note, or create it fresh.
    fn merge(
        &self,
        abs: &Path,
        rel: &str,
        extraction: &ExtractionResult,
        captured: DateTime<Utc>,
        asset_id: &str,
    ) -> Result<String> {
        if !abs.exists() {
            let fm =
                Frontmatter::new(&extraction.title, &extraction.category, captured, asset_id);
            let doc = frontmatter::compose(&fm, &extraction.content)?;
            self.write_atomic(abs, &doc)?;
            return Ok(rel.to_string());
        }

        let existing = std::fs::read_to_string(abs)?;
        let (fm, body) = frontmatter::parse(&existing);
        let mut fm = fm.unwrap_or_else(|| {
            // Pre-existing note without frontmatter: synthesize one.
            Frontmatter {
                title: extraction.title.clone(),
                category: extraction.category.clone(),
                captured: Some(captured.to_rfc3339()),
                asset_ids: Vec::new(),
            }
        });
        fm.add_asset_id(asset_id);

        // Models routinely emit "" for optional fields; a blank anchor
        // means no anchor, not "match the first blank line".
        let anchor = extraction
            .write_plan
            .append_to
            .as_deref()
            .map(str::trim)
            .filter(|a| !a.is_empty());
        let merged = merge_body(body, &extraction.content, anchor);
        let doc = frontmatter::compose(&fm, &merged)?;
        self.write_atomic(abs, &doc)?;
        Ok(rel.to_string())
    }

    /// Whole-file atomic replace: write to a temp file in the same
    /// directory, then rename over the target.
    fn write_atomic(&self, abs: &Path, contents: &str) -> Result<()> {
        let parent = abs
            .parent()
            .ok_or_else(|| Error::Write(format!("no parent directory: {}", abs.display())))?;
        let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
        tmp.write_all(contents.as_bytes())?;
        tmp.flush()?;
        tmp.persist(abs)
            .map_err(|e| Error::Write(format!("rename into {} failed: {}", abs.display(), e)))?;
        Ok(())
    }
}

/// Find the next free `name-N.md` beside an existing `name.md`.
fn next_available(abs: &Path, rel: &str) -> Result<(PathBuf, String)> {
    let rel_stem = rel.strip_suffix(".md").unwrap_or(rel);
    let parent = abs
        .parent()
        .ok_or_else(|| Error::Write(format!("no parent directory: {}", abs.display())))?;
    let stem = abs
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| Error::Write(format!("unusable file name: {}", abs.display())))?;
    for n in 2..10_000u32 {
        let candidate = parent.join(format!("{}-{}.md", stem, n));
        if !candidate.exists() {
            return Ok((candidate, format!("{}-{}.md", rel_stem, n)));
        }
    }
    Err(Error::Write(format!(
        "no free suffix for {}",
        abs.display()
    )))
}

/// Merge a new content block into an existing body.
///
/// With an anchor: insert immediately after the matching line (trimmed
/// exact match), creating the anchor section at end of file when absent.
/// Without one: append at end of file. A leading line of the new block
/// that repeats the anchor is dropped so headings don't duplicate.
fn merge_body(existing: &str, new_block: &str, anchor: Option<&str>) -> String {
    let block = match anchor {
        Some(a) => strip_leading_anchor(new_block, a),
        None => new_block.trim(),
    };

    if let Some(a) = anchor {
        let lines: Vec<&str> = existing.lines().collect();
        if let Some(i) = lines.iter().position(|l| l.trim() == a.trim()) {
            let mut out = String::new();
            for (idx, line) in lines.iter().enumerate() {
                out.push_str(line);
                out.push('\n');
                if idx == i {
                    out.push_str(block);
                    out.push('\n');
                }
            }
            return out;
        }
        // Anchor specified but absent: create the section at end of file.
        return format!(
            "{}\n\n{}\n\n{}\n",
            existing.trim_end(),
            a.trim(),
            block
        );
    }

    format!("{}\n\n{}\n", existing.trim_end(), block)
}

/// Drop a leading line that redundantly repeats the anchor.
fn strip_leading_anchor<'a>(block: &'a str, anchor: &str) -> &'a str {
    let trimmed = block.trim();
    if let Some(first_line) = trimmed.lines().next() {
        if first_line.trim() == anchor.trim() {
            return trimmed[first_line.len()..].trim_start();
        }
    }
    trimmed
}
