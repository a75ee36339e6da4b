//! Vault-authoritative dedup scan.
//!
//! Walks the capture tree and collects every asset ID embedded in note
//! frontmatter. A photo whose ID appears anywhere in the tree has already
//! been captured, regardless of what the cached state file says. Deleting
//! a note therefore makes its source photos eligible again.

use std::collections::HashSet;
use std::path::Path;

use tracing::{debug, warn};
use walkdir::WalkDir;

use fovea_core::defaults;
use fovea_core::Result;

use crate::frontmatter;

/// Collect every asset ID referenced by notes under the vault's capture
/// root. A missing capture root is an empty vault, not an error. Notes
/// that cannot be read are skipped with a warning so one bad file does
/// not block a scan.
pub fn existing_asset_ids(vault_root: &Path) -> Result<HashSet<String>> {
    let capture_root = vault_root.join(defaults::CAPTURE_ROOT);
    let mut ids = HashSet::new();
    if !capture_root.exists() {
        debug!(root = %capture_root.display(), "capture root missing, vault is empty");
        return Ok(ids);
    }

    let mut notes = 0usize;
    for entry in WalkDir::new(&capture_root)
        .follow_links(false)
        .into_iter()
        .filter_map(|e| match e {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(error = %e, "skipping unreadable vault entry");
                None
            }
        })
    {
        if !entry.file_type().is_file() {
            continue;
        }
        if entry.path().extension().and_then(|e| e.to_str()) != Some("md") {
            continue;
        }
        match std::fs::read_to_string(entry.path()) {
            Ok(content) => {
                notes += 1;
                for id in frontmatter::parse_asset_ids(&content) {
                    ids.insert(id);
                }
            }
            Err(e) => {
                warn!(path = %entry.path().display(), error = %e, "skipping unreadable note");
            }
        }
    }

    debug!(notes, asset_ids = ids.len(), "vault dedup scan complete");
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_note(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    #[test]
    fn test_missing_capture_root_is_empty() {
        let dir = TempDir::new().unwrap();
        assert!(existing_asset_ids(dir.path()).unwrap().is_empty());
    }

    #[test]
    fn test_collects_ids_across_tree() {
        let dir = TempDir::new().unwrap();
        write_note(
            dir.path(),
            "captures/books/sapiens.md",
            "---\nasset_ids:\n- A1\n- A2\n---\nbody\n",
        );
        write_note(
            dir.path(),
            "captures/languages/spanish/log.md",
            "---\nasset_ids:\n- A3\n---\nbody\n",
        );
        let ids = existing_asset_ids(dir.path()).unwrap();
        assert_eq!(ids.len(), 3);
        assert!(ids.contains("A1") && ids.contains("A2") && ids.contains("A3"));
    }

    #[test]
    fn test_legacy_scalar_key_counts() {
        let dir = TempDir::new().unwrap();
        write_note(
            dir.path(),
            "captures/old.md",
            "---\nasset_id: LEGACY\n---\nbody\n",
        );
        let ids = existing_asset_ids(dir.path()).unwrap();
        assert!(ids.contains("LEGACY"));
    }

    #[test]
    fn test_ignores_non_markdown_and_frontmatterless_files() {
        let dir = TempDir::new().unwrap();
        write_note(dir.path(), "captures/image.png", "not a note");
        write_note(dir.path(), "captures/plain.md", "no frontmatter\n");
        assert!(existing_asset_ids(dir.path()).unwrap().is_empty());
    }

    #[test]
    fn test_notes_outside_capture_root_ignored() {
        let dir = TempDir::new().unwrap();
        write_note(
            dir.path(),
            "journal/today.md",
            "---\nasset_ids:\n- ELSEWHERE\n---\n",
        );
        assert!(existing_asset_ids(dir.path()).unwrap().is_empty());
    }
}
