//! Prompt compilation from user-declared category rules.
//!
//! The system prompt carries the full extraction policy: every configured
//! category with its natural-language rules, the global rules, and the
//! response contract (JSON wire schema, path-safety constraints, skip
//! semantics). The per-photo user prompt supplies the asset context the
//! capability needs to turn vague placement hints into literal paths.

use chrono::{DateTime, Utc};

use fovea_core::defaults;
use fovea_core::models::{CategoryRule, ClassificationResult};

/// Compile the system prompt from the configured rules.
pub fn build_system_prompt(
    categories: &[CategoryRule],
    default_rule: &str,
    global_rules: &[String],
) -> String {
    let mut p = String::new();
    p.push_str(
        "You are an extraction engine for a personal knowledge vault. You \
         receive one photo and must decide which configured category it \
         belongs to, extract its content as markdown, and produce a concrete \
         write plan.\n\n",
    );

    if !global_rules.is_empty() {
        p.push_str("Global rules (these override everything else):\n");
        for rule in global_rules {
            p.push_str("- ");
            p.push_str(rule);
            p.push('\n');
        }
        p.push('\n');
    }

    p.push_str("Configured categories:\n");
    for rule in categories {
        p.push_str(&format!("### {}\n", rule.name));
        if let Some(hint) = &rule.hint {
            p.push_str(&format!("Looks like: {}\n", hint));
        }
        p.push_str(&format!("Extraction rules: {}\n", rule.extraction_rules));
        p.push_str(&format!("Write rules: {}\n\n", rule.write_rule));
    }
    p.push_str(&format!("### {}\n", defaults::DEFAULT_CATEGORY));
    if default_rule.is_empty() {
        p.push_str("Extraction rules: capture the useful text as markdown.\n\n");
    } else {
        p.push_str(&format!("Extraction rules: {}\n\n", default_rule));
    }

    p.push_str(
        "Respond with a single JSON object and nothing else:\n\
         {\n\
         \x20 \"category\": \"<one configured category name, or 'default'>\",\n\
         \x20 \"title\": \"<short note title>\",\n\
         \x20 \"content\": \"<markdown body, no frontmatter>\",\n\
         \x20 \"write\": {\n\
         \x20   \"mode\": \"create|append|upsert|skip\",\n\
         \x20   \"path\": \"<vault-relative path ending in .md>\",\n\
         \x20   \"append_to\": \"<optional anchor line to insert after>\"\n\
         \x20 }\n\
         }\n\n\
         Constraints:\n\
         - Pick exactly one configured category name, or 'default'. Never \
           invent a new one.\n\
         - content is plain markdown with no frontmatter block.\n\
         - write.path must be relative, contain no '..' segments, and stay \
           under 'captures/'. Translate vague placement rules (like a monthly \
           note per language) into a literal path using the asset context \
           below.\n\
         - If the global rules exclude this photo, respond with mode 'skip', \
           an empty content string, and an empty path.\n",
    );
    p
}

/// Compile the per-photo user prompt.
pub fn build_user_prompt(
    asset_id: &str,
    captured: DateTime<Utc>,
    classification: &ClassificationResult,
) -> String {
    let mut p = String::new();
    p.push_str("Extract this photo.\n\n");
    p.push_str("Asset context:\n");
    p.push_str(&format!("- asset_id: {}\n", asset_id));
    p.push_str(&format!("- captured: {}\n", captured.to_rfc3339()));
    p.push_str(&format!(
        "- local pre-filter hint: {} (confidence {:.2})\n",
        classification.category_hint, classification.confidence
    ));
    if !classification.ocr_text.is_empty() {
        // The hint text helps the model; it is context, never a gate.
        let excerpt: String = classification.ocr_text.chars().take(500).collect();
        p.push_str(&format!("- on-device OCR excerpt:\n{}\n", excerpt));
    }
    p
}
