//! Fixed keyword tables for the pre-filter.
//!
//! All matching is case-insensitive substring matching against the
//! concatenated OCR text. The tables are deliberately small and fixed; the
//! pre-filter is a heuristic, not a trained classifier.

/// General learning vocabulary. Two or more matches (with enough text
/// lines) qualify a photo as learning content at low confidence.
pub const LEARNING_KEYWORDS: &[&str] = &[
    "chapter",
    "definition",
    "theorem",
    "vocabulary",
    "grammar",
    "lesson",
    "exercise",
    "example",
    "summary",
    "glossary",
    "flashcard",
    "study",
    "quiz",
    "translate",
    "meaning",
    "formula",
    "syntax",
    "algorithm",
    "highlight",
];

/// Duolingo exercise vocabulary. Two or more matches pin the photo to the
/// duolingo category at the highest confidence.
pub const DUOLINGO_KEYWORDS: &[&str] = &[
    "duolingo",
    "write this in",
    "translate this sentence",
    "tap what you hear",
    "type what you hear",
    "complete the sentence",
    "select the missing word",
    "mark the correct meaning",
    "match the pairs",
    "tap the pairs",
];

/// Code-syntax tokens. Three or more matches suggest a code snippet.
pub const CODE_TOKENS: &[&str] = &[
    "fn ",
    "def ",
    "class ",
    "import ",
    "return",
    "=>",
    "};",
    "let ",
    "const ",
    "var ",
    "public ",
    "private ",
    "#include",
    "function",
    "print(",
    "println",
    "-> ",
    "if (",
    "for (",
];

/// Web/article layout patterns. Two or more matches suggest a saved
/// article screenshot.
pub const ARTICLE_PATTERNS: &[&str] = &[
    "min read",
    "subscribe",
    "newsletter",
    "published",
    "share this",
    "comments",
    "http://",
    "https://",
    "www.",
    "continue reading",
    "sign up",
];

/// Note-taking trigger words.
pub const NOTE_TRIGGERS: &[&str] = &[
    "todo",
    "to-do",
    "remember",
    "note:",
    "idea:",
    "important",
    "don't forget",
    "action items",
    "recap",
];

/// Count how many entries of `table` occur in `haystack` (already
/// lowercased by the caller).
pub fn count_matches(haystack: &str, table: &[&str]) -> usize {
    table.iter().filter(|kw| haystack.contains(*kw)).count()
}

/// Collect matching entries of `table` in table order, no duplicates.
pub fn collect_matches(haystack: &str, table: &[&str]) -> Vec<String> {
    table
        .iter()
        .filter(|kw| haystack.contains(*kw))
        .map(|kw| kw.to_string())
        .collect()
}
