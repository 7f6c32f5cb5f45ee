use std::sync::LazyLock;

use regex::Regex;

/// Words that only add noise to a marketplace search.
pub const NOISE_WORDS: &[&str] = &[
    "booth",
    "gumroad",
    "avatar",
    "アバター",
    "unity",
    "vrc",
    "vrchat",
];

static BRACKETS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\[\]【】()（）]").unwrap());
static VERSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)_?v(?:er)?\.?\d+(?:\.\d+)*").unwrap());
static NOISE_RE: LazyLock<Regex> = LazyLock::new(|| {
    let alternation = NOISE_WORDS
        .iter()
        .map(|w| regex::escape(w))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"(?i)\b(?:{alternation})\b")).unwrap()
});
static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Turns folder names into marketplace search phrases.
#[derive(Clone)]
pub struct QueryNormalizer;

impl Default for QueryNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryNormalizer {
    pub fn new() -> Self {
        Self
    }

    /// Strips bracket glyphs, version tokens and noise words, then collapses whitespace.
    ///
    /// May return an empty string; use [`QueryNormalizer::search_query`] when the
    /// result feeds a search.
    pub fn normalize(&self, folder_name: &str) -> String {
        let cleaned = BRACKETS_RE.replace_all(folder_name, " ");
        let cleaned = VERSION_RE.replace_all(&cleaned, " ");
        let cleaned = NOISE_RE.replace_all(&cleaned, " ");
        let cleaned = cleaned.replace('_', " ");
        WHITESPACE_RE.replace_all(&cleaned, " ").trim().to_string()
    }

    /// Like [`normalize`](Self::normalize) but never empty: falls back to the
    /// original folder name verbatim.
    pub fn search_query(&self, folder_name: &str) -> String {
        let cleaned = self.normalize(folder_name);
        if cleaned.is_empty() {
            folder_name.to_string()
        } else {
            cleaned
        }
    }
}
