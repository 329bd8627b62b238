//! Text helpers shared by the extractors: whitespace handling, the capability
//! keyword set, and the count/size/context/modality token parsers.

use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

/// Closed set of capability badges recognised anywhere in the catalog.
pub const CAPABILITY_KEYWORDS: &[&str] = &[
    "tools",
    "thinking",
    "vision",
    "embedding",
    "multimodal",
    "reasoning",
];

/// Upper bound on stored descriptions, in characters.
pub const DESCRIPTION_LIMIT: usize = 2000;

static PULLS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b([0-9][0-9,]*(?:\.[0-9]+)?)\s*([KMB])?\s*Pulls\b").expect("pulls regex must compile")
});

static DOWNLOADS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b([0-9][0-9,]*(?:\.[0-9]+)?)\s*([KMB])?\s*Downloads\b")
        .expect("downloads regex must compile")
});

static SIZE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b([0-9]+(?:\.[0-9]+)?)([KMG]B)\b").expect("size regex must compile")
});

static CONTEXT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b([0-9]+(?:\.[0-9]+)?K)\b").expect("context regex must compile"));

static MODALITY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(text|vision|audio|image)\b").expect("modality regex must compile")
});

static KEYWORD_RES: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    CAPABILITY_KEYWORDS
        .iter()
        .map(|kw| {
            let re = Regex::new(&format!(r"(?i)\b{}\b", regex::escape(kw)))
                .expect("keyword regex must compile");
            (*kw, re)
        })
        .collect()
});

/// A popularity figure and the text it was read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Count {
    pub value: u64,
    pub raw: String,
}

/// A byte size and the text it was read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Size {
    pub bytes: u64,
    pub raw: String,
}

pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Truncates to at most `limit` characters (not bytes).
pub fn truncate_chars(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((end, _)) => text[..end].to_string(),
        None => text.to_string(),
    }
}

/// Whitespace-separated words of `text` that are capability keywords, lowercased.
pub fn capability_words(text: &str) -> BTreeSet<String> {
    text.split_whitespace()
        .map(str::to_lowercase)
        .filter(|word| CAPABILITY_KEYWORDS.contains(&word.as_str()))
        .collect()
}

/// Capability keywords appearing anywhere in `text` as whole words.
pub fn capability_mentions(text: &str) -> BTreeSet<String> {
    KEYWORD_RES
        .iter()
        .filter(|(_, re)| re.is_match(text))
        .map(|(kw, _)| kw.to_string())
        .collect()
}

/// Removes whole-word occurrences of the given capability keywords.
pub fn strip_capabilities(text: &str, capabilities: &BTreeSet<String>) -> String {
    KEYWORD_RES
        .iter()
        .filter(|(kw, _)| capabilities.contains(*kw))
        .fold(text.to_string(), |acc, (_, re)| re.replace_all(&acc, "").into_owned())
}

/// Parses `"<number>[K|M|B] Pulls"`.
pub fn parse_pulls(text: &str) -> Option<Count> {
    parse_count(&PULLS_RE, text)
}

/// Parses `"<number>[K|M|B] Downloads"`.
pub fn parse_downloads(text: &str) -> Option<Count> {
    parse_count(&DOWNLOADS_RE, text)
}

fn parse_count(re: &Regex, text: &str) -> Option<Count> {
    let caps = re.captures(text)?;
    let number: f64 = caps[1].replace(',', "").parse().ok()?;
    let multiplier = match caps.get(2).map(|m| m.as_str().to_ascii_uppercase()) {
        Some(suffix) if suffix == "K" => 1e3,
        Some(suffix) if suffix == "M" => 1e6,
        Some(suffix) if suffix == "B" => 1e9,
        _ => 1.0,
    };
    Some(Count {
        value: (number * multiplier).round() as u64,
        raw: caps[0].to_string(),
    })
}

/// Parses the first `<number><KB|MB|GB>` token using binary multipliers.
pub fn parse_size(text: &str) -> Option<Size> {
    let caps = SIZE_RE.captures(text)?;
    let number: f64 = caps[1].parse().ok()?;
    let multiplier = match caps[2].to_ascii_uppercase().as_str() {
        "KB" => 1024f64,
        "MB" => 1024f64.powi(2),
        _ => 1024f64.powi(3),
    };
    Some(Size {
        bytes: (number * multiplier).round() as u64,
        raw: caps[0].to_string(),
    })
}

/// First `<number>K` token, e.g. `8K` or `128K`.
pub fn parse_context(text: &str) -> Option<String> {
    CONTEXT_RE.captures(text).map(|caps| caps[1].to_string())
}

/// First input modality keyword, capitalised (`Text`, `Vision`, ...).
pub fn parse_modality(text: &str) -> Option<String> {
    MODALITY_RE.captures(text).map(|caps| capitalize(&caps[1]))
}

fn capitalize(word: &str) -> String {
    let lower = word.to_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
