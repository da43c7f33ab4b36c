//! Keyword matching and continuation detection.

use crate::config::{CategoryConfig, ContinuationConfig, ContinuationMode};
use regex::RegexSet;
use std::collections::BTreeMap;

/// Category names that ship with the router, in keyword priority order.
pub const BUILTIN_CATEGORIES: [&str; 4] = ["code", "reasoning", "conversation", "tools"];

/// Category used whenever nothing more specific applies.
pub const FALLBACK_CATEGORY: &str = "conversation";

/// Category for requests carrying tool definitions.
pub const TOOLS_CATEGORY: &str = "tools";

pub const CODE_KEYWORDS: &[&str] = &[
    "code", "python", "javascript", "function", "class", "def ", "import ", "bug", "debug",
    "error", "refactor", "api", "http", "json", "sql", "file", "script", "terminal", "git",
    "commit", "push", "pull", "react", "vue", "node", "typescript", "java", "c++", "rust", "go",
    "write code", "create function", "fix ", "solve",
];

pub const REASONING_KEYWORDS: &[&str] = &[
    "why", "how", "explain", "analyze", "think", "reason", "prove", "math", "calculate",
    "solution", "logic", "problem", "determine", "compare", "differentiate", "evaluate", "assess",
    "complex", "research", "study", "understand", "concept", "theory",
];

pub const CONVERSATION_KEYWORDS: &[&str] = &[
    "hello", "hi", "hey", "thanks", "thank you", "please", "sorry", "yes", "no", "ok", "okay",
    "sure", "what", "who", "when", "where", "天气", "weather", "news", "info", "help",
];

/// Trivial acknowledgements treated as continuations of the previous turn.
pub const CONTINUATION_PATTERNS: &[&str] = &[
    r"^ok$",
    r"^okay$",
    r"^yes$",
    r"^no$",
    r"^thanks?$",
    r"^please$",
    r"^sure$",
    r"^right$",
    r"^got it$",
    r"^cool$",
    r"^nice$",
    r"^[\x{4e00}-\x{9fff}]+$",
    r"^[a-zA-Z]{1,3}$",
];

pub fn is_builtin(category: &str) -> bool {
    BUILTIN_CATEGORIES.contains(&category)
}

/// Category names in keyword priority order: custom categories first
/// (alphabetical), then the built-ins that are configured.
pub fn priority_order(categories: &BTreeMap<String, CategoryConfig>) -> Vec<&str> {
    let custom = categories
        .keys()
        .map(String::as_str)
        .filter(|name| !is_builtin(name));
    let builtin = BUILTIN_CATEGORIES
        .iter()
        .copied()
        .filter(|name| categories.contains_key(*name));
    custom.chain(builtin).collect()
}

/// Case-insensitive substring scan. Returns the first category in priority
/// order whose keyword list matches, or `None`.
pub fn match_keywords<'a>(
    categories: &'a BTreeMap<String, CategoryConfig>,
    message: &str,
) -> Option<&'a str> {
    let haystack = message.to_lowercase();

    for name in priority_order(categories) {
        let Some((key, category)) = categories.get_key_value(name) else {
            continue;
        };
        let hit = category
            .keywords
            .iter()
            .filter(|kw| !kw.is_empty())
            .any(|kw| haystack.contains(&kw.to_lowercase()));
        if hit {
            return Some(key.as_str());
        }
    }
    None
}

/// Decides whether a message is a trivial follow-up.
#[derive(Debug, Clone)]
pub enum ContinuationDetector {
    /// Message (trimmed, lower-cased) matches one of a fixed set of patterns
    Patterns(RegexSet),
    /// Message has at least one and fewer than `n` words
    WordCount(usize),
}

impl ContinuationDetector {
    pub fn from_config(config: &ContinuationConfig) -> Result<Self, regex::Error> {
        match config.mode {
            ContinuationMode::WordCount => Ok(Self::WordCount(config.word_threshold)),
            ContinuationMode::Patterns => {
                let patterns: Vec<String> = if config.patterns.is_empty() {
                    CONTINUATION_PATTERNS.iter().map(|p| format!("(?i){}", p)).collect()
                } else {
                    config.patterns.iter().map(|p| format!("(?i){}", p)).collect()
                };
                Ok(Self::Patterns(RegexSet::new(patterns)?))
            }
        }
    }

    pub fn is_continuation(&self, message: &str) -> bool {
        match self {
            Self::Patterns(set) => set.is_match(&message.trim().to_lowercase()),
            Self::WordCount(threshold) => {
                let words = message.split_whitespace().count();
                words > 0 && words < *threshold
            }
        }
    }
}

impl Default for ContinuationDetector {
    fn default() -> Self {
        // Built-in patterns are known to compile.
        Self::from_config(&ContinuationConfig::default()).unwrap_or(Self::WordCount(3))
    }
}
