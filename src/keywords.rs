//! Keyword frequency mined from repository names and READMEs.
//!
//! Text is lowercased and split into runs of ASCII letters and digits. Short
//! words and a fixed list of filler words are discarded so that what remains
//! says something about the account's topics rather than about Markdown,
//! URLs or generic project boilerplate.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;

const MIN_WORD_LEN: usize = 3;

static WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[a-z0-9]+").expect("static regex"));

static STOP_WORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "https", "http", "href", "com", "github", "bash", "www", "org", "de", "a", "about", "an",
        "and", "are", "as", "at", "be", "by", "for", "from", "how", "i", "in", "is", "it", "of",
        "on", "or", "that", "the", "this", "to", "was", "what", "when", "where", "who", "will",
        "with", "he", "she", "they", "we", "me", "you", "my", "your", "our", "do", "not", "have",
        "were", "if", "then", "else", "while", "code", "file", "files", "gem", "build", "setup",
        "config", "run", "installation", "usage", "license", "mit", "gpl", "data", "lib", "docs",
        "new", "get", "use", "using", "via", "these", "those", "example", "examples", "please",
        "feel", "free", "more", "also", "just", "like", "some", "any", "all", "its", "can",
        "readme", "md", "out", "there", "because", "been", "through", "into", "only", "repo",
        "repository", "project", "projects", "app", "application", "service", "api", "client",
        "server", "test", "tests", "feature", "features", "version", "update", "release",
        "change", "fix", "add", "remove", "refactor", "style", "chore", "ci", "performance",
        "security", "support", "help", "contact", "information", "details", "note", "important",
    ]
    .into_iter()
    .collect()
});

/// Returns the words of `text` that count as keywords, in order of appearance.
pub fn extract(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    WORD.find_iter(&lowered)
        .map(|m| m.as_str())
        .filter(|w| w.len() >= MIN_WORD_LEN && !STOP_WORDS.contains(w))
        .map(str::to_owned)
        .collect()
}

/// Repository names use `-` and `_` as word separators.
pub fn split_repo_name(name: &str) -> String {
    name.replace(['-', '_'], " ")
}

#[derive(Debug, Default, Clone)]
pub struct KeywordCounter {
    counts: HashMap<String, u64>,
}

impl KeywordCounter {
    pub fn add_text(&mut self, text: &str) {
        for word in extract(text) {
            *self.counts.entry(word).or_default() += 1;
        }
    }

    pub fn add_repo_name(&mut self, name: &str) {
        self.add_text(&split_repo_name(name));
    }

    #[cfg(test)]
    pub fn get(&self, word: &str) -> u64 {
        self.counts.get(word).copied().unwrap_or(0)
    }

    /// Most frequent words first; equal counts are ordered alphabetically.
    pub fn top(&self, n: usize) -> Vec<(String, u64)> {
        let mut ranked: Vec<(String, u64)> =
            self.counts.iter().map(|(w, c)| (w.clone(), *c)).collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(n);
        ranked
    }
}
