use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::error::GithubError;
use crate::github::{RepoSource, Repository};
use crate::keywords::KeywordCounter;
use crate::span::Span;

/// Blobs at or above this size are not downloaded.
pub const MAX_BLOB_SIZE: u64 = 1_000_000;

/// Languages at or below this share of total bytes are left out of the report.
pub const MIN_LANGUAGE_SHARE: f64 = 0.1;

/// Running totals over all repositories of one account.
#[derive(Debug, Default)]
pub struct Stats {
    pub repo_names: Vec<String>,
    pub first_activity: Option<DateTime<Utc>>,
    pub last_activity: Option<DateTime<Utc>>,
    pub language_bytes: BTreeMap<String, u64>,
    pub doc_lines: u64,
    pub code_lines: u64,
    pub commits: u64,
    pub keywords: KeywordCounter,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LanguageShare {
    pub language: String,
    pub bytes: u64,
    pub percent: f64,
}

impl Stats {
    /// Name, activity dates and name keywords. Needs no API call.
    pub fn observe_repo(&mut self, repo: &Repository) {
        self.repo_names.push(repo.full_name.clone());

        if self.first_activity.is_none_or(|first| repo.created_at < first) {
            self.first_activity = Some(repo.created_at);
        }
        if let Some(pushed) = repo.pushed_at {
            if self.last_activity.is_none_or(|last| pushed > last) {
                self.last_activity = Some(pushed);
            }
        }

        self.keywords.add_repo_name(&repo.name);
    }

    pub fn add_languages(&mut self, languages: &BTreeMap<String, u64>) {
        for (language, bytes) in languages {
            let total = self.language_bytes.entry(language.clone()).or_default();
            *total = total.saturating_add(*bytes);
        }
    }

    pub fn add_readme(&mut self, text: &str) {
        self.doc_lines = self.doc_lines.saturating_add(count_lines(text));
        self.keywords.add_text(text);
    }

    pub fn add_source(&mut self, text: &str) {
        self.code_lines = self.code_lines.saturating_add(count_lines(text));
    }

    pub fn add_commits(&mut self, weekly_totals: impl IntoIterator<Item = u64>) {
        for total in weekly_totals {
            self.commits = self.commits.saturating_add(total);
        }
    }

    pub fn total_language_bytes(&self) -> u64 {
        self.language_bytes.values().sum()
    }

    /// Languages by byte count, largest first, above [`MIN_LANGUAGE_SHARE`] percent.
    pub fn language_shares(&self) -> Vec<LanguageShare> {
        let total = self.total_language_bytes();
        if total == 0 {
            return Vec::new();
        }

        let mut shares: Vec<LanguageShare> = self
            .language_bytes
            .iter()
            .map(|(language, bytes)| LanguageShare {
                language: language.clone(),
                bytes: *bytes,
                percent: *bytes as f64 / total as f64 * 100.0,
            })
            .filter(|s| s.percent > MIN_LANGUAGE_SHARE)
            .collect();
        // BTreeMap iteration is alphabetical, so ties stay alphabetical.
        shares.sort_by(|a, b| b.bytes.cmp(&a.bytes));
        shares
    }

    pub fn activity_span(&self) -> Option<Span> {
        match (self.first_activity, self.last_activity) {
            (Some(first), Some(last)) => Some(Span::between(first.date_naive(), last.date_naive())),
            _ => None,
        }
    }
}

/// Text lines; a trailing newline does not open another line.
pub fn count_lines(text: &str) -> u64 {
    text.lines().count() as u64
}

/// Walk every repository and accumulate its statistics. A repository whose
/// analysis fails keeps what was gathered before the failure.
pub async fn screen<S>(
    source: &S,
    repos: &[Repository],
    mut on_progress: impl FnMut(usize, usize, &Repository),
) -> Stats
where
    S: RepoSource + ?Sized,
{
    let mut stats = Stats::default();

    for (index, repo) in repos.iter().enumerate() {
        on_progress(index + 1, repos.len(), repo);
        stats.observe_repo(repo);

        if let Err(e) = analyze_repo(source, repo, &mut stats).await {
            warn!(
                status = ?e.status(),
                "Could not fully analyze repository '{}': {e}",
                repo.full_name
            );
        }
    }

    stats
}

async fn analyze_repo<S>(source: &S, repo: &Repository, stats: &mut Stats) -> Result<(), GithubError>
where
    S: RepoSource + ?Sized,
{
    let name = repo.full_name.as_str();

    let languages = source.languages(name).await?;
    stats.add_languages(&languages);

    if let Some(readme) = source.readme(name).await? {
        stats.add_readme(&readme);
    } else {
        debug!(repo = name, "no README");
    }

    if let Some(branch) = repo.default_branch.as_deref() {
        count_source_lines(source, name, branch, stats).await?;
    }

    let weeks = source.commit_activity(name).await?;
    stats.add_commits(weeks.iter().map(|w| w.total));

    Ok(())
}

async fn count_source_lines<S>(
    source: &S,
    name: &str,
    branch: &str,
    stats: &mut Stats,
) -> Result<(), GithubError>
where
    S: RepoSource + ?Sized,
{
    let tree = source.tree(name, branch).await?;
    let candidates = tree
        .iter()
        .filter(|e| e.is_blob() && e.size.is_some_and(|s| s > 0 && s < MAX_BLOB_SIZE));

    for entry in candidates {
        let text = match source.blob(name, &entry.sha).await.and_then(|b| b.text()) {
            Ok(Some(text)) => text,
            Ok(None) => {
                debug!(repo = name, path = %entry.path, "skipping non-text blob");
                continue;
            }
            Err(e) => {
                debug!(repo = name, path = %entry.path, "skipping blob: {e}");
                continue;
            }
        };
        stats.add_source(&text);
    }

    Ok(())
}
