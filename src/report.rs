use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::Serialize;

use crate::github::User;
use crate::span::Span;
use crate::stats::{LanguageShare, Stats};

const RULE_WIDTH: usize = 46;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Text,
    Json,
}

#[derive(Debug, Serialize)]
pub struct Report {
    pub login: String,
    pub name: String,
    pub first_activity: Option<DateTime<Utc>>,
    pub last_activity: Option<DateTime<Utc>>,
    pub active_for: Option<Span>,
    pub code_lines: u64,
    pub doc_lines: u64,
    pub commits_last_year: u64,
    pub keywords: Vec<Keyword>,
    pub languages: Vec<Language>,
    pub repositories: Vec<String>,
    #[serde(skip)]
    top_keywords: usize,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct Keyword {
    pub word: String,
    pub mentions: u64,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct Language {
    pub name: String,
    pub bytes: u64,
    pub percent: f64,
}

impl From<LanguageShare> for Language {
    fn from(share: LanguageShare) -> Self {
        Self {
            name: share.language,
            bytes: share.bytes,
            percent: share.percent,
        }
    }
}

impl Report {
    pub fn new(user: &User, stats: Stats, top_keywords: usize) -> Self {
        Self {
            login: user.login.clone(),
            name: user.display_name().to_string(),
            first_activity: stats.first_activity,
            last_activity: stats.last_activity,
            active_for: stats.activity_span(),
            code_lines: stats.code_lines,
            doc_lines: stats.doc_lines,
            commits_last_year: stats.commits,
            keywords: stats
                .keywords
                .top(top_keywords)
                .into_iter()
                .map(|(word, mentions)| Keyword { word, mentions })
                .collect(),
            languages: stats.language_shares().into_iter().map(Language::from).collect(),
            repositories: stats.repo_names,
            top_keywords,
        }
    }

    pub fn render(&self, format: Format) -> serde_json::Result<String> {
        match format {
            Format::Text => Ok(self.to_text()),
            Format::Json => serde_json::to_string_pretty(self),
        }
    }

    pub fn to_text(&self) -> String {
        let rule = "=".repeat(RULE_WIDTH);
        let mut out = String::new();

        out.push_str(&format!("📊 Results for {} (@{})\n", self.name, self.login));
        out.push_str(&format!("{rule}\n"));

        out.push_str("\n🗓️ Activity Span\n");
        out.push_str(&format!(
            "First activity (oldest repo): {}\n",
            format_date(self.first_activity)
        ));
        out.push_str(&format!(
            "Last activity (latest push):  {}\n",
            format_date(self.last_activity)
        ));
        if let Some(span) = self.active_for {
            out.push_str(&format!("Active for: {span}\n"));
        }

        out.push_str("\n📈 General Statistics\n");
        out.push_str(&format!(
            "Total lines of code: {}\n",
            format_thousands(self.code_lines)
        ));
        out.push_str(&format!(
            "Total documentation lines (in READMEs): {}\n",
            format_thousands(self.doc_lines)
        ));
        out.push_str(&format!(
            "Total commits (last year): {}\n",
            format_thousands(self.commits_last_year)
        ));

        out.push_str(&format!(
            "\n🔑 Top {} Keywords (from Repo Names & READMEs)\n",
            self.top_keywords
        ));
        if self.keywords.is_empty() {
            out.push_str("No keywords found.\n");
        }
        for (i, k) in self.keywords.iter().enumerate() {
            out.push_str(&format!("{}. {} ({} mentions)\n", i + 1, k.word, k.mentions));
        }

        out.push_str("\n💻 Programming Languages Used:\n");
        if self.languages.is_empty() {
            out.push_str("No language data found.\n");
        }
        for lang in &self.languages {
            out.push_str(&format!("   - {}: {:.2}%\n", lang.name, lang.percent));
        }

        out.push_str(&format!(
            "\n📚 Repository List ({} total)\n",
            self.repositories.len()
        ));
        for name in &self.repositories {
            out.push_str(&format!("   - {name}\n"));
        }

        out.push_str(&format!("{rule}\n"));
        out
    }
}

fn format_date(date: Option<DateTime<Utc>>) -> String {
    date.map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "N/A".to_string())
}

/// `1234567` → `"1,234,567"`.
pub fn format_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::Repository;
    use std::collections::BTreeMap;

    fn ts(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    fn sample_stats() -> Stats {
        let mut stats = Stats::default();
        stats.observe_repo(&Repository {
            name: "tokio-tracer".into(),
            full_name: "octocat/tokio-tracer".into(),
            default_branch: Some("main".into()),
            created_at: ts("2019-04-02T08:00:00Z"),
            pushed_at: Some(ts("2024-11-30T23:59:00Z")),
        });
        stats.add_languages(&BTreeMap::from([
            ("Rust".to_string(), 8_765),
            ("Shell".to_string(), 1_235),
        ]));
        stats.add_readme("Tracing for tokio.\nTracing everywhere.\n");
        stats.code_lines = 1_234_567;
        stats.commits = 1_000;
        stats
    }

    fn octocat() -> User {
        User {
            login: "octocat".into(),
            name: Some("The Octocat".into()),
        }
    }

    #[test]
    fn thousands_separators() {
        assert_eq!(format_thousands(0), "0");
        assert_eq!(format_thousands(999), "999");
        assert_eq!(format_thousands(1_000), "1,000");
        assert_eq!(format_thousands(1_234_567), "1,234,567");
        assert_eq!(format_thousands(100_000), "100,000");
    }

    #[test]
    fn text_report_has_every_section() {
        let report = Report::new(&octocat(), sample_stats(), 10);
        let text = report.to_text();

        assert!(text.starts_with("📊 Results for The Octocat (@octocat)\n"));
        assert!(text.contains("First activity (oldest repo): 2019-04-02\n"));
        assert!(text.contains("Last activity (latest push):  2024-11-30\n"));
        assert!(text.contains("Active for: 5 years, 7 months, 28 days\n"));
        assert!(text.contains("Total lines of code: 1,234,567\n"));
        assert!(text.contains("Total documentation lines (in READMEs): 2\n"));
        assert!(text.contains("Total commits (last year): 1,000\n"));
        assert!(text.contains("🔑 Top 10 Keywords (from Repo Names & READMEs)\n"));
        assert!(text.contains("1. tokio (2 mentions)\n2. tracing (2 mentions)\n3. everywhere (1 mentions)\n"));
        assert!(text.contains("   - Rust: 87.65%\n   - Shell: 12.35%\n"));
        assert!(text.contains("📚 Repository List (1 total)\n   - octocat/tokio-tracer\n"));
        assert!(text.ends_with(&format!("{}\n", "=".repeat(RULE_WIDTH))));
    }

    #[test]
    fn empty_account_prints_fallbacks() {
        let user = User {
            login: "ghost".into(),
            name: None,
        };
        let text = Report::new(&user, Stats::default(), 10).to_text();

        assert!(text.contains("Results for ghost (@ghost)"));
        assert!(text.contains("First activity (oldest repo): N/A\n"));
        assert!(text.contains("Last activity (latest push):  N/A\n"));
        assert!(!text.contains("Active for"));
        assert!(text.contains("No keywords found.\n"));
        assert!(text.contains("No language data found.\n"));
        assert!(text.contains("Repository List (0 total)\n"));
    }

    #[test]
    fn json_report_carries_the_same_data() {
        let report = Report::new(&octocat(), sample_stats(), 1);
        let json: serde_json::Value =
            serde_json::from_str(&report.render(Format::Json).unwrap()).unwrap();

        assert_eq!(json["login"], "octocat");
        assert_eq!(json["code_lines"], 1_234_567);
        assert_eq!(json["keywords"].as_array().unwrap().len(), 1);
        assert_eq!(json["keywords"][0]["word"], "tokio");
        assert_eq!(json["languages"][0]["name"], "Rust");
        assert_eq!(json["active_for"]["years"], 5);
        assert_eq!(json["repositories"][0], "octocat/tokio-tracer");
    }
}
