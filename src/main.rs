mod cli;
mod config;
mod error;
mod github;
mod keywords;
mod report;
mod span;
mod stats;

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use cli::Cli;
use config::{Overrides, Prompter, TerminalPrompter};
use github::{GithubClient, RepoSource};
use report::Report;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn setup_logging(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let path = cli.config.clone().unwrap_or_else(config::default_path);
    let overrides = Overrides {
        user: cli.user.clone(),
        token: cli.token.clone(),
        api_url: cli.api_url.clone(),
    };

    let mut terminal = TerminalPrompter;
    let prompter: Option<&mut dyn Prompter> = if cli.no_input {
        None
    } else {
        Some(&mut terminal)
    };
    let creds = config::resolve(&path, overrides, prompter)
        .with_context(|| format!("Failed to load credentials from '{}'", path.display()))?;
    info!(user = %creds.user, api = %creds.api_url, "credentials resolved");

    let client = GithubClient::new(creds.token, &creds.api_url)?;
    let report = screen_account(&client, &creds.user, usize::from(cli.top)).await?;

    let rendered = report
        .render(cli.format)
        .context("Failed to render report")?;
    println!("{rendered}");

    Ok(())
}

/// Fetch the account and its repositories, then aggregate them into a report.
/// Progress goes to stderr so stdout only carries the report.
async fn screen_account<S>(source: &S, login: &str, top: usize) -> Result<Report>
where
    S: RepoSource + ?Sized,
{
    eprintln!("Initializing screener for user: {login}...");
    let user = source.user(login).await?;

    eprintln!("Fetching all public repositories...");
    let repos = source
        .repos(login)
        .await
        .context("Error during API request")?;

    eprintln!(
        "Starting analysis of {} repositories. This may take a while...",
        repos.len()
    );
    eprintln!("---");

    let stats = stats::screen(source, &repos, |i, n, repo| {
        eprintln!("[{i}/{n}] Analyzing: {}", repo.full_name);
    })
    .await;

    eprintln!("\n---");
    eprintln!("✅ Analysis complete!");
    eprintln!("---\n");

    Ok(Report::new(&user, stats, top))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GithubError;
    use crate::github::{Blob, Repository, TreeEntry, User, WeekActivity};
    use async_trait::async_trait;
    use std::collections::BTreeMap;

    /// An account with one empty repository, or no account at all.
    struct OneRepo {
        exists: bool,
    }

    #[async_trait]
    impl RepoSource for OneRepo {
        async fn user(&self, login: &str) -> Result<User, GithubError> {
            if !self.exists {
                return Err(GithubError::UserNotFound(login.to_string()));
            }
            Ok(User {
                login: login.to_string(),
                name: Some("Mona".to_string()),
            })
        }

        async fn repos(&self, login: &str) -> Result<Vec<Repository>, GithubError> {
            Ok(vec![Repository {
                name: "hello-world".to_string(),
                full_name: format!("{login}/hello-world"),
                default_branch: None,
                created_at: "2011-01-26T19:01:12Z".parse().unwrap(),
                pushed_at: Some("2011-01-26T19:06:43Z".parse().unwrap()),
            }])
        }

        async fn languages(&self, _: &str) -> Result<BTreeMap<String, u64>, GithubError> {
            Ok(BTreeMap::new())
        }

        async fn readme(&self, _: &str) -> Result<Option<String>, GithubError> {
            Ok(None)
        }

        async fn tree(&self, _: &str, _: &str) -> Result<Vec<TreeEntry>, GithubError> {
            Ok(Vec::new())
        }

        async fn blob(&self, _: &str, sha: &str) -> Result<Blob, GithubError> {
            panic!("unexpected blob request {sha}")
        }

        async fn commit_activity(&self, _: &str) -> Result<Vec<WeekActivity>, GithubError> {
            Ok(vec![WeekActivity { total: 7 }])
        }
    }

    #[tokio::test]
    async fn screen_account_builds_a_report() {
        let report = screen_account(&OneRepo { exists: true }, "mona", 10)
            .await
            .unwrap();

        assert_eq!(report.name, "Mona");
        assert_eq!(report.repositories, vec!["mona/hello-world"]);
        assert_eq!(report.commits_last_year, 7);
        assert_eq!(report.keywords.len(), 2);
        assert_eq!(report.keywords[0].word, "hello");
    }

    #[tokio::test]
    async fn unknown_user_aborts_the_run() {
        let err = screen_account(&OneRepo { exists: false }, "nobody", 10)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "User 'nobody' not found.");
    }
}
