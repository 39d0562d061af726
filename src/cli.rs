use std::path::PathBuf;

use clap::{ArgAction, Parser};

use crate::report::Format;

/// Screen a GitHub account: lines of code, README size, commit activity,
/// languages and keywords across its public repositories.
#[derive(Parser, Debug)]
#[command(name = "gh-screener")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Account to screen (defaults to GITHUB_USER from the config file)
    pub user: Option<String>,

    /// Path to the YAML config file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Personal access token (defaults to ACCESS_TOKEN from the config file)
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// REST API root, e.g. for GitHub Enterprise Server
    #[arg(long, value_name = "URL")]
    pub api_url: Option<String>,

    /// Report format
    #[arg(short, long, value_enum, default_value_t = Format::Text)]
    pub format: Format,

    /// Number of keywords to list
    #[arg(long, default_value_t = 10, value_name = "N", value_parser = clap::value_parser!(u16).range(1..))]
    pub top: u16,

    /// Fail instead of prompting when credentials are missing
    #[arg(long)]
    pub no_input: bool,

    /// Increase verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}
