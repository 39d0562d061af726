//! Credentials: which account to screen and which token to screen it with.
//!
//! Values come from command-line flags and `GITHUB_TOKEN` first, then from a
//! YAML file (`config.yml` by default). Whatever is still missing is asked
//! for interactively and written back to the file for the next run.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use dialoguer::{Input, Password};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::ConfigError;
use crate::github::DEFAULT_API_URL;

pub const DEFAULT_CONFIG_FILE: &str = "config.yml";

/// Values a fresh config file is seeded with; they count as unset.
const USER_PLACEHOLDER: &str = "USER_NAME";
const TOKEN_PLACEHOLDER: &str = "YOUR_TOKEN";

/// On-disk layout of the config file. Unknown keys are kept when saving.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(rename = "GITHUB_USER", default, skip_serializing_if = "Option::is_none")]
    pub github_user: Option<String>,

    #[serde(rename = "ACCESS_TOKEN", default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,

    #[serde(rename = "API_URL", default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

impl FileConfig {
    /// Load `path`; a missing or empty file is an empty config.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no config file");
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let yaml = serde_yaml::to_string(self).map_err(|source| ConfigError::Serialize {
            path: path.to_path_buf(),
            source,
        })?;
        fs::write(path, yaml).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    fn user(&self) -> Option<String> {
        usable(self.github_user.clone(), USER_PLACEHOLDER)
    }

    fn token(&self) -> Option<String> {
        usable(self.access_token.clone(), TOKEN_PLACEHOLDER)
    }
}

fn usable(value: Option<String>, placeholder: &str) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty() && v != placeholder)
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub user: String,
    pub token: String,
    pub api_url: String,
}

/// Source of values the user types in.
pub trait Prompter {
    fn username(&mut self) -> Result<String, ConfigError>;
    fn token(&mut self) -> Result<String, ConfigError>;
}

/// Prompts on the controlling terminal; the token is not echoed.
pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn username(&mut self) -> Result<String, ConfigError> {
        Ok(Input::<String>::new()
            .with_prompt("Enter your GitHub username")
            .interact_text()?)
    }

    fn token(&mut self) -> Result<String, ConfigError> {
        Ok(Password::new()
            .with_prompt("Enter your GitHub personal access token")
            .interact()?)
    }
}

/// What the command line contributed before the file is consulted.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub user: Option<String>,
    pub token: Option<String>,
    pub api_url: Option<String>,
}

pub fn default_path() -> PathBuf {
    PathBuf::from(DEFAULT_CONFIG_FILE)
}

/// Merge overrides with the file at `path`, prompting for anything missing
/// when `prompter` is given. Prompted values are saved back to `path`.
pub fn resolve(
    path: &Path,
    overrides: Overrides,
    prompter: Option<&mut dyn Prompter>,
) -> Result<Credentials, ConfigError> {
    let mut file = FileConfig::load(path)?;

    let mut user = usable(overrides.user, USER_PLACEHOLDER).or_else(|| file.user());
    let mut token = usable(overrides.token, TOKEN_PLACEHOLDER).or_else(|| file.token());

    if user.is_none() || token.is_none() {
        let Some(prompter) = prompter else {
            return Err(ConfigError::Missing(if user.is_none() {
                "GitHub username"
            } else {
                "GitHub access token"
            }));
        };

        eprintln!("Configuration not found or incomplete. Please set it up now.");
        if user.is_none() {
            let entered = usable(Some(prompter.username()?), USER_PLACEHOLDER)
                .ok_or(ConfigError::Missing("GitHub username"))?;
            file.github_user = Some(entered.clone());
            user = Some(entered);
        }
        if token.is_none() {
            let entered = usable(Some(prompter.token()?), TOKEN_PLACEHOLDER)
                .ok_or(ConfigError::Missing("GitHub access token"))?;
            file.access_token = Some(entered.clone());
            token = Some(entered);
        }

        file.save(path)?;
        info!(path = %path.display(), "saved configuration");
        eprintln!("✅ Configuration saved to '{}'.\n", path.display());
    }

    let api_url = overrides
        .api_url
        .or_else(|| file.api_url.clone())
        .filter(|u| !u.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_API_URL.to_string());

    // Both are Some here: either they resolved or the prompt filled them in.
    match (user, token) {
        (Some(user), Some(token)) => Ok(Credentials {
            user,
            token,
            api_url,
        }),
        (None, _) => Err(ConfigError::Missing("GitHub username")),
        (_, None) => Err(ConfigError::Missing("GitHub access token")),
    }
}
