use std::path::PathBuf;

use thiserror::Error;

/// Failures talking to the GitHub REST API.
#[derive(Debug, Error)]
pub enum GithubError {
    #[error("User '{0}' not found.")]
    UserNotFound(String),

    #[error("GitHub token is invalid or lacks the required permissions.")]
    Unauthorized,

    #[error("GitHub API returned HTTP {status} for {path}: {message}")]
    Status {
        status: u16,
        path: String,
        message: String,
    },

    #[error("Network error requesting {path}: {source}")]
    Network {
        path: String,
        source: reqwest::Error,
    },

    #[error("Failed to decode {what}: {source}")]
    Decode {
        what: String,
        source: base64::DecodeError,
    },
}

impl GithubError {
    /// Status code carried by the error, if the API answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            GithubError::Status { status, .. } => Some(*status),
            GithubError::Unauthorized => Some(401),
            GithubError::UserNotFound(_) => Some(404),
            _ => None,
        }
    }
}

/// Failures loading or completing the credentials file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write config file '{}': {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Config file '{}' is not valid YAML: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("Failed to serialize config for '{}': {source}", path.display())]
    Serialize {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("Missing {0}; pass it on the command line or drop --no-input to be prompted")]
    Missing(&'static str),

    #[error("Interactive prompt failed: {0}")]
    Prompt(#[from] dialoguer::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_is_exposed_for_api_errors() {
        let err = GithubError::Status {
            status: 409,
            path: "/repos/a/b/git/trees/main".into(),
            message: "Git Repository is empty.".into(),
        };
        assert_eq!(err.status(), Some(409));
        assert_eq!(GithubError::Unauthorized.status(), Some(401));
        assert_eq!(GithubError::UserNotFound("x".into()).status(), Some(404));
    }

    #[test]
    fn messages_read_like_the_cli_output() {
        assert_eq!(
            GithubError::UserNotFound("octocat".into()).to_string(),
            "User 'octocat' not found."
        );
        assert_eq!(
            ConfigError::Missing("GitHub username").to_string(),
            "Missing GitHub username; pass it on the command line or drop --no-input to be prompted"
        );
    }

    #[test]
    fn serialize_and_parse_failures_read_differently() {
        let yaml_error = || serde_yaml::from_str::<serde_yaml::Value>("[").unwrap_err();
        let path = PathBuf::from("config.yml");

        let parse = ConfigError::Parse {
            path: path.clone(),
            source: yaml_error(),
        };
        let serialize = ConfigError::Serialize {
            path,
            source: yaml_error(),
        };
        assert!(parse.to_string().starts_with("Config file 'config.yml' is not valid YAML"));
        assert!(serialize.to_string().starts_with("Failed to serialize config for 'config.yml'"));
        assert!(!serialize.to_string().contains("not valid YAML"));
    }
}
