use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failures raised by the external authentication collaborator.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Failed to start authentication helper `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("{0}")]
    HelperFailed(String),

    #[error("Authentication helper did not print a token")]
    EmptyToken,

    #[error("Authentication helper I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Maximum length for helper diagnostics carried in error messages
const MAX_HELPER_MESSAGE_LENGTH: usize = 500;

impl AuthError {
    /// Build a `HelperFailed` from the helper's stderr, falling back to the exit status
    pub fn from_helper_output(status: std::process::ExitStatus, stderr: &str) -> Self {
        let message = stderr
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .last()
            .map(Self::truncate_message)
            .unwrap_or_else(|| format!("authentication helper exited with {}", status));
        AuthError::HelperFailed(message)
    }

    fn truncate_message(message: &str) -> String {
        if message.chars().count() <= MAX_HELPER_MESSAGE_LENGTH {
            message.to_string()
        } else {
            let truncated: String = message.chars().take(MAX_HELPER_MESSAGE_LENGTH).collect();
            format!("{}... (truncated)", truncated)
        }
    }
}

#[derive(Error, Debug)]
pub enum TokenError {
    #[error("email and password are required")]
    MissingCredential,

    #[error("Failed to read credential from terminal: {0}")]
    Prompt(#[source] io::Error),

    #[error("Failed to read {path}: {source}")]
    EnvFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Authentication(#[from] AuthError),
}
