//! External authentication collaborator.
//!
//! The Garmin login handshake itself lives outside this crate. The
//! [`Authenticator`] trait is the seam; [`HelperAuthenticator`] fills it by
//! running an external helper program (the `garth` library driven through
//! `python3` unless `GARMIN_AUTH_COMMAND` says otherwise) and reading the
//! exported session token from its stdout.

use std::io;
use std::process::Stdio;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, info};

use crate::auth::{Credentials, SessionToken};
use crate::config::{Environment, EMAIL_KEY, PASSWORD_KEY};
use crate::error::AuthError;

/// Environment key overriding the helper command line
pub const AUTH_COMMAND_KEY: &str = "GARMIN_AUTH_COMMAND";

/// Helper used when `GARMIN_AUTH_COMMAND` is unset. It reads the
/// credentials from its environment and prints only the exported session,
/// so nothing prompts on the terminal a second time.
const DEFAULT_PROGRAM: &str = "python3";
const DEFAULT_SCRIPT: &str = "import os, garth; \
garth.login(os.environ['GARMIN_EMAIL'], os.environ['GARMIN_PASSWORD']); \
print(garth.client.dumps())";

/// Performs one login and exports the resulting session state.
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn login(&self, credentials: &Credentials) -> Result<SessionToken, AuthError>;
}

/// Runs an external helper process for the login.
///
/// The helper gets the email and password as two stdin lines and as
/// `GARMIN_EMAIL` / `GARMIN_PASSWORD` in its environment, and must print the
/// token as the last word of its stdout.
#[derive(Debug, Clone)]
pub struct HelperAuthenticator {
    program: String,
    args: Vec<String>,
}

impl Default for HelperAuthenticator {
    fn default() -> Self {
        Self::new(DEFAULT_PROGRAM, ["-c", DEFAULT_SCRIPT])
    }
}

impl HelperAuthenticator {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Build from `GARMIN_AUTH_COMMAND` (whitespace separated), or the default helper
    pub fn from_env<E: Environment + ?Sized>(env: &E) -> Self {
        env.get(AUTH_COMMAND_KEY)
            .and_then(|command| Self::parse_command(&command))
            .unwrap_or_default()
    }

    fn parse_command(command: &str) -> Option<Self> {
        let mut parts = command.split_whitespace();
        let program = parts.next()?;
        Some(Self::new(program, parts))
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }
}

/// Last whitespace-separated word of the helper's stdout.
///
/// Prompts written without a trailing newline (`Email: `) share the token's
/// line, so only the final word of the last non-empty line is kept.
fn extract_token(stdout: &str) -> Option<&str> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .last()
        .and_then(|line| line.split_whitespace().last())
}

#[async_trait]
impl Authenticator for HelperAuthenticator {
    async fn login(&self, credentials: &Credentials) -> Result<SessionToken, AuthError> {
        info!(program = %self.program, "Running authentication helper");

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .env(EMAIL_KEY, credentials.email())
            .env(PASSWORD_KEY, credentials.password().expose_secret())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| AuthError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            let input = format!(
                "{}\n{}\n",
                credentials.email(),
                credentials.password().expose_secret()
            );
            match stdin.write_all(input.as_bytes()).await {
                Ok(()) => {}
                // Helpers reading only the environment may exit without touching stdin
                Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {
                    debug!("Authentication helper closed stdin early");
                }
                Err(e) => return Err(AuthError::Io(e)),
            }
        }

        let output = child.wait_with_output().await?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        if !output.status.success() {
            debug!(status = %output.status, "Authentication helper failed");
            return Err(AuthError::from_helper_output(output.status, &stderr));
        }

        let token = extract_token(&stdout).ok_or(AuthError::EmptyToken)?;
        debug!(bytes = token.len(), "Authentication helper returned a token");
        Ok(SessionToken::new(token))
    }
}
