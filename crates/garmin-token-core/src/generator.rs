//! The token generation flow: resolve credentials, log in once, report.

use std::io::{self, Write};

use chrono::Utc;
use tracing::{debug, error, info, warn};

use crate::auth::{resolve_credentials, Authenticator, Prompter, SessionToken};
use crate::config::Environment;
use crate::error::TokenError;
use crate::report;

/// Process exit status after a token was printed
pub const EXIT_SUCCESS: u8 = 0;

/// Process exit status for missing credentials or a failed login
pub const EXIT_FAILURE: u8 = 1;

pub struct TokenGenerator<A> {
    authenticator: A,
}

impl<A: Authenticator> TokenGenerator<A> {
    pub fn new(authenticator: A) -> Self {
        Self { authenticator }
    }

    pub fn authenticator(&self) -> &A {
        &self.authenticator
    }

    /// Run the whole flow, writing the report to `out`. Returns the exit status.
    pub async fn run<E, P, W>(&self, env: &E, prompter: &mut P, out: &mut W) -> u8
    where
        E: Environment + ?Sized,
        P: Prompter + ?Sized,
        W: Write + ?Sized,
    {
        match self.try_run(env, prompter, out).await {
            Ok(status) => status,
            Err(e) => {
                error!(error = %e, "Failed to write report");
                EXIT_FAILURE
            }
        }
    }

    async fn try_run<E, P, W>(&self, env: &E, prompter: &mut P, out: &mut W) -> io::Result<u8>
    where
        E: Environment + ?Sized,
        P: Prompter + ?Sized,
        W: Write + ?Sized,
    {
        report::write_banner(out)?;
        out.flush()?;

        let credentials = match resolve_credentials(env, prompter) {
            Ok(credentials) => credentials,
            Err(e) => {
                match &e {
                    TokenError::Prompt(source) => error!(error = %source, "Could not read credentials"),
                    other => warn!(error = %other, "Credentials incomplete"),
                }
                report::write_missing_credentials(out)?;
                return Ok(EXIT_FAILURE);
            }
        };

        report::write_authenticating(out)?;
        out.flush()?;

        match self.authenticator.login(&credentials).await {
            Ok(token) => {
                info!("Authentication succeeded");
                log_token_summary(&token);
                report::write_success(out, &token)?;
                out.flush()?;
                Ok(EXIT_SUCCESS)
            }
            Err(e) => {
                let e = TokenError::from(e);
                error!(error = %e, "Authentication failed");
                report::write_failure(out, &e)?;
                out.flush()?;
                Ok(EXIT_FAILURE)
            }
        }
    }
}

fn log_token_summary(token: &SessionToken) {
    let Some(summary) = token.summary() else {
        debug!("Token is not in the Garmin secret string layout");
        return;
    };

    let now = Utc::now();
    if summary.is_expired(now) {
        warn!(expired_at = %summary.refresh_token_expires_at, "Token is already expired");
    } else {
        info!(
            domain = summary.domain.as_deref().unwrap_or("garmin.com"),
            access_expires_at = %summary.expires_at,
            refresh_expires_at = %summary.refresh_token_expires_at,
            days_left = summary.days_until_expiry(now),
            "Token lifetime"
        );
    }
}
