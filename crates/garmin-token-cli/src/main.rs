//! get-garmin-token - prints a reusable Garmin Connect session token.
//!
//! Credentials come from `GARMIN_EMAIL` / `GARMIN_PASSWORD` (optionally set
//! through a `.env` file) or interactive prompts. The printed token is meant
//! to be stored as the `GARMIN_SECRET_STRING` secret.

use std::io::{self, Write};
use std::process::ExitCode;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use garmin_token_core::{
    load_env_file, HelperAuthenticator, ProcessEnv, TerminalPrompter, TokenGenerator,
};

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug).
    // Logs go to stderr so stdout only carries the report.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

// Single-threaded runtime: the environment is mutated while loading `.env`
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    init_tracing();
    debug!("get-garmin-token starting");

    let mut env = ProcessEnv;
    match load_env_file(&mut env) {
        Ok(Some(path)) => info!(path = %path.display(), "Using .env file"),
        Ok(None) => {}
        Err(e) => warn!(error = %e, "Ignoring unreadable .env file"),
    }

    let authenticator = HelperAuthenticator::from_env(&env);
    debug!(program = authenticator.program(), args = ?authenticator.args(), "Authentication helper configured");

    let generator = TokenGenerator::new(authenticator);
    let mut prompter = TerminalPrompter::new();
    let mut stdout = io::stdout();

    let status = generator.run(&env, &mut prompter, &mut stdout).await;
    stdout.flush().context("Failed to flush stdout")?;

    Ok(ExitCode::from(status))
}
