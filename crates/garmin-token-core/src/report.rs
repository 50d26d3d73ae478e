//! User-facing report text.
//!
//! Everything here is written to the caller's writer (stdout in the binary);
//! diagnostics for operators go through `tracing` instead.

use std::fmt::Display;
use std::io::{self, Write};

use crate::auth::SessionToken;

/// Width of the `=` separator lines
const RULE_WIDTH: usize = 60;

const TITLE: &str = "Garmin Authentication Token Generator";

/// Secret name suggested for storing the token
pub const SECRET_NAME: &str = "GARMIN_SECRET_STRING";

const POSSIBLE_REASONS: [&str; 3] = [
    "Incorrect email or password",
    "Two-factor authentication enabled (not supported yet)",
    "Network connection issues",
];

pub fn rule() -> String {
    "=".repeat(RULE_WIDTH)
}

pub fn write_banner<W: Write + ?Sized>(out: &mut W) -> io::Result<()> {
    writeln!(out, "{}", rule())?;
    writeln!(out, "{}", TITLE)?;
    writeln!(out, "{}", rule())?;
    writeln!(out)
}

pub fn write_missing_credentials<W: Write + ?Sized>(out: &mut W) -> io::Result<()> {
    writeln!(out, "Error: email and password are required.")
}

pub fn write_authenticating<W: Write + ?Sized>(out: &mut W) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "Authenticating with Garmin...")
}

pub fn write_success<W: Write + ?Sized>(out: &mut W, token: &SessionToken) -> io::Result<()> {
    writeln!(out, "✓ Successfully authenticated with Garmin")?;
    writeln!(out)?;
    writeln!(out, "{}", rule())?;
    writeln!(out, "Your Garmin Secret String:")?;
    writeln!(out, "{}", rule())?;
    writeln!(out, "{}", token)?;
    writeln!(out, "{}", rule())?;
    writeln!(out)?;
    writeln!(out, "Add this to your GitHub Secrets as {}", SECRET_NAME)?;
    writeln!(out)
}

pub fn write_failure<W: Write + ?Sized>(out: &mut W, error: &dyn Display) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "✗ Authentication failed: {}", error)?;
    writeln!(out)?;
    writeln!(out, "Possible reasons:")?;
    for (i, reason) in POSSIBLE_REASONS.iter().enumerate() {
        writeln!(out, "{}. {}", i + 1, reason)?;
    }
    Ok(())
}
