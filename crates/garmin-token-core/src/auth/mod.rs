//! Authentication module for obtaining a Garmin session token.
//!
//! This module provides:
//! - `Credentials` and `resolve_credentials`: environment lookup with interactive fallback
//! - `Authenticator`: the seam to the external login collaborator
//! - `HelperAuthenticator`: an `Authenticator` backed by an external helper program
//! - `SessionToken`: the exported, opaque session state
//!
//! Two-factor authentication is not supported.

pub mod credentials;
pub mod helper;
pub mod session;

pub use credentials::{resolve_credentials, Credentials, Prompter, ScriptedPrompter, TerminalPrompter};
pub use helper::{Authenticator, HelperAuthenticator};
pub use session::{SessionToken, TokenSummary};
