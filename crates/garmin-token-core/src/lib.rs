//! Core library for garmin-token.
//!
//! Resolves Garmin Connect credentials (an optional `.env` file overlaid on
//! the environment, then interactive prompts), hands them to an external
//! authentication helper, and reports the exported session token so it can
//! be stored in a secrets manager.

pub mod auth;
pub mod config;
pub mod error;
pub mod generator;
pub mod report;

pub use auth::{
    resolve_credentials, Authenticator, Credentials, HelperAuthenticator, Prompter,
    ScriptedPrompter, SessionToken, TerminalPrompter, TokenSummary,
};
pub use config::{load_env_file, load_env_file_from, EnvFile, Environment, MapEnv, ProcessEnv};
pub use error::{AuthError, TokenError};
pub use generator::{TokenGenerator, EXIT_FAILURE, EXIT_SUCCESS};
