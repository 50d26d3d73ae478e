//! Environment configuration and `.env` overlay.
//!
//! Credentials come from the process environment, optionally seeded from a
//! dotenv-style `.env` file. The first `.env` found in the candidate
//! directories is applied:
//!
//! - `GARMIN_EMAIL` / `GARMIN_PASSWORD` from the file always win
//! - every other key is only set when the environment does not have it yet
//!
//! Candidates are the working directory, the directory above the running
//! executable (plus the project root when that is a cargo `target/`
//! directory), and `~/.config/garmin-token/`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::TokenError;

/// Environment key carrying the Garmin account email
pub const EMAIL_KEY: &str = "GARMIN_EMAIL";

/// Environment key carrying the Garmin account password
pub const PASSWORD_KEY: &str = "GARMIN_PASSWORD";

/// Keys where the `.env` file takes precedence over the environment
const CREDENTIAL_KEYS: [&str; 2] = [EMAIL_KEY, PASSWORD_KEY];

/// Application name used for the config directory path
const APP_NAME: &str = "garmin-token";

/// Dotenv file name
const ENV_FILE: &str = ".env";

// ============================================================================
// Environment
// ============================================================================

/// A readable and writable table of environment variables.
pub trait Environment {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str);

    fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }
}

/// The real process environment.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessEnv;

impl Environment for ProcessEnv {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }

    fn set(&mut self, key: &str, value: &str) {
        // Written once at startup, before any other thread reads the environment
        std::env::set_var(key, value);
    }

    fn contains(&self, key: &str) -> bool {
        std::env::var_os(key).is_some()
    }
}

/// An in-memory environment that never touches the process table.
#[derive(Debug, Default, Clone)]
pub struct MapEnv {
    vars: HashMap<String, String>,
}

impl MapEnv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: &str) -> Self {
        self.vars.insert(key.to_string(), value.to_string());
        self
    }
}

impl Environment for MapEnv {
    fn get(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.vars.insert(key.to_string(), value.to_string());
    }
}

// ============================================================================
// Dotenv file
// ============================================================================

/// Parsed contents of a dotenv-style file, in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvFile {
    pub entries: Vec<(String, String)>,
}

impl EnvFile {
    /// Parse `KEY=VALUE` lines.
    ///
    /// Blank lines, `#` comments and lines without `=` are skipped. A value
    /// wrapped in matching quotes loses them and has its escaped quote
    /// unescaped; nothing else is interpreted.
    pub fn parse(text: &str) -> Self {
        let entries = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .filter_map(|line| line.split_once('='))
            .map(|(key, value)| (key.trim(), unquote(value.trim())))
            .filter(|(key, _)| !key.is_empty())
            .map(|(key, value)| (key.to_string(), value))
            .collect();

        Self { entries }
    }

    pub fn read(path: &Path) -> Result<Self, TokenError> {
        let contents = std::fs::read_to_string(path).map_err(|source| TokenError::EnvFile {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::parse(&contents))
    }

    /// Overlay the entries onto `env`, returning how many variables were set
    pub fn apply<E: Environment + ?Sized>(&self, env: &mut E) -> usize {
        let mut applied = 0;
        for (key, value) in &self.entries {
            if is_credential_key(key) || !env.contains(key) {
                env.set(key, value);
                applied += 1;
            } else {
                debug!(key = %key, "Keeping existing environment value");
            }
        }
        applied
    }
}

fn is_credential_key(key: &str) -> bool {
    CREDENTIAL_KEYS.contains(&key)
}

/// Strip one pair of matching surrounding quotes and unescape that quote
fn unquote(value: &str) -> String {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            let inner = &value[1..value.len() - 1];
            return inner.replace(&format!("\\{}", quote), &quote.to_string());
        }
    }
    value.to_string()
}

// ============================================================================
// Discovery
// ============================================================================

/// Cargo build output directory name
const CARGO_TARGET_DIR: &str = "target";

/// Directories searched for a `.env` file, in priority order:
///
/// 1. the working directory
/// 2. one level above the directory holding the executable; for a cargo
///    build in `<root>/target/release/` that is `<root>/target/`, so `<root>`
///    is searched right after it
/// 3. `~/.config/garmin-token/`
pub fn candidate_dirs() -> Vec<PathBuf> {
    let mut candidates = Vec::new();

    match std::env::current_dir() {
        Ok(cwd) => candidates.push(cwd),
        Err(e) => warn!(error = %e, "Could not determine working directory"),
    }

    match std::env::current_exe() {
        Ok(exe) => candidates.extend(exe_roots(&exe)),
        Err(e) => warn!(error = %e, "Could not determine executable path"),
    }

    if let Some(config_dir) = dirs::config_dir() {
        candidates.push(config_dir.join(APP_NAME));
    }

    candidates
}

/// Directories above the executable's own directory worth searching
fn exe_roots(exe: &Path) -> Vec<PathBuf> {
    let Some(above) = exe.parent().and_then(Path::parent) else {
        return Vec::new();
    };

    let mut roots = vec![above.to_path_buf()];
    if above.file_name().is_some_and(|name| name == CARGO_TARGET_DIR) {
        if let Some(project_root) = above.parent() {
            roots.push(project_root.to_path_buf());
        }
    }
    roots
}

/// First `.env` regular file among `dirs`
pub fn find_env_file<P: AsRef<Path>>(dirs: &[P]) -> Option<PathBuf> {
    dirs.iter()
        .map(|dir| dir.as_ref().join(ENV_FILE))
        .find(|path| path.is_file())
}

/// Find, parse and apply the first `.env` file among `dirs`.
///
/// Returns the path that was applied, or `None` when no file exists.
pub fn load_env_file_from<P, E>(dirs: &[P], env: &mut E) -> Result<Option<PathBuf>, TokenError>
where
    P: AsRef<Path>,
    E: Environment + ?Sized,
{
    let Some(path) = find_env_file(dirs) else {
        debug!("No .env file found");
        return Ok(None);
    };

    let file = EnvFile::read(&path)?;
    let applied = file.apply(env);
    info!(path = %path.display(), entries = file.entries.len(), applied, "Loaded .env file");
    Ok(Some(path))
}

/// [`load_env_file_from`] over [`candidate_dirs`]
pub fn load_env_file<E: Environment + ?Sized>(env: &mut E) -> Result<Option<PathBuf>, TokenError> {
    let dirs = candidate_dirs();
    load_env_file_from(dirs.as_slice(), env)
}
