use std::collections::VecDeque;
use std::io::{self, BufRead, IsTerminal, Write};

use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

use crate::config::{Environment, EMAIL_KEY, PASSWORD_KEY};
use crate::error::TokenError;

const EMAIL_PROMPT: &str = "Enter your Garmin email address: ";
const PASSWORD_PROMPT: &str = "Enter your Garmin password: ";

/// Garmin account credentials, held only for the duration of one login
#[derive(Debug)]
pub struct Credentials {
    email: String,
    password: SecretString,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: SecretString) -> Self {
        Self {
            email: email.into(),
            password,
        }
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn password(&self) -> &SecretString {
        &self.password
    }
}

/// Source of interactive answers for missing credentials.
///
/// Both methods return `Ok(None)` when input is exhausted.
pub trait Prompter {
    /// Ask with the answer echoed
    fn prompt(&mut self, message: &str) -> io::Result<Option<String>>;

    /// Ask without echoing the answer
    fn prompt_hidden(&mut self, message: &str) -> io::Result<Option<String>>;
}

/// Prompts on the controlling terminal; falls back to plain stdin lines when
/// input is piped.
#[derive(Debug, Default)]
pub struct TerminalPrompter;

impl TerminalPrompter {
    pub fn new() -> Self {
        Self
    }

    fn read_stdin_line(message: &str) -> io::Result<Option<String>> {
        print!("{}", message);
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().lock().read_line(&mut input)? == 0 {
            return Ok(None);
        }
        Ok(Some(strip_line_ending(&input).to_string()))
    }
}

impl Prompter for TerminalPrompter {
    fn prompt(&mut self, message: &str) -> io::Result<Option<String>> {
        Self::read_stdin_line(message)
    }

    fn prompt_hidden(&mut self, message: &str) -> io::Result<Option<String>> {
        if !io::stdin().is_terminal() {
            return Self::read_stdin_line(message);
        }

        match rpassword::prompt_password(message) {
            Ok(password) => Ok(Some(password)),
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Ok(None),
            Err(e) => Err(e),
        }
    }
}

/// Replays canned answers. `None` entries behave like end of input.
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    lines: VecDeque<Option<String>>,
    hidden: VecDeque<Option<String>>,
    /// Every prompt message shown, in order
    pub asked: Vec<String>,
}

impl ScriptedPrompter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn line(mut self, answer: Option<&str>) -> Self {
        self.lines.push_back(answer.map(str::to_string));
        self
    }

    pub fn hidden(mut self, answer: Option<&str>) -> Self {
        self.hidden.push_back(answer.map(str::to_string));
        self
    }
}

impl Prompter for ScriptedPrompter {
    fn prompt(&mut self, message: &str) -> io::Result<Option<String>> {
        self.asked.push(message.to_string());
        Ok(self.lines.pop_front().flatten())
    }

    fn prompt_hidden(&mut self, message: &str) -> io::Result<Option<String>> {
        self.asked.push(message.to_string());
        Ok(self.hidden.pop_front().flatten())
    }
}

fn strip_line_ending(input: &str) -> &str {
    input.trim_end_matches(['\n', '\r'])
}

fn env_value<E: Environment + ?Sized>(env: &E, key: &str) -> String {
    env.get(key)
        .map(|value| value.trim().to_string())
        .unwrap_or_default()
}

/// Resolve credentials from the environment, prompting for anything missing.
///
/// Fails with [`TokenError::MissingCredential`] when either value is still
/// empty afterwards.
pub fn resolve_credentials<E, P>(env: &E, prompter: &mut P) -> Result<Credentials, TokenError>
where
    E: Environment + ?Sized,
    P: Prompter + ?Sized,
{
    let mut email = env_value(env, EMAIL_KEY);
    let mut password = SecretString::new(env_value(env, PASSWORD_KEY).into());

    if email.is_empty() {
        debug!("Email not configured, prompting");
        email = prompter
            .prompt(EMAIL_PROMPT)
            .map_err(TokenError::Prompt)?
            .unwrap_or_default();
    }

    if password.expose_secret().is_empty() {
        debug!("Password not configured, prompting");
        password = SecretString::new(
            prompter
                .prompt_hidden(PASSWORD_PROMPT)
                .map_err(TokenError::Prompt)?
                .unwrap_or_default()
                .into(),
        );
    }

    if email.is_empty() || password.expose_secret().is_empty() {
        return Err(TokenError::MissingCredential);
    }

    debug!(email = %email, "Credentials resolved");
    Ok(Credentials::new(email, password))
}
