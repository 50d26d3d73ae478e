use std::sync::Mutex;

use async_trait::async_trait;
use secrecy::ExposeSecret;

use garmin_token_core::config::{EMAIL_KEY, PASSWORD_KEY};
use garmin_token_core::report::rule;
use garmin_token_core::{
    load_env_file_from, AuthError, Authenticator, Credentials, Environment, MapEnv,
    ScriptedPrompter, SessionToken, TokenGenerator, EXIT_FAILURE, EXIT_SUCCESS,
};

/// Records every login attempt and answers with a canned result
struct FakeAuthenticator {
    outcome: Result<&'static str, &'static str>,
    seen: Mutex<Vec<(String, String)>>,
}

impl FakeAuthenticator {
    fn succeeding(token: &'static str) -> Self {
        Self {
            outcome: Ok(token),
            seen: Mutex::new(Vec::new()),
        }
    }

    fn failing(message: &'static str) -> Self {
        Self {
            outcome: Err(message),
            seen: Mutex::new(Vec::new()),
        }
    }

    fn seen(&self) -> Vec<(String, String)> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl Authenticator for FakeAuthenticator {
    async fn login(&self, credentials: &Credentials) -> Result<SessionToken, AuthError> {
        self.seen.lock().unwrap().push((
            credentials.email().to_string(),
            credentials.password().expose_secret().to_string(),
        ));
        match self.outcome {
            Ok(token) => Ok(SessionToken::new(token)),
            Err(message) => Err(AuthError::HelperFailed(message.to_string())),
        }
    }
}

async fn run(
    generator: &TokenGenerator<FakeAuthenticator>,
    env: &MapEnv,
    prompter: &mut ScriptedPrompter,
) -> (u8, String) {
    let mut out = Vec::new();
    let status = generator.run(env, prompter, &mut out).await;
    (status, String::from_utf8(out).unwrap())
}

fn pair(email: &str, password: &str) -> (String, String) {
    (email.to_string(), password.to_string())
}

#[tokio::test]
async fn test_env_file_credentials_are_used() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join(".env"),
        "# Garmin account\nGARMIN_EMAIL=\"file@example.com\"\nGARMIN_PASSWORD='file secret'\n",
    )
    .unwrap();

    let mut env = MapEnv::new();
    load_env_file_from(&[dir.path()], &mut env).unwrap();

    let generator = TokenGenerator::new(FakeAuthenticator::succeeding("ABC123"));
    let mut prompter = ScriptedPrompter::new();
    let (status, _) = run(&generator, &env, &mut prompter).await;

    assert_eq!(status, EXIT_SUCCESS);
    assert_eq!(generator.authenticator().seen(), vec![pair("file@example.com", "file secret")]);
    assert!(prompter.asked.is_empty());
}

#[tokio::test]
async fn test_env_file_credentials_override_environment() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join(".env"),
        "GARMIN_EMAIL=file@example.com\nGARMIN_PASSWORD=file-secret\n",
    )
    .unwrap();

    let mut env = MapEnv::new()
        .with(EMAIL_KEY, "env@example.com")
        .with(PASSWORD_KEY, "env-secret");
    load_env_file_from(&[dir.path()], &mut env).unwrap();

    let generator = TokenGenerator::new(FakeAuthenticator::succeeding("ABC123"));
    let (status, _) = run(&generator, &env, &mut ScriptedPrompter::new()).await;

    assert_eq!(status, EXIT_SUCCESS);
    assert_eq!(generator.authenticator().seen(), vec![pair("file@example.com", "file-secret")]);
}

#[test]
fn test_environment_wins_for_other_keys() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join(".env"), "GARMIN_AUTH_COMMAND=from-file\n").unwrap();

    let mut env = MapEnv::new().with("GARMIN_AUTH_COMMAND", "from-env");
    load_env_file_from(&[dir.path()], &mut env).unwrap();

    assert_eq!(env.get("GARMIN_AUTH_COMMAND").as_deref(), Some("from-env"));
}

#[tokio::test]
async fn test_interactive_values_are_used_without_config() {
    let dir = tempfile::tempdir().unwrap();
    let mut env = MapEnv::new();
    assert_eq!(load_env_file_from(&[dir.path()], &mut env).unwrap(), None);

    let generator = TokenGenerator::new(FakeAuthenticator::succeeding("ABC123"));
    let mut prompter = ScriptedPrompter::new()
        .line(Some("typed@example.com"))
        .hidden(Some("typed-secret"));
    let (status, _) = run(&generator, &env, &mut prompter).await;

    assert_eq!(status, EXIT_SUCCESS);
    assert_eq!(generator.authenticator().seen(), vec![pair("typed@example.com", "typed-secret")]);
    assert_eq!(prompter.asked.len(), 2);
}

#[tokio::test]
async fn test_missing_email_at_end_of_input_fails_without_login() {
    let env = MapEnv::new().with(PASSWORD_KEY, "secret");
    let generator = TokenGenerator::new(FakeAuthenticator::succeeding("ABC123"));
    let mut prompter = ScriptedPrompter::new().line(None);

    let (status, stdout) = run(&generator, &env, &mut prompter).await;

    assert_eq!(status, EXIT_FAILURE);
    assert!(generator.authenticator().seen().is_empty());
    assert!(stdout.contains("Error: email and password are required."));
}

#[tokio::test]
async fn test_success_prints_token_between_separators() {
    let env = MapEnv::new()
        .with(EMAIL_KEY, "runner@example.com")
        .with(PASSWORD_KEY, "hunter2");
    let generator = TokenGenerator::new(FakeAuthenticator::succeeding("ABC123"));

    let (status, stdout) = run(&generator, &env, &mut ScriptedPrompter::new()).await;

    assert_eq!(status, EXIT_SUCCESS);
    let separator = rule();
    let framed = format!("{0}\nABC123\n{0}\n", separator);
    assert!(stdout.contains(&framed), "stdout was:\n{}", stdout);
    assert!(stdout.contains("Authenticating with Garmin..."));
    assert!(stdout.contains("✓ Successfully authenticated with Garmin"));
    assert!(stdout.contains("Add this to your GitHub Secrets as GARMIN_SECRET_STRING"));
}

#[tokio::test]
async fn test_authentication_error_is_reported() {
    let env = MapEnv::new()
        .with(EMAIL_KEY, "runner@example.com")
        .with(PASSWORD_KEY, "wrong");
    let generator = TokenGenerator::new(FakeAuthenticator::failing("invalid credentials"));

    let (status, stdout) = run(&generator, &env, &mut ScriptedPrompter::new()).await;

    assert_eq!(status, EXIT_FAILURE);
    assert_eq!(generator.authenticator().seen().len(), 1);
    assert!(stdout.contains("✗ Authentication failed: invalid credentials"));
    assert!(stdout.contains("Possible reasons:"));
    assert!(!stdout.contains("Your Garmin Secret String:"));
}

#[cfg(unix)]
#[tokio::test]
async fn test_helper_process_end_to_end() {
    use garmin_token_core::HelperAuthenticator;

    let env = MapEnv::new()
        .with(EMAIL_KEY, "runner@example.com")
        .with(PASSWORD_KEY, "hunter2");
    let helper = HelperAuthenticator::new(
        "sh",
        [
            "-c",
            concat!(
                r#"printf 'Email: '; read email; "#,
                r#"printf 'Password: ' >&2; read password; "#,
                r#"echo "TOKEN-$email""#,
            ),
        ],
    );
    let generator = TokenGenerator::new(helper);

    let mut out = Vec::new();
    let status = generator.run(&env, &mut ScriptedPrompter::new(), &mut out).await;
    let stdout = String::from_utf8(out).unwrap();

    assert_eq!(status, EXIT_SUCCESS);
    assert!(stdout.contains(&format!("{0}\nTOKEN-runner@example.com\n{0}\n", rule())));
}
