//! Resolution of the API key used for generation calls.
//!
//! The key is only ever held in memory. It is never written to the
//! transcript or anywhere else on disk.
use std::env;
use std::fmt;

use anyhow::Result;
use dialoguer::Password;

use super::config::CREDENTIAL_ENV_VAR;

/// Secret string authorizing calls to the generation API.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Returns `None` for blank input so an empty form field or
    /// env var never counts as a credential.
    pub fn new(secret: &str) -> Option<Self> {
        let secret = secret.trim();
        if secret.is_empty() {
            None
        } else {
            Some(Self(secret.to_string()))
        }
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// Looks up the credential in the environment.
pub fn from_env() -> Option<Credential> {
    env::var(CREDENTIAL_ENV_VAR)
        .ok()
        .and_then(|v| Credential::new(&v))
}

/// Asks for the credential on the terminal with masked input.
pub fn prompt() -> Result<Option<Credential>> {
    let input = Password::new()
        .with_prompt("Enter your Gemini API Key")
        .allow_empty_password(true)
        .interact()?;
    Ok(Credential::new(&input))
}

/// Environment first, then an interactive prompt when `interactive`
/// is set. Returns `None` if neither produced a key.
pub fn resolve(interactive: bool) -> Result<Option<Credential>> {
    if let Some(credential) = from_env() {
        tracing::debug!("Using credential from {}", CREDENTIAL_ENV_VAR);
        return Ok(Some(credential));
    }
    if interactive {
        return prompt();
    }
    Ok(None)
}
