mod config;
pub mod credential;
mod error;
pub mod logging;

pub use config::{AppConfig, CREDENTIAL_ENV_VAR};
pub use credential::Credential;
pub use error::ChatError;
