use std::env;
use std::path::PathBuf;

/// Environment variable holding the Gemini API key.
pub const CREDENTIAL_ENV_VAR: &str = "GEMINI_API_KEY";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub history_path: PathBuf,
    pub gemini_api_hostname: String,
    pub gemini_model: String,
    pub web_ui_path: PathBuf,
}

impl AppConfig {
    /// Loads a `.env` file if one exists and then reads the config
    /// from the environment.
    pub fn from_env() -> Self {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!("Loaded environment from {}", path.display());
        }
        Self::default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        let history_path =
            env::var("GEMCHAT_HISTORY_PATH").unwrap_or_else(|_| "chat_history.json".to_string());
        let gemini_api_hostname = env::var("GEMCHAT_API_HOST")
            .unwrap_or_else(|_| "https://generativelanguage.googleapis.com".to_string());
        let gemini_model =
            env::var("GEMCHAT_MODEL").unwrap_or_else(|_| "gemini-2.5-flash".to_string());
        let web_ui_path = env::var("GEMCHAT_WEB_UI_PATH").unwrap_or_else(|_| "./web-ui".to_string());

        Self {
            history_path: PathBuf::from(history_path),
            gemini_api_hostname,
            gemini_model,
            web_ui_path: PathBuf::from(web_ui_path),
        }
    }
}
