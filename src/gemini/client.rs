use anyhow::{Error, Result, anyhow, bail};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::chat::{Role, Turn};
use crate::core::{ChatError, Credential};

// Sampling is fixed and not configurable by users.
pub const TEMPERATURE: f64 = 0.7;
pub const TOP_P: f64 = 0.8;
pub const TOP_K: u32 = 40;

#[derive(Debug, Serialize)]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    pub generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct Content {
    pub role: String,
    pub parts: Vec<Part>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct Part {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct GenerationConfig {
    pub temperature: f64,
    #[serde(rename = "topP")]
    pub top_p: f64,
    #[serde(rename = "topK")]
    pub top_k: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: TEMPERATURE,
            top_p: TOP_P,
            top_k: TOP_K,
        }
    }
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
    error: Option<ApiErrorBody>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

impl Content {
    fn new(role: Role, text: &str) -> Self {
        // The API calls the assistant role "model"
        let role = match role {
            Role::User => "user",
            Role::Assistant => "model",
        };
        Content {
            role: role.to_string(),
            parts: vec![Part {
                text: text.to_string(),
            }],
        }
    }
}

impl GenerateContentRequest {
    /// Prior turns in order followed by the active prompt. The prompt
    /// must not already be the last entry of `history`.
    pub fn new(prompt: &str, history: &[Turn]) -> Self {
        let mut contents: Vec<Content> = history
            .iter()
            .map(|turn| Content::new(turn.role, &turn.content))
            .collect();
        contents.push(Content::new(Role::User, prompt));

        Self {
            contents,
            generation_config: GenerationConfig::default(),
        }
    }
}

/// Anything that can produce the next assistant message.
#[async_trait]
pub trait Generate {
    async fn generate(
        &self,
        credential: &Credential,
        prompt: &str,
        history: &[Turn],
    ) -> Result<String, ChatError>;
}

pub type BoxedGenerate = Box<dyn Generate + Send + Sync + 'static>;

/// Client for the hosted Gemini `generateContent` endpoint. Makes
/// exactly one request per call with no retries.
#[derive(Clone, Debug)]
pub struct GeminiClient {
    api_hostname: String,
    model: String,
    client: reqwest::Client,
}

impl GeminiClient {
    pub fn new(api_hostname: &str, model: &str) -> Self {
        Self {
            api_hostname: api_hostname.trim_end_matches('/').to_string(),
            model: model.to_string(),
            client: reqwest::Client::new(),
        }
    }

    fn url(&self) -> String {
        let model = self.model.trim_start_matches("models/");
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.api_hostname, model
        )
    }

    async fn completion(
        &self,
        credential: &Credential,
        request: &GenerateContentRequest,
    ) -> Result<String, Error> {
        let response = self
            .client
            .post(self.url())
            .header("x-goog-api-key", credential.expose())
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorEnvelope>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            bail!("Gemini API error ({}): {}", status, message);
        }

        let resp: GenerateContentResponse = response.json().await?;
        if let Some(err) = resp.error {
            bail!("Gemini API error: {}", err.message);
        }

        let text: String = resp
            .candidates
            .and_then(|c| c.into_iter().next())
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.is_empty() {
            return Err(anyhow!("No text in Gemini response"));
        }
        Ok(text)
    }
}

#[async_trait]
impl Generate for GeminiClient {
    async fn generate(
        &self,
        credential: &Credential,
        prompt: &str,
        history: &[Turn],
    ) -> Result<String, ChatError> {
        let request = GenerateContentRequest::new(prompt, history);
        tracing::debug!(
            "Calling {} with {} prior turns",
            self.model,
            history.len()
        );
        self.completion(credential, &request).await.map_err(|e| {
            tracing::error!("Generation failed: {}", e);
            ChatError::Generation(e.to_string())
        })
    }
}
