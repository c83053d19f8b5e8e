use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::CompletionClient;
use crate::config::Config;
use crate::credential::Credential;
use crate::error::CompletionError;
use crate::state::{Role, Turn};

pub const ANTHROPIC_VERSION: &str = "2023-06-01";
const MESSAGES_PATH: &str = "/v1/messages";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Appended after the user's turn on every request; never stored in the transcript.
pub const ARTIFACT_INSTRUCTION: &str = "Create a complete, working HTML application based on this request. \
Include ALL necessary HTML, CSS, and JavaScript in a single file. \
Make it fully functional and interactive. \
Use modern styling with gradients, animations, and a beautiful UI. \
The code should be production-ready.";

#[derive(Debug, Serialize, PartialEq, Eq)]
pub(crate) struct ClaudeMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct ClaudeRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<ClaudeMessage>,
}

#[derive(Deserialize)]
struct ClaudeContent {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize)]
struct ClaudeResponse {
    content: Vec<ClaudeContent>,
}

#[derive(Clone)]
pub struct ClaudeClient {
    client: Client,
    base_url: String,
    model: String,
    max_tokens: u32,
}

impl ClaudeClient {
    pub fn new(base_url: &str, model: &str, max_tokens: u32, timeout: Duration) -> Result<Self, CompletionError> {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            max_tokens,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, CompletionError> {
        Self::new(
            config.base_url(),
            config.model(),
            config.max_tokens(),
            config.request_timeout(),
        )
    }

    pub fn endpoint(&self) -> String {
        format!("{}{}", self.base_url, MESSAGES_PATH)
    }

    /// History, then the new user turn, then the fixed instruction.
    pub(crate) fn build_messages(history: &[Turn], user_text: &str) -> Vec<ClaudeMessage> {
        let mut messages: Vec<ClaudeMessage> = history
            .iter()
            .map(|turn| ClaudeMessage {
                role: turn.role().as_str(),
                content: turn.content().to_string(),
            })
            .collect();

        messages.push(ClaudeMessage {
            role: Role::User.as_str(),
            content: user_text.to_string(),
        });
        messages.push(ClaudeMessage {
            role: Role::User.as_str(),
            content: ARTIFACT_INSTRUCTION.to_string(),
        });

        messages
    }

    pub fn build_request(&self, history: &[Turn], user_text: &str, credential: &Credential) -> RequestBuilder {
        let request = ClaudeRequest {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            messages: Self::build_messages(history, user_text),
        };

        self.client
            .post(self.endpoint())
            .header("x-api-key", credential.expose())
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&request)
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

fn status_error(status: StatusCode, body: String) -> CompletionError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => CompletionError::Authentication {
            status: status.as_u16(),
            body,
        },
        _ => CompletionError::Remote {
            status: status.as_u16(),
            body,
        },
    }
}

#[async_trait]
impl CompletionClient for ClaudeClient {
    async fn submit(
        &self,
        history: &[Turn],
        user_text: &str,
        credential: &Credential,
    ) -> Result<String, CompletionError> {
        log::info!(
            "Requesting completion from {} ({} prior turns)",
            self.model,
            history.len()
        );

        let response = self.build_request(history, user_text, credential).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = match response.text().await {
                Ok(text) => text,
                Err(e) => format!("(could not read error body: {})", e),
            };
            log::warn!("Completion request failed with status {}", status);
            return Err(status_error(status, text));
        }

        let claude_response: ClaudeResponse = response.json().await?;
        claude_response
            .content
            .into_iter()
            .next()
            .and_then(|c| c.text)
            .ok_or_else(|| CompletionError::MalformedResponse("response had no text content".to_string()))
    }
}
