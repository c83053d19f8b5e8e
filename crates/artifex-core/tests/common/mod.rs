#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use artifex_core::{CompletionClient, CompletionError, Credential, RenderError, RenderSurface, Turn};
use async_trait::async_trait;

/// A recorded call to [`ScriptedClient::submit`].
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub history: Vec<Turn>,
    pub user_text: String,
    pub credential: String,
}

/// Replays canned results in order and records every request.
#[derive(Default)]
pub struct ScriptedClient {
    replies: Mutex<VecDeque<Result<String, CompletionError>>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl ScriptedClient {
    pub fn new(replies: Vec<Result<String, CompletionError>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl CompletionClient for ScriptedClient {
    async fn submit(
        &self,
        history: &[Turn],
        user_text: &str,
        credential: &Credential,
    ) -> Result<String, CompletionError> {
        self.requests.lock().unwrap().push(RecordedRequest {
            history: history.to_vec(),
            user_text: user_text.to_string(),
            credential: credential.expose().to_string(),
        });
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(CompletionError::Transport("no scripted reply".to_string())))
    }
}

/// Shares its display log with the test through an `Arc`.
#[derive(Clone, Default)]
pub struct RecordingSurface {
    pub displayed: Arc<Mutex<Vec<String>>>,
    pub fail: bool,
}

impl RecordingSurface {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.displayed.lock().unwrap().clone()
    }
}

impl RenderSurface for RecordingSurface {
    fn display(&mut self, markup: &str) -> Result<(), RenderError> {
        self.displayed.lock().unwrap().push(markup.to_string());
        if self.fail {
            return Err(RenderError::Io {
                path: "preview.html".to_string(),
                source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
            });
        }
        Ok(())
    }
}

pub fn html_reply(body: &str) -> String {
    format!("Here is your app:\n```html\n{}\n```\nOpen it in a browser.", body)
}
