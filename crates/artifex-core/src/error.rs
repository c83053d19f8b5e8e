use thiserror::Error;

/// Failure of a single completion request. None of these carry the credential.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompletionError {
    /// The endpoint rejected the credential (401/403).
    #[error("API key rejected ({status}): {body}")]
    Authentication { status: u16, body: String },

    /// Connectivity failure, including timeouts.
    #[error("network error: {0}")]
    Transport(String),

    /// Any other non-success status.
    #[error("API error {status}: {body}")]
    Remote { status: u16, body: String },

    /// Success status, but the body was not a usable completion.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// The background task running the request died before reporting back.
    #[error("request task failed: {0}")]
    TaskFailed(String),
}

impl From<reqwest::Error> for CompletionError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            return CompletionError::MalformedResponse(err.to_string());
        }
        if err.is_timeout() {
            return CompletionError::Transport(format!("request timed out: {err}"));
        }
        let mut message = err.to_string();
        let mut source = std::error::Error::source(&err);
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        CompletionError::Transport(message)
    }
}

/// A submission refused before anything reaches the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Enter a description of the app you want to build")]
    EmptyInput,

    #[error("Set your Anthropic API key in settings first")]
    MissingCredential,

    #[error("Still generating the previous request")]
    RequestPending,
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("could not write preview {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
