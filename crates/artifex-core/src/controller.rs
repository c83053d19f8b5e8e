//! Turn sequencing: validate, record, request, extract, render.
//!
//! The controller is split into [`Controller::begin_submit`] and
//! [`Controller::finish`] so a UI can run the network call on a background task
//! and keep drawing while it waits. [`Controller::submit`] does both in line.
//! While a request is outstanding the controller is `AwaitingResponse` and
//! refuses further submissions, so at most one request exists at a time.

use std::sync::Arc;

use crate::ai::CompletionClient;
use crate::credential::Credential;
use crate::error::{CompletionError, ValidationError};
use crate::extract::{extract_artifact, ExtractionSource};
use crate::render::RenderSurface;
use crate::state::{Artifact, Transcript, Turn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    Idle,
    AwaitingResponse,
}

/// Everything one request needs, captured at submission time.
pub struct PendingTurn {
    history: Vec<Turn>,
    user_text: String,
    credential: Credential,
}

impl PendingTurn {
    pub fn user_text(&self) -> &str {
        &self.user_text
    }

    pub async fn send(self, client: &dyn CompletionClient) -> Result<String, CompletionError> {
        client
            .submit(&self.history, &self.user_text, &self.credential)
            .await
    }
}

/// What happened when a response (or failure) came back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    Rendered { source: ExtractionSource },
    /// The artifact was updated but the surface could not show it.
    RenderFailed { source: ExtractionSource, message: String },
    /// Recorded in the transcript as an error turn.
    Failed(CompletionError),
    /// A result arrived with no request outstanding; ignored.
    Stale,
}

pub struct Controller {
    transcript: Transcript,
    artifact: Option<Artifact>,
    state: ControllerState,
    credential: Option<Credential>,
    client: Arc<dyn CompletionClient>,
    surface: Box<dyn RenderSurface>,
}

impl Controller {
    pub fn new(
        client: Arc<dyn CompletionClient>,
        surface: Box<dyn RenderSurface>,
        credential: Option<Credential>,
    ) -> Self {
        Self {
            transcript: Transcript::new(),
            artifact: None,
            state: ControllerState::Idle,
            credential,
            client,
            surface,
        }
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn is_awaiting(&self) -> bool {
        self.state == ControllerState::AwaitingResponse
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn artifact(&self) -> Option<&Artifact> {
        self.artifact.as_ref()
    }

    pub fn client(&self) -> Arc<dyn CompletionClient> {
        Arc::clone(&self.client)
    }

    pub fn has_credential(&self) -> bool {
        self.credential.as_ref().is_some_and(|c| !c.is_empty())
    }

    /// Takes effect on the next submission; an in-flight request keeps its key.
    pub fn set_credential(&mut self, credential: Option<Credential>) {
        self.credential = credential;
    }

    /// Validate `input`, record it as a user turn, and enter `AwaitingResponse`.
    ///
    /// On error nothing changes: no turn is appended and no request may be sent.
    pub fn begin_submit(&mut self, input: &str) -> Result<PendingTurn, ValidationError> {
        if self.is_awaiting() {
            log::debug!("Rejected submission: request already pending");
            return Err(ValidationError::RequestPending);
        }
        if input.trim().is_empty() {
            return Err(ValidationError::EmptyInput);
        }
        let credential = match &self.credential {
            Some(c) if !c.is_empty() => c.clone(),
            _ => {
                log::debug!("Rejected submission: no API key configured");
                return Err(ValidationError::MissingCredential);
            }
        };

        let history = self.transcript.turns().to_vec();
        self.transcript.append(Turn::user(input));
        self.state = ControllerState::AwaitingResponse;

        Ok(PendingTurn {
            history,
            user_text: input.to_string(),
            credential,
        })
    }

    /// Record the result of the outstanding request and return to `Idle`.
    ///
    /// Failures become an assistant turn describing the error; they are never
    /// returned as `Err`. The artifact only changes on success.
    pub fn finish(&mut self, outcome: Result<String, CompletionError>) -> TurnOutcome {
        if !self.is_awaiting() {
            log::warn!("Dropping completion result: no request outstanding");
            return TurnOutcome::Stale;
        }
        self.state = ControllerState::Idle;

        let reply = match outcome {
            Ok(reply) => reply,
            Err(err) => {
                log::warn!("Completion failed: {}", err);
                self.transcript.append(Turn::assistant(error_summary(&err)));
                return TurnOutcome::Failed(err);
            }
        };

        let extraction = extract_artifact(&reply);
        let source = extraction.source;
        let artifact = Artifact::new(extraction.markup);
        log::info!(
            "Extracted {} lines of markup ({:?})",
            artifact.line_count(),
            source
        );

        let rendered = self.surface.display(artifact.markup());
        self.artifact = Some(artifact);
        self.transcript.append(Turn::assistant(reply));

        match rendered {
            Ok(()) => TurnOutcome::Rendered { source },
            Err(err) => {
                log::error!("Preview update failed: {}", err);
                TurnOutcome::RenderFailed {
                    source,
                    message: err.to_string(),
                }
            }
        }
    }

    /// One full turn without a background task.
    pub async fn submit(&mut self, input: &str) -> Result<TurnOutcome, ValidationError> {
        let pending = self.begin_submit(input)?;
        let client = Arc::clone(&self.client);
        let outcome = pending.send(client.as_ref()).await;
        Ok(self.finish(outcome))
    }
}

/// The text shown in place of a reply when a request fails.
pub fn error_summary(err: &CompletionError) -> String {
    format!("Error: {}. Check your API key and try again.", err)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_summary_mentions_cause() {
        let summary = error_summary(&CompletionError::Remote {
            status: 529,
            body: "overloaded".to_string(),
        });
        assert!(summary.starts_with("Error: "));
        assert!(summary.contains("529"));
        assert!(summary.contains("overloaded"));
    }
}
