pub mod ai;
pub mod config;
pub mod controller;
pub mod credential;
pub mod error;
pub mod export;
pub mod extract;
pub mod render;
pub mod state;

// Re-export main types for convenience
pub use ai::{ClaudeClient, CompletionClient};
pub use config::Config;
pub use controller::{Controller, ControllerState, PendingTurn, TurnOutcome};
pub use credential::{Credential, CredentialSource, CredentialStore};
pub use error::{CompletionError, RenderError, ValidationError};
pub use export::save_artifact;
pub use extract::{extract, extract_artifact, Extraction, ExtractionSource};
pub use render::{RenderSurface, SandboxedPreview};
pub use state::{Artifact, Role, Transcript, Turn};
