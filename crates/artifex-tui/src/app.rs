use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::Result;
use ratatui::layout::Rect;
use tokio::task::JoinHandle;

use artifex_core::{
    save_artifact, CompletionError, Config, Controller, Credential, CredentialSource, CredentialStore,
    ExtractionSource, TurnOutcome,
};

use crate::platform;

/// How long a transient status (e.g. "Copied") stays in the footer.
const STATUS_TTL: Duration = Duration::from_secs(2);

pub type BrowserOpener = Box<dyn FnMut(&Path) -> Result<()>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusPane {
    Chat,
    Preview,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Info,
    Error,
}

#[derive(Debug, Clone)]
pub struct StatusMessage {
    pub text: String,
    pub kind: StatusKind,
    expires_at: Instant,
}

pub struct App {
    pub should_quit: bool,
    pub input_mode: InputMode,
    pub focus: FocusPane,

    // Prompt input
    pub input: String,
    pub input_cursor: usize, // cursor position in chars, not bytes

    // Chat panel
    pub controller: Controller,
    pub request_task: Option<JoinHandle<Result<String, CompletionError>>>,
    pub chat_scroll: u16,
    pub chat_height: u16, // inner height, updated during render
    pub chat_width: u16,  // inner width, updated during render

    // Preview panel
    pub preview_scroll: u16,
    pub preview_path: PathBuf,
    pub export_dir: PathBuf,
    pub open_preview: bool,
    pub preview_opened: bool,
    pub open_browser: BrowserOpener,

    // Settings popup
    pub show_api_key_input: bool,
    pub api_key_input: String,
    pub api_key_input_cursor: usize,
    pub credential_store: CredentialStore,
    pub credential_source: Option<CredentialSource>,

    pub model: String,
    pub status: Option<StatusMessage>,
    pub animation_frame: u8, // 0-2 for ellipsis animation

    // Panel areas for mouse hit-testing (updated during render)
    pub chat_area: Option<Rect>,
    pub preview_area: Option<Rect>,
}

impl App {
    pub fn new(
        config: &Config,
        controller: Controller,
        credential_store: CredentialStore,
        credential_source: Option<CredentialSource>,
        preview_path: PathBuf,
    ) -> Self {
        Self {
            should_quit: false,
            input_mode: InputMode::Editing,
            focus: FocusPane::Chat,

            input: String::new(),
            input_cursor: 0,

            controller,
            request_task: None,
            chat_scroll: 0,
            chat_height: 0,
            chat_width: 0,

            preview_scroll: 0,
            preview_path,
            export_dir: config.export_dir(),
            open_preview: config.open_preview(),
            preview_opened: false,
            open_browser: Box::new(platform::open_in_browser),

            show_api_key_input: false,
            api_key_input: String::new(),
            api_key_input_cursor: 0,
            credential_store,
            credential_source,

            model: config.model().to_string(),
            status: None,
            animation_frame: 0,

            chat_area: None,
            preview_area: None,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.controller.is_awaiting()
    }

    pub fn set_status(&mut self, text: impl Into<String>, kind: StatusKind) {
        self.status = Some(StatusMessage {
            text: text.into(),
            kind,
            expires_at: Instant::now() + STATUS_TTL,
        });
    }

    /// Validate and dispatch the prompt in the input box on a background task.
    pub fn submit_input(&mut self) {
        let pending = match self.controller.begin_submit(&self.input) {
            Ok(pending) => pending,
            Err(err) => {
                self.set_status(err.to_string(), StatusKind::Error);
                return;
            }
        };

        log::info!("Submitting prompt ({} chars)", pending.user_text().chars().count());
        self.input.clear();
        self.input_cursor = 0;
        self.input_mode = InputMode::Normal;
        self.scroll_chat_to_bottom();

        let client = self.controller.client();
        self.request_task = Some(tokio::spawn(async move { pending.send(client.as_ref()).await }));
    }

    /// Called on every tick: collect a finished request and expire stale status.
    pub async fn poll_request(&mut self) {
        if let Some(status) = &self.status {
            if Instant::now() >= status.expires_at {
                self.status = None;
            }
        }

        let finished = self.request_task.as_ref().is_some_and(|task| task.is_finished());
        if !finished {
            return;
        }
        let Some(task) = self.request_task.take() else {
            return;
        };

        let outcome = match task.await {
            Ok(result) => result,
            Err(e) => Err(CompletionError::TaskFailed(e.to_string())),
        };
        let turn = self.controller.finish(outcome);
        self.on_turn_finished(turn);
    }

    fn on_turn_finished(&mut self, outcome: TurnOutcome) {
        match outcome {
            TurnOutcome::Rendered { source } => {
                self.preview_scroll = 0;
                if source == ExtractionSource::Fallback {
                    self.set_status("No code block in reply; showing raw text", StatusKind::Info);
                }
                if self.open_preview && !self.preview_opened {
                    self.open_preview_in_browser();
                }
            }
            TurnOutcome::RenderFailed { message, .. } => {
                self.preview_scroll = 0;
                self.set_status(message, StatusKind::Error);
            }
            TurnOutcome::Failed(_) | TurnOutcome::Stale => {}
        }
        self.scroll_chat_to_bottom();
    }

    pub fn copy_artifact(&mut self) {
        let Some(artifact) = self.controller.artifact() else {
            self.set_status("Nothing generated yet", StatusKind::Error);
            return;
        };
        match platform::copy_to_clipboard(artifact.markup()) {
            Ok(()) => self.set_status("Copied", StatusKind::Info),
            Err(e) => self.set_status(e.to_string(), StatusKind::Error),
        }
    }

    pub fn save_artifact(&mut self) {
        let Some(artifact) = self.controller.artifact() else {
            self.set_status("Nothing generated yet", StatusKind::Error);
            return;
        };
        match save_artifact(artifact, &self.export_dir) {
            Ok(path) => self.set_status(format!("Saved {}", path.display()), StatusKind::Info),
            Err(e) => self.set_status(e.to_string(), StatusKind::Error),
        }
    }

    pub fn open_preview_in_browser(&mut self) {
        if self.controller.artifact().is_none() {
            self.set_status("Nothing generated yet", StatusKind::Error);
            return;
        }
        match (self.open_browser)(&self.preview_path) {
            Ok(()) => self.preview_opened = true,
            Err(e) => self.set_status(e.to_string(), StatusKind::Error),
        }
    }

    // API key popup
    pub fn open_api_key_input(&mut self) {
        self.show_api_key_input = true;
        self.api_key_input.clear();
        self.api_key_input_cursor = 0;
    }

    pub fn close_api_key_input(&mut self) {
        self.show_api_key_input = false;
        self.api_key_input.clear();
        self.api_key_input_cursor = 0;
    }

    /// Persist the typed key and hand it to the controller for the next request.
    pub fn save_api_key(&mut self) -> Result<()> {
        let credential = Credential::new(self.api_key_input.trim());
        self.credential_store.save(&credential)?;
        self.controller.set_credential(Some(credential));
        self.credential_source = Some(CredentialSource::Config);
        self.close_api_key_input();
        self.set_status("API key saved", StatusKind::Info);
        Ok(())
    }

    pub fn tick_animation(&mut self) {
        if self.is_loading() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    pub fn artifact_line_count(&self) -> u16 {
        self.controller
            .artifact()
            .map(|a| a.line_count().min(u16::MAX as usize) as u16)
            .unwrap_or(0)
    }

    pub fn scroll_preview_down(&mut self, lines: u16) {
        let max = self.artifact_line_count().saturating_sub(1);
        self.preview_scroll = self.preview_scroll.saturating_add(lines).min(max);
    }

    pub fn scroll_preview_up(&mut self, lines: u16) {
        self.preview_scroll = self.preview_scroll.saturating_sub(lines);
    }

    /// Scroll chat to bottom so the newest turn (or "Generating...") is visible
    pub fn scroll_chat_to_bottom(&mut self) {
        let wrap_width = if self.chat_width > 0 { self.chat_width as usize } else { 50 };

        let mut total_lines: u16 = 0;
        for turn in self.controller.transcript().iter() {
            total_lines = total_lines.saturating_add(1); // "You:" / "AI:"
            for line in turn.content().lines() {
                // chars, not bytes, for UTF-8 content
                let char_count = line.chars().count();
                let wrapped = char_count.div_ceil(wrap_width).max(1);
                total_lines = total_lines.saturating_add(u16::try_from(wrapped).unwrap_or(u16::MAX));
            }
            total_lines = total_lines.saturating_add(1); // blank line after turn
        }
        if self.is_loading() {
            total_lines = total_lines.saturating_add(2);
        }

        let visible_height = if self.chat_height > 0 { self.chat_height } else { 20 };
        self.chat_scroll = total_lines.saturating_sub(visible_height);
    }
}
