use std::io::{self, Stderr};
use std::time::Duration;
use anyhow::Result;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEvent, KeyEventKind, MouseEvent},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use futures_util::StreamExt;
use tokio::sync::mpsc;

pub type Tui = Terminal<CrosstermBackend<Stderr>>;

#[derive(Debug)]
pub enum AppEvent {
    Key(KeyEvent),
    Mouse(MouseEvent),
    Resize,
    /// Drives the loading animation and polls the in-flight request.
    Tick,
}

pub struct EventHandler {
    rx: mpsc::UnboundedReceiver<AppEvent>,
}

impl EventHandler {
    pub fn new(tick_rate: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            let mut reader = event::EventStream::new();
            let mut ticks = tokio::time::interval(tick_rate);

            loop {
                let app_event = tokio::select! {
                    _ = ticks.tick() => Some(AppEvent::Tick),
                    maybe_event = reader.next() => match maybe_event {
                        // Only key presses; releases and repeats are noise here
                        Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => Some(AppEvent::Key(key)),
                        Some(Ok(Event::Mouse(mouse))) => Some(AppEvent::Mouse(mouse)),
                        Some(Ok(Event::Resize(_, _))) => Some(AppEvent::Resize),
                        Some(Ok(_)) => None,
                        Some(Err(e)) => {
                            log::warn!("Terminal event stream error: {}", e);
                            None
                        }
                        None => break,
                    },
                };

                if let Some(event) = app_event {
                    if tx.send(event).is_err() {
                        break;
                    }
                }
            }
        });

        Self { rx }
    }

    pub async fn next(&mut self) -> Option<AppEvent> {
        self.rx.recv().await
    }
}

pub fn init() -> Result<Tui> {
    enable_raw_mode()?;
    execute!(io::stderr(), EnterAlternateScreen, EnableMouseCapture)?;

    let backend = CrosstermBackend::new(io::stderr());
    let terminal = Terminal::new(backend)?;

    Ok(terminal)
}

pub fn restore() -> Result<()> {
    execute!(io::stderr(), DisableMouseCapture, LeaveAlternateScreen)?;
    disable_raw_mode()?;
    Ok(())
}

/// Install panic hook to restore terminal on panic
pub fn install_panic_hook() {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = restore();
        original_hook(panic_info);
    }));
}
