use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;

use crate::app::{App, FocusPane, InputMode, StatusKind};
use crate::tui::AppEvent;

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub async fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Resize => {}
        AppEvent::Tick => {
            app.tick_animation();
            app.poll_request().await;
        }
    }
    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    if app.show_api_key_input {
        handle_api_key_input(app, key);
        return;
    }

    match app.input_mode {
        InputMode::Normal => handle_normal_mode(app, key),
        InputMode::Editing => handle_editing_mode(app, key),
    }
}

fn handle_normal_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,

        // Start typing (blocked while a request is outstanding)
        KeyCode::Char('i') | KeyCode::Enter => {
            if app.is_loading() {
                app.set_status("Still generating...", StatusKind::Info);
            } else {
                app.input_mode = InputMode::Editing;
                app.focus = FocusPane::Chat;
            }
        }

        KeyCode::Tab => {
            app.focus = match app.focus {
                FocusPane::Chat => FocusPane::Preview,
                FocusPane::Preview => FocusPane::Chat,
            };
        }

        KeyCode::Char('j') | KeyCode::Down => match app.focus {
            FocusPane::Chat => app.chat_scroll = app.chat_scroll.saturating_add(1),
            FocusPane::Preview => app.scroll_preview_down(1),
        },
        KeyCode::Char('k') | KeyCode::Up => match app.focus {
            FocusPane::Chat => app.chat_scroll = app.chat_scroll.saturating_sub(1),
            FocusPane::Preview => app.scroll_preview_up(1),
        },
        KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            let half_page = (app.chat_height / 2).max(1);
            match app.focus {
                FocusPane::Chat => app.chat_scroll = app.chat_scroll.saturating_add(half_page),
                FocusPane::Preview => app.scroll_preview_down(half_page),
            }
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            let half_page = (app.chat_height / 2).max(1);
            match app.focus {
                FocusPane::Chat => app.chat_scroll = app.chat_scroll.saturating_sub(half_page),
                FocusPane::Preview => app.scroll_preview_up(half_page),
            }
        }
        KeyCode::Char('G') => app.scroll_chat_to_bottom(),

        // Artifact actions
        KeyCode::Char('c') => app.copy_artifact(),
        KeyCode::Char('s') => app.save_artifact(),
        KeyCode::Char('o') => app.open_preview_in_browser(),

        // Settings
        KeyCode::Char('K') => app.open_api_key_input(),

        _ => {}
    }
}

fn handle_editing_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.input_mode = InputMode::Normal;
        }
        KeyCode::Enter => {
            app.submit_input();
        }
        KeyCode::Backspace => {
            if app.input_cursor > 0 {
                app.input_cursor -= 1;
                let byte_pos = char_to_byte_index(&app.input, app.input_cursor);
                app.input.remove(byte_pos);
            }
        }
        KeyCode::Delete => {
            if app.input_cursor < app.input.chars().count() {
                let byte_pos = char_to_byte_index(&app.input, app.input_cursor);
                app.input.remove(byte_pos);
            }
        }
        KeyCode::Left => {
            app.input_cursor = app.input_cursor.saturating_sub(1);
        }
        KeyCode::Right => {
            app.input_cursor = (app.input_cursor + 1).min(app.input.chars().count());
        }
        KeyCode::Home => {
            app.input_cursor = 0;
        }
        KeyCode::End => {
            app.input_cursor = app.input.chars().count();
        }
        KeyCode::Char(c) => {
            let byte_pos = char_to_byte_index(&app.input, app.input_cursor);
            app.input.insert(byte_pos, c);
            app.input_cursor += 1;
        }
        _ => {}
    }
}

fn handle_api_key_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.close_api_key_input(),
        KeyCode::Enter => {
            if let Err(e) = app.save_api_key() {
                log::error!("Failed to save API key: {}", e);
                app.set_status(format!("Could not save API key: {}", e), StatusKind::Error);
            }
        }
        KeyCode::Backspace => {
            if app.api_key_input_cursor > 0 {
                app.api_key_input_cursor -= 1;
                let byte_pos = char_to_byte_index(&app.api_key_input, app.api_key_input_cursor);
                app.api_key_input.remove(byte_pos);
            }
        }
        KeyCode::Left => {
            app.api_key_input_cursor = app.api_key_input_cursor.saturating_sub(1);
        }
        KeyCode::Right => {
            app.api_key_input_cursor = (app.api_key_input_cursor + 1).min(app.api_key_input.chars().count());
        }
        KeyCode::Char(c) => {
            let byte_pos = char_to_byte_index(&app.api_key_input, app.api_key_input_cursor);
            app.api_key_input.insert(byte_pos, c);
            app.api_key_input_cursor += 1;
        }
        _ => {}
    }
}

/// Check if a point is within a rectangle
fn point_in_rect(x: u16, y: u16, rect: Rect) -> bool {
    x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    let (x, y) = (mouse.column, mouse.row);
    let in_chat = app.chat_area.is_some_and(|r| point_in_rect(x, y, r));
    let in_preview = app.preview_area.is_some_and(|r| point_in_rect(x, y, r));

    match mouse.kind {
        MouseEventKind::ScrollDown if in_chat => app.chat_scroll = app.chat_scroll.saturating_add(3),
        MouseEventKind::ScrollDown if in_preview => app.scroll_preview_down(3),
        MouseEventKind::ScrollUp if in_chat => app.chat_scroll = app.chat_scroll.saturating_sub(3),
        MouseEventKind::ScrollUp if in_preview => app.scroll_preview_up(3),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_char_to_byte_index_multibyte() {
        let s = "añb";
        assert_eq!(char_to_byte_index(s, 0), 0);
        assert_eq!(char_to_byte_index(s, 2), 3);
        assert_eq!(char_to_byte_index(s, 10), s.len());
    }

    #[test]
    fn test_point_in_rect_edges() {
        let rect = Rect::new(2, 2, 4, 3);
        assert!(point_in_rect(2, 2, rect));
        assert!(point_in_rect(5, 4, rect));
        assert!(!point_in_rect(6, 4, rect));
        assert!(!point_in_rect(2, 5, rect));
    }
}
