use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};
use artifex_core::Role;

use crate::app::{App, FocusPane, InputMode, StatusKind};

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    let [header_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);

    let [chat_column, preview_area] = Layout::horizontal([
        Constraint::Percentage(50),
        Constraint::Percentage(50),
    ])
    .areas(body_area);

    render_chat(app, frame, chat_column);
    render_preview(app, frame, preview_area);
    render_footer(app, frame, footer_area);

    if app.show_api_key_input {
        render_api_key_input(app, frame, area);
    }
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let key_indicator = match app.credential_source {
        Some(source) if app.controller.has_credential() => format!(" [key: {}]", source.as_str()),
        _ => " [no API key - press K]".to_string(),
    };

    let title = Line::from(vec![
        Span::styled(" artifex ", Style::default().fg(Color::Magenta).bold()),
        Span::styled(app.model.clone(), Style::default().fg(Color::White)),
        Span::styled(key_indicator, Style::default().fg(Color::Gray)),
        Span::raw(" "),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::Gray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let mode_style = match app.input_mode {
        InputMode::Normal => Style::default().bg(Color::Blue).fg(Color::White),
        InputMode::Editing => Style::default().bg(Color::Yellow).fg(Color::Black),
    };
    let mode_text = match app.input_mode {
        InputMode::Normal => " NORMAL ",
        InputMode::Editing => " PROMPT ",
    };

    let mut spans = vec![Span::styled(mode_text, mode_style), Span::raw(" ")];

    if let Some(status) = &app.status {
        let style = match status.kind {
            StatusKind::Info => Style::default().fg(Color::Green),
            StatusKind::Error => Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        };
        spans.push(Span::styled(status.text.clone(), style));
    } else {
        // Key style: dark background with bright text for visibility on both light/dark terminals
        let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
        let hints: &[(&str, &str)] = match (app.show_api_key_input, app.input_mode) {
            (true, _) => &[("Enter", "save key"), ("Esc", "cancel")],
            (false, InputMode::Editing) => &[("Enter", "generate"), ("Esc", "normal mode")],
            (false, InputMode::Normal) => &[
                ("i", "prompt"),
                ("Tab", "focus"),
                ("j/k", "scroll"),
                ("c", "copy"),
                ("s", "save"),
                ("o", "open preview"),
                ("K", "API key"),
                ("q", "quit"),
            ],
        };
        for (key, label) in hints {
            spans.push(Span::styled(format!(" {} ", key), key_style));
            spans.push(Span::raw(format!(" {}  ", label)));
        }
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_chat(app: &mut App, frame: &mut Frame, area: Rect) {
    let [chat_area, input_area] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(3),
    ])
    .areas(area);

    app.chat_area = Some(chat_area);
    app.chat_height = chat_area.height.saturating_sub(2);
    app.chat_width = chat_area.width.saturating_sub(2);

    let border_color = if app.focus == FocusPane::Chat { Color::Cyan } else { Color::DarkGray };
    let chat_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(" Chat ");

    let transcript = app.controller.transcript();
    let chat_text = if transcript.is_empty() && !app.is_loading() {
        Text::from(vec![
            Line::from(Span::styled(
                "Build an app with AI",
                Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                "Describe what you want to create and the model will generate it.",
                Style::default().fg(Color::DarkGray),
            )),
        ])
    } else {
        let mut lines: Vec<Line> = Vec::new();

        for turn in transcript.iter() {
            let (label, color) = match turn.role() {
                Role::User => ("You:", Color::Cyan),
                Role::Assistant => ("AI:", Color::Yellow),
            };
            lines.push(Line::from(Span::styled(
                label,
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            )));
            for line in turn.content().lines() {
                lines.push(Line::from(line.to_string()));
            }
            lines.push(Line::default());
        }

        if app.is_loading() {
            lines.push(Line::from(Span::styled(
                "AI:",
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            )));
            // Animated ellipsis: cycles through ".", "..", "..."
            let dots = ".".repeat((app.animation_frame as usize) + 1);
            lines.push(Line::from(Span::styled(
                format!("Generating{}", dots),
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
            )));
        }

        Text::from(lines)
    };

    let chat = Paragraph::new(chat_text)
        .block(chat_block)
        .wrap(Wrap { trim: false })
        .scroll((app.chat_scroll, 0));
    frame.render_widget(chat, chat_area);

    render_input(app, frame, input_area);
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let editing = app.input_mode == InputMode::Editing;
    let border_color = if app.is_loading() {
        Color::DarkGray
    } else if editing {
        Color::Yellow
    } else {
        Color::Gray
    };

    let title = if app.is_loading() { " Generating... " } else { " Describe your app " };
    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title);

    // Horizontal scroll keeps the cursor inside the box
    let inner_width = area.width.saturating_sub(2) as usize;
    let cursor_pos = app.input_cursor;
    let scroll_offset = if inner_width > 0 && cursor_pos >= inner_width {
        cursor_pos - inner_width + 1
    } else {
        0
    };

    let visible_text: String = app.input
        .chars()
        .skip(scroll_offset)
        .take(inner_width)
        .collect();

    let input = Paragraph::new(visible_text)
        .style(Style::default().fg(Color::Cyan))
        .block(input_block);
    frame.render_widget(input, area);

    if editing && !app.show_api_key_input {
        let cursor_x = (cursor_pos - scroll_offset) as u16;
        frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
    }
}

fn render_preview(app: &mut App, frame: &mut Frame, area: Rect) {
    app.preview_area = Some(area);

    let border_color = if app.focus == FocusPane::Preview { Color::Cyan } else { Color::DarkGray };
    let mut block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(" Preview ");

    let Some(artifact) = app.controller.artifact() else {
        let placeholder = Paragraph::new(Span::styled(
            "Your app will appear here",
            Style::default().fg(Color::DarkGray),
        ))
        .block(block);
        frame.render_widget(placeholder, area);
        return;
    };

    block = block.title_bottom(Line::from(Span::styled(
        format!(" {} ", app.preview_path.display()),
        Style::default().fg(Color::DarkGray),
    )));

    let lines: Vec<Line> = artifact
        .markup()
        .lines()
        .enumerate()
        .map(|(i, line)| {
            Line::from(vec![
                Span::styled(format!("{:>4} ", i + 1), Style::default().fg(Color::DarkGray)),
                Span::raw(line.to_string()),
            ])
        })
        .collect();

    let source = Paragraph::new(Text::from(lines))
        .block(block)
        .scroll((app.preview_scroll, 0));
    frame.render_widget(source, area);
}

/// Mask all but the last four characters of a key
fn mask_key(key: &str) -> String {
    let len = key.chars().count();
    if len <= 4 {
        return "*".repeat(len);
    }
    let masked_len = len - 4;
    let last_four: String = key.chars().skip(masked_len).collect();
    format!("{}...{}", "*".repeat(masked_len.min(20)), last_four)
}

fn render_api_key_input(app: &App, frame: &mut Frame, area: Rect) {
    let popup_width = 60.min(area.width.saturating_sub(4));
    let popup_height = 7.min(area.height.saturating_sub(2));
    let popup_area = Rect::new(
        area.width.saturating_sub(popup_width) / 2,
        area.height.saturating_sub(popup_height) / 2,
        popup_width,
        popup_height,
    );

    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(" Anthropic API Key ");
    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    // Rows shrink to zero height on short terminals
    let [instructions_area, _, input_area, status_area] = Layout::vertical([
        Constraint::Length(2),
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Length(1),
    ])
    .areas(inner);

    let instructions = Paragraph::new("Paste your key (console.anthropic.com). Enter saves, Esc cancels.")
        .style(Style::default().fg(Color::DarkGray))
        .wrap(Wrap { trim: true });
    frame.render_widget(instructions, instructions_area);

    if input_area.height > 0 {
        let masked = mask_key(&app.api_key_input);
        let cursor_x = masked.chars().count().min(input_area.width as usize) as u16;
        frame.render_widget(
            Paragraph::new(masked).style(Style::default().fg(Color::Cyan)),
            input_area,
        );
        frame.set_cursor_position((input_area.x + cursor_x, input_area.y));
    }

    if status_area.height > 0 {
        let status = Paragraph::new(format!("{} characters", app.api_key_input.chars().count()))
            .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(status, status_area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::{backend::TestBackend, Terminal};

    use crate::app::tests::test_app;

    fn screen_text(terminal: &Terminal<TestBackend>) -> String {
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn test_key_popup_fits_short_terminals() {
        let dir = tempfile::tempdir().unwrap();
        let (mut app, _) = test_app(dir.path(), vec![], None);
        app.open_api_key_input();
        app.api_key_input = "sk-ant-12345678".to_string();

        for height in 1..=8 {
            let mut terminal = Terminal::new(TestBackend::new(80, height)).unwrap();
            terminal.draw(|frame| render(&mut app, frame)).unwrap();
        }
    }

    #[test]
    fn test_key_popup_shows_masked_key() {
        let dir = tempfile::tempdir().unwrap();
        let (mut app, _) = test_app(dir.path(), vec![], None);
        app.open_api_key_input();
        app.api_key_input = "sk-ant-12345678".to_string();

        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        terminal.draw(|frame| render(&mut app, frame)).unwrap();

        let text = screen_text(&terminal);
        assert!(text.contains("Anthropic API Key"));
        assert!(text.contains("...5678"));
        assert!(!text.contains("sk-ant"));
        assert!(text.contains("15 characters"));
    }

    #[test]
    fn test_mask_key_keeps_last_four() {
        assert_eq!(mask_key(""), "");
        assert_eq!(mask_key("abcd"), "****");
        assert_eq!(mask_key("sk-ant-12345678"), "***********...5678");
    }
}
