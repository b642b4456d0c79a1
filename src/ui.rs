use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, Sender};

/// Placeholder shown in the empty input box.
const INPUT_HINT: &str = "Ask about stocks, investments, market trends...";

/// Input box rows the composer may grow to before it scrolls.
const MAX_INPUT_LINES: usize = 5;

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, chat, input (grows with the draft), footer
    let [header_area, chat_area, input_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(input_box_height(&app.input)),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);
    render_chat(app, frame, chat_area);
    render_input(app, frame, input_area);
    render_footer(frame, footer_area);
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let title = Line::from(vec![
        Span::styled(" Brampton Finance AI ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(
            format!("({}) ", app.backend.base_url()),
            Style::default().fg(Color::Gray),
        ),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::Gray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_chat(app: &mut App, frame: &mut Frame, area: Rect) {
    // Inner dimensions (minus borders) feed the scroll-to-bottom math.
    app.chat_height = area.height.saturating_sub(2);
    app.chat_width = area.width.saturating_sub(2);

    let chat_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" Conversation ");

    let mut lines: Vec<Line> = Vec::new();
    for msg in &app.messages {
        let label_style = match msg.sender {
            Sender::User => Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            Sender::Assistant => Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        };
        lines.push(Line::from(Span::styled(
            format!("{}:", msg.sender.label()),
            label_style,
        )));
        for line in msg.text.lines() {
            lines.push(Line::from(line.to_string()));
        }
        lines.push(Line::default());
    }

    if app.awaiting_reply {
        lines.push(Line::from(Span::styled(
            "Brampton:",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )));
        // Animated ellipsis: cycles through ".", "..", "..."
        let dots = ".".repeat((app.animation_frame as usize) + 1);
        lines.push(Line::from(Span::styled(
            format!("Thinking{}", dots),
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        )));
    }

    let chat = Paragraph::new(Text::from(lines))
        .block(chat_block)
        .wrap(Wrap { trim: true })
        .scroll((app.chat_scroll, 0));

    frame.render_widget(chat, area);
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let border_color = if app.awaiting_reply {
        Color::DarkGray
    } else {
        Color::Yellow
    };

    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(" Message ");

    let inner_width = area.width.saturating_sub(2) as usize;
    let inner_height = area.height.saturating_sub(2) as usize;
    let (cursor_row, cursor_col) = cursor_position(&app.input, app.input_cursor);

    // Keep the cursor visible: scroll the paragraph, don't move the cursor.
    let v_scroll = cursor_row.saturating_sub(inner_height.saturating_sub(1));
    let h_scroll = if inner_width == 0 {
        0
    } else {
        cursor_col.saturating_sub(inner_width - 1)
    };

    let input = if app.input.is_empty() {
        Paragraph::new(Span::styled(INPUT_HINT, Style::default().fg(Color::DarkGray)))
            .block(input_block)
    } else {
        Paragraph::new(app.input.as_str())
            .style(Style::default().fg(Color::Cyan))
            .scroll((v_scroll as u16, h_scroll as u16))
            .block(input_block)
    };

    frame.render_widget(input, area);

    frame.set_cursor_position((
        area.x + 1 + (cursor_col - h_scroll) as u16,
        area.y + 1 + (cursor_row - v_scroll) as u16,
    ));
}

fn render_footer(frame: &mut Frame, area: Rect) {
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let hints = vec![
        Span::styled(" Enter ", key_style),
        Span::styled(" send ", label_style),
        Span::styled(" Shift+Enter ", key_style),
        Span::styled(" newline ", label_style),
        Span::styled(" Up/Down ", key_style),
        Span::styled(" scroll ", label_style),
        Span::styled(" Esc ", key_style),
        Span::styled(" quit ", label_style),
    ];

    frame.render_widget(Paragraph::new(Line::from(hints)), area);
}

/// Bordered height of the input box: grows with the draft up to a cap.
fn input_box_height(input: &str) -> u16 {
    let lines = input.split('\n').count().max(1);
    (lines.min(MAX_INPUT_LINES) as u16) + 2
}

/// (row, column) of a char-indexed cursor within a multi-line buffer.
fn cursor_position(input: &str, cursor: usize) -> (usize, usize) {
    let mut row = 0;
    let mut col = 0;
    for c in input.chars().take(cursor) {
        if c == '\n' {
            row += 1;
            col = 0;
        } else {
            col += 1;
        }
    }
    (row, col)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_box_height_grows_and_caps() {
        assert_eq!(input_box_height(""), 3);
        assert_eq!(input_box_height("one line"), 3);
        assert_eq!(input_box_height("a\nb"), 4);
        assert_eq!(input_box_height("a\nb\nc\nd\ne\nf\ng"), (MAX_INPUT_LINES as u16) + 2);
    }

    #[test]
    fn test_cursor_position_tracks_newlines() {
        assert_eq!(cursor_position("", 0), (0, 0));
        assert_eq!(cursor_position("abc", 2), (0, 2));
        assert_eq!(cursor_position("ab\ncd", 3), (1, 0));
        assert_eq!(cursor_position("ab\ncd", 5), (1, 2));
    }

    #[test]
    fn test_cursor_position_counts_chars_not_bytes() {
        // 'ç' and 'ã' are multi-byte; the column is still a char count.
        assert_eq!(cursor_position("ação", 4), (0, 4));
    }
}
