use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Flex, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};
use sounding_board_core::ChatRole;
use crate::app::App;

const TITLE: &str = "Sounding Board";
const SUBTITLE: &str = "AI Career Coach for Scientists";
const EMPTY_PROMPT: &str = "Start a conversation with your AI career coach";
const EMPTY_HINT: &str = "Ask about career transitions, portfolio building, or job search strategies";

/// Parse a line of text and convert **bold** markdown to styled spans
fn parse_markdown_line(text: &str) -> Line<'static> {
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut rest = text;

    while let Some(start) = rest.find("**") {
        let after = &rest[start + 2..];
        let Some(end) = after.find("**") else { break };

        if start > 0 {
            spans.push(Span::raw(rest[..start].to_string()));
        }
        let bold = &after[..end];
        if bold.is_empty() {
            spans.push(Span::raw("****"));
        } else {
            spans.push(Span::styled(bold.to_string(), Style::default().add_modifier(Modifier::BOLD)));
        }
        rest = &after[end + 2..];
    }

    // Unclosed ** stays literal
    if !rest.is_empty() {
        spans.push(Span::raw(rest.to_string()));
    }

    Line::from(spans)
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    let [header_area, chat_area, input_area, footer_area] = Layout::vertical([
        Constraint::Length(4),
        Constraint::Min(0),
        Constraint::Length(5),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(frame, header_area);
    render_chat(app, frame, chat_area);
    render_input(app, frame, input_area);
    render_footer(app, frame, footer_area);

    if let Some(message) = app.error_message() {
        render_alert(frame, area, message);
    }
}

fn render_header(frame: &mut Frame, area: Rect) {
    let header = Paragraph::new(vec![
        Line::from(Span::styled(
            TITLE,
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(SUBTITLE, Style::default().fg(Color::LightBlue))),
    ])
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Blue)),
    );

    frame.render_widget(header, area);
}

/// Chat history as styled lines: user bubbles right, coach bubbles left
pub fn chat_lines(app: &App) -> Vec<Line<'static>> {
    let mut lines: Vec<Line<'static>> = Vec::new();

    for msg in app.conversation.messages() {
        match msg.role {
            ChatRole::User => {
                let style = Style::default().fg(Color::Cyan);
                lines.push(
                    Line::from(Span::styled("You", style.add_modifier(Modifier::BOLD)))
                        .alignment(Alignment::Right),
                );
                for line in msg.content.split('\n') {
                    lines.push(Line::from(Span::styled(line.to_string(), style)).alignment(Alignment::Right));
                }
            }
            ChatRole::Assistant | ChatRole::System => {
                lines.push(Line::from(Span::styled(
                    "Coach",
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                )));
                for line in msg.content.split('\n') {
                    lines.push(parse_markdown_line(line));
                }
            }
        }
        lines.push(Line::default());
    }

    if app.is_loading() {
        lines.push(Line::from(Span::styled(
            "Coach",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )));
        // Animated ellipsis: cycles through ".", "..", "..."
        let dots = ".".repeat((app.animation_frame as usize) + 1);
        lines.push(Line::from(Span::styled(
            format!("Thinking{}", dots),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )));
    }

    lines
}

fn render_chat(app: &mut App, frame: &mut Frame, area: Rect) {
    // Inner size minus borders, used for scroll calculations
    app.chat_height = area.height.saturating_sub(2);
    app.chat_width = area.width.saturating_sub(2);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));

    let text = if app.conversation.is_empty() && !app.is_loading() {
        Text::from(vec![
            Line::default(),
            Line::from(Span::styled(EMPTY_PROMPT, Style::default().fg(Color::Gray))),
            Line::from(Span::styled(EMPTY_HINT, Style::default().fg(Color::DarkGray))),
        ])
        .alignment(Alignment::Center)
    } else {
        Text::from(chat_lines(app))
    };

    let chat = Paragraph::new(text)
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((app.chat_scroll, 0));

    frame.render_widget(chat, area);
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let loading = app.is_loading();
    let border_color = if loading { Color::DarkGray } else { Color::Blue };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(" Message ");

    let inner_width = area.width.saturating_sub(2) as usize;
    let inner_height = area.height.saturating_sub(2) as usize;

    // Cursor row and column within the (possibly multi-line) input
    let before_cursor: String = app.input.chars().take(app.input_cursor).collect();
    let row = before_cursor.matches('\n').count();
    let col = before_cursor.rsplit('\n').next().map(|l| l.chars().count()).unwrap_or(0);

    // Scroll so the cursor stays inside the box
    let v_scroll = (row + 1).saturating_sub(inner_height);
    let h_scroll = (col + 1).saturating_sub(inner_width);

    let content = if app.input.is_empty() && !loading {
        Text::from(Span::styled("Type your message...", Style::default().fg(Color::DarkGray)))
    } else {
        let style = if loading {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default()
        };
        Text::from(
            app.input
                .split('\n')
                .map(|l| Line::from(Span::styled(l.to_string(), style)))
                .collect::<Vec<_>>(),
        )
    };

    let input = Paragraph::new(content)
        .block(block)
        .scroll((v_scroll as u16, h_scroll as u16));
    frame.render_widget(input, area);

    // A collapsed box has no cell to put the cursor in
    let has_room = inner_width > 0 && inner_height > 0;
    if has_room && !loading && app.error_message().is_none() {
        frame.set_cursor_position((
            area.x + 1 + (col - h_scroll) as u16,
            area.y + 1 + (row - v_scroll) as u16,
        ));
    }
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let key_style = |enabled: bool| {
        if enabled {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::DarkGray)
        }
    };
    let label = Style::default().fg(Color::Gray);

    let mut spans = vec![
        Span::styled(" Enter", key_style(app.can_send())),
        Span::styled(" send  ", label),
        Span::styled("Shift+Enter", key_style(!app.is_loading())),
        Span::styled(" newline  ", label),
    ];

    // Export is only offered once there is something to export
    if !app.conversation.is_empty() {
        spans.push(Span::styled("Ctrl+E", key_style(true)));
        spans.push(Span::styled(" export  ", label));
    }

    spans.push(Span::styled("Ctrl+C", key_style(true)));
    spans.push(Span::styled(" quit", label));

    if let Some(status) = &app.status {
        spans.push(Span::styled(format!("  {}", status), Style::default().fg(Color::Green)));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_alert(frame: &mut Frame, area: Rect, message: &str) {
    let [popup] = Layout::horizontal([Constraint::Percentage(60)])
        .flex(Flex::Center)
        .areas(area);
    let [popup] = Layout::vertical([Constraint::Length(6)])
        .flex(Flex::Center)
        .areas(popup);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Red))
        .title(" Error ");

    let alert = Paragraph::new(vec![
        Line::from(message.to_string()),
        Line::default(),
        Line::from(Span::styled("Press any key to continue", Style::default().fg(Color::DarkGray))),
    ])
    .block(block)
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true });

    frame.render_widget(Clear, popup);
    frame.render_widget(alert, popup);
}
