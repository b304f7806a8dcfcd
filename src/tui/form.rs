use crate::engine::argv;
use crate::model::{RunStatus, StreamKind};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Tabs, Wrap},
    Frame,
};

use super::help;
use super::state::{UiState, FIELDS, TAB_HELP, TAB_OUTPUT};

pub fn draw(area: Rect, f: &mut Frame, state: &UiState) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(5),
            Constraint::Length(3),
        ])
        .split(area);

    let titles = ["Form", "Output", "Help"];
    let tabs = Tabs::new(titles.iter().map(|t| Line::from(*t)))
        .block(Block::default().borders(Borders::ALL).title("promptdeck"))
        .select(state.tab)
        .highlight_style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        );
    f.render_widget(tabs, rows[0]);

    match state.tab {
        TAB_OUTPUT => draw_output(rows[1], f, state),
        TAB_HELP => help::draw(rows[1], f),
        _ => draw_form(rows[1], f, state),
    }

    draw_status_bar(rows[2], f, state);
}

fn draw_form(area: Rect, f: &mut Frame, state: &UiState) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(area);

    let mut lines: Vec<Line> = Vec::with_capacity(FIELDS.len());
    for (i, field) in FIELDS.iter().enumerate() {
        let selected = i == state.selected;
        let value = if selected && state.editing {
            format!("{}▏", state.edit_buffer)
        } else {
            state.field_value(*field)
        };

        let marker = if selected { "› " } else { "  " };
        let label_style = if selected {
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };
        let value_style = if selected && state.editing {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default()
        };

        lines.push(Line::from(vec![
            Span::raw(marker),
            Span::styled(format!("{:<26}", field.label()), label_style),
            Span::styled(value, value_style),
        ]));
    }

    let form = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("Options"))
        .scroll((scroll_offset(state.selected, cols[0].height), 0));
    f.render_widget(form, cols[0]);

    draw_side_panel(cols[1], f, state);
}

/// Keep the selected row visible when the form is taller than the panel.
fn scroll_offset(selected: usize, panel_height: u16) -> u16 {
    let visible = panel_height.saturating_sub(2) as usize;
    if visible == 0 || selected < visible {
        0
    } else {
        (selected + 1 - visible) as u16
    }
}

fn draw_side_panel(area: Rect, f: &mut Frame, state: &UiState) {
    let parts = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(5), Constraint::Min(3)])
        .split(area);

    let tool_line = match &state.tool_path {
        Some(path) => Line::from(vec![
            Span::styled("Tool: ", Style::default().fg(Color::Gray)),
            Span::styled(path.display().to_string(), Style::default().fg(Color::Green)),
        ]),
        None => Line::from(vec![
            Span::styled("Tool: ", Style::default().fg(Color::Gray)),
            Span::styled(
                format!("{} (not found on PATH)", state.tool_name),
                Style::default().fg(Color::Red),
            ),
        ]),
    };
    let mut tool_lines = vec![tool_line];
    if let Some(tokens) = &state.token_info {
        tool_lines.push(Line::from(vec![
            Span::styled("Tokens: ", Style::default().fg(Color::Gray)),
            Span::styled(tokens.clone(), Style::default().fg(Color::Cyan)),
        ]));
    }
    let tool = Paragraph::new(tool_lines)
        .block(Block::default().borders(Borders::ALL).title("Tool"));
    f.render_widget(tool, parts[0]);

    // Live preview of the exact argument vector the next run will use.
    let preview = argv::render(&argv::build(&state.options));
    let preview = Paragraph::new(format!("{} {}", state.tool_name, preview))
        .block(Block::default().borders(Borders::ALL).title("Command"))
        .wrap(Wrap { trim: false });
    f.render_widget(preview, parts[1]);
}

fn draw_output(area: Rect, f: &mut Frame, state: &UiState) {
    let visible = area.height.saturating_sub(2) as usize;
    let bottom = state.output_scroll.min(state.output_lines.len());
    let top = bottom.saturating_sub(visible);

    let lines: Vec<Line> = state.output_lines[top..bottom]
        .iter()
        .map(|(stream, text)| match stream {
            StreamKind::Stderr => Line::from(Span::styled(
                format!("ERROR: {text}"),
                Style::default().fg(Color::Red),
            )),
            StreamKind::Stdout => Line::from(Span::raw(text.clone())),
        })
        .collect();

    let title = if state.follow_output {
        format!("Output ({} lines)", state.output_lines.len())
    } else {
        format!(
            "Output ({}/{} – f to follow)",
            bottom,
            state.output_lines.len()
        )
    };
    let output =
        Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(title));
    f.render_widget(output, area);
}

fn draw_status_bar(area: Rect, f: &mut Frame, state: &UiState) {
    let status_style = match state.status {
        RunStatus::Generating => Style::default().fg(Color::Yellow),
        RunStatus::Completed => Style::default().fg(Color::Green),
        RunStatus::Failed | RunStatus::Error => Style::default().fg(Color::Red),
        RunStatus::Cancelled => Style::default().fg(Color::Magenta),
        RunStatus::Ready => Style::default().fg(Color::Gray),
    };

    let mut spans = vec![
        Span::styled(
            format!(" {} ", state.status.label()),
            status_style.add_modifier(Modifier::BOLD),
        ),
        Span::raw("│ "),
        Span::raw(state.info.clone()),
    ];
    if !state.editing {
        spans.push(Span::styled(
            "  g generate · x cancel · y copy · s save · ? help · q quit",
            Style::default().fg(Color::DarkGray),
        ));
    } else {
        spans.push(Span::styled(
            "  Enter commit · Esc discard",
            Style::default().fg(Color::DarkGray),
        ));
    }

    let bar = Paragraph::new(Line::from(spans))
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(bar, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selected_row_scrolls_into_view() {
        assert_eq!(scroll_offset(0, 10), 0);
        assert_eq!(scroll_offset(7, 10), 0);
        assert_eq!(scroll_offset(8, 10), 1);
        assert_eq!(scroll_offset(20, 10), 13);
    }

    #[test]
    fn tiny_panel_never_underflows() {
        assert_eq!(scroll_offset(5, 0), 0);
        assert_eq!(scroll_offset(5, 2), 0);
    }
}
