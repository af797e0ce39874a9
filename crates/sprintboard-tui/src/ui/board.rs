use crate::app::App;
use crate::ui::helpers::truncate;
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph},
};
use sprintboard_core::models::{IssueType, Priority, SprintStatus};

/// Column under the pointer, for `columns` equal-width columns
pub fn column_at(x: u16, area: Rect, columns: usize) -> Option<usize> {
    if columns == 0 {
        return None;
    }
    let width = area.width / columns as u16;
    if width == 0 || x < area.x {
        return None;
    }
    Some((((x - area.x) / width) as usize).min(columns - 1))
}

/// Card under the pointer; row 0 is the column border
pub fn card_at(y: u16, area: Rect, cards: usize) -> Option<usize> {
    let row = y.checked_sub(area.y)?;
    if row == 0 {
        return None;
    }
    let index = (row - 1) as usize;
    (index < cards).then_some(index)
}

fn type_color(issue_type: IssueType) -> Color {
    match issue_type {
        IssueType::Bug => Color::Red,
        IssueType::Feature => Color::Green,
        IssueType::Task => Color::Blue,
        IssueType::Story => Color::Magenta,
    }
}

fn priority_marker(priority: Priority) -> &'static str {
    match priority {
        Priority::Low => "▽",
        Priority::Medium => "◇",
        Priority::High => "△",
        Priority::Critical => "▲",
    }
}

fn status_color(status: Option<SprintStatus>) -> Color {
    match status {
        None => Color::White,
        Some(SprintStatus::Planned) => Color::Yellow,
        Some(SprintStatus::Active) => Color::Green,
        Some(SprintStatus::Completed) => Color::DarkGray,
    }
}

pub fn draw_board(f: &mut Frame, app: &App, area: Rect) {
    let containers = app.columns();
    let n = containers.len().max(1) as u32;
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints((0..n).map(|_| Constraint::Ratio(1, n)))
        .split(area);

    let dragging = app.is_dragging();
    let dragged = app.dragged_issue_id();
    let target_column = app.drag_target_column();

    for (i, container) in containers.iter().enumerate() {
        let issues = app.column_issues(i);
        let is_selected = app.selected_column == i;
        let is_target = dragging && target_column == Some(i);
        let color = status_color(
            container
                .sprint_id()
                .and_then(|id| app.planner.store().sprint(id))
                .map(|s| s.status),
        );
        let width = (chunks[i].width as usize).saturating_sub(4);

        let mut items: Vec<ListItem> = issues
            .iter()
            .enumerate()
            .map(|(j, issue)| {
                let is_card_selected = is_selected && app.selected_card == j && !dragging;
                let is_being_dragged = dragged == Some(issue.id.as_str());

                let points = issue
                    .story_points
                    .map(|p| format!(" ({})", p))
                    .unwrap_or_default();
                let title = truncate(
                    &issue.title,
                    width.saturating_sub(issue.key.len() + points.len() + 4),
                );

                let style = if is_being_dragged {
                    Style::default()
                        .fg(Color::DarkGray)
                        .add_modifier(Modifier::DIM | Modifier::CROSSED_OUT)
                } else if is_card_selected {
                    Style::default()
                        .fg(Color::Black)
                        .bg(color)
                        .add_modifier(Modifier::BOLD)
                } else {
                    Style::default()
                };

                ListItem::new(Line::from(vec![
                    Span::styled(
                        format!("{} ", priority_marker(issue.priority)),
                        Style::default().fg(type_color(issue.issue_type)),
                    ),
                    Span::styled(issue.key.clone(), Style::default().add_modifier(Modifier::BOLD)),
                    Span::raw(format!(" {}{}", title, points)),
                ]))
                .style(style)
            })
            .collect();

        if is_target && !issues.iter().any(|issue| dragged == Some(issue.id.as_str())) {
            items.insert(
                0,
                ListItem::new(Line::from(Span::styled(
                    " ┌─ Drop here ─┐",
                    Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::BOLD),
                ))),
            );
        } else if items.is_empty() {
            items.push(ListItem::new(Line::from(Span::styled(
                " (empty)",
                Style::default().fg(Color::DarkGray),
            ))));
        }

        let border_style = if is_target {
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD)
        } else if is_selected {
            Style::default().fg(color).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::DarkGray)
        };

        let title = app.column_title(i);
        let title = if is_target {
            format!(" ▼ {} ▼ ", title)
        } else {
            format!(" {} ", title)
        };

        let mut block = Block::default()
            .borders(Borders::ALL)
            .title(title)
            .border_style(border_style);

        if app.is_over_capacity(i) {
            block = block.title_bottom(
                Line::from(Span::styled(" over capacity ", Style::default().fg(Color::Red)))
                    .right_aligned(),
            );
        }

        f.render_widget(List::new(items).block(block), chunks[i]);
    }

    if let Some(drag) = &app.mouse_drag {
        draw_ghost_card(f, &drag.title, drag.x, drag.y);
    }
}

fn draw_ghost_card(f: &mut Frame, title: &str, x: u16, y: u16) {
    let title = truncate(title, 24);
    let width = (title.chars().count() as u16 + 6).min(30);
    let screen = f.area();
    let ghost_area = Rect {
        x: x.saturating_sub(width / 2),
        y: y.saturating_sub(1),
        width,
        height: 3,
    }
    .intersection(screen);

    f.render_widget(Clear, ghost_area);

    let ghost = Paragraph::new(Line::from(vec![
        Span::raw("  "),
        Span::styled(
            title,
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
    ]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .style(Style::default().bg(Color::Black)),
    );

    f.render_widget(ghost, ghost_area);
}
