mod board;
mod confirmation;
pub mod helpers;
mod input;

use crate::app::{App, InputMode};
use board::draw_board;
use confirmation::draw_confirmation_modal;
use input::draw_search_modal;
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
};

pub use board::{card_at, column_at};

/// Title bar, board and status bar
pub fn layout(area: Rect) -> [Rect; 3] {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .split(area);
    [chunks[0], chunks[1], chunks[2]]
}

pub fn draw(f: &mut Frame, app: &App) {
    let [title, board, status] = layout(f.area());

    draw_title_bar(f, app, title);
    draw_board(f, app, board);
    draw_status_bar(f, app, status);

    match app.input_mode {
        InputMode::Search => draw_search_modal(f, app),
        InputMode::DeleteIssueConfirm | InputMode::DeleteSprintConfirm => {
            draw_confirmation_modal(f, app)
        }
        InputMode::Normal => {}
    }

    if app.show_help {
        draw_help_modal(f);
    }
}

fn draw_title_bar(f: &mut Frame, app: &App, area: Rect) {
    let active = app
        .planner
        .store()
        .active_sprint()
        .map(|s| s.name.clone())
        .unwrap_or_else(|| "none".to_string());

    let line = Line::from(vec![
        Span::styled(
            " Sprintboard ",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!("[{}] │ Active: {} │ ", app.project_id, active)),
        Span::styled(app.filter_summary(), Style::default().fg(Color::Yellow)),
    ]);

    f.render_widget(
        Paragraph::new(line).block(Block::default().borders(Borders::ALL)),
        area,
    );
}

fn draw_status_bar(f: &mut Frame, app: &App, area: Rect) {
    let hint = if app.is_dragging() {
        " [h/l] Column  [Space] Drop  [Esc] Cancel "
    } else {
        " [?] Help  [/] Search  [Space] Drag  [q] Quit "
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .title_bottom(Line::from(hint).right_aligned());

    f.render_widget(
        Paragraph::new(app.status_message.as_str()).block(block),
        area,
    );
}

fn draw_help_modal(f: &mut Frame) {
    let lines = [
        "h/l, ←/→     Select column",
        "j/k, ↑/↓     Select card",
        "Space        Pick up / drop card",
        "H/L          Move card one column",
        "Esc          Cancel drag",
        "/            Search backlog",
        "t / p        Cycle type / priority filter",
        "c            Clear filters",
        "s / C        Start / complete sprint",
        "d / D        Delete issue / sprint",
        "r            Reload board",
        "q            Quit",
    ];

    let area = helpers::centered_rect(f.area(), 48, lines.len() as u16 + 2);
    f.render_widget(Clear, area);

    let text: Vec<Line> = lines.iter().map(|l| Line::from(*l)).collect();
    let help = Paragraph::new(text).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Help ")
            .border_style(Style::default().fg(Color::Cyan)),
    );
    f.render_widget(help, area);
}
