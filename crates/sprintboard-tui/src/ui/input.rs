use crate::app::App;
use crate::ui::helpers::centered_rect;
use ratatui::{
    Frame,
    style::{Color, Style},
    widgets::{Block, Borders, Clear, Paragraph},
};

pub fn draw_search_modal(f: &mut Frame, app: &App) {
    let modal_area = centered_rect(f.area(), 60, 3);

    f.render_widget(Clear, modal_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Search backlog (Enter to close) ")
        .border_style(Style::default().fg(Color::Cyan));

    let input = Paragraph::new(app.input_buffer.as_str()).block(block);

    f.render_widget(input, modal_area);

    // Keep the cursor inside the borders
    let typed = app.input_buffer.chars().count() as u16;
    let cursor_x = (modal_area.x + 1 + typed).min(modal_area.right().saturating_sub(2));
    let cursor_y = modal_area.y + 1;

    f.set_cursor_position((cursor_x, cursor_y));
}
