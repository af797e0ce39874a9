mod app;
mod ui;

use anyhow::{Context, Result};
use app::{App, InputMode};
use clap::Parser;
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, KeyModifiers,
        MouseButton, MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{
        disable_raw_mode, enable_raw_mode, size, EnterAlternateScreen, LeaveAlternateScreen,
    },
};
use ratatui::{backend::CrosstermBackend, layout::Rect, Terminal};
use sprintboard_client::ApiClient;
use sprintboard_core::storage::{init_config_dir, init_data_dir, ConfigStorage};
use sprintboard_planner::{BoardEvent, Direction, Planner};
use std::io;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::time::Duration;
use tracing::info;

fn setup_logging() -> Result<()> {
    let log_path = init_data_dir()?.join("sprintboard-tui.log");

    let log_file = std::fs::File::create(log_path)?;
    let subscriber = tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_env_filter("sprintboard_tui=debug,sprintboard_planner=debug")
        .json()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

fn setup_panic_hook() {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(std::io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
        let _ = execute!(std::io::stdout(), crossterm::cursor::Show);

        tracing::error!(?panic_info, "Application panicked");

        eprintln!("A fatal error occurred: {}", panic_info);

        original_hook(panic_info);
    }));
}

#[derive(Parser, Debug)]
#[command(name = "sprintboard-tui")]
#[command(about = "Sprintboard TUI - drag issues between the backlog and sprints", long_about = None)]
struct Args {
    /// Project to open (defaults to default_project from the config)
    #[arg(short, long)]
    project: Option<String>,

    /// Override the API base URL
    #[arg(long)]
    api_url: Option<String>,

    #[arg(long, env = "SPRINTBOARD_TOKEN", hide_env_values = true)]
    token: Option<String>,
}

async fn handle_key_event(app: &mut App, code: KeyCode, modifiers: KeyModifiers) -> Result<()> {
    match app.input_mode {
        InputMode::Search => match code {
            KeyCode::Enter | KeyCode::Esc => app.end_search(),
            KeyCode::Backspace => app.search_backspace(),
            KeyCode::Char(c) => app.search_input(c),
            _ => {}
        },
        InputMode::DeleteIssueConfirm | InputMode::DeleteSprintConfirm => match code {
            KeyCode::Char('y') | KeyCode::Char('Y') => app.delete_confirmed().await,
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                app.input_mode = InputMode::Normal;
            }
            _ => {}
        },
        InputMode::Normal if app.show_help => {
            if matches!(code, KeyCode::Char('?') | KeyCode::Esc | KeyCode::Char('q')) {
                app.show_help = false;
            }
        }
        InputMode::Normal => handle_board_keys(app, code, modifiers).await,
    }
    Ok(())
}

async fn handle_board_keys(app: &mut App, code: KeyCode, modifiers: KeyModifiers) {
    // While carrying a card, h/l pick the drop target instead of the selection
    if app.is_dragging() {
        match code {
            KeyCode::Left | KeyCode::Char('h') => app.nudge(Direction::Previous),
            KeyCode::Right | KeyCode::Char('l') => app.nudge(Direction::Next),
            KeyCode::Char(' ') | KeyCode::Enter => app.drop_dragged().await,
            KeyCode::Esc => app.cancel_drag(),
            _ => {}
        }
        return;
    }

    match code {
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Char('?') => app.show_help = true,
        KeyCode::Char('H') => app.move_selected(-1).await,
        KeyCode::Char('L') => app.move_selected(1).await,
        KeyCode::Left | KeyCode::Char('h') => {
            if modifiers.contains(KeyModifiers::SHIFT) {
                app.move_selected(-1).await;
            } else {
                app.select_column(-1);
            }
        }
        KeyCode::Right | KeyCode::Char('l') => {
            if modifiers.contains(KeyModifiers::SHIFT) {
                app.move_selected(1).await;
            } else {
                app.select_column(1);
            }
        }
        KeyCode::Up | KeyCode::Char('k') => app.select_card(-1),
        KeyCode::Down | KeyCode::Char('j') => app.select_card(1),
        KeyCode::Char(' ') => app.pick_up_or_drop().await,
        KeyCode::Char('/') => app.begin_search(),
        KeyCode::Char('t') => app.cycle_type_filter(),
        KeyCode::Char('p') => app.cycle_priority_filter(),
        KeyCode::Char('c') => app.clear_filters(),
        KeyCode::Char('s') => app.start_selected_sprint().await,
        KeyCode::Char('C') => app.complete_selected_sprint().await,
        KeyCode::Char('d') => app.confirm_delete_issue(),
        KeyCode::Char('D') => app.confirm_delete_sprint(),
        KeyCode::Char('r') => {
            app.status_message = "Refreshing...".to_string();
            app.refresh().await;
        }
        _ => {}
    }
}

async fn handle_mouse_event(app: &mut App, mouse: MouseEvent, area: Rect) {
    if app.input_mode != InputMode::Normal || app.show_help {
        return;
    }

    let [_, board, _] = ui::layout(area);
    let columns = app.columns().len();
    let column = if board.contains((mouse.column, mouse.row).into()) {
        ui::column_at(mouse.column, board, columns)
    } else {
        None
    };

    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => {
            if app.is_dragging() {
                return;
            }
            if let Some(column) = column {
                let cards = app.column_issues(column).len();
                let card = ui::card_at(mouse.row, board, cards);
                app.mouse_down(column, card, mouse.column, mouse.row);
            }
        }
        MouseEventKind::Drag(MouseButton::Left) => {
            app.mouse_drag(column, mouse.column, mouse.row);
        }
        MouseEventKind::Up(MouseButton::Left) => {
            app.mouse_up().await;
        }
        _ => {}
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    setup_logging()?;
    setup_panic_hook();
    info!("Sprintboard TUI starting up");

    let args = Args::parse();

    let storage = ConfigStorage::new(init_config_dir()?);
    let mut config = storage.load().context("Failed to load configuration")?;
    if let Some(api_url) = args.api_url {
        config.api.base_url = api_url;
    }
    if args.token.is_some() {
        config.api.token = args.token;
    }

    let project_id = args
        .project
        .or_else(|| config.default_project.clone())
        .context("No project given; pass --project or set default_project in the config")?;

    let client = ApiClient::from_config(&config.api)?;
    info!("Using API at {}", client.base_url());

    let planner = Planner::new(Arc::new(client), config.planner.clone());
    let mut events_rx = planner.events().subscribe();

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    if let Err(e) = execute!(stdout, EnterAlternateScreen, EnableMouseCapture) {
        let _ = disable_raw_mode();
        return Err(e.into());
    }
    let backend = CrosstermBackend::new(stdout);

    let mut app = App::new(planner, project_id);
    let result = match Terminal::new(backend) {
        Ok(mut terminal) => {
            let result = run_app(&mut terminal, &mut app, &mut events_rx).await;
            let _ = terminal.show_cursor();
            result
        }
        Err(e) => Err(e.into()),
    };

    finish(result, restore_terminal)
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    events_rx: &mut broadcast::Receiver<BoardEvent>,
) -> Result<()> {
    app.refresh().await;

    loop {
        terminal.draw(|f| ui::draw(f, app))?;

        if app.should_quit {
            return Ok(());
        }

        tokio::select! {
            Ok(event) = events_rx.recv() => {
                app.on_board_event(event);
            }
            _ = tokio::time::sleep(Duration::from_millis(16)) => {
                app.run_due_query().await;

                if event::poll(Duration::from_millis(0))? {
                    match event::read()? {
                        Event::Key(key) if key.kind == KeyEventKind::Press => {
                            handle_key_event(app, key.code, key.modifiers).await?;
                        }
                        Event::Mouse(mouse) => {
                            let (w, h) = size()?;
                            handle_mouse_event(app, mouse, Rect::new(0, 0, w, h)).await;
                        }
                        Event::Resize(width, height) => {
                            info!(width, height, "Terminal resized");
                        }
                        _ => {}
                    }
                }
            }
        }
    }
}

fn restore_terminal() -> Result<()> {
    disable_raw_mode()?;
    execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture)?;
    Ok(())
}

/// Run `restore` whatever the loop returned; the loop's own error wins
fn finish<T>(result: Result<T>, restore: impl FnOnce() -> Result<()>) -> Result<T> {
    let restored = restore();
    let value = result?;
    restored?;
    Ok(value)
}
