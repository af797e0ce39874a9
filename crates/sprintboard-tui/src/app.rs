//! Application state management

use sprintboard_client::ApiClient;
use sprintboard_core::models::{Container, Issue, IssueType, Priority};
use sprintboard_planner::{
    BoardEvent, BoardEventType, Direction, DragState, MoveRecord, NoticeLevel, Planner,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Search,
    DeleteIssueConfirm,
    DeleteSprintConfirm,
}

/// Pointer position of a card being dragged with the mouse
#[derive(Debug, Clone)]
pub struct MouseDrag {
    pub title: String,
    pub x: u16,
    pub y: u16,
}

pub struct App {
    pub planner: Planner<ApiClient>,
    pub project_id: String,
    pub input_mode: InputMode,
    pub input_buffer: String,

    // UI state
    pub selected_column: usize, // 0 = backlog, then sprints in board order
    pub selected_card: usize,
    pub mouse_drag: Option<MouseDrag>,
    pub show_help: bool,
    pub should_quit: bool,
    pub status_message: String,
}

impl App {
    pub fn new(planner: Planner<ApiClient>, project_id: String) -> Self {
        Self {
            planner,
            project_id,
            input_mode: InputMode::Normal,
            input_buffer: String::new(),
            selected_column: 0,
            selected_card: 0,
            mouse_drag: None,
            show_help: false,
            should_quit: false,
            status_message: "Loading...".to_string(),
        }
    }

    fn report<T>(&mut self, result: Result<T, sprintboard_planner::PlannerError>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::debug!("Planner error: {}", e);
                self.status_message = format!("✗ {}", e);
                None
            }
        }
    }

    pub async fn refresh(&mut self) {
        let result = self.planner.load(&self.project_id).await;
        self.report(result);
        self.clamp_selection();
    }

    /// Run the filter query once its debounce has elapsed
    pub async fn run_due_query(&mut self) {
        if let Some(query) = self.planner.try_next_query() {
            let result = self.planner.refresh_backlog(query).await;
            self.report(result);
            self.clamp_selection();
        }
    }

    pub fn on_board_event(&mut self, event: BoardEvent) {
        match event.event_type {
            BoardEventType::Notice(notice) => {
                let icon = match notice.level {
                    NoticeLevel::Success => "✓",
                    NoticeLevel::Error => "✗",
                };
                self.status_message = format!("{} {}", icon, notice.message);
            }
            BoardEventType::MoveReverted { issue_id, from, .. } => {
                tracing::info!("Move of {} reverted to {}", issue_id, from);
                self.clamp_selection();
            }
            _ => self.clamp_selection(),
        }
    }

    // ---- Board view ----

    pub fn columns(&self) -> Vec<Container> {
        self.planner.store().containers()
    }

    pub fn column_issues(&self, column: usize) -> Vec<&Issue> {
        match self.columns().get(column) {
            Some(Container::Backlog) => self.planner.visible_backlog(),
            Some(Container::Sprint(id)) => self.planner.store().sprint_issues(id).iter().collect(),
            None => Vec::new(),
        }
    }

    pub fn column_title(&self, column: usize) -> String {
        let store = self.planner.store();
        match self.columns().get(column) {
            Some(Container::Backlog) => {
                format!("Backlog ({})", self.planner.visible_backlog().len())
            }
            Some(Container::Sprint(id)) => {
                let Some(sprint) = store.sprint(id) else {
                    return id.clone();
                };
                let points = match store.sprint_summary(id) {
                    Some(s) => match s.capacity {
                        Some(c) => format!("{}/{} pts", s.story_points, c),
                        None => format!("{} pts", s.story_points),
                    },
                    None => String::new(),
                };
                format!(
                    "{} [{}] {}d {}",
                    sprint.name,
                    sprint.status.as_str(),
                    sprint.duration_days(),
                    points
                )
            }
            None => String::new(),
        }
    }

    pub fn is_over_capacity(&self, column: usize) -> bool {
        match self.columns().get(column) {
            Some(Container::Sprint(id)) => self
                .planner
                .store()
                .sprint_summary(id)
                .is_some_and(|s| s.over_capacity),
            _ => false,
        }
    }

    pub fn selected_issue(&self) -> Option<&Issue> {
        self.column_issues(self.selected_column)
            .get(self.selected_card)
            .copied()
    }

    fn selected_sprint_id(&self) -> Option<String> {
        match self.columns().get(self.selected_column) {
            Some(Container::Sprint(id)) => Some(id.clone()),
            _ => None,
        }
    }

    pub fn clamp_selection(&mut self) {
        let columns = self.columns().len();
        if self.selected_column >= columns {
            self.selected_column = columns.saturating_sub(1);
        }
        let cards = self.column_issues(self.selected_column).len();
        if self.selected_card >= cards {
            self.selected_card = cards.saturating_sub(1);
        }
    }

    pub fn select_column(&mut self, delta: isize) {
        let columns = self.columns().len() as isize;
        if columns == 0 {
            return;
        }
        self.selected_column = (self.selected_column as isize + delta).clamp(0, columns - 1) as usize;
        self.selected_card = 0;
    }

    pub fn select_card(&mut self, delta: isize) {
        let cards = self.column_issues(self.selected_column).len() as isize;
        if cards == 0 {
            return;
        }
        self.selected_card = (self.selected_card as isize + delta).clamp(0, cards - 1) as usize;
    }

    fn follow(&mut self, record: &MoveRecord) {
        if let Some(column) = self.columns().iter().position(|c| *c == record.to) {
            self.selected_column = column;
            self.selected_card = 0;
        }
    }

    // ---- Dragging ----

    pub fn is_dragging(&self) -> bool {
        matches!(self.planner.drag_state(), DragState::Dragging { .. })
    }

    /// Column index the current drag would drop into
    pub fn drag_target_column(&self) -> Option<usize> {
        let DragState::Dragging { origin, hover, .. } = self.planner.drag_state() else {
            return None;
        };
        let target = hover
            .as_deref()
            .and_then(|id| self.planner.store().resolve_droppable(id))
            .unwrap_or_else(|| origin.clone());
        self.columns().iter().position(|c| *c == target)
    }

    pub fn dragged_issue_id(&self) -> Option<&str> {
        match self.planner.drag_state() {
            DragState::Dragging { issue_id, .. } => Some(issue_id.as_str()),
            DragState::Idle => None,
        }
    }

    /// Space: pick up the selected card, or drop the one being carried
    pub async fn pick_up_or_drop(&mut self) {
        if self.is_dragging() {
            self.drop_dragged().await;
            return;
        }

        let Some(issue) = self.selected_issue() else {
            return;
        };
        let (id, key) = (issue.id.clone(), issue.key.clone());
        let result = self.planner.drag_start(&id);
        if self.report(result).is_some() {
            self.status_message = format!("Carrying {}: [h/l] choose column, [Space] drop, [Esc] cancel", key);
        }
    }

    pub fn nudge(&mut self, direction: Direction) {
        if let Some(target) = self.planner.drag_nudge(direction) {
            if let Some(column) = self.columns().iter().position(|c| *c == target) {
                self.selected_column = column;
            }
            self.status_message = format!("Drop into {}", self.planner.store().container_label(&target));
        }
    }

    pub fn cancel_drag(&mut self) {
        self.planner.drag_cancel();
        self.mouse_drag = None;
        self.status_message = "Drag cancelled".to_string();
    }

    pub async fn drop_dragged(&mut self) {
        self.mouse_drag = None;
        let result = self.planner.drop_on(None).await;
        match self.report(result) {
            Some(Some(record)) => self.follow(&record),
            Some(None) => self.status_message = "Dropped in place, nothing moved".to_string(),
            None => {}
        }
        self.clamp_selection();
    }

    pub fn mouse_down(&mut self, column: usize, card: Option<usize>, x: u16, y: u16) {
        self.selected_column = column;
        let Some(card) = card else {
            return;
        };
        self.selected_card = card;

        let Some(issue) = self.selected_issue() else {
            return;
        };
        let (id, title) = (issue.id.clone(), issue.title.clone());
        let result = self.planner.drag_start(&id);
        if self.report(result).is_some() {
            self.mouse_drag = Some(MouseDrag { title, x, y });
        }
    }

    pub fn mouse_drag(&mut self, column: Option<usize>, x: u16, y: u16) {
        let Some(drag) = self.mouse_drag.as_mut() else {
            return;
        };
        drag.x = x;
        drag.y = y;

        if let Some(container) = column.and_then(|c| self.columns().get(c).cloned()) {
            self.planner.drag_over(container.droppable_id());
        }
    }

    pub async fn mouse_up(&mut self) {
        if self.mouse_drag.is_some() {
            self.drop_dragged().await;
        }
    }

    /// Shift+h/l: move the selected card one column over without dragging
    pub async fn move_selected(&mut self, delta: isize) {
        let columns = self.columns();
        let target = self.selected_column as isize + delta;
        let Some(to) = usize::try_from(target).ok().and_then(|t| columns.get(t)) else {
            return;
        };
        let Some(issue_id) = self.selected_issue().map(|i| i.id.clone()) else {
            return;
        };

        let result = self.planner.move_issue(&issue_id, to).await;
        if let Some(Some(record)) = self.report(result) {
            self.follow(&record);
        }
    }

    // ---- Sprint and issue actions ----

    pub async fn start_selected_sprint(&mut self) {
        let Some(sprint_id) = self.selected_sprint_id() else {
            self.status_message = "Select a sprint column to start it".to_string();
            return;
        };
        let result = self.planner.start_sprint(&sprint_id).await;
        self.report(result);
    }

    pub async fn complete_selected_sprint(&mut self) {
        let Some(sprint_id) = self.selected_sprint_id() else {
            self.status_message = "Select a sprint column to complete it".to_string();
            return;
        };
        let result = self.planner.complete_sprint(&sprint_id).await;
        self.report(result);
    }

    pub fn confirm_delete_issue(&mut self) {
        if self.selected_issue().is_some() {
            self.input_mode = InputMode::DeleteIssueConfirm;
        }
    }

    pub fn confirm_delete_sprint(&mut self) {
        if self.selected_sprint_id().is_some() {
            self.input_mode = InputMode::DeleteSprintConfirm;
        }
    }

    /// Label of whatever the open confirmation would delete
    pub fn pending_delete_label(&self) -> String {
        match self.input_mode {
            InputMode::DeleteIssueConfirm => self
                .selected_issue()
                .map(|i| format!("{} {}", i.key, i.title))
                .unwrap_or_default(),
            InputMode::DeleteSprintConfirm => self
                .columns()
                .get(self.selected_column)
                .map(|c| self.planner.store().container_label(c))
                .unwrap_or_default(),
            _ => String::new(),
        }
    }

    pub async fn delete_confirmed(&mut self) {
        let mode = std::mem::replace(&mut self.input_mode, InputMode::Normal);
        match mode {
            InputMode::DeleteIssueConfirm => {
                if let Some(issue_id) = self.selected_issue().map(|i| i.id.clone()) {
                    let result = self.planner.delete_issue(&issue_id).await;
                    self.report(result);
                }
            }
            InputMode::DeleteSprintConfirm => {
                if let Some(sprint_id) = self.selected_sprint_id() {
                    let result = self.planner.delete_sprint(&sprint_id).await;
                    self.report(result);
                }
            }
            _ => {}
        }
        self.clamp_selection();
    }

    // ---- Filters ----

    pub fn begin_search(&mut self) {
        self.input_mode = InputMode::Search;
        self.input_buffer = self.planner.filter().search.clone().unwrap_or_default();
    }

    pub fn search_input(&mut self, c: char) {
        self.input_buffer.push(c);
        self.planner.set_search(self.input_buffer.clone());
    }

    pub fn search_backspace(&mut self) {
        self.input_buffer.pop();
        self.planner.set_search(self.input_buffer.clone());
    }

    pub fn end_search(&mut self) {
        self.input_mode = InputMode::Normal;
    }

    pub fn cycle_type_filter(&mut self) {
        let next = cycle(&IssueType::ALL, self.planner.filter().issue_type);
        self.planner.set_issue_type(next);
    }

    pub fn cycle_priority_filter(&mut self) {
        let next = cycle(&Priority::ALL, self.planner.filter().priority);
        self.planner.set_priority(next);
    }

    pub fn clear_filters(&mut self) {
        self.input_buffer.clear();
        if self.planner.clear_filters() {
            self.status_message = "Filters cleared".to_string();
        }
    }

    /// Short description of the active filters for the title bar
    pub fn filter_summary(&self) -> String {
        let filter = self.planner.filter();
        let mut parts = Vec::new();
        if let Some(search) = filter.search_term() {
            parts.push(format!("\"{}\"", search));
        }
        if let Some(t) = filter.issue_type {
            parts.push(t.as_str().to_string());
        }
        if let Some(p) = filter.priority {
            parts.push(p.as_str().to_string());
        }
        if parts.is_empty() {
            "no filters".to_string()
        } else {
            parts.join(" + ")
        }
    }
}

/// Step through `all`, then back to no selection
fn cycle<T: Copy + PartialEq>(all: &[T], current: Option<T>) -> Option<T> {
    match current {
        None => all.first().copied(),
        Some(current) => all
            .iter()
            .position(|x| *x == current)
            .and_then(|i| all.get(i + 1))
            .copied(),
    }
}
