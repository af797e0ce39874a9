//! Sprintboard Planner
//!
//! Backlog and sprint planning board: board state, drag-and-drop
//! reassignment, debounced backlog filtering and sprint lifecycle.

pub mod board;
pub mod commit;
pub mod drag;
pub mod event_manager;
pub mod events;
pub mod filter;
pub mod planner;
pub mod sprint;

#[cfg(test)]
mod test_support;

pub use board::{ApplyOutcome, BoardError, BoardStore, LoadTicket, MoveRecord};
pub use commit::{CommitError, Inverse, ReassignmentCommitter};
pub use drag::{Direction, DragController, DragError, DragState, DropResolution};
pub use event_manager::EventManager;
pub use events::{BoardEvent, BoardEventType, Notice, NoticeLevel};
pub use filter::{BacklogQuery, FilterProjector};
pub use planner::{Planner, PlannerError};
pub use sprint::LifecycleError;
