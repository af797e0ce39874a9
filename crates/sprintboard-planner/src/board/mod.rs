pub mod loader;
pub mod store;

pub use loader::{FetchedBacklog, FetchedBoard, PendingBacklog, PendingLoad};
pub use store::{
    ApplyOutcome, BoardError, BoardSnapshot, BoardStore, LoadTicket, MoveRecord, RemovedIssue,
    RemovedSprint, SprintSummary,
};
