pub mod config;
pub mod container;
pub mod filter;
pub mod issue;
pub mod sprint;

pub use config::{ApiConfig, Config, PlannerConfig};
pub use container::{Container, BACKLOG_ID};
pub use filter::BacklogFilter;
pub use issue::{Issue, IssueDraft, IssueType, Priority};
pub use sprint::{Sprint, SprintDraft, SprintStatus};
