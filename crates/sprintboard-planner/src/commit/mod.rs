pub mod committer;

pub use committer::{CommitError, Inverse, PendingMove, ReassignmentCommitter};
