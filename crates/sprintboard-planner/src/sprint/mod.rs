pub mod lifecycle;

pub use lifecycle::{check_complete, check_start, LifecycleError};
