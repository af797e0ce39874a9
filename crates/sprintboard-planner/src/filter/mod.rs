pub mod debounce;
pub mod projector;

pub use debounce::Debouncer;
pub use projector::{BacklogQuery, FilterProjector};
