pub mod controller;

pub use controller::{Direction, DragController, DragError, DragState, DropResolution};
