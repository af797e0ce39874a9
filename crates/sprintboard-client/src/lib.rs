//! Sprintboard API client
//!
//! Async HTTP/JSON client for the planning REST backend, plus the
//! [`PlanningApi`] trait the planner is written against.

pub mod api;
pub mod auth;
pub mod client;
pub mod error;
pub mod types;

pub use api::PlanningApi;
pub use auth::ApiAuth;
pub use client::ApiClient;
pub use error::{Error, Result};
pub use types::*;
