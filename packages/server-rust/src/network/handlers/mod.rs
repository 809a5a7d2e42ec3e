//! HTTP handler definitions for the todo server.
//!
//! Defines [`AppState`], the shared state carried through axum extractors,
//! and re-exports every handler for router assembly.

pub mod health;
pub mod todos;

pub use health::{health_handler, liveness_handler, readiness_handler};
pub use todos::{create_todo, delete_todo, get_todo, list_todos, update_todo};

use std::sync::Arc;
use std::time::Instant;

use super::ShutdownController;
use crate::storage::RecordStore;

/// Shared application state passed to all axum handlers via `State` extraction.
///
/// Holds `Arc` references so cloning per request is cheap.
#[derive(Clone)]
pub struct AppState {
    /// The single record store shared by every request.
    pub store: Arc<RecordStore>,
    /// Health state and in-flight tracking.
    pub shutdown: Arc<ShutdownController>,
    /// Server process start time, used for uptime calculation.
    pub start_time: Instant,
}
