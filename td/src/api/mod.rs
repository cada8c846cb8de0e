//! HTTP surface
//!
//! Thin axum handlers over [`TaskService`]. Wire names follow the task
//! JSON contract (`id`, `name`, `taskStream`, `status`, `timestamp`).

mod error;
mod health;
mod tasks;
mod workers;

use axum::Router;
use axum::routing::get;

use crate::service::TaskService;

pub use error::{ApiError, ErrorBody};
pub use health::HealthResponse;
pub use tasks::SubmitParams;
pub use workers::RegisterWorkerRequest;

/// Build the complete application router
pub fn build_router(service: TaskService) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/api/tasks", get(tasks::list_tasks).post(tasks::submit_task))
        .route("/api/tasks/{id}", get(tasks::get_task))
        .route("/api/workers", get(workers::list_workers).post(workers::register_worker))
        .route("/api/dispatcher", get(tasks::dispatcher_status))
        .with_state(service)
}
