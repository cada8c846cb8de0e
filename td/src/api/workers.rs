//! Worker registration and listing

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use serde::{Deserialize, Serialize};

use crate::domain::Worker;
use crate::service::TaskService;

use super::error::ApiError;

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct RegisterWorkerRequest {
    #[serde(default)]
    pub name: String,
}

pub async fn list_workers(State(service): State<TaskService>) -> Json<Vec<Worker>> {
    Json(service.workers().await)
}

pub async fn register_worker(
    State(service): State<TaskService>,
    body: Result<Json<RegisterWorkerRequest>, JsonRejection>,
) -> Result<Json<Worker>, ApiError> {
    let Json(request) = body?;
    Ok(Json(service.register_worker(&request.name).await?))
}
