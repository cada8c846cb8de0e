//! Task submission, listing and dispatcher status

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use serde::Deserialize;
use tracing::debug;

use crate::domain::{SchedulingMechanism, Task, TaskId};
use crate::registry::TaskSnapshot;
use crate::service::{DispatcherStatus, SubmitRequest, TaskService};

use super::error::ApiError;

#[derive(Debug, Default, Deserialize)]
pub struct SubmitParams {
    #[serde(rename = "schedulingMechanism")]
    pub scheduling_mechanism: Option<String>,
}

impl SubmitParams {
    /// Absent or blank means "use the default"
    fn mechanism(&self) -> Result<Option<SchedulingMechanism>, ApiError> {
        match self.scheduling_mechanism.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => Ok(Some(raw.parse()?)),
        }
    }
}

pub async fn list_tasks(State(service): State<TaskService>) -> Json<TaskSnapshot> {
    Json(service.query().await)
}

pub async fn submit_task(
    State(service): State<TaskService>,
    Query(params): Query<SubmitParams>,
    body: Result<Json<SubmitRequest>, JsonRejection>,
) -> Result<Json<Task>, ApiError> {
    debug!(?params, "submit_task: called");
    let mechanism = params.mechanism()?;
    let Json(request) = body?;
    let task = service.submit(request, mechanism).await?;
    Ok(Json(task))
}

pub async fn get_task(State(service): State<TaskService>, Path(id): Path<String>) -> Result<Json<Task>, ApiError> {
    let id: TaskId = id.parse()?;
    service
        .task(&id)
        .await
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("task not found: {id}")))
}

pub async fn dispatcher_status(State(service): State<TaskService>) -> Json<DispatcherStatus> {
    Json(service.dispatcher_status())
}
