//! HTTP client for a running `td serve`

use std::time::Duration;

use eyre::{Context, Result, eyre};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::api::{ErrorBody, HealthResponse, RegisterWorkerRequest};
use crate::domain::{SchedulingMechanism, Task, TaskId, Worker};
use crate::registry::TaskSnapshot;
use crate::service::{DispatcherStatus, SubmitRequest};

/// Default server URL when neither --server nor config says otherwise
pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:8080";

pub struct ApiClient {
    http: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        debug!(%base_url, "ApiClient::new: called");
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn health(&self) -> Result<HealthResponse> {
        self.send(self.http.get(self.url("/health"))).await
    }

    pub async fn submit(&self, name: &str, stream: &str, mechanism: Option<SchedulingMechanism>) -> Result<Task> {
        debug!(%name, %stream, ?mechanism, "ApiClient::submit: called");
        let mut request = self
            .http
            .post(self.url("/api/tasks"))
            .json(&SubmitRequest::new(name, stream));
        if let Some(mechanism) = mechanism {
            request = request.query(&[("schedulingMechanism", mechanism.as_str())]);
        }
        self.send(request).await
    }

    pub async fn tasks(&self) -> Result<TaskSnapshot> {
        self.send(self.http.get(self.url("/api/tasks"))).await
    }

    pub async fn task(&self, id: &TaskId) -> Result<Task> {
        self.send(self.http.get(self.url(&format!("/api/tasks/{id}")))).await
    }

    pub async fn workers(&self) -> Result<Vec<Worker>> {
        self.send(self.http.get(self.url("/api/workers"))).await
    }

    pub async fn register_worker(&self, name: &str) -> Result<Worker> {
        let body = RegisterWorkerRequest { name: name.to_string() };
        self.send(self.http.post(self.url("/api/workers")).json(&body)).await
    }

    pub async fn dispatcher(&self) -> Result<DispatcherStatus> {
        self.send(self.http.get(self.url("/api/dispatcher"))).await
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = request
            .send()
            .await
            .with_context(|| format!("Failed to reach server at {}", self.base_url))?;

        let status = response.status();
        if status.is_success() {
            return response.json::<T>().await.context("Failed to decode server response");
        }

        let body = response.text().await.unwrap_or_default();
        Err(eyre!("{}", describe_error(status, &body)))
    }
}

/// Turn a non-2xx response into a one-line message
fn describe_error(status: StatusCode, body: &str) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody { error }) => format!("server returned {status}: {error}"),
        Err(_) if body.is_empty() => format!("server returned {status}"),
        Err(_) => format!("server returned {status}: {body}"),
    }
}
