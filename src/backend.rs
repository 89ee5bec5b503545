//! Persistence backend for canvases, artifacts and projects.
//!
//! DESIGN
//! ======
//! Editors only ever see [`CanvasBackend`]. [`HttpBackend`] talks to the REST
//! API; [`MemoryBackend`] keeps everything in process for offline use and
//! tests. Canvas documents are normalized on the way in, so callers always
//! receive repaired data.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use canvas::doc::CanvasData;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::BackendConfig;

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Partial project update; `None` fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A generated planning document (BMC, story set, ...) stored next to a project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    pub id: String,
    pub project_id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    #[serde(default)]
    pub data: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewArtifact {
    pub project_id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub data: Value,
}

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// Failed to construct the HTTP client.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
    /// The request could not be sent or the body not read.
    #[error("backend request failed: {0}")]
    Request(String),
    /// Non-success status from the API.
    #[error("backend returned {status}: {body}")]
    Status { status: u16, body: String },
    /// The response body did not have the expected shape.
    #[error("backend response parse failed: {0}")]
    Parse(String),
    #[error("{what} not found: {id}")]
    NotFound { what: &'static str, id: String },
}

impl crate::error::UserFacing for BackendError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::HttpClientBuild(_) => "E_HTTP_CLIENT_BUILD",
            Self::Request(_) => "E_BACKEND_REQUEST",
            Self::Status { .. } => "E_BACKEND_STATUS",
            Self::Parse(_) => "E_BACKEND_PARSE",
            Self::NotFound { .. } => "E_NOT_FOUND",
        }
    }

    fn user_message(&self) -> String {
        match self {
            Self::NotFound { what, .. } => format!("The {what} could not be found."),
            _ => "Your changes could not be saved. Please try again.".to_owned(),
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Request(_) | Self::Status { status: 429 | 500..=599, .. })
    }
}

// =============================================================================
// TRAIT
// =============================================================================

#[async_trait::async_trait]
pub trait CanvasBackend: Send + Sync {
    /// The project's canvas, or `None` when it has never been saved.
    async fn get_canvas(&self, project_id: &str) -> Result<Option<CanvasData>, BackendError>;

    async fn create_canvas(&self, project_id: &str, data: &CanvasData) -> Result<(), BackendError>;

    async fn update_canvas(&self, project_id: &str, data: &CanvasData) -> Result<(), BackendError>;

    async fn create_artifact(&self, artifact: &NewArtifact) -> Result<Artifact, BackendError>;

    async fn update_artifact(&self, id: &str, data: &Value) -> Result<Artifact, BackendError>;

    async fn get_project(&self, id: &str) -> Result<Project, BackendError>;

    async fn update_project(&self, id: &str, patch: &ProjectPatch) -> Result<Project, BackendError>;
}

/// Parse a stored canvas document, logging any load-time repairs.
pub fn parse_canvas(project_id: &str, text: &str) -> Result<CanvasData, BackendError> {
    let (data, report) = CanvasData::from_json(text).map_err(|e| BackendError::Parse(e.to_string()))?;
    if !report.is_clean() {
        warn!(%project_id, ?report, "canvas normalized on load");
    }
    Ok(data)
}

// =============================================================================
// HTTP
// =============================================================================

/// REST client: `{base}/projects/{id}`, `{base}/projects/{id}/canvas`, `{base}/artifacts`.
pub struct HttpBackend {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpBackend {
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeouts.request_secs))
            .connect_timeout(Duration::from_secs(config.timeouts.connect_secs))
            .build()
            .map_err(|e| BackendError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, base_url: config.base_url.trim_end_matches('/').to_string(), api_key: config.api_key.clone() })
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let builder = self.http.request(method, format!("{}{path}", self.base_url));
        match &self.api_key {
            Some(key) => builder.bearer_auth(key),
            None => builder,
        }
    }

    /// Send, then return `(status, body)`.
    async fn send(&self, builder: reqwest::RequestBuilder) -> Result<(u16, String), BackendError> {
        let response = builder.send().await.map_err(|e| BackendError::Request(e.to_string()))?;
        let status = response.status().as_u16();
        let text = response.text().await.map_err(|e| BackendError::Request(e.to_string()))?;
        debug!(status, bytes = text.len(), "backend response");
        Ok((status, text))
    }

    async fn send_ok(&self, builder: reqwest::RequestBuilder) -> Result<String, BackendError> {
        let (status, body) = self.send(builder).await?;
        if !(200..300).contains(&status) {
            return Err(BackendError::Status { status, body });
        }
        Ok(body)
    }
}

fn parse_json<T: serde::de::DeserializeOwned>(text: &str) -> Result<T, BackendError> {
    serde_json::from_str(text).map_err(|e| BackendError::Parse(e.to_string()))
}

#[async_trait::async_trait]
impl CanvasBackend for HttpBackend {
    async fn get_canvas(&self, project_id: &str) -> Result<Option<CanvasData>, BackendError> {
        let path = format!("/projects/{project_id}/canvas");
        let (status, body) = self.send(self.request(reqwest::Method::GET, &path)).await?;
        match status {
            404 => Ok(None),
            200..=299 => parse_canvas(project_id, &body).map(Some),
            _ => Err(BackendError::Status { status, body }),
        }
    }

    async fn create_canvas(&self, project_id: &str, data: &CanvasData) -> Result<(), BackendError> {
        let path = format!("/projects/{project_id}/canvas");
        self.send_ok(self.request(reqwest::Method::POST, &path).json(data)).await?;
        Ok(())
    }

    async fn update_canvas(&self, project_id: &str, data: &CanvasData) -> Result<(), BackendError> {
        let path = format!("/projects/{project_id}/canvas");
        self.send_ok(self.request(reqwest::Method::PUT, &path).json(data)).await?;
        Ok(())
    }

    async fn create_artifact(&self, artifact: &NewArtifact) -> Result<Artifact, BackendError> {
        let body = self.send_ok(self.request(reqwest::Method::POST, "/artifacts").json(artifact)).await?;
        parse_json(&body)
    }

    async fn update_artifact(&self, id: &str, data: &Value) -> Result<Artifact, BackendError> {
        let path = format!("/artifacts/{id}");
        let payload = serde_json::json!({ "data": data });
        let (status, body) = self.send(self.request(reqwest::Method::PUT, &path).json(&payload)).await?;
        match status {
            404 => Err(BackendError::NotFound { what: "artifact", id: id.to_string() }),
            200..=299 => parse_json(&body),
            _ => Err(BackendError::Status { status, body }),
        }
    }

    async fn get_project(&self, id: &str) -> Result<Project, BackendError> {
        let path = format!("/projects/{id}");
        let (status, body) = self.send(self.request(reqwest::Method::GET, &path)).await?;
        match status {
            404 => Err(BackendError::NotFound { what: "project", id: id.to_string() }),
            200..=299 => parse_json(&body),
            _ => Err(BackendError::Status { status, body }),
        }
    }

    async fn update_project(&self, id: &str, patch: &ProjectPatch) -> Result<Project, BackendError> {
        let path = format!("/projects/{id}");
        let (status, body) = self.send(self.request(reqwest::Method::PUT, &path).json(patch)).await?;
        match status {
            404 => Err(BackendError::NotFound { what: "project", id: id.to_string() }),
            200..=299 => parse_json(&body),
            _ => Err(BackendError::Status { status, body }),
        }
    }
}

// =============================================================================
// MEMORY
// =============================================================================

/// In-process backend. Counts canvas writes and can be told to fail them.
#[derive(Default)]
pub struct MemoryBackend {
    canvases: Mutex<HashMap<String, CanvasData>>,
    artifacts: Mutex<HashMap<String, Artifact>>,
    projects: Mutex<HashMap<String, Project>>,
    creates: AtomicUsize,
    updates: AtomicUsize,
    fail_writes: AtomicBool,
}

impl MemoryBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_project(&self, project: Project) {
        lock(&self.projects).insert(project.id.clone(), project);
    }

    pub fn insert_canvas(&self, project_id: &str, data: CanvasData) {
        lock(&self.canvases).insert(project_id.to_string(), data);
    }

    #[must_use]
    pub fn canvas(&self, project_id: &str) -> Option<CanvasData> {
        lock(&self.canvases).get(project_id).cloned()
    }

    #[must_use]
    pub fn artifact(&self, id: &str) -> Option<Artifact> {
        lock(&self.artifacts).get(id).cloned()
    }

    /// Number of `create_canvas` calls that succeeded.
    #[must_use]
    pub fn create_count(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }

    /// Number of `update_canvas` calls that succeeded.
    #[must_use]
    pub fn update_count(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }

    /// Make subsequent canvas writes fail with a 503.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_writable(&self) -> Result<(), BackendError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(BackendError::Status { status: 503, body: "unavailable".into() });
        }
        Ok(())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[async_trait::async_trait]
impl CanvasBackend for MemoryBackend {
    async fn get_canvas(&self, project_id: &str) -> Result<Option<CanvasData>, BackendError> {
        Ok(self.canvas(project_id))
    }

    async fn create_canvas(&self, project_id: &str, data: &CanvasData) -> Result<(), BackendError> {
        self.check_writable()?;
        lock(&self.canvases).insert(project_id.to_string(), data.clone());
        self.creates.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn update_canvas(&self, project_id: &str, data: &CanvasData) -> Result<(), BackendError> {
        self.check_writable()?;
        let mut canvases = lock(&self.canvases);
        let Some(slot) = canvases.get_mut(project_id) else {
            return Err(BackendError::NotFound { what: "canvas", id: project_id.to_string() });
        };
        *slot = data.clone();
        self.updates.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn create_artifact(&self, artifact: &NewArtifact) -> Result<Artifact, BackendError> {
        let stored = Artifact {
            id: uuid::Uuid::new_v4().to_string(),
            project_id: artifact.project_id.clone(),
            kind: artifact.kind.clone(),
            title: artifact.title.clone(),
            data: artifact.data.clone(),
        };
        lock(&self.artifacts).insert(stored.id.clone(), stored.clone());
        Ok(stored)
    }

    async fn update_artifact(&self, id: &str, data: &Value) -> Result<Artifact, BackendError> {
        let mut artifacts = lock(&self.artifacts);
        let Some(artifact) = artifacts.get_mut(id) else {
            return Err(BackendError::NotFound { what: "artifact", id: id.to_string() });
        };
        artifact.data = data.clone();
        Ok(artifact.clone())
    }

    async fn get_project(&self, id: &str) -> Result<Project, BackendError> {
        lock(&self.projects)
            .get(id)
            .cloned()
            .ok_or_else(|| BackendError::NotFound { what: "project", id: id.to_string() })
    }

    async fn update_project(&self, id: &str, patch: &ProjectPatch) -> Result<Project, BackendError> {
        let mut projects = lock(&self.projects);
        let Some(project) = projects.get_mut(id) else {
            return Err(BackendError::NotFound { what: "project", id: id.to_string() });
        };
        if let Some(name) = &patch.name {
            project.name.clone_from(name);
        }
        if let Some(description) = &patch.description {
            project.description = Some(description.clone());
        }
        Ok(project.clone())
    }
}

#[cfg(test)]
#[path = "backend_test.rs"]
mod tests;
