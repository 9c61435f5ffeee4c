//! Remote execution over HTTP.
//!
//! A server exposes any [`AtomicExecutor`] at a single JSON endpoint
//! (`POST /api/v0/execute`) using axum, and [`HttpBackend`] is an executor
//! that forwards every operation there with reqwest. The server runs the
//! operation atomically against its own store, so a remote collection is
//! exactly as consistent as the store behind the server.
//!
//! Tree failures cross the wire as typed [`TreeError`]s. Transport failures
//! and non-success statuses become connectivity errors on the client; a body
//! that arrives but cannot be parsed is a [`CodecError`].

use std::any::Any;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::extract::{Json as ExtractJson, State};
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::{get, post};
use axum::Router;
use serde::{Deserialize, Serialize};

use crate::backend::{AtomicExecutor, BackendError};
use crate::codec::{Arg, CodecError, Operation, Reply};
use crate::tree::TreeError;
use crate::{Error, Result};

/// Request timeout used by [`HttpBackend::new`].
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Body of `POST /api/v0/execute`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecuteRequest {
    /// Operation name from the fixed vocabulary.
    pub op: String,
    pub collection: String,
    pub args: Vec<Arg>,
}

/// Answer to an [`ExecuteRequest`]: `{"reply": ...}` or `{"error": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecuteResponse {
    Reply(Reply),
    Error(RemoteError),
}

/// A failure reported by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "category", content = "detail", rename_all = "snake_case")]
pub enum RemoteError {
    /// The operation was rejected by the tree itself.
    Tree(TreeError),
    /// The server does not know the operation name.
    UnsupportedOperation { name: String },
    /// The argument list did not fit the operation.
    InvalidArguments { op: String, reason: String },
    /// The server's own store failed.
    Unavailable { message: String },
}

/// Body of `GET /health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    /// Kind of the store behind the server.
    pub backend: String,
    pub version: String,
}

/// Builds the axum router serving `executor`.
pub fn router(executor: Arc<dyn AtomicExecutor>) -> Router {
    Router::new()
        .route("/api/v0/execute", post(handle_execute))
        .route("/health", get(handle_health))
        .with_state(executor)
}

/// Handler for `/api/v0/execute`.
async fn handle_execute(
    State(executor): State<Arc<dyn AtomicExecutor>>,
    ExtractJson(request): ExtractJson<ExecuteRequest>,
) -> (StatusCode, Json<ExecuteResponse>) {
    let result = executor
        .execute(&request.op, &request.collection, &request.args)
        .await;

    match result {
        Ok(reply) => (StatusCode::OK, Json(ExecuteResponse::Reply(reply))),
        Err(err) => {
            let (status, error) = to_remote_error(&request, err);
            (status, Json(ExecuteResponse::Error(error)))
        }
    }
}

fn to_remote_error(request: &ExecuteRequest, err: Error) -> (StatusCode, RemoteError) {
    match err {
        Error::Tree(tree_err) => {
            if tree_err.is_invariant_violation() {
                tracing::warn!(
                    collection = %request.collection,
                    op = %request.op,
                    error = %tree_err,
                    "rejected invariant violation"
                );
            }
            (StatusCode::OK, RemoteError::Tree(tree_err))
        }
        Error::Codec(CodecError::UnsupportedOperation { name }) => {
            (StatusCode::OK, RemoteError::UnsupportedOperation { name })
        }
        Error::Codec(CodecError::InvalidArguments { op, reason }) => (
            StatusCode::OK,
            RemoteError::InvalidArguments {
                op: op.name().to_string(),
                reason,
            },
        ),
        other => {
            tracing::error!(
                collection = %request.collection,
                op = %request.op,
                error = %other,
                "store failure"
            );
            (
                StatusCode::SERVICE_UNAVAILABLE,
                RemoteError::Unavailable {
                    message: other.to_string(),
                },
            )
        }
    }
}

/// Handler for `/health`.
async fn handle_health(State(executor): State<Arc<dyn AtomicExecutor>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        backend: executor.kind().to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// An executor that forwards every operation to a remote server.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl HttpBackend {
    /// Creates a client for the server at `base_url` (e.g. `http://127.0.0.1:3000`)
    /// with [`DEFAULT_TIMEOUT`].
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    /// Creates a client whose requests give up after `timeout`.
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BackendError::Unreachable {
                address: base_url.clone(),
                reason: format!("Failed to build HTTP client: {e}"),
            })?;
        Ok(Self {
            client,
            base_url,
            timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Checks the server's health endpoint.
    pub async fn health(&self) -> Result<HealthResponse> {
        let response = self
            .client
            .get(format!("{}/health", self.base_url))
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        let response = self.check_status(response).await?;
        let body = response.bytes().await.map_err(|e| self.transport_error(e))?;
        serde_json::from_slice(&body).map_err(|e| {
            CodecError::MalformedBody {
                endpoint: "health".to_string(),
                reason: e.to_string(),
            }
            .into()
        })
    }

    fn transport_error(&self, err: reqwest::Error) -> Error {
        if err.is_timeout() {
            BackendError::Timeout {
                duration_ms: u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
            }
            .into()
        } else {
            BackendError::Unreachable {
                address: self.base_url.clone(),
                reason: err.to_string(),
            }
            .into()
        }
    }

    async fn check_status(&self, response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let reason = match response.json::<ExecuteResponse>().await {
            Ok(ExecuteResponse::Error(RemoteError::Unavailable { message })) => message,
            Ok(other) => format!("{other:?}"),
            Err(_) => status.canonical_reason().unwrap_or("unknown").to_string(),
        };
        Err(BackendError::RemoteStatus {
            status: status.as_u16(),
            reason,
        }
        .into())
    }
}

#[async_trait]
impl AtomicExecutor for HttpBackend {
    async fn execute_op(&self, op: Operation, collection: &str, args: &[Arg]) -> Result<Reply> {
        let request = ExecuteRequest {
            op: op.name().to_string(),
            collection: collection.to_string(),
            args: args.to_vec(),
        };
        let response = self
            .client
            .post(format!("{}/api/v0/execute", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        let response = self.check_status(response).await?;
        let body = response.bytes().await.map_err(|e| self.transport_error(e))?;
        let body: ExecuteResponse =
            serde_json::from_slice(&body).map_err(|e| CodecError::Decode {
                op,
                expected: "execute response body",
                found: e.to_string(),
            })?;

        match body {
            ExecuteResponse::Reply(reply) => Ok(reply),
            ExecuteResponse::Error(RemoteError::Tree(err)) => Err(err.into()),
            ExecuteResponse::Error(RemoteError::UnsupportedOperation { name }) => {
                Err(CodecError::UnsupportedOperation { name }.into())
            }
            ExecuteResponse::Error(RemoteError::InvalidArguments { reason, .. }) => {
                Err(CodecError::InvalidArguments { op, reason }.into())
            }
            ExecuteResponse::Error(RemoteError::Unavailable { message }) => {
                Err(BackendError::RemoteStatus {
                    status: StatusCode::SERVICE_UNAVAILABLE.as_u16(),
                    reason: message,
                }
                .into())
            }
        }
    }

    fn kind(&self) -> &'static str {
        "remote"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
