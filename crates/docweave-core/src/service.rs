use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("invalid service endpoint: {0}")]
    InvalidEndpoint(#[from] url::ParseError),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("malformed service response: {0}")]
    MalformedResponse(String),
    #[error("timed out waiting for operation {0}")]
    Timeout(String),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchRequest {
    pub processor: String,
    pub input_prefix: String,
    pub output_prefix: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationState {
    Running,
    Succeeded,
    Failed,
}

#[derive(Debug, Clone)]
pub struct OperationStatus {
    pub state: OperationState,
    pub message: Option<String>,
    /// One output destination URI per processed input document.
    pub outputs: Vec<String>,
}

impl OperationStatus {
    #[must_use]
    pub fn running() -> Self {
        Self {
            state: OperationState::Running,
            message: None,
            outputs: Vec::new(),
        }
    }
}

/// The batch document-extraction service. Submitting returns the name of a
/// long-running operation; the operation eventually reports one output
/// destination per input document.
#[async_trait]
pub trait ExtractionService: Send + Sync {
    async fn submit(&self, request: &BatchRequest) -> ServiceResult<String>;

    async fn status(&self, operation: &str) -> ServiceResult<OperationStatus>;
}

/// HTTP client for the extraction service. Credential acquisition is the
/// caller's problem; an already-obtained bearer token is attached verbatim.
pub struct HttpExtractionService {
    client: Client,
    endpoint: Url,
    auth_token: Option<String>,
}

impl HttpExtractionService {
    #[must_use]
    pub fn new(endpoint: Url) -> Self {
        Self {
            client: Client::new(),
            endpoint,
            auth_token: None,
        }
    }

    pub fn from_endpoint(endpoint: &str) -> ServiceResult<Self> {
        Ok(Self::new(Url::parse(endpoint)?))
    }

    #[must_use]
    pub fn with_auth_token(mut self, token: String) -> Self {
        self.auth_token = Some(token);
        self
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.auth_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

#[async_trait]
impl ExtractionService for HttpExtractionService {
    async fn submit(&self, request: &BatchRequest) -> ServiceResult<String> {
        let url = self
            .endpoint
            .join(&format!("v1/{}:batchProcess", request.processor))?;
        let body = json!({
            "inputPrefix": request.input_prefix,
            "outputPrefix": request.output_prefix,
        });

        let response = self
            .authorize(self.client.post(url))
            .json(&body)
            .send()
            .await?
            .error_for_status()?;
        let payload: Value = response.json().await?;

        payload
            .get("name")
            .and_then(Value::as_str)
            .map(str::to_owned)
            .ok_or_else(|| ServiceError::MalformedResponse("missing operation name".into()))
    }

    async fn status(&self, operation: &str) -> ServiceResult<OperationStatus> {
        let url = self.endpoint.join(&format!("v1/{operation}"))?;

        let response = self
            .authorize(self.client.get(url))
            .send()
            .await?
            .error_for_status()?;
        let payload: Value = response.json().await?;

        Ok(parse_status(&payload))
    }
}

fn parse_status(payload: &Value) -> OperationStatus {
    let done = payload.get("done").and_then(Value::as_bool).unwrap_or(false);
    if !done {
        return OperationStatus::running();
    }

    if let Some(error) = payload.get("error") {
        let message = error
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("unknown error")
            .to_string();
        return OperationStatus {
            state: OperationState::Failed,
            message: Some(message),
            outputs: Vec::new(),
        };
    }

    let outputs = payload
        .get("metadata")
        .and_then(|metadata| metadata.get("individualProcessStatuses"))
        .and_then(Value::as_array)
        .map(|statuses| {
            statuses
                .iter()
                .filter_map(|status| {
                    status
                        .get("outputDestination")
                        .and_then(Value::as_str)
                        .map(str::to_owned)
                })
                .collect()
        })
        .unwrap_or_default();

    OperationStatus {
        state: OperationState::Succeeded,
        message: None,
        outputs,
    }
}

/// Polls an operation at a fixed interval until it reaches a terminal state
/// or the deadline passes. Backoff is deliberately not implemented here.
pub async fn wait_until_done(
    service: &dyn ExtractionService,
    operation: &str,
    poll_interval: Duration,
    deadline: Duration,
) -> ServiceResult<OperationStatus> {
    let started = tokio::time::Instant::now();

    loop {
        let status = service.status(operation).await?;
        if status.state != OperationState::Running {
            return Ok(status);
        }
        if started.elapsed() >= deadline {
            return Err(ServiceError::Timeout(operation.to_string()));
        }
        tokio::time::sleep(poll_interval).await;
    }
}
