//! Unary GraphQL transport over HTTP POST.

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::LinkError;
use crate::operation::{OperationResponse, PendingRequest, Reply};
use crate::traits::{HttpClient, HttpError, Response, Transport};

/// Sends queries and mutations as JSON POSTs to one endpoint.
#[derive(Clone)]
pub struct GraphQlHttpTransport {
    endpoint: String,
    http: Arc<dyn HttpClient>,
}

impl std::fmt::Debug for GraphQlHttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphQlHttpTransport")
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

impl GraphQlHttpTransport {
    pub fn new(endpoint: impl Into<String>, http: Arc<dyn HttpClient>) -> Self {
        Self {
            endpoint: endpoint.into(),
            http,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Transport for GraphQlHttpTransport {
    async fn dispatch(&self, request: &PendingRequest) -> Result<Reply, LinkError> {
        let response = self
            .http
            .post(&self.endpoint, &request.operation.to_body(), &request.headers)
            .await?;
        parse_response(&response).map(Reply::Unary)
    }
}

/// Interpret an HTTP response as a GraphQL result.
///
/// Non-2xx statuses become [`LinkError::Http`] carrying the status and the
/// GraphQL error messages from the body when it has any. A 2xx body with a
/// non-empty `errors` array becomes [`LinkError::Graphql`].
pub fn parse_response(response: &Response) -> Result<OperationResponse, LinkError> {
    if !response.is_success() {
        let body = response.text().unwrap_or_default();
        return Err(error_from_status(response.status, &body));
    }

    let parsed: OperationResponse = response
        .json()
        .map_err(|e| LinkError::InvalidResponse(e.to_string()))?;
    parsed.into_result()
}

/// Build the error for a non-2xx status and its body.
pub fn error_from_status(status: u16, body: &str) -> LinkError {
    let message = serde_json::from_str::<OperationResponse>(body)
        .ok()
        .filter(|r| r.has_errors())
        .map(|r| {
            r.errors
                .iter()
                .map(|e| e.message.as_str())
                .collect::<Vec<_>>()
                .join("; ")
        })
        .unwrap_or_else(|| {
            let trimmed = body.trim();
            if trimmed.is_empty() {
                default_reason(status).to_string()
            } else {
                trimmed.to_string()
            }
        });
    LinkError::Http(HttpError::ServerError { status, message })
}

fn default_reason(status: u16) -> &'static str {
    match status {
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        _ => "Unknown error",
    }
}
