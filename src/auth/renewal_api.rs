//! Renewal endpoint client.
//!
//! Exchanges a refresh token for a new credential with the API's
//! `refreshToken` mutation. The client owns its own [`HttpClient`]; it is a
//! leaf call and never passes through the link chain.

use async_trait::async_trait;
use std::sync::Arc;

use crate::adapters::ReqwestHttpClient;
use crate::auth::TokenGrant;
use crate::error::RenewalError;
use crate::operation::{Operation, OperationResponse};
use crate::traits::{Headers, HttpClient, HttpError, RenewalExecutor};

/// Mutation used to renew a credential.
pub const REFRESH_TOKEN_MUTATION: &str = "mutation RefreshToken($refreshToken: String!) {
  refreshToken(refreshToken: $refreshToken) {
    accessToken
    refreshToken
    user
  }
}";

/// Field of `data` carrying the renewed credential.
const REFRESH_FIELD: &str = "refreshToken";

/// Client for the renewal endpoint.
#[derive(Clone)]
pub struct RenewalApiClient {
    endpoint: String,
    http: Arc<dyn HttpClient>,
}

impl std::fmt::Debug for RenewalApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenewalApiClient")
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

impl RenewalApiClient {
    /// Create a client with a dedicated reqwest connection pool.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self::with_http_client(endpoint, Arc::new(ReqwestHttpClient::new()))
    }

    /// Create a client over a caller-provided HTTP client.
    ///
    /// The HTTP client must not be one that routes through the link chain.
    pub fn with_http_client(endpoint: impl Into<String>, http: Arc<dyn HttpClient>) -> Self {
        Self {
            endpoint: endpoint.into(),
            http,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Refresh an access token using a refresh token.
    pub async fn refresh_token(&self, refresh_token: &str) -> Result<TokenGrant, RenewalError> {
        let operation = Operation::new(REFRESH_TOKEN_MUTATION)
            .with_name("RefreshToken")
            .with_variables(serde_json::json!({ "refreshToken": refresh_token }));

        let mut headers = Headers::new();
        headers.insert("Content-Type".to_string(), "application/json".to_string());

        let response = self
            .http
            .post(&self.endpoint, &operation.to_body(), &headers)
            .await
            .map_err(classify_http_error)?;

        let body = response.text().unwrap_or_default();

        if !response.is_success() {
            let message = serde_json::from_str::<OperationResponse>(&body)
                .ok()
                .filter(|r| r.has_errors())
                .map(|r| join(&r))
                .unwrap_or_else(|| non_empty_or(body.trim(), "Unknown error"));
            return Err(if matches!(response.status, 401 | 403) || is_rejection_message(&message) {
                RenewalError::RefreshTokenRejected(message)
            } else {
                RenewalError::Transient(format!("status {}: {}", response.status, message))
            });
        }

        let parsed: OperationResponse = serde_json::from_str(&body)
            .map_err(|e| RenewalError::InvalidResponse(e.to_string()))?;

        if parsed.has_errors() {
            let message = join(&parsed);
            return Err(if is_rejection_message(&message) {
                RenewalError::RefreshTokenRejected(message)
            } else {
                RenewalError::Transient(message)
            });
        }

        let payload = parsed
            .data
            .and_then(|mut data| data.get_mut(REFRESH_FIELD).map(serde_json::Value::take))
            .filter(|value| !value.is_null())
            .ok_or_else(|| {
                RenewalError::InvalidResponse(format!("response has no `{}` field", REFRESH_FIELD))
            })?;

        serde_json::from_value(payload).map_err(|e| RenewalError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl RenewalExecutor for RenewalApiClient {
    async fn renew(&self, refresh_token: &str) -> Result<TokenGrant, RenewalError> {
        self.refresh_token(refresh_token).await
    }
}

/// True when a renewal error message says the refresh token is unusable.
pub fn is_rejection_message(message: &str) -> bool {
    let lower = message.to_lowercase();
    if lower.contains("unauthorized") || lower.contains("unauthenticated") {
        return true;
    }
    lower.contains("token")
        && (lower.contains("invalid") || lower.contains("expired") || lower.contains("revoked"))
}

fn classify_http_error(err: HttpError) -> RenewalError {
    match err {
        HttpError::ServerError { status: 401 | 403, message } => {
            RenewalError::RefreshTokenRejected(message)
        }
        other => RenewalError::Transient(other.to_string()),
    }
}

fn join(response: &OperationResponse) -> String {
    response
        .errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

fn non_empty_or(text: &str, fallback: &str) -> String {
    if text.is_empty() {
        fallback.to_string()
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock::{MockHttpClient, MockResponse};
    use crate::traits::Response;

    const URL: &str = "https://api.example.com/graphql";

    fn client_with(response: MockResponse) -> (RenewalApiClient, MockHttpClient) {
        let http = MockHttpClient::new();
        http.set_response(URL, response);
        (
            RenewalApiClient::with_http_client(URL, Arc::new(http.clone())),
            http,
        )
    }

    #[test]
    fn test_is_rejection_message() {
        assert!(is_rejection_message("Invalid refresh token"));
        assert!(is_rejection_message("Refresh token expired"));
        assert!(is_rejection_message("token has been revoked"));
        assert!(is_rejection_message("Unauthorized"));
        assert!(!is_rejection_message("Internal server error"));
        assert!(!is_rejection_message("Invalid input"));
    }

    #[tokio::test]
    async fn test_refresh_success() {
        let (client, http) = client_with(MockResponse::Success(Response::json_body(
            200,
            &serde_json::json!({
                "data": {"refreshToken": {
                    "accessToken": "T2",
                    "refreshToken": "R2",
                    "user": {"id": "u1"}
                }}
            }),
        )));

        let grant = client.refresh_token("R1").await.unwrap();
        assert_eq!(grant.access_token, "T2");
        assert_eq!(grant.refresh_token, "R2");

        let requests = http.get_requests();
        assert_eq!(requests.len(), 1);
        let body: serde_json::Value =
            serde_json::from_str(requests[0].body.as_deref().unwrap()).unwrap();
        assert_eq!(body["variables"]["refreshToken"], "R1");
        assert_eq!(body["operationName"], "RefreshToken");
        assert!(!requests[0].headers.contains_key("Authorization"));
    }

    #[tokio::test]
    async fn test_graphql_rejection() {
        let (client, _) = client_with(MockResponse::Success(Response::json_body(
            200,
            &serde_json::json!({"data": null, "errors": [{"message": "Invalid refresh token"}]}),
        )));

        assert_eq!(
            client.refresh_token("R1").await.unwrap_err(),
            RenewalError::RefreshTokenRejected("Invalid refresh token".to_string())
        );
    }

    #[tokio::test]
    async fn test_graphql_other_error_is_transient() {
        let (client, _) = client_with(MockResponse::Success(Response::json_body(
            200,
            &serde_json::json!({"errors": [{"message": "Database unavailable"}]}),
        )));

        assert!(matches!(
            client.refresh_token("R1").await,
            Err(RenewalError::Transient(_))
        ));
    }

    #[tokio::test]
    async fn test_status_401_is_rejection() {
        let (client, _) = client_with(MockResponse::Success(Response::new(
            401,
            bytes::Bytes::from("nope"),
        )));

        assert_eq!(
            client.refresh_token("R1").await.unwrap_err(),
            RenewalError::RefreshTokenRejected("nope".to_string())
        );
    }

    #[tokio::test]
    async fn test_status_503_is_transient() {
        let (client, _) = client_with(MockResponse::Success(Response::new(
            503,
            bytes::Bytes::new(),
        )));

        assert_eq!(
            client.refresh_token("R1").await.unwrap_err(),
            RenewalError::Transient("status 503: Unknown error".to_string())
        );
    }

    #[tokio::test]
    async fn test_connection_failure_is_transient() {
        let (client, _) = client_with(MockResponse::Error(HttpError::ConnectionFailed(
            "refused".to_string(),
        )));

        assert!(client.refresh_token("R1").await.unwrap_err().is_transient());
    }

    #[tokio::test]
    async fn test_missing_payload_is_invalid_response() {
        let (client, _) = client_with(MockResponse::Success(Response::json_body(
            200,
            &serde_json::json!({"data": {"refreshToken": null}}),
        )));

        assert!(matches!(
            client.refresh_token("R1").await,
            Err(RenewalError::InvalidResponse(_))
        ));
    }
}
