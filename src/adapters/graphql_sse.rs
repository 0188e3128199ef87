//! Streaming GraphQL transport for subscriptions over Server-Sent Events.
//!
//! The subscription is POSTed like a query with `Accept: text/event-stream`.
//! Each SSE event's data is a GraphQL response; an `event: complete` ends
//! the stream.

use async_trait::async_trait;
use futures_util::StreamExt;
use std::collections::VecDeque;
use std::sync::Arc;

use super::graphql_http::error_from_status;
use crate::error::LinkError;
use crate::operation::{OperationResponse, PendingRequest, Reply};
use crate::sse::{SseMessage, SseParser};
use crate::traits::{ByteStream, HttpClient, HttpError, Transport};

/// Opens subscriptions as SSE streams against one endpoint.
#[derive(Clone)]
pub struct GraphQlSseTransport {
    endpoint: String,
    http: Arc<dyn HttpClient>,
}

impl std::fmt::Debug for GraphQlSseTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphQlSseTransport")
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

impl GraphQlSseTransport {
    pub fn new(endpoint: impl Into<String>, http: Arc<dyn HttpClient>) -> Self {
        Self {
            endpoint: endpoint.into(),
            http,
        }
    }
}

struct StreamState {
    bytes: ByteStream,
    parser: SseParser,
    queued: VecDeque<SseMessage>,
    finished: bool,
}

fn decode_event(data: &str) -> Result<OperationResponse, LinkError> {
    serde_json::from_str::<OperationResponse>(data)
        .map_err(|e| LinkError::InvalidResponse(e.to_string()))?
        .into_result()
}

#[async_trait]
impl Transport for GraphQlSseTransport {
    async fn dispatch(&self, request: &PendingRequest) -> Result<Reply, LinkError> {
        let mut headers = request.headers.clone();
        headers.insert("Accept".to_string(), "text/event-stream".to_string());

        let bytes = self
            .http
            .post_stream(&self.endpoint, &request.operation.to_body(), &headers)
            .await
            .map_err(|err| match err {
                HttpError::ServerError { status, message } => error_from_status(status, &message),
                other => LinkError::Http(other),
            })?;

        let state = StreamState {
            bytes,
            parser: SseParser::new(),
            queued: VecDeque::new(),
            finished: false,
        };

        let events = futures::stream::unfold(state, |mut state| async move {
            loop {
                if state.finished {
                    return None;
                }
                if let Some(message) = state.queued.pop_front() {
                    if message.is_complete() {
                        return None;
                    }
                    if message.data.is_empty() {
                        continue;
                    }
                    let item = decode_event(&message.data);
                    return Some((item, state));
                }
                match state.bytes.next().await {
                    Some(Ok(chunk)) => {
                        let messages = state.parser.feed(&chunk);
                        state.queued.extend(messages);
                    }
                    Some(Err(err)) => {
                        state.finished = true;
                        return Some((Err(LinkError::Stream(err.to_string())), state));
                    }
                    None => return None,
                }
            }
        });

        Ok(Reply::Stream(Box::pin(events)))
    }
}
