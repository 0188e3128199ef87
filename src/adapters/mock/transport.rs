//! Scripted transport for testing the link chain.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use crate::error::LinkError;
use crate::operation::{GraphQlError, OperationResponse, PendingRequest, Reply};
use crate::traits::{HttpError, Transport};

/// One scripted outcome of a dispatch.
#[derive(Debug, Clone)]
pub enum MockReply {
    /// A successful unary response with this `data`.
    Data(serde_json::Value),
    /// A failed dispatch.
    Failure(LinkError),
    /// A subscription that yields these events and then ends.
    Events(Vec<Result<OperationResponse, LinkError>>),
}

impl MockReply {
    /// A GraphQL error with the given message and no status.
    pub fn graphql_error(message: &str) -> Self {
        MockReply::Failure(LinkError::Graphql {
            errors: vec![GraphQlError::new(message)],
            data: None,
        })
    }

    /// A non-2xx HTTP failure.
    pub fn status(status: u16, message: &str) -> Self {
        MockReply::Failure(LinkError::Http(HttpError::ServerError {
            status,
            message: message.to_string(),
        }))
    }

    fn into_result(self) -> Result<Reply, LinkError> {
        match self {
            MockReply::Data(data) => Ok(Reply::Unary(OperationResponse::from_data(data))),
            MockReply::Failure(err) => Err(err),
            MockReply::Events(events) => Ok(Reply::Stream(Box::pin(futures::stream::iter(events)))),
        }
    }
}

/// Transport that answers from per-operation scripts and records every
/// request it receives.
///
/// Replies are looked up by operation label; each label has a FIFO queue.
/// When the queue is empty the fallback reply is used.
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    scripts: Arc<Mutex<HashMap<String, VecDeque<MockReply>>>>,
    fallback: Arc<Mutex<Option<MockReply>>>,
    requests: Arc<Mutex<Vec<PendingRequest>>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a reply for the operation with this label.
    pub fn push_reply(&self, label: &str, reply: MockReply) {
        self.scripts
            .lock()
            .unwrap()
            .entry(label.to_string())
            .or_default()
            .push_back(reply);
    }

    /// Reply used when no scripted reply is queued.
    pub fn set_fallback(&self, reply: MockReply) {
        *self.fallback.lock().unwrap() = Some(reply);
    }

    /// Every request dispatched so far, in order.
    pub fn requests(&self) -> Vec<PendingRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn dispatch_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// `Authorization` header of each dispatched request, in order.
    pub fn authorization_headers(&self) -> Vec<Option<String>> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.header(crate::operation::AUTHORIZATION).map(str::to_string))
            .collect()
    }

    fn next_reply(&self, label: &str) -> Option<MockReply> {
        let scripted = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(label)
            .and_then(|queue| queue.pop_front());
        scripted.or_else(|| self.fallback.lock().unwrap().clone())
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn dispatch(&self, request: &PendingRequest) -> Result<Reply, LinkError> {
        self.requests.lock().unwrap().push(request.clone());

        let label = request.operation.label();
        match self.next_reply(&label) {
            Some(reply) => reply.into_result(),
            None => Err(LinkError::Http(HttpError::Other(format!(
                "No mock reply for operation: {}",
                label
            )))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::Operation;
    use futures::StreamExt;

    fn request(name: &str) -> PendingRequest {
        PendingRequest::new(Operation::new("query { x }").with_name(name))
    }

    #[tokio::test]
    async fn test_scripted_replies_then_fallback() {
        let transport = MockTransport::new();
        transport.push_reply("A", MockReply::graphql_error("Token expired"));
        transport.set_fallback(MockReply::Data(serde_json::json!({"ok": true})));

        assert!(transport.dispatch(&request("A")).await.is_err());
        let reply = transport.dispatch(&request("A")).await.unwrap();
        assert_eq!(reply.into_unary().unwrap().data.unwrap()["ok"], true);
        assert_eq!(transport.dispatch_count(), 2);
    }

    #[tokio::test]
    async fn test_records_authorization() {
        let transport = MockTransport::new();
        transport.set_fallback(MockReply::Data(serde_json::json!({})));

        let mut with_token = request("A");
        with_token.set_bearer("T1");
        transport.dispatch(&with_token).await.unwrap();
        transport.dispatch(&request("B")).await.unwrap();

        assert_eq!(
            transport.authorization_headers(),
            vec![Some("Bearer T1".to_string()), None]
        );
    }

    #[tokio::test]
    async fn test_events_reply_is_stream() {
        let transport = MockTransport::new();
        transport.push_reply(
            "S",
            MockReply::Events(vec![Ok(OperationResponse::from_data(serde_json::json!(1)))]),
        );

        let reply = transport.dispatch(&request("S")).await.unwrap();
        let Reply::Stream(stream) = reply else {
            panic!("expected a stream");
        };
        assert_eq!(stream.collect::<Vec<_>>().await.len(), 1);
    }

    #[tokio::test]
    async fn test_unscripted_operation_fails() {
        let transport = MockTransport::new();
        assert!(transport.dispatch(&request("A")).await.is_err());
    }
}
