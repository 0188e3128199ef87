//! Routes subscriptions and one-shot operations to different transports.

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::LinkError;
use crate::operation::{Operation, OperationKind, PendingRequest, Reply};
use crate::traits::Transport;

pub fn is_subscription(operation: &Operation) -> bool {
    operation.kind == OperationKind::Subscription
}

/// Terminal transport of the chain: subscriptions go to `streaming`,
/// queries and mutations to `unary`.
#[derive(Clone)]
pub struct TransportSplit {
    unary: Arc<dyn Transport>,
    streaming: Arc<dyn Transport>,
}

impl std::fmt::Debug for TransportSplit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportSplit").finish_non_exhaustive()
    }
}

impl TransportSplit {
    pub fn new(unary: Arc<dyn Transport>, streaming: Arc<dyn Transport>) -> Self {
        Self { unary, streaming }
    }
}

#[async_trait]
impl Transport for TransportSplit {
    async fn dispatch(&self, request: &PendingRequest) -> Result<Reply, LinkError> {
        if is_subscription(&request.operation) {
            tracing::debug!("Opening subscription {}", request.operation.label());
            self.streaming.dispatch(request).await
        } else {
            self.unary.dispatch(request).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock::{MockReply, MockTransport};

    fn split() -> (TransportSplit, MockTransport, MockTransport) {
        let unary = MockTransport::new();
        unary.set_fallback(MockReply::Data(serde_json::json!({})));
        let streaming = MockTransport::new();
        streaming.set_fallback(MockReply::Events(Vec::new()));
        let split = TransportSplit::new(Arc::new(unary.clone()), Arc::new(streaming.clone()));
        (split, unary, streaming)
    }

    #[tokio::test]
    async fn test_routes_by_operation_kind() {
        let (split, unary, streaming) = split();

        let query = PendingRequest::new(Operation::new("query { me }"));
        let mutation = PendingRequest::new(Operation::new("mutation { logout }"));
        let subscription = PendingRequest::new(Operation::new("subscription { ticks }"));

        assert!(!split.dispatch(&query).await.unwrap().is_stream());
        assert!(!split.dispatch(&mutation).await.unwrap().is_stream());
        assert!(split.dispatch(&subscription).await.unwrap().is_stream());

        assert_eq!(unary.dispatch_count(), 2);
        assert_eq!(streaming.dispatch_count(), 1);
    }

    #[test]
    fn test_explicit_kind_wins() {
        let op = Operation::new("{ ticks }").with_kind(OperationKind::Subscription);
        assert!(is_subscription(&op));
        assert!(!is_subscription(&Operation::new("{ ticks }")));
    }

    #[test]
    fn test_fragment_first_subscription_routes_to_stream() {
        let doc = "fragment Amount on Balance { amount }\n\
                   subscription BalanceChanged { balanceChanged { ...Amount } }";
        assert!(is_subscription(&Operation::new(doc)));

        let doc = "query Current { balance { amount } }\n\
                   subscription BalanceChanged { balanceChanged { amount } }";
        assert!(!is_subscription(&Operation::new(doc)));
        assert!(is_subscription(
            &Operation::new(doc).with_name("BalanceChanged")
        ));
    }
}
