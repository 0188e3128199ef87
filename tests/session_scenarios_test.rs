//! End-to-end behavior of the session pipeline over mock adapters.

mod common;

use std::sync::atomic::Ordering;
use std::time::Duration;

use common::{count_clears, named_query, test_user, TestSession};
use session_link::adapters::mock::{grant, MockRenewalExecutor, MockReply};
use session_link::auth::UserSnapshot;
use session_link::error::{ErrorCategory, LinkError, RenewalError};

/// Expired token: renewal succeeds and the replay carries the new token.
#[tokio::test]
async fn test_expired_token_is_renewed_and_replayed() {
    let t = TestSession::signed_in().await;
    t.transport
        .push_reply("Balance", MockReply::graphql_error("Token expired"));
    t.transport
        .push_reply("Balance", MockReply::Data(serde_json::json!({"balance": 42})));

    let response = t.session.query(named_query("Balance")).await.unwrap();

    assert_eq!(response.data.unwrap()["balance"], 42);
    assert_eq!(
        t.transport.authorization_headers(),
        vec![Some("Bearer T1".to_string()), Some("Bearer T2".to_string())]
    );
    assert_eq!(t.executor.calls(), vec!["R1".to_string()]);

    let stored = t.provider.get_credentials().unwrap();
    assert_eq!(stored.access_token, "T2");
    assert_eq!(stored.refresh_token, "R2");
    assert_eq!(t.store().access_token().as_deref(), Some("T2"));
    assert_eq!(t.sign_in.redirect_count(), 0);
    assert!(!t.session.coordinator().is_in_flight());
}

/// Rejected refresh token: the session is cleared and the user is sent to
/// sign in.
#[tokio::test]
async fn test_rejected_refresh_token_signs_out() {
    let t = TestSession::signed_in_with(MockRenewalExecutor::failing(
        RenewalError::RefreshTokenRejected("Invalid refresh token".into()),
    ))
    .await;
    let clears = count_clears(t.store(), "cache");
    t.transport
        .push_reply("Balance", MockReply::graphql_error("Token expired"));

    let err = t.session.query(named_query("Balance")).await.unwrap_err();

    assert!(err.is_session_expired());
    assert_eq!(err.category(), ErrorCategory::Renewal);
    assert!(err.auth_error().unwrap().requires_reauth());
    assert!(!t.store().is_authenticated());
    assert!(t.provider.get_credentials().is_none());
    assert_eq!(clears.load(Ordering::SeqCst), 1);
    assert_eq!(t.sign_in.redirect_count(), 1);
    assert_eq!(t.transport.dispatch_count(), 1);
}

/// Two requests failing in the same scheduling turn share one renewal; the
/// second fails immediately with its own error.
#[tokio::test]
async fn test_concurrent_failures_share_one_renewal() {
    let executor = MockRenewalExecutor::granting("T2", "R2");
    executor.set_delay(Duration::from_millis(50));
    let t = TestSession::signed_in_with(executor).await;
    t.transport.push_reply("A", MockReply::graphql_error("Token expired"));
    t.transport
        .push_reply("A", MockReply::Data(serde_json::json!({"balance": 1})));
    t.transport.push_reply("B", MockReply::graphql_error("Token expired"));

    let (a, b) = tokio::join!(
        t.session.query(named_query("A")),
        t.session.query(named_query("B"))
    );

    assert_eq!(a.unwrap().data.unwrap()["balance"], 1);
    let b = b.unwrap_err();
    assert_eq!(b.messages(), vec!["Token expired"]);
    assert!(!b.is_session_expired());

    assert_eq!(t.executor.call_count(), 1);
    assert_eq!(t.session.coordinator().renewal_count(), 1);
    assert_eq!(t.transport.dispatch_count(), 3);
    assert_eq!(t.store().access_token().as_deref(), Some("T2"));
}

/// Ordinary failures pass through without touching the coordinator.
#[tokio::test]
async fn test_application_error_passes_through() {
    let t = TestSession::signed_in().await;
    t.transport
        .push_reply("Pay", MockReply::graphql_error("Insufficient balance"));

    let err = t.session.query(named_query("Pay")).await.unwrap_err();

    assert!(matches!(err, LinkError::Graphql { .. }));
    assert_eq!(err.messages(), vec!["Insufficient balance"]);
    assert_eq!(err.category(), ErrorCategory::Application);
    assert_eq!(t.executor.call_count(), 0);
    assert_eq!(t.session.coordinator().renewal_count(), 0);
    assert_eq!(t.store().access_token().as_deref(), Some("T1"));
}

#[tokio::test]
async fn test_network_error_passes_through() {
    let t = TestSession::signed_in().await;
    t.transport.push_reply(
        "Balance",
        MockReply::Failure(LinkError::Http(
            session_link::traits::HttpError::ConnectionFailed("refused".into()),
        )),
    );

    let err = t.session.query(named_query("Balance")).await.unwrap_err();

    assert_eq!(err.category(), ErrorCategory::Network);
    assert_eq!(t.executor.call_count(), 0);
}

/// A 401 without a recognizable message is still an auth failure.
#[tokio::test]
async fn test_401_status_triggers_renewal() {
    let t = TestSession::signed_in().await;
    t.transport.push_reply("Balance", MockReply::status(401, "nope"));
    t.transport
        .push_reply("Balance", MockReply::Data(serde_json::json!({"balance": 0})));

    assert!(t.session.query(named_query("Balance")).await.is_ok());
    assert_eq!(t.executor.call_count(), 1);
}

/// The replay's outcome is final even if it fails authentication again.
#[tokio::test]
async fn test_replay_is_attempted_once() {
    let t = TestSession::signed_in().await;
    t.transport.set_fallback(MockReply::graphql_error("Unauthorized"));

    let err = t.session.query(named_query("Balance")).await.unwrap_err();

    assert_eq!(err.messages(), vec!["Unauthorized"]);
    assert_eq!(t.transport.dispatch_count(), 2);
    assert_eq!(t.executor.call_count(), 1);
    assert!(t.store().is_authenticated());
}

#[tokio::test]
async fn test_signed_out_request_without_refresh_token() {
    let t = TestSession::build(
        None,
        MockRenewalExecutor::granting("T2", "R2"),
        Default::default(),
    )
    .await;
    t.transport
        .push_reply("Balance", MockReply::graphql_error("Authentication required"));

    let err = t.session.query(named_query("Balance")).await.unwrap_err();

    assert!(matches!(
        err,
        LinkError::SessionExpired {
            reason: RenewalError::MissingRefreshToken
        }
    ));
    assert_eq!(t.transport.authorization_headers(), vec![None]);
    assert_eq!(t.executor.call_count(), 0);
    assert_eq!(t.sign_in.redirect_count(), 1);
}

#[tokio::test]
async fn test_sign_in_after_sign_out() {
    let t = TestSession::signed_in().await;
    t.transport
        .set_fallback(MockReply::Data(serde_json::json!({"balance": 7})));

    t.session.sign_out().await.unwrap();
    assert!(!t.store().is_authenticated());

    t.session.sign_in(grant("T9", "R9")).await.unwrap();
    t.session.query(named_query("Balance")).await.unwrap();

    assert_eq!(
        t.transport.authorization_headers(),
        vec![Some("Bearer T9".to_string())]
    );
    assert_eq!(t.provider.get_credentials().unwrap().refresh_token, "R9");
}

#[tokio::test]
async fn test_renewal_replaces_user_snapshot() {
    let renamed = UserSnapshot::new(serde_json::json!({"id": "u1", "username": "ada.l"}));
    let executor = MockRenewalExecutor::new();
    let mut renewed = grant("T2", "R2");
    renewed.user = renamed.clone();
    executor.set_fallback(Ok(renewed));
    let t = TestSession::signed_in_with(executor).await;
    assert_eq!(t.store().user(), Some(test_user()));
    t.transport
        .push_reply("Balance", MockReply::graphql_error("Token expired"));
    t.transport
        .push_reply("Balance", MockReply::Data(serde_json::json!({})));

    t.session.query(named_query("Balance")).await.unwrap();

    assert_eq!(t.store().user(), Some(renamed.clone()));
    assert_eq!(t.provider.get_credentials().unwrap().user, renamed);
}
