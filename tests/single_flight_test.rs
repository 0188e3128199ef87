//! Single-flight renewal under concurrency, and guard release on every exit
//! path.

mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use common::{count_clears, named_query, wait_until, TestSession};
use session_link::adapters::mock::{MockRenewalExecutor, MockReply, RenewalBehavior};
use session_link::config::SessionConfig;
use session_link::error::{ErrorCategory, RenewalError};
use session_link::session::RenewalOutcome;

const N: usize = 8;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_callers_start_one_renewal() {
    let executor = MockRenewalExecutor::granting("T2", "R2");
    executor.hold();
    let t = TestSession::signed_in_with(executor.clone()).await;
    let coordinator = Arc::clone(t.session.coordinator());

    let tasks: Vec<_> = (0..N)
        .map(|_| {
            let coordinator = Arc::clone(&coordinator);
            tokio::spawn(async move { coordinator.ensure_fresh_credential().await })
        })
        .collect();

    // Everyone but the renewing caller returns without waiting.
    wait_until(|| tasks.iter().filter(|task| task.is_finished()).count() == N - 1).await;
    executor.release();

    let mut outcomes = Vec::new();
    for task in tasks {
        outcomes.push(task.await.unwrap());
    }

    let renewed = outcomes
        .iter()
        .filter(|o| **o == RenewalOutcome::Renewed("T2".to_string()))
        .count();
    let in_flight = outcomes
        .iter()
        .filter(|o| **o == RenewalOutcome::InFlight)
        .count();
    assert_eq!(renewed, 1);
    assert_eq!(in_flight, N - 1);
    assert_eq!(executor.call_count(), 1);
    assert!(!coordinator.is_in_flight());
}

#[tokio::test]
async fn test_burst_of_auth_failures_renews_once() {
    let executor = MockRenewalExecutor::granting("T2", "R2");
    executor.set_delay(Duration::from_millis(20));
    let t = TestSession::signed_in_with(executor).await;
    for i in 0..N {
        let name = format!("Op{}", i);
        t.transport
            .push_reply(&name, MockReply::graphql_error("Invalid or expired token"));
        t.transport
            .push_reply(&name, MockReply::Data(serde_json::json!({"i": i})));
    }

    let results =
        futures::future::join_all((0..N).map(|i| t.session.query(named_query(&format!("Op{}", i)))))
            .await;

    assert_eq!(t.executor.call_count(), 1);
    // The first request renews and replays; the rest fail with their own error.
    assert!(results[0].is_ok());
    for result in &results[1..] {
        let err = result.as_ref().unwrap_err();
        assert_eq!(err.messages(), vec!["Invalid or expired token"]);
    }
    assert_eq!(t.store().access_token().as_deref(), Some("T2"));
}

#[tokio::test]
async fn test_failed_renewal_notifies_listeners_once() {
    let executor = MockRenewalExecutor::failing(RenewalError::RefreshTokenRejected(
        "Refresh token revoked".into(),
    ));
    executor.set_delay(Duration::from_millis(20));
    let t = TestSession::signed_in_with(executor).await;
    let cache = count_clears(t.store(), "cache");
    let ui = count_clears(t.store(), "ui");
    t.transport.set_fallback(MockReply::status(401, "Unauthorized"));

    let results = futures::future::join_all((0..N).map(|_| t.session.query(named_query("Me")))).await;

    assert_eq!(t.executor.call_count(), 1);
    assert_eq!(cache.load(Ordering::SeqCst), 1);
    assert_eq!(ui.load(Ordering::SeqCst), 1);
    assert_eq!(t.sign_in.redirect_count(), 1);
    assert_eq!(
        results
            .iter()
            .filter(|r| r.as_ref().is_err_and(|e| e.is_session_expired()))
            .count(),
        1
    );
    assert!(results.iter().all(|r| r.is_err()));
    assert!(!t.store().is_authenticated());
}

#[tokio::test]
async fn test_clear_twice_fires_twice() {
    let t = TestSession::signed_in().await;
    let clears = count_clears(t.store(), "cache");

    t.store().clear_tokens().await.unwrap();
    t.store().clear_tokens().await.unwrap();

    assert!(!t.store().is_authenticated());
    assert_eq!(clears.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_panicking_renewal_releases_guard() {
    let executor = MockRenewalExecutor::granting("T2", "R2");
    executor.set_behavior(RenewalBehavior::Panic);
    let t = Arc::new(TestSession::signed_in_with(executor.clone()).await);
    t.transport
        .push_reply("Balance", MockReply::graphql_error("Token expired"));

    let request = {
        let t = Arc::clone(&t);
        tokio::spawn(async move { t.session.query(named_query("Balance")).await })
    };
    assert!(request.await.unwrap_err().is_panic());
    assert!(!t.session.coordinator().is_in_flight());

    // The next auth failure can renew normally.
    executor.set_behavior(RenewalBehavior::Scripted);
    t.transport
        .push_reply("Balance", MockReply::graphql_error("Token expired"));
    t.transport
        .push_reply("Balance", MockReply::Data(serde_json::json!({})));
    assert!(t.session.query(named_query("Balance")).await.is_ok());
    assert_eq!(t.session.coordinator().renewal_count(), 2);
}

#[tokio::test]
async fn test_renewal_timeout_is_terminal() {
    let executor = MockRenewalExecutor::granting("T2", "R2");
    executor.set_behavior(RenewalBehavior::Hang);
    let t = TestSession::build(
        Some(common::test_credentials()),
        executor,
        SessionConfig::default().with_renewal_timeout(Duration::from_millis(50)),
    )
    .await;
    t.transport
        .push_reply("Balance", MockReply::graphql_error("Token expired"));

    let err = t.session.query(named_query("Balance")).await.unwrap_err();

    match err {
        session_link::error::LinkError::SessionExpired { reason } => {
            assert_eq!(reason, RenewalError::TimedOut(Duration::from_millis(50)))
        }
        other => panic!("unexpected: {:?}", other),
    }
    assert!(!t.session.coordinator().is_in_flight());
    assert!(!t.store().is_authenticated());
    assert_eq!(t.sign_in.redirect_count(), 1);
}

#[tokio::test]
async fn test_save_failure_keeps_old_credential_on_medium() {
    let t = TestSession::signed_in().await;
    t.provider.set_save_should_fail(true);
    t.provider.set_clear_should_fail(true);
    t.transport
        .push_reply("Balance", MockReply::graphql_error("Token expired"));

    let err = t.session.query(named_query("Balance")).await.unwrap_err();

    assert!(matches!(
        err,
        session_link::error::LinkError::SessionExpired {
            reason: RenewalError::Storage(_)
        }
    ));
    assert_eq!(err.category(), ErrorCategory::Storage);
    assert_eq!(
        err.auth_error().unwrap().user_message(),
        "Your session has ended. Please sign in again."
    );
    // The renewed pair was never written; the old one is still on the medium.
    assert_eq!(t.provider.get_credentials().unwrap().access_token, "T1");
    assert!(!t.store().is_authenticated());
}
