//! Scripted renewal executor for testing the refresh coordinator.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Semaphore;

use crate::auth::{TokenGrant, UserSnapshot};
use crate::error::RenewalError;
use crate::traits::RenewalExecutor;

/// How the next renewal call behaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenewalBehavior {
    /// Answer from the script.
    #[default]
    Scripted,
    /// Never complete.
    Hang,
    /// Panic inside the call.
    Panic,
}

/// Renewal executor that answers from a script.
///
/// Calls can be slowed with [`MockRenewalExecutor::set_delay`] or held
/// until [`MockRenewalExecutor::release`] is called, so tests can observe
/// the coordinator while a renewal is in flight.
#[derive(Debug, Clone, Default)]
pub struct MockRenewalExecutor {
    results: Arc<Mutex<VecDeque<Result<TokenGrant, RenewalError>>>>,
    fallback: Arc<Mutex<Option<Result<TokenGrant, RenewalError>>>>,
    calls: Arc<Mutex<Vec<String>>>,
    started: Arc<AtomicUsize>,
    delay: Arc<Mutex<Option<Duration>>>,
    behavior: Arc<Mutex<RenewalBehavior>>,
    gate: Arc<Mutex<Option<Arc<Semaphore>>>>,
}

impl MockRenewalExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Executor whose every call succeeds with this grant.
    pub fn granting(access_token: &str, refresh_token: &str) -> Self {
        let executor = Self::new();
        executor.set_fallback(Ok(grant(access_token, refresh_token)));
        executor
    }

    /// Executor whose every call fails with this error.
    pub fn failing(err: RenewalError) -> Self {
        let executor = Self::new();
        executor.set_fallback(Err(err));
        executor
    }

    /// Queue the result of the next call.
    pub fn push_result(&self, result: Result<TokenGrant, RenewalError>) {
        self.results.lock().unwrap().push_back(result);
    }

    /// Result used once the queue is empty.
    pub fn set_fallback(&self, result: Result<TokenGrant, RenewalError>) {
        *self.fallback.lock().unwrap() = Some(result);
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    pub fn set_behavior(&self, behavior: RenewalBehavior) {
        *self.behavior.lock().unwrap() = behavior;
    }

    /// Hold every call until [`MockRenewalExecutor::release`].
    pub fn hold(&self) {
        *self.gate.lock().unwrap() = Some(Arc::new(Semaphore::new(0)));
    }

    /// Let held calls complete.
    pub fn release(&self) {
        // A closed semaphore fails every pending and future acquire.
        if let Some(gate) = self.gate.lock().unwrap().take() {
            gate.close();
        }
    }

    /// Refresh tokens passed to completed or in-progress calls.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Number of calls that have started.
    pub fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }
}

/// A grant with a null user snapshot.
pub fn grant(access_token: &str, refresh_token: &str) -> TokenGrant {
    TokenGrant {
        access_token: access_token.to_string(),
        refresh_token: refresh_token.to_string(),
        user: UserSnapshot::default(),
    }
}

#[async_trait]
impl RenewalExecutor for MockRenewalExecutor {
    async fn renew(&self, refresh_token: &str) -> Result<TokenGrant, RenewalError> {
        self.calls.lock().unwrap().push(refresh_token.to_string());
        self.started.fetch_add(1, Ordering::SeqCst);

        let gate = self.gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            let _ = gate.acquire().await;
        }

        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let behavior = *self.behavior.lock().unwrap();
        match behavior {
            RenewalBehavior::Scripted => {}
            RenewalBehavior::Hang => futures::future::pending::<()>().await,
            RenewalBehavior::Panic => panic!("mock renewal executor panicked"),
        }

        let scripted = self.results.lock().unwrap().pop_front();
        scripted
            .or_else(|| self.fallback.lock().unwrap().clone())
            .unwrap_or_else(|| Err(RenewalError::Transient("no scripted renewal result".into())))
    }
}
