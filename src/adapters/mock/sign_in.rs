//! Sign-in redirect that only counts.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::traits::SignInRedirect;

#[derive(Debug, Clone, Default)]
pub struct RecordingSignIn {
    redirects: Arc<AtomicUsize>,
}

impl RecordingSignIn {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn redirect_count(&self) -> usize {
        self.redirects.load(Ordering::SeqCst)
    }
}

impl SignInRedirect for RecordingSignIn {
    fn redirect_to_sign_in(&self) {
        self.redirects.fetch_add(1, Ordering::SeqCst);
    }
}
