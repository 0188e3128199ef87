//! Sign-in redirect that opens the sign-in page in the user's browser.

use crate::traits::SignInRedirect;

/// Opens the configured sign-in URL with the system browser.
///
/// Without a URL, or when no browser can be launched, the redirect is
/// reported through `tracing` instead.
#[derive(Debug, Clone, Default)]
pub struct BrowserSignIn {
    sign_in_url: Option<String>,
}

impl BrowserSignIn {
    pub fn new(sign_in_url: Option<String>) -> Self {
        Self { sign_in_url }
    }

    pub fn sign_in_url(&self) -> Option<&str> {
        self.sign_in_url.as_deref()
    }
}

impl SignInRedirect for BrowserSignIn {
    fn redirect_to_sign_in(&self) {
        let Some(url) = self.sign_in_url.as_deref() else {
            tracing::warn!("Session ended; sign in again to continue");
            return;
        };

        tracing::info!("Session ended; opening sign-in page {}", url);
        if let Err(e) = webbrowser::open(url) {
            tracing::warn!("Could not open browser ({}); sign in at {}", e, url);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_in_url() {
        assert_eq!(BrowserSignIn::default().sign_in_url(), None);
        assert_eq!(
            BrowserSignIn::new(Some("https://app.example.com/login".into())).sign_in_url(),
            Some("https://app.example.com/login")
        );
    }

    #[test]
    fn test_redirect_without_url_does_not_panic() {
        BrowserSignIn::default().redirect_to_sign_in();
    }
}
