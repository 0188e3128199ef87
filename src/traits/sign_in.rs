//! Sign-in redirect abstraction.

/// Navigation target used when the session cannot be recovered.
///
/// Treated as a fire-and-forget side effect; the pipeline consumes no result.
pub trait SignInRedirect: Send + Sync {
    /// Send the user to the sign-in entry point.
    fn redirect_to_sign_in(&self);
}
