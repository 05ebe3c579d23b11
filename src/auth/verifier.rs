//! Credential backend capability shared by every verifier.

use async_trait::async_trait;

use super::error::AuthError;

/// A pluggable authority that can check a username/password pair.
///
/// Implementations must be `Send + Sync`; the controller shares one across
/// concurrent requests without locking.
#[async_trait]
pub trait CredentialVerifier: Send + Sync {
    /// Short backend name used in diagnostics.
    fn name(&self) -> &'static str;

    /// Map a backend-specific username onto the allow-list identity space.
    fn format_username(&self, username: &str) -> String;

    /// Check `password` for `username` exactly as supplied.
    ///
    /// Rejected credentials return `Ok(false)`; `Err` is reserved for a
    /// backend that could not give an answer at all.
    async fn check_credentials(&self, username: &str, password: &str) -> Result<bool, AuthError>;
}
