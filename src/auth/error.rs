//! Error types for credential backends and the access controller.
//!
//! Rejected credentials and identities missing from the allow-list are not
//! errors: they resolve to `false` plus a diagnostic event. Only faults that
//! the caller must handle differently from "access denied" live here.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    /// Fatal at startup: the allow-list or password file cannot be used.
    #[error("configuration error: {message}")]
    Config { message: String },

    #[error("password file {path} could not be read: {source}")]
    PasswordFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The directory server could not be reached or did not complete the
    /// protocol exchange in time. Never reported as invalid credentials.
    #[error("authentication temporarily unavailable: {server}: {message}")]
    BackendUnavailable { server: String, message: String },
}

impl AuthError {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub(crate) fn unavailable(server: &str, message: impl Into<String>) -> Self {
        Self::BackendUnavailable {
            server: server.to_string(),
            message: message.into(),
        }
    }

    /// Configuration faults halt startup; everything else is per call.
    #[must_use]
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config { .. } | Self::PasswordFile { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_unavailable_message_never_mentions_credentials() {
        let err = AuthError::unavailable("ldap://dc1.corp.example", "connection refused");
        let msg = err.to_string();
        assert!(msg.starts_with("authentication temporarily unavailable"));
        assert!(!msg.contains("invalid"));
        assert!(!err.is_config());
    }

    #[test]
    fn password_file_error_is_config() {
        let err = AuthError::PasswordFile {
            path: PathBuf::from("/nonexistent/.htpasswd"),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert!(err.is_config());
        assert!(err.to_string().contains("/nonexistent/.htpasswd"));
    }
}
