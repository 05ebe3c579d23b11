//! Authentication state machine on top of a credential backend and the
//! allow-list.
//!
//! A session is either unauthenticated or authenticated as one canonical
//! identity. The state lives only in the [`SessionStore`]; the controller
//! keeps nothing between calls apart from its injected collaborators.

use secrecy::{ExposeSecret, SecretString};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, instrument};

use super::allow_list::AllowList;
use super::error::AuthError;
use super::events::{default_sink, AuthEvent, EventSink, Stage};
use super::session::{SessionStore, AUTHNAME_KEY, AUTHORIZED_KEY};
use super::verifier::CredentialVerifier;

const AUTHORIZED_FLAG: &str = "1";

/// Submitted login form values for one request.
#[derive(Clone, Debug)]
pub struct LoginAttempt {
    pub username: String,
    pub password: SecretString,
}

impl LoginAttempt {
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: SecretString::from(password.into()),
        }
    }

    /// An empty username or password is no attempt at all.
    #[must_use]
    pub fn is_present(&self) -> bool {
        !self.username.is_empty() && !self.password.expose_secret().is_empty()
    }
}

pub struct AccessController {
    verifier: Box<dyn CredentialVerifier>,
    allow_list: AllowList,
    sink: Arc<dyn EventSink>,
}

impl fmt::Debug for AccessController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessController")
            .field("verifier", &self.verifier.name())
            .field("allow_list", &self.allow_list.len())
            .finish_non_exhaustive()
    }
}

impl AccessController {
    #[must_use]
    pub fn new(verifier: Box<dyn CredentialVerifier>, allow_list: AllowList) -> Self {
        Self {
            verifier,
            allow_list,
            sink: default_sink(),
        }
    }

    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    #[must_use]
    pub fn allow_list(&self) -> &AllowList {
        &self.allow_list
    }

    /// Process `attempt` if one was submitted, then report whether the
    /// session is authenticated.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::BackendUnavailable`] when the backend could not
    /// check the submitted credentials.
    pub async fn is_authenticated<S: SessionStore + ?Sized>(
        &self,
        session: &mut S,
        attempt: Option<&LoginAttempt>,
    ) -> Result<bool, AuthError> {
        if let Some(attempt) = attempt.filter(|attempt| attempt.is_present()) {
            self.authenticate(session, &attempt.username, attempt.password.expose_secret())
                .await?;
        }
        Ok(is_authorized(session))
    }

    /// Check credentials and allow-list membership; on success the session
    /// becomes authenticated as the canonical identity.
    ///
    /// Returns whether the session transitioned. A `false` result leaves the
    /// session untouched and does not say which check failed.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::BackendUnavailable`] when the backend could not
    /// answer.
    #[instrument(skip(self, session, password), fields(backend = self.verifier.name()))]
    pub async fn authenticate<S: SessionStore + ?Sized>(
        &self,
        session: &mut S,
        username: &str,
        password: &str,
    ) -> Result<bool, AuthError> {
        if username.is_empty() || password.is_empty() {
            return Ok(false);
        }

        let username = username.to_lowercase();

        if !self.verifier.check_credentials(&username, password).await? {
            return Ok(false);
        }

        let identity = self.verifier.format_username(&username);
        if !self.authorize(&identity) {
            return Ok(false);
        }

        if !session.is_started() {
            session.start();
        }
        // Identity first: a reader that sees the flag always sees the name.
        session.set(AUTHNAME_KEY, identity);
        session.set(AUTHORIZED_KEY, AUTHORIZED_FLAG.to_string());

        Ok(true)
    }

    /// Canonical identity of an authenticated session.
    #[must_use]
    pub fn current_identity<S: SessionStore + ?Sized>(&self, session: &S) -> Option<String> {
        if is_authorized(session) {
            session.get(AUTHNAME_KEY)
        } else {
            None
        }
    }

    /// Whether the session, after processing `attempt`, is authenticated as
    /// an identity holding the single-character `level`.
    ///
    /// # Errors
    ///
    /// Same as [`Self::is_authenticated`].
    pub async fn has_level<S: SessionStore + ?Sized>(
        &self,
        session: &mut S,
        attempt: Option<&LoginAttempt>,
        level: &str,
    ) -> Result<bool, AuthError> {
        if !self.is_authenticated(session, attempt).await? {
            return Ok(false);
        }
        Ok(self
            .current_identity(session)
            .is_some_and(|identity| self.allow_list.permits(&identity, level)))
    }

    /// Clear the authenticated state. `attempt` is processed first, like
    /// every other entry point.
    ///
    /// # Errors
    ///
    /// Same as [`Self::is_authenticated`].
    pub async fn logout<S: SessionStore + ?Sized>(
        &self,
        session: &mut S,
        attempt: Option<&LoginAttempt>,
    ) -> Result<(), AuthError> {
        if self.is_authenticated(session, attempt).await? {
            session.delete(AUTHORIZED_KEY);
            session.delete(AUTHNAME_KEY);
            debug!("session logged out");
        }
        Ok(())
    }

    fn authorize(&self, identity: &str) -> bool {
        if self.allow_list.contains(identity) {
            self.sink.record(&AuthEvent::granted(
                identity,
                Stage::Authorization,
                "granted access",
            ));
            true
        } else {
            self.sink.record(&AuthEvent::denied(
                identity,
                Stage::Authorization,
                "not in list of permitted users",
            ));
            false
        }
    }
}

fn is_authorized<S: SessionStore + ?Sized>(session: &S) -> bool {
    session.get(AUTHORIZED_KEY).is_some()
}
