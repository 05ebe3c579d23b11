//! Directory backend: credentials are checked with an LDAP simple bind.

use async_trait::async_trait;
use ldap3::{Ldap, LdapConnAsync, LdapConnSettings};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, instrument, warn};
use url::Url;

use super::error::AuthError;
use super::events::{default_sink, AuthEvent, EventSink, Stage};
use super::verifier::CredentialVerifier;

const DEFAULT_BIND_TIMEOUT: Duration = Duration::from_secs(5);
const NO_DIAGNOSTIC: &str = "No additional information is available.";

// Result codes that mean the server could not answer, rather than a refusal.
const RC_PROTOCOL_ERROR: u32 = 2;
const RC_BUSY: u32 = 51;
const RC_UNAVAILABLE: u32 = 52;

pub struct DirectoryVerifier {
    server: String,
    full_domain: String,
    short_domain: String,
    bind_timeout: Duration,
    sink: Arc<dyn EventSink>,
}

impl std::fmt::Debug for DirectoryVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectoryVerifier")
            .field("server", &self.server)
            .field("full_domain", &self.full_domain)
            .field("short_domain", &self.short_domain)
            .field("bind_timeout", &self.bind_timeout)
            .finish_non_exhaustive()
    }
}

impl DirectoryVerifier {
    /// No I/O happens until the first credential check.
    ///
    /// `full_domain` is the `user@full_domain` suffix, `short_domain` the
    /// `SHORT_DOMAIN\user` prefix.
    #[must_use]
    pub fn new(server: String, full_domain: String, short_domain: String) -> Self {
        Self {
            server,
            full_domain,
            short_domain,
            bind_timeout: DEFAULT_BIND_TIMEOUT,
            sink: default_sink(),
        }
    }

    /// Upper bound for connecting and binding; expiry is
    /// [`AuthError::BackendUnavailable`].
    #[must_use]
    pub fn with_timeout(mut self, bind_timeout: Duration) -> Self {
        self.bind_timeout = bind_timeout;
        self
    }

    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    #[must_use]
    pub fn bind_timeout(&self) -> Duration {
        self.bind_timeout
    }

    /// Server address as an LDAP URL; bare host names default to `ldap://`.
    #[must_use]
    pub fn server_url(&self) -> String {
        match Url::parse(&self.server) {
            Ok(url) if matches!(url.scheme(), "ldap" | "ldaps" | "ldapi") => self.server.clone(),
            _ => format!("ldap://{}", self.server),
        }
    }

    async fn connect(&self, url: &str) -> Result<Ldap, AuthError> {
        let settings = LdapConnSettings::new().set_conn_timeout(self.bind_timeout);
        let (conn, ldap) = LdapConnAsync::with_settings(settings, url)
            .await
            .map_err(|e| AuthError::unavailable(url, e.to_string()))?;

        tokio::spawn(async move {
            if let Err(e) = conn.drive().await {
                warn!("LDAP connection error: {e}");
            }
        });

        Ok(ldap)
    }

    /// ldap3 always speaks protocol version 3.
    async fn bind(&self, url: &str, username: &str, password: &str) -> Result<bool, AuthError> {
        let mut ldap = self.connect(url).await?;

        let result = ldap
            .simple_bind(username, password)
            .await
            .map_err(|e| AuthError::unavailable(url, e.to_string()))?;

        if let Err(e) = ldap.unbind().await {
            debug!("LDAP unbind failed: {e}");
        }

        self.bind_outcome(url, username, result.rc, result.text)
    }

    /// Map a bind result code and diagnostic onto a decision.
    fn bind_outcome(
        &self,
        url: &str,
        username: &str,
        rc: u32,
        text: String,
    ) -> Result<bool, AuthError> {
        match rc {
            0 => {
                self.sink.record(&AuthEvent::granted(
                    username,
                    Stage::Credentials,
                    "directory bind succeeded",
                ));
                Ok(true)
            }
            RC_PROTOCOL_ERROR | RC_BUSY | RC_UNAVAILABLE => Err(AuthError::unavailable(
                url,
                format!("bind returned result code {rc}: {text}"),
            )),
            rc => {
                let diagnostic = if text.trim().is_empty() {
                    NO_DIAGNOSTIC.to_string()
                } else {
                    text
                };
                self.sink.record(&AuthEvent::denied(
                    username,
                    Stage::Credentials,
                    format!("Error binding to LDAP (rc={rc}): {diagnostic}"),
                ));
                Ok(false)
            }
        }
    }
}

/// Case-insensitive ASCII prefix strip.
fn strip_prefix_ci<'a>(value: &'a str, prefix: &str) -> Option<&'a str> {
    let head = value.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix)
        .then(|| &value[prefix.len()..])
}

fn strip_suffix_ci<'a>(value: &'a str, suffix: &str) -> Option<&'a str> {
    let split = value.len().checked_sub(suffix.len())?;
    let tail = value.get(split..)?;
    tail.eq_ignore_ascii_case(suffix).then(|| &value[..split])
}

#[async_trait]
impl CredentialVerifier for DirectoryVerifier {
    fn name(&self) -> &'static str {
        "directory"
    }

    /// Strip `SHORT\` then `@full.domain`, repeatedly, so the result is a
    /// fixed point.
    fn format_username(&self, username: &str) -> String {
        let mut name = username;

        if !self.short_domain.is_empty() {
            let prefix = format!("{}\\", self.short_domain);
            while let Some(rest) = strip_prefix_ci(name, &prefix) {
                name = rest;
            }
        }

        if !self.full_domain.is_empty() {
            let suffix = format!("@{}", self.full_domain);
            while let Some(rest) = strip_suffix_ci(name, &suffix) {
                name = rest;
            }
        }

        name.to_string()
    }

    #[instrument(skip(self, password), fields(server = %self.server))]
    async fn check_credentials(&self, username: &str, password: &str) -> Result<bool, AuthError> {
        // An empty password turns a simple bind into an unauthenticated
        // bind, which servers report as success.
        if password.is_empty() {
            self.sink.record(&AuthEvent::denied(
                username,
                Stage::Credentials,
                "empty password refused",
            ));
            return Ok(false);
        }

        let url = self.server_url();
        let result = match timeout(self.bind_timeout, self.bind(&url, username, password)).await {
            Ok(result) => result,
            Err(_) => Err(AuthError::unavailable(
                &url,
                format!("no answer within {:?}", self.bind_timeout),
            )),
        };

        if let Err(e) = &result {
            warn!("{e}");
            self.sink.record(&AuthEvent::denied(
                username,
                Stage::Credentials,
                "backend unavailable",
            ));
        }

        result
    }
}
