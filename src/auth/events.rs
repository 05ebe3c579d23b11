//! Structured diagnostic events for credential checks and authorization
//! decisions.
//!
//! Every check emits exactly one [`AuthEvent`] into the injected
//! [`EventSink`]. Passwords never appear in events.

use serde::Serialize;
use std::fmt;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

use super::hash::HashScheme;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Granted,
    Denied,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Granted => f.write_str("granted"),
            Self::Denied => f.write_str("denied"),
        }
    }
}

/// Which half of the decision produced the event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Credentials,
    Authorization,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Credentials => f.write_str("credentials"),
            Self::Authorization => f.write_str("authorization"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AuthEvent {
    pub identity: String,
    pub stage: Stage,
    pub outcome: Outcome,
    pub reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheme: Option<HashScheme>,
}

impl AuthEvent {
    pub fn granted(identity: &str, stage: Stage, reason: impl Into<String>) -> Self {
        Self {
            identity: identity.to_string(),
            stage,
            outcome: Outcome::Granted,
            reason: reason.into(),
            scheme: None,
        }
    }

    pub fn denied(identity: &str, stage: Stage, reason: impl Into<String>) -> Self {
        Self {
            identity: identity.to_string(),
            stage,
            outcome: Outcome::Denied,
            reason: reason.into(),
            scheme: None,
        }
    }

    #[must_use]
    pub fn with_scheme(mut self, scheme: HashScheme) -> Self {
        self.scheme = Some(scheme);
        self
    }

    #[must_use]
    pub fn is_granted(&self) -> bool {
        self.outcome == Outcome::Granted
    }
}

/// Receiver for authentication diagnostics.
pub trait EventSink: Send + Sync {
    fn record(&self, event: &AuthEvent);
}

/// Default sink: forwards every event to `tracing`, denials at WARN.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn record(&self, event: &AuthEvent) {
        let scheme = event.scheme.map(HashScheme::as_str).unwrap_or("-");
        match event.outcome {
            Outcome::Granted => info!(
                identity = %event.identity,
                stage = %event.stage,
                outcome = %event.outcome,
                scheme,
                "{}",
                event.reason
            ),
            Outcome::Denied => warn!(
                identity = %event.identity,
                stage = %event.stage,
                outcome = %event.outcome,
                scheme,
                "{}",
                event.reason
            ),
        }
    }
}

/// Collects events in memory; useful when the embedding application wants
/// to inspect decisions after the fact.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<AuthEvent>>,
}

impl MemorySink {
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    #[must_use]
    pub fn events(&self) -> Vec<AuthEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn last(&self) -> Option<AuthEvent> {
        self.events
            .lock()
            .ok()
            .and_then(|events| events.last().cloned())
    }
}

impl EventSink for MemorySink {
    fn record(&self, event: &AuthEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}

pub(crate) fn default_sink() -> Arc<dyn EventSink> {
    Arc::new(TracingSink)
}
