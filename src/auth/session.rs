//! Session store seam.
//!
//! The store belongs to the transport layer; the controller only reads and
//! writes two keys in it and asks it to start lazily.

use std::collections::HashMap;

pub const AUTHORIZED_KEY: &str = "authorized";
pub const AUTHNAME_KEY: &str = "authname";

pub trait SessionStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: String);
    fn delete(&mut self, key: &str);
    fn is_started(&self) -> bool;
    /// Begin a session if none is active.
    fn start(&mut self);
}

/// Plain in-memory session, one per transport session.
#[derive(Clone, Debug, Default)]
pub struct MemorySession {
    started: bool,
    values: HashMap<String, String>,
}

impl MemorySession {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl SessionStore for MemorySession {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) {
        self.values.insert(key.to_string(), value);
    }

    fn delete(&mut self, key: &str) {
        self.values.remove(key);
    }

    fn is_started(&self) -> bool {
        self.started
    }

    fn start(&mut self) {
        self.started = true;
    }
}
