//! File backend: an Apache `htpasswd` style `user:hash` table.

use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, error, warn};

use super::error::AuthError;
use super::events::{default_sink, AuthEvent, EventSink, Stage};
use super::hash::{self, Verification};
use super::verifier::CredentialVerifier;

pub struct HtpasswdVerifier {
    records: HashMap<String, String>,
    sink: Arc<dyn EventSink>,
}

impl fmt::Debug for HtpasswdVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Hashes stay out of debug output.
        f.debug_struct("HtpasswdVerifier")
            .field("records", &self.records.len())
            .finish_non_exhaustive()
    }
}

impl HtpasswdVerifier {
    /// Load the password file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::PasswordFile`] if the file is missing or
    /// unreadable.
    pub fn load(path: &Path) -> Result<Self, AuthError> {
        let contents = std::fs::read_to_string(path).map_err(|source| AuthError::PasswordFile {
            path: path.to_path_buf(),
            source,
        })?;

        let verifier = Self::parse(&contents);

        debug!(
            path = %path.display(),
            records = verifier.records.len(),
            "password file loaded"
        );

        Ok(verifier)
    }

    /// Parse password file contents. Malformed lines are skipped with a
    /// warning, and for duplicate identities the first record wins.
    #[must_use]
    pub fn parse(contents: &str) -> Self {
        let mut records = HashMap::new();

        for (index, line) in contents.lines().enumerate() {
            let line_no = index + 1;
            if line.trim().is_empty() {
                continue;
            }

            let mut fields = line.split(':');
            let identity = fields.next().unwrap_or_default();
            let Some(hash) = fields.next().map(str::trim_end) else {
                warn!(line = line_no, "skipping password record without ':' separator");
                continue;
            };

            if identity.is_empty() || hash.is_empty() {
                warn!(line = line_no, "skipping password record with empty field");
                continue;
            }

            if records.contains_key(identity) {
                warn!(line = line_no, identity, "skipping duplicate password record");
                continue;
            }

            if !is_lowercase_identity(identity) {
                warn!(
                    line = line_no,
                    identity,
                    "password record with uppercase letters never matches lowercased usernames"
                );
            }

            records.insert(identity.to_string(), hash.to_string());
        }

        Self {
            records,
            sink: default_sink(),
        }
    }

    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn check(&self, username: &str, password: &str) -> bool {
        let Some(stored) = self.records.get(username) else {
            self.sink.record(&AuthEvent::denied(
                username,
                Stage::Credentials,
                "not present in password file",
            ));
            return false;
        };

        let (scheme, verification) = hash::verify(stored, password);
        let event = match verification {
            Verification::Match => {
                AuthEvent::granted(username, Stage::Credentials, "password accepted")
            }
            Verification::Mismatch => {
                AuthEvent::denied(username, Stage::Credentials, "password mismatch")
            }
            Verification::Malformed(reason) => {
                error!(identity = username, %scheme, reason, "unusable password record");
                AuthEvent::denied(username, Stage::Credentials, reason)
            }
            Verification::Unsupported => {
                error!(
                    identity = username,
                    "'$' prefixed password hashes (MD5, bcrypt, sha-crypt) are not supported"
                );
                AuthEvent::denied(username, Stage::Credentials, "unsupported hash scheme")
            }
        };

        self.sink.record(&event.with_scheme(scheme));
        verification == Verification::Match
    }
}

fn is_lowercase_identity(identity: &str) -> bool {
    identity.to_lowercase() == identity
}

#[async_trait]
impl CredentialVerifier for HtpasswdVerifier {
    fn name(&self) -> &'static str {
        "htpasswd"
    }

    fn format_username(&self, username: &str) -> String {
        username.to_string()
    }

    async fn check_credentials(&self, username: &str, password: &str) -> Result<bool, AuthError> {
        Ok(self.check(username, password))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::events::{MemorySink, Outcome};
    use crate::auth::hash::HashScheme;
    use std::io::Write;

    const FILE: &str = "\
alice:{SHA}qUqP5cyxm6YcTAhz05Hph5gvu9M=
carol:{SSHA}EfPuh7/9ddeKpzeG+d+Ylov4cTrerb7v:extra:fields
dave:abNANd1rDfiNc\r
erin:$1$saltsalt$9xy1btjgzLYfb7hivXtC//

malformed line without separator
:{SHA}qUqP5cyxm6YcTAhz05Hph5gvu9M=
frank:
alice:{SHA}5en6G6MezRroT3XKqkdPOmY/BfQ=
";

    fn verifier() -> (HtpasswdVerifier, Arc<MemorySink>) {
        let sink = MemorySink::new();
        (HtpasswdVerifier::parse(FILE).with_sink(sink.clone()), sink)
    }

    #[test]
    fn parse_skips_malformed_and_duplicate_lines() {
        let (verifier, _) = verifier();
        assert_eq!(verifier.len(), 4);
        assert_eq!(
            verifier.records.get("alice").map(String::as_str),
            Some("{SHA}qUqP5cyxm6YcTAhz05Hph5gvu9M=")
        );
        assert_eq!(
            verifier.records.get("dave").map(String::as_str),
            Some("abNANd1rDfiNc")
        );
    }

    #[tokio::test]
    async fn sha_record() {
        let (verifier, sink) = verifier();
        assert!(verifier.check_credentials("alice", "test").await.unwrap());
        assert!(!verifier.check_credentials("alice", "wrong").await.unwrap());
        // First record wins over the later duplicate hashing "secret".
        assert!(!verifier.check_credentials("alice", "secret").await.unwrap());

        let events = sink.events();
        assert_eq!(events.len(), 3);
        assert_eq!(events[0].outcome, Outcome::Granted);
        assert_eq!(events[0].scheme, Some(HashScheme::Sha1));
        assert_eq!(events[1].outcome, Outcome::Denied);
    }

    #[tokio::test]
    async fn ssha_record_ignores_extra_fields() {
        let (verifier, _) = verifier();
        assert!(verifier.check_credentials("carol", "secret").await.unwrap());
        assert!(!verifier.check_credentials("carol", "Secret").await.unwrap());
    }

    #[tokio::test]
    async fn crypt_record_trims_carriage_return() {
        let (verifier, _) = verifier();
        assert!(verifier.check_credentials("dave", "secret").await.unwrap());
        assert!(!verifier.check_credentials("dave", "secre").await.unwrap());
    }

    #[tokio::test]
    async fn legacy_digest_always_denies() {
        let (verifier, sink) = verifier();
        assert!(!verifier.check_credentials("erin", "secret").await.unwrap());
        assert!(!verifier.check_credentials("erin", "").await.unwrap());
        let event = sink.last().unwrap();
        assert_eq!(event.scheme, Some(HashScheme::LegacyDigest));
        assert_eq!(event.reason, "unsupported hash scheme");
    }

    #[tokio::test]
    async fn unknown_identity_denies_with_event() {
        let (verifier, sink) = verifier();
        assert!(!verifier.check_credentials("mallory", "test").await.unwrap());
        let event = sink.last().unwrap();
        assert_eq!(event.identity, "mallory");
        assert_eq!(event.outcome, Outcome::Denied);
        assert!(event.scheme.is_none());
    }

    #[test]
    fn mixed_case_identities_are_flagged() {
        assert!(is_lowercase_identity("alice"));
        assert!(is_lowercase_identity("corp\\bob.smith-2"));
        assert!(!is_lowercase_identity("Alice"));
        assert!(!is_lowercase_identity("BÖB"));

        // Still loaded, so an operator sees the record in the count.
        let verifier = HtpasswdVerifier::parse("Alice:{SHA}qUqP5cyxm6YcTAhz05Hph5gvu9M=\n");
        assert_eq!(verifier.len(), 1);
    }

    #[test]
    fn format_username_is_identity() {
        let (verifier, _) = verifier();
        assert_eq!(verifier.format_username("CORP\\alice"), "CORP\\alice");
        assert_eq!(verifier.name(), "htpasswd");
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "alice:{{SHA}}qUqP5cyxm6YcTAhz05Hph5gvu9M=").unwrap();
        let verifier = HtpasswdVerifier::load(file.path()).unwrap();
        assert_eq!(verifier.len(), 1);
    }

    #[test]
    fn load_missing_file_is_config_error() {
        let err = HtpasswdVerifier::load(Path::new("/nonexistent/.htpasswd")).unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn debug_hides_hashes() {
        let (verifier, _) = verifier();
        let debug = format!("{verifier:?}");
        assert!(!debug.contains("qUqP5"));
    }
}
