//! Static allow-list: canonical identity to permitted access levels.
//!
//! Configured as a JSON object such as `{"admin": "0129", "alice": "12"}`.
//! Identities compare case-insensitively; each level is one ASCII
//! alphanumeric character.

use serde_json::Value;
use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use tracing::debug;

use super::error::AuthError;

#[derive(Clone, Debug, Default)]
pub struct AllowList {
    entries: HashMap<String, BTreeSet<char>>,
}

impl AllowList {
    /// Build from `(identity, levels)` pairs.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Config`] for an empty identity, an empty or
    /// non-alphanumeric level string, or two identities that only differ in
    /// case.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self, AuthError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut entries = HashMap::new();
        for (identity, levels) in pairs {
            let identity = identity.as_ref().trim();
            if identity.is_empty() {
                return Err(AuthError::config("allow-list identity must not be empty"));
            }
            let levels = parse_levels(identity, levels.as_ref())?;
            if entries.insert(fold(identity), levels).is_some() {
                return Err(AuthError::config(format!(
                    "allow-list identity {identity} is listed more than once"
                )));
            }
        }

        debug!(identities = entries.len(), "allow-list loaded");

        Ok(Self { entries })
    }

    /// Build from a JSON object of identity to level string.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Config`] when the value is not an object of
    /// strings, or any pair fails [`AllowList::from_pairs`].
    pub fn from_json(value: &Value) -> Result<Self, AuthError> {
        let Some(object) = value.as_object() else {
            return Err(AuthError::config(
                "allow-list must map identities to strings of access levels",
            ));
        };

        let pairs = object
            .iter()
            .map(|(identity, levels)| match levels.as_str() {
                Some(levels) => Ok((identity.as_str(), levels)),
                None => Err(AuthError::config(format!(
                    "access levels for {identity} must be a string, got {levels}"
                ))),
            })
            .collect::<Result<Vec<_>, _>>()?;

        Self::from_pairs(pairs)
    }

    /// Read and parse a JSON allow-list file.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Config`] if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, AuthError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            AuthError::config(format!("allow-list {} could not be read: {e}", path.display()))
        })?;
        let value: Value = serde_json::from_str(&raw).map_err(|e| {
            AuthError::config(format!("allow-list {} is not valid JSON: {e}", path.display()))
        })?;
        Self::from_json(&value)
    }

    #[must_use]
    pub fn contains(&self, identity: &str) -> bool {
        self.entries.contains_key(&fold(identity))
    }

    /// Levels granted to `identity`; unknown identities hold none.
    #[must_use]
    pub fn levels(&self, identity: &str) -> Option<&BTreeSet<char>> {
        self.entries.get(&fold(identity))
    }

    /// True when `identity` holds exactly the single-character `level`.
    #[must_use]
    pub fn permits(&self, identity: &str, level: &str) -> bool {
        let mut chars = level.chars();
        let (Some(token), None) = (chars.next(), chars.next()) else {
            return false;
        };
        self.levels(identity)
            .is_some_and(|levels| levels.contains(&token))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Lookups are exact after lowercasing; whitespace is only trimmed from
/// configured keys.
fn fold(identity: &str) -> String {
    identity.to_lowercase()
}

fn parse_levels(identity: &str, levels: &str) -> Result<BTreeSet<char>, AuthError> {
    if levels.is_empty() {
        return Err(AuthError::config(format!(
            "allow-list identity {identity} has no access levels"
        )));
    }
    if let Some(bad) = levels.chars().find(|c| !c.is_ascii_alphanumeric()) {
        return Err(AuthError::config(format!(
            "allow-list identity {identity} has invalid access level {bad:?}"
        )));
    }
    Ok(levels.chars().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn from_json_accepts_identity_to_levels() {
        let list = AllowList::from_json(&json!({"admin": "0129", "alice": "12"})).unwrap();
        assert_eq!(list.len(), 2);
        assert!(list.permits("admin", "9"));
        assert!(list.permits("alice", "1"));
        assert!(!list.permits("alice", "9"));
    }

    #[test]
    fn identities_compare_case_insensitively() {
        let list = AllowList::from_pairs([("Alice", "1")]).unwrap();
        assert!(list.contains("alice"));
        assert!(list.contains("ALICE"));
        assert!(!list.contains("bob"));
    }

    #[test]
    fn configured_keys_are_trimmed_but_lookups_are_exact() {
        let list = AllowList::from_json(&json!({" alice ": "1"})).unwrap();
        assert!(list.contains("alice"));
        assert!(!list.contains(" alice "));
        assert!(!list.permits("alice\t", "1"));
    }

    #[test]
    fn unknown_identity_has_no_levels() {
        let list = AllowList::from_pairs([("alice", "0123456789")]).unwrap();
        for level in ["0", "1", "5", "9", "a"] {
            assert!(!list.permits("mallory", level));
        }
        assert!(list.levels("mallory").is_none());
    }

    #[test]
    fn level_token_must_be_one_character() {
        let list = AllowList::from_pairs([("alice", "12")]).unwrap();
        assert!(!list.permits("alice", ""));
        assert!(!list.permits("alice", "12"));
    }

    #[test]
    fn rejects_non_object() {
        for value in [json!(["alice"]), json!("alice"), json!(null), json!(3)] {
            let err = AllowList::from_json(&value).unwrap_err();
            assert!(err.is_config());
        }
    }

    #[test]
    fn rejects_non_string_levels() {
        assert!(AllowList::from_json(&json!({"alice": 12})).is_err());
        assert!(AllowList::from_json(&json!({"alice": ["1", "2"]})).is_err());
    }

    #[test]
    fn rejects_empty_identity_and_levels() {
        assert!(AllowList::from_pairs([("", "1")]).is_err());
        assert!(AllowList::from_pairs([("  ", "1")]).is_err());
        assert!(AllowList::from_pairs([("alice", "")]).is_err());
        assert!(AllowList::from_pairs([("alice", "1 2")]).is_err());
    }

    #[test]
    fn rejects_case_colliding_identities() {
        let err = AllowList::from_pairs([("alice", "1"), ("ALICE", "2")]).unwrap_err();
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn load_reads_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut file, br#"{"bob": "0"}"#).unwrap();
        let list = AllowList::load(file.path()).unwrap();
        assert!(list.permits("bob", "0"));
    }

    #[test]
    fn load_missing_file_is_config_error() {
        let err = AllowList::load(Path::new("/nonexistent/allow.json")).unwrap_err();
        assert!(err.is_config());
    }
}
