//! htpasswd hash encodings.
//!
//! Supported, bit-exact with `htpasswd`:
//!
//! - `{SSHA}` base64(`SHA1(password || salt)` || salt)
//! - `{SHA}` base64(`SHA1(password)`)
//! - traditional DES `crypt(3)`, two character salt prefix
//!
//! Anything starting with `$` (apr1/MD5, bcrypt, sha-crypt) is recognised but
//! refused.

use base64ct::{Base64, Encoding};
use rand::Rng;
use serde::Serialize;
use sha1::{Digest, Sha1};
use std::fmt;
use subtle::ConstantTimeEq;

const SSHA_TAG: &str = "{SSHA}";
const SHA_TAG: &str = "{SHA}";
const DIGEST_TAG: &str = "$";

const SHA1_LEN: usize = 20;
const SSHA_SALT_LEN: usize = 4;
const CRYPT_SALT_LEN: usize = 2;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum HashScheme {
    #[serde(rename = "ssha")]
    SaltedSha1,
    #[serde(rename = "sha")]
    Sha1,
    /// `$`-prefixed modular crypt formats. Never verified.
    #[serde(rename = "digest")]
    LegacyDigest,
    #[serde(rename = "crypt")]
    Crypt,
}

impl HashScheme {
    #[must_use]
    pub fn detect(stored: &str) -> Self {
        if stored.starts_with(SSHA_TAG) {
            Self::SaltedSha1
        } else if stored.starts_with(SHA_TAG) {
            Self::Sha1
        } else if stored.starts_with(DIGEST_TAG) {
            Self::LegacyDigest
        } else {
            Self::Crypt
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SaltedSha1 => "ssha",
            Self::Sha1 => "sha",
            Self::LegacyDigest => "digest",
            Self::Crypt => "crypt",
        }
    }
}

impl fmt::Display for HashScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of checking a password against one stored hash.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verification {
    Match,
    Mismatch,
    /// The stored value claims a scheme but cannot be decoded.
    Malformed(&'static str),
    Unsupported,
}

impl Verification {
    fn from_eq(equal: bool) -> Self {
        if equal {
            Self::Match
        } else {
            Self::Mismatch
        }
    }
}

/// Check `password` against a stored htpasswd hash.
#[must_use]
pub fn verify(stored: &str, password: &str) -> (HashScheme, Verification) {
    let scheme = HashScheme::detect(stored);
    let verification = match scheme {
        HashScheme::SaltedSha1 => verify_ssha(&stored[SSHA_TAG.len()..], password),
        HashScheme::Sha1 => verify_sha(&stored[SHA_TAG.len()..], password),
        HashScheme::LegacyDigest => Verification::Unsupported,
        HashScheme::Crypt => verify_crypt(stored, password),
    };
    (scheme, verification)
}

fn verify_ssha(encoded: &str, password: &str) -> Verification {
    let Ok(decoded) = Base64::decode_vec(encoded) else {
        return Verification::Malformed("invalid base64 in {SSHA} hash");
    };
    if decoded.len() < SHA1_LEN {
        return Verification::Malformed("{SSHA} hash shorter than a SHA-1 digest");
    }
    let (digest, salt) = decoded.split_at(SHA1_LEN);
    let computed = salted_sha1(password.as_bytes(), salt);
    Verification::from_eq(computed.as_slice().ct_eq(digest).into())
}

fn verify_sha(encoded: &str, password: &str) -> Verification {
    let Ok(decoded) = Base64::decode_vec(encoded) else {
        return Verification::Malformed("invalid base64 in {SHA} hash");
    };
    let computed = Sha1::digest(password.as_bytes());
    Verification::from_eq(computed.as_slice().ct_eq(decoded.as_slice()).into())
}

fn verify_crypt(stored: &str, password: &str) -> Verification {
    let Some(salt) = stored.get(..CRYPT_SALT_LEN) else {
        return Verification::Malformed("crypt hash shorter than its salt");
    };
    match pwhash::unix_crypt::hash_with(salt, password) {
        Ok(computed) => Verification::from_eq(computed.as_bytes().ct_eq(stored.as_bytes()).into()),
        Err(_) => Verification::Malformed("invalid crypt salt"),
    }
}

fn salted_sha1(password: &[u8], salt: &[u8]) -> Vec<u8> {
    let mut hasher = Sha1::new();
    hasher.update(password);
    hasher.update(salt);
    hasher.finalize().to_vec()
}

/// `{SSHA}` hash for `password` with an explicit salt.
#[must_use]
pub fn ssha_with_salt(password: &str, salt: &[u8]) -> String {
    let mut payload = salted_sha1(password.as_bytes(), salt);
    payload.extend_from_slice(salt);
    format!("{SSHA_TAG}{}", Base64::encode_string(&payload))
}

/// `{SSHA}` hash with a random four byte salt, as `htpasswd -s` writes it.
#[must_use]
pub fn ssha(password: &str) -> String {
    let mut salt = [0u8; SSHA_SALT_LEN];
    rand::thread_rng().fill(&mut salt);
    ssha_with_salt(password, &salt)
}

/// Unsalted `{SHA}` hash.
#[must_use]
pub fn sha(password: &str) -> String {
    let digest = Sha1::digest(password.as_bytes());
    format!("{SHA_TAG}{}", Base64::encode_string(&digest))
}
