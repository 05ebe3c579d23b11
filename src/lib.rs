//! # Accessgate
//!
//! `accessgate` decides who may use an application and at which access
//! level. Credentials are verified by a pluggable backend (an `htpasswd`
//! file or an LDAP directory bind), usernames are normalized to a canonical
//! identity, and that identity is looked up in a static allow-list of
//! single-character access levels.

pub mod auth;
pub mod cli;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};
