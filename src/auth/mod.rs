//! Password authentication against pluggable backends, followed by
//! authorization against a static allow-list.
//!
//! ```no_run
//! use accessgate::auth::{
//!     AccessController, AllowList, HtpasswdVerifier, LoginAttempt, MemorySession,
//! };
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), accessgate::auth::AuthError> {
//! let verifier = HtpasswdVerifier::load(Path::new("/etc/app/.htpasswd"))?;
//! let allow_list = AllowList::from_pairs([("alice", "12")])?;
//! let controller = AccessController::new(Box::new(verifier), allow_list);
//!
//! let mut session = MemorySession::new();
//! let attempt = LoginAttempt::new("alice", "password");
//! if controller.has_level(&mut session, Some(&attempt), "1").await? {
//!     controller.logout(&mut session, None).await?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod allow_list;
pub mod controller;
pub mod directory;
pub mod error;
pub mod events;
pub mod hash;
pub mod htpasswd;
pub mod session;
pub mod verifier;

pub use self::allow_list::AllowList;
pub use self::controller::{AccessController, LoginAttempt};
pub use self::directory::DirectoryVerifier;
pub use self::error::AuthError;
pub use self::events::{AuthEvent, EventSink, MemorySink, Outcome, Stage, TracingSink};
pub use self::hash::HashScheme;
pub use self::htpasswd::HtpasswdVerifier;
pub use self::session::{MemorySession, SessionStore};
pub use self::verifier::CredentialVerifier;
