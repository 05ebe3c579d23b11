use crate::auth::{
    AccessController, AllowList, CredentialVerifier, DirectoryVerifier, HtpasswdVerifier,
    LoginAttempt, MemorySession,
};
use crate::cli::commands::backend::Backend;
use anyhow::{Context, Result};
use secrecy::SecretString;
use std::path::PathBuf;
use tracing::{debug, instrument};

#[derive(Debug)]
pub struct Args {
    pub allow_list: PathBuf,
    pub backend: Backend,
    pub username: String,
    pub password: SecretString,
    pub levels: Vec<String>,
}

/// Outcome of a check, printed by [`execute`].
#[derive(Debug, PartialEq, Eq)]
pub struct Report {
    pub identity: Option<String>,
    pub levels: Vec<(String, bool)>,
}

impl Report {
    /// Authenticated and every requested level held.
    #[must_use]
    pub fn granted(&self) -> bool {
        self.identity.is_some() && self.levels.iter().all(|(_, held)| *held)
    }
}

fn verifier(backend: Backend) -> Result<Box<dyn CredentialVerifier>> {
    Ok(match backend {
        Backend::File { htpasswd } => Box::new(
            HtpasswdVerifier::load(&htpasswd)
                .with_context(|| format!("failed to load {}", htpasswd.display()))?,
        ),
        Backend::Directory {
            server,
            full_domain,
            short_domain,
            timeout,
        } => Box::new(DirectoryVerifier::new(server, full_domain, short_domain).with_timeout(timeout)),
    })
}

/// Run one login attempt against a fresh session.
///
/// # Errors
/// Returns an error if the configuration cannot be loaded or the backend is
/// unavailable.
#[instrument(skip(args), fields(username = %args.username))]
pub async fn run(args: Args) -> Result<Report> {
    let allow_list = AllowList::load(&args.allow_list)
        .with_context(|| format!("failed to load {}", args.allow_list.display()))?;
    let controller = AccessController::new(verifier(args.backend)?, allow_list);

    debug!("{controller:?}");

    let mut session = MemorySession::new();
    let attempt = LoginAttempt {
        username: args.username,
        password: args.password,
    };

    controller
        .is_authenticated(&mut session, Some(&attempt))
        .await?;

    let mut levels = Vec::with_capacity(args.levels.len());
    for level in args.levels {
        let held = controller.has_level(&mut session, None, &level).await?;
        levels.push((level, held));
    }

    Ok(Report {
        identity: controller.current_identity(&session),
        levels,
    })
}

/// Handle the check action, returning whether access was granted.
///
/// # Errors
/// See [`run`].
pub async fn execute(args: Args) -> Result<bool> {
    let report = run(args).await?;

    match &report.identity {
        Some(identity) => println!("access granted: {identity}"),
        None => println!("access denied"),
    }
    if report.identity.is_some() {
        for (level, held) in &report.levels {
            println!("level {level}: {}", if *held { "granted" } else { "denied" });
        }
    }

    Ok(report.granted())
}
