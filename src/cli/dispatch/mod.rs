//! Map parsed CLI arguments to the action to run.

use crate::cli::actions::{check, hash, Action};
use crate::cli::commands::{backend, credentials, ARG_LEVEL, ARG_SCHEME, CMD_CHECK, CMD_HASH};
use anyhow::{anyhow, Context, Result};

/// Map validated CLI matches to an action.
///
/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    match matches.subcommand() {
        Some((CMD_CHECK, sub_m)) => {
            let backend_opts = backend::Options::parse(sub_m)?;
            let credentials = credentials::Options::parse(sub_m)?;
            let levels = sub_m
                .get_many::<String>(ARG_LEVEL)
                .map(|levels| levels.cloned().collect())
                .unwrap_or_default();

            Ok(Action::Check(check::Args {
                allow_list: backend_opts.allow_list,
                backend: backend_opts.backend,
                username: credentials.username,
                password: credentials.password,
                levels,
            }))
        }
        Some((CMD_HASH, sub_m)) => {
            let credentials = credentials::Options::parse(sub_m)?;
            let scheme = sub_m
                .get_one::<String>(ARG_SCHEME)
                .context("missing --scheme")?
                .parse()?;

            Ok(Action::Hash(hash::Args {
                username: credentials.username,
                password: credentials.password,
                scheme,
            }))
        }
        _ => Err(anyhow!("no subcommand given")),
    }
}
