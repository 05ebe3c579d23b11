use anyhow::{anyhow, Context, Result};
use clap::{Arg, ArgMatches, Command};
use std::path::PathBuf;
use std::time::Duration;

pub const ARG_ALLOW_LIST: &str = "allow-list";
pub const ARG_BACKEND: &str = "backend";
pub const ARG_HTPASSWD: &str = "htpasswd";
pub const ARG_LDAP_SERVER: &str = "ldap-server";
pub const ARG_LDAP_DOMAIN: &str = "ldap-domain";
pub const ARG_LDAP_SHORT_DOMAIN: &str = "ldap-short-domain";
pub const ARG_LDAP_TIMEOUT: &str = "ldap-timeout";

const BACKEND_FILE: &str = "file";
const BACKEND_DIRECTORY: &str = "directory";

/// Which credential backend to build, with its settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Backend {
    File {
        htpasswd: PathBuf,
    },
    Directory {
        server: String,
        full_domain: String,
        short_domain: String,
        timeout: Duration,
    },
}

#[derive(Debug, Clone)]
pub struct Options {
    pub allow_list: PathBuf,
    pub backend: Backend,
}

impl Options {
    /// Parse backend arguments from matches.
    ///
    /// # Errors
    /// Returns an error if the selected backend is missing its settings.
    pub fn parse(matches: &ArgMatches) -> Result<Self> {
        let read_required = |id: &str| -> Result<String> {
            matches
                .get_one::<String>(id)
                .cloned()
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| anyhow!("missing required argument: --{id}"))
        };
        let read_optional = |id: &str| -> String {
            matches.get_one::<String>(id).cloned().unwrap_or_default()
        };

        let backend = match matches
            .get_one::<String>(ARG_BACKEND)
            .map_or(BACKEND_FILE, String::as_str)
        {
            BACKEND_FILE => Backend::File {
                htpasswd: PathBuf::from(read_required(ARG_HTPASSWD)?),
            },
            BACKEND_DIRECTORY => Backend::Directory {
                server: read_required(ARG_LDAP_SERVER)?,
                full_domain: read_optional(ARG_LDAP_DOMAIN),
                short_domain: read_optional(ARG_LDAP_SHORT_DOMAIN),
                timeout: Duration::from_secs(
                    matches
                        .get_one::<u64>(ARG_LDAP_TIMEOUT)
                        .copied()
                        .context("missing --ldap-timeout")?,
                ),
            },
            other => return Err(anyhow!("unknown backend: {other}")),
        };

        Ok(Self {
            allow_list: PathBuf::from(read_required(ARG_ALLOW_LIST)?),
            backend,
        })
    }
}

/// Backend settings are checked by [`Options::parse`]; `--backend` has a
/// default, which clap's conditional requirements do not see.
#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_ALLOW_LIST)
                .short('a')
                .long(ARG_ALLOW_LIST)
                .help("JSON file mapping identities to access levels, example: {\"admin\": \"0129\"}")
                .env("ACCESSGATE_ALLOW_LIST")
                .required(true),
        )
        .arg(
            Arg::new(ARG_BACKEND)
                .short('b')
                .long(ARG_BACKEND)
                .help("Credential backend")
                .env("ACCESSGATE_BACKEND")
                .default_value(BACKEND_FILE)
                .value_parser([BACKEND_FILE, BACKEND_DIRECTORY]),
        )
        .arg(
            Arg::new(ARG_HTPASSWD)
                .long(ARG_HTPASSWD)
                .help("Path to the htpasswd file (file backend)")
                .env("ACCESSGATE_HTPASSWD"),
        )
        .arg(
            Arg::new(ARG_LDAP_SERVER)
                .long(ARG_LDAP_SERVER)
                .help("Directory server, example: ldaps://dc1.corp.example (directory backend)")
                .env("ACCESSGATE_LDAP_SERVER"),
        )
        .arg(
            Arg::new(ARG_LDAP_DOMAIN)
                .long(ARG_LDAP_DOMAIN)
                .help("Domain stripped from user@domain names, example: corp.example")
                .env("ACCESSGATE_LDAP_DOMAIN"),
        )
        .arg(
            Arg::new(ARG_LDAP_SHORT_DOMAIN)
                .long(ARG_LDAP_SHORT_DOMAIN)
                .help("Domain stripped from DOMAIN\\user names, example: CORP")
                .env("ACCESSGATE_LDAP_SHORT_DOMAIN"),
        )
        .arg(
            Arg::new(ARG_LDAP_TIMEOUT)
                .long(ARG_LDAP_TIMEOUT)
                .help("Seconds to wait for the directory bind")
                .env("ACCESSGATE_LDAP_TIMEOUT")
                .default_value("5")
                .value_parser(clap::value_parser!(u64).range(1..)),
        )
}
