use anyhow::{anyhow, Result};
use clap::{Arg, ArgMatches, Command};
use secrecy::SecretString;

pub const ARG_USERNAME: &str = "username";
pub const ARG_PASSWORD: &str = "password";

#[derive(Debug, Clone)]
pub struct Options {
    pub username: String,
    pub password: SecretString,
}

impl Options {
    /// Parse username and password from matches.
    ///
    /// # Errors
    /// Returns an error if either value is missing.
    pub fn parse(matches: &ArgMatches) -> Result<Self> {
        let username = matches
            .get_one::<String>(ARG_USERNAME)
            .cloned()
            .ok_or_else(|| anyhow!("missing required argument: --{ARG_USERNAME}"))?;
        let password = matches
            .get_one::<String>(ARG_PASSWORD)
            .cloned()
            .map(SecretString::from)
            .ok_or_else(|| anyhow!("missing required argument: --{ARG_PASSWORD}"))?;

        Ok(Self { username, password })
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_USERNAME)
                .short('u')
                .long(ARG_USERNAME)
                .help("Username as typed into the login form")
                .env("ACCESSGATE_USERNAME")
                .required(true),
        )
        .arg(
            Arg::new(ARG_PASSWORD)
                .long(ARG_PASSWORD)
                .help("Password; prefer the environment variable over the flag")
                .env("ACCESSGATE_PASSWORD")
                .hide_env_values(true)
                .required(true),
        )
}
