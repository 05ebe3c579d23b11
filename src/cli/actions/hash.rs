use crate::auth::hash;
use anyhow::{anyhow, Result};
use secrecy::{ExposeSecret, SecretString};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    Ssha,
    Sha,
}

impl FromStr for Scheme {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "ssha" => Ok(Self::Ssha),
            "sha" => Ok(Self::Sha),
            other => Err(anyhow!("unsupported hash scheme: {other}")),
        }
    }
}

#[derive(Debug)]
pub struct Args {
    pub username: String,
    pub password: SecretString,
    pub scheme: Scheme,
}

/// Build the `user:hash` line for a password file.
///
/// # Errors
/// Returns an error if the username cannot be stored in the file format.
pub fn record(args: &Args) -> Result<String> {
    if args.username.is_empty() || args.username.contains(':') {
        return Err(anyhow!("username must be non-empty and must not contain ':'"));
    }

    let password = args.password.expose_secret();
    let hashed = match args.scheme {
        Scheme::Ssha => hash::ssha(password),
        Scheme::Sha => hash::sha(password),
    };

    Ok(format!("{}:{hashed}", args.username))
}

/// Print the record to stdout.
///
/// # Errors
/// See [`record`].
pub fn execute(args: &Args) -> Result<()> {
    println!("{}", record(args)?);
    Ok(())
}
