pub mod backend;
pub mod credentials;
pub mod logging;

use clap::{
    builder::styling::{AnsiColor, Effects, Styles},
    Arg, ArgAction, ColorChoice, Command,
};

pub const CMD_CHECK: &str = "check";
pub const CMD_HASH: &str = "hash";

pub const ARG_LEVEL: &str = "level";
pub const ARG_SCHEME: &str = "scheme";

#[must_use]
pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    let long_version: &'static str = Box::leak(
        format!("{} - {}", env!("CARGO_PKG_VERSION"), crate::GIT_COMMIT_HASH).into_boxed_str(),
    );

    let command = Command::new("accessgate")
        .about("Password authentication and allow-list authorization")
        .version(env!("CARGO_PKG_VERSION"))
        .long_version(long_version)
        .color(ColorChoice::Auto)
        .styles(styles)
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(check())
        .subcommand(hash());

    logging::with_args(command)
}

fn check() -> Command {
    let command = Command::new(CMD_CHECK)
        .about("Authenticate a user and report the access levels they hold")
        .arg(
            Arg::new(ARG_LEVEL)
                .short('l')
                .long(ARG_LEVEL)
                .help("Access level to test, repeatable")
                .action(ArgAction::Append),
        );

    let command = backend::with_args(command);
    credentials::with_args(command)
}

fn hash() -> Command {
    let command = Command::new(CMD_HASH)
        .about("Print an htpasswd record for a user")
        .arg(
            Arg::new(ARG_SCHEME)
                .short('s')
                .long(ARG_SCHEME)
                .help("Hash scheme")
                .default_value("ssha")
                .value_parser(["ssha", "sha"]),
        );

    credentials::with_args(command)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new() {
        let command = new();

        assert_eq!(command.get_name(), "accessgate");
        assert_eq!(
            command.get_about().map(ToString::to_string),
            Some("Password authentication and allow-list authorization".to_string())
        );
        assert_eq!(
            command.get_version().map(ToString::to_string),
            Some(env!("CARGO_PKG_VERSION").to_string())
        );
    }

    #[test]
    fn test_check_file_backend() {
        temp_env::with_vars_unset(["ACCESSGATE_BACKEND", "ACCESSGATE_PASSWORD"], || {
            let matches = new().get_matches_from(vec![
                "accessgate",
                "check",
                "--allow-list",
                "/etc/accessgate/allow.json",
                "--htpasswd",
                "/etc/accessgate/.htpasswd",
                "-u",
                "alice",
                "--password",
                "test",
                "-l",
                "1",
                "-l",
                "9",
            ]);
            let (name, sub) = matches.subcommand().unwrap();
            assert_eq!(name, CMD_CHECK);
            assert_eq!(
                sub.get_one::<String>(backend::ARG_BACKEND).cloned(),
                Some("file".to_string())
            );
            let levels: Vec<&String> = sub.get_many::<String>(ARG_LEVEL).unwrap().collect();
            assert_eq!(levels, ["1", "9"]);
            assert_eq!(sub.get_one::<u64>(backend::ARG_LDAP_TIMEOUT).copied(), Some(5));
        });
    }

    #[test]
    fn test_check_env() {
        temp_env::with_vars(
            [
                ("ACCESSGATE_ALLOW_LIST", Some("/etc/accessgate/allow.json")),
                ("ACCESSGATE_BACKEND", Some("directory")),
                ("ACCESSGATE_LDAP_SERVER", Some("ldaps://dc1.corp.example")),
                ("ACCESSGATE_LDAP_SHORT_DOMAIN", Some("CORP")),
                ("ACCESSGATE_LDAP_TIMEOUT", Some("3")),
                ("ACCESSGATE_USERNAME", Some("CORP\\bob")),
                ("ACCESSGATE_PASSWORD", Some("secret")),
                ("ACCESSGATE_LOG_LEVEL", Some("info")),
            ],
            || {
                let matches = new().get_matches_from(vec!["accessgate", "check"]);
                assert_eq!(
                    matches.get_one::<u8>(logging::ARG_VERBOSITY).copied(),
                    Some(2)
                );
                let (_, sub) = matches.subcommand().unwrap();
                assert_eq!(
                    sub.get_one::<String>(backend::ARG_LDAP_SERVER).cloned(),
                    Some("ldaps://dc1.corp.example".to_string())
                );
                assert_eq!(sub.get_one::<u64>(backend::ARG_LDAP_TIMEOUT).copied(), Some(3));
                assert_eq!(
                    sub.get_one::<String>(credentials::ARG_USERNAME).cloned(),
                    Some("CORP\\bob".to_string())
                );
            },
        );
    }

    #[test]
    fn test_check_log_level_env() {
        // loop cover all possible value_parse
        let levels = ["error", "warn", "info", "debug", "trace"];
        for (index, &level) in levels.iter().enumerate() {
            temp_env::with_vars(
                [
                    ("ACCESSGATE_LOG_LEVEL", Some(level)),
                    ("ACCESSGATE_USERNAME", Some("alice")),
                    ("ACCESSGATE_PASSWORD", Some("test")),
                ],
                || {
                    let matches = new().get_matches_from(vec!["accessgate", "hash"]);
                    assert_eq!(
                        matches.get_one::<u8>(logging::ARG_VERBOSITY).copied(),
                        Some(u8::try_from(index).unwrap_or(u8::MAX))
                    );
                },
            );
        }
    }

    #[test]
    fn test_check_log_level_verbosity() {
        for index in 0..5_usize {
            temp_env::with_vars_unset(["ACCESSGATE_LOG_LEVEL"], || {
                let mut args = vec![
                    "accessgate".to_string(),
                    "hash".to_string(),
                    "-u".to_string(),
                    "alice".to_string(),
                    "--password".to_string(),
                    "test".to_string(),
                ];

                // Add the appropriate number of "-v" flags based on the index
                if index > 0 {
                    args.push(format!("-{}", "v".repeat(index)));
                }

                let matches = new().get_matches_from(args);

                assert_eq!(
                    matches.get_one::<u8>(logging::ARG_VERBOSITY).copied(),
                    Some(u8::try_from(index).unwrap_or(u8::MAX))
                );
            });
        }
    }

    #[test]
    fn test_hash_scheme_values() {
        temp_env::with_vars_unset(["ACCESSGATE_USERNAME", "ACCESSGATE_PASSWORD"], || {
            let result = new().try_get_matches_from(vec![
                "accessgate", "hash", "-u", "alice", "--password", "x", "--scheme", "md5",
            ]);
            assert!(result.is_err());
        });
    }
}
