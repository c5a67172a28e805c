use clap::{Arg, ArgAction, ArgMatches, Command};

pub const ARG_REMEMBER_TTL_SECONDS: &str = "remember-ttl-seconds";
pub const ARG_SECURE_COOKIES: &str = "secure-cookies";

#[derive(Debug, Clone)]
pub struct Options {
    pub remember_ttl_seconds: i64,
    pub secure: bool,
}

impl Options {
    #[must_use]
    pub fn parse(matches: &ArgMatches) -> Self {
        Self {
            remember_ttl_seconds: matches
                .get_one::<i64>(ARG_REMEMBER_TTL_SECONDS)
                .copied()
                .unwrap_or(2_592_000),
            secure: matches.get_flag(ARG_SECURE_COOKIES),
        }
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_REMEMBER_TTL_SECONDS)
                .long(ARG_REMEMBER_TTL_SECONDS)
                .help("Lifetime of a remembered session cookie in seconds")
                .env("SESAME_REMEMBER_TTL_SECONDS")
                .default_value("2592000")
                .value_parser(clap::value_parser!(i64).range(1..)),
        )
        .arg(
            Arg::new(ARG_SECURE_COOKIES)
                .long(ARG_SECURE_COOKIES)
                .help("Mark cookies Secure (serve over HTTPS)")
                .env("SESAME_SECURE_COOKIES")
                .action(ArgAction::SetTrue),
        )
}
